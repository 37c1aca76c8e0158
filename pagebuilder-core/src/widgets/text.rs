use serde_json::json;

use super::ALIGN_OPTIONS;
use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::{escape_html, sanitize_rich_text};
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct TextWidget;

impl Widget for TextWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "text".into(),
            name: "Text Editor".into(),
            icon: "align-left".into(),
            description: "Paragraphs of plain or formatted text".into(),
            category: Category::Basic,
            tags: vec!["paragraph".into(), "content".into(), "editor".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Content")?
            .register_field(
                "content",
                FieldDefinition::wysiwyg("Content")
                    .default_value(json!("Click here to edit this text."))
                    .build()?,
            )?
            .register_field("drop_cap", FieldDefinition::toggle("Drop Cap").build()?)?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("text_style", "Text")?
            .register_field(
                "text_color",
                FieldDefinition::color("Text Color")
                    .selector("{{WRAPPER}} .pb-text", "color: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "font_size",
                FieldDefinition::responsive_number("Font Size")
                    .min(6.0)
                    .max(120.0)
                    .unit("px")
                    .selector("{{WRAPPER}} .pb-text", "font-size: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "line_height",
                FieldDefinition::number("Line Height")
                    .min(0.5)
                    .max(4.0)
                    .step(0.1)
                    .selector("{{WRAPPER}} .pb-text", "line-height: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "align",
                FieldDefinition::select("Alignment")
                    .options(ALIGN_OPTIONS)
                    .selector("{{WRAPPER}} .pb-text", "text-align: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "drop_cap_color",
                FieldDefinition::color("Drop Cap Color")
                    .condition("drop_cap", json!(true))
                    .selector(
                        "{{WRAPPER}} .pb-drop-cap > p:first-child::first-letter",
                        "color: {{VALUE}};",
                    )
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let content = settings.text("content");
        let body = if content.contains('<') {
            sanitize_rich_text(content)
        } else {
            paragraphs(content)
        };
        let class = if settings.flag("drop_cap") {
            "pb-text pb-drop-cap"
        } else {
            "pb-text"
        };
        Ok(format!("<div class=\"{}\">{}</div>", class, body))
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let mut css = ctx.controls_css();
        if ctx.settings.flag("drop_cap") {
            css.push_str(&format!(
                "{} .pb-drop-cap > p:first-child::first-letter {{ float: left; font-size: 3.2em; line-height: 1; margin-right: 0.1em; }}\n",
                ctx.wrapper()
            ));
        }
        Ok(css)
    }
}

/// Blank lines separate paragraphs; single newlines become `<br>`.
fn paragraphs(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim())).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Breakpoints;
    use crate::settings::Settings;
    use crate::widget::WidgetSchema;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_becomes_paragraphs() {
        assert_eq!(
            paragraphs("One\nline two\n\n\n<Two>"),
            "<p>One<br>line two</p><p>&lt;Two&gt;</p>"
        );
    }

    #[test]
    fn drop_cap_color_follows_toggle() {
        let schema = WidgetSchema::from_widget(&TextWidget).unwrap();
        let settings = Settings::new()
            .with("content", json!("<p>Hello <em>world</em></p><img src=x onerror=alert(1)>"))
            .with("drop_cap_color", json!("#aa0000"));

        let off = schema.resolve(&settings);
        assert!(!off.values.contains("drop_cap_color"));

        let on = schema.resolve(&settings.clone().with("drop_cap", json!(true)));
        let ctx = RenderContext {
            instance_id: "t1",
            settings: &on.values,
            schema: &schema,
            breakpoints: &Breakpoints::default(),
        };
        assert_eq!(
            TextWidget.render(&ctx).unwrap(),
            "<div class=\"pb-text pb-drop-cap\"><p>Hello <em>world</em></p>&lt;img src=x onerror=alert(1)&gt;</div>"
        );
        let css = TextWidget.generate_css(&ctx).unwrap();
        assert!(css.starts_with(
            "#t1 .pb-drop-cap > p:first-child::first-letter { color: #aa0000; }\n"
        ));
        assert!(css.contains("float: left;"));
    }
}
