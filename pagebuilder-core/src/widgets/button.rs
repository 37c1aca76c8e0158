use serde_json::json;

use super::{link_attributes, ALIGN_OPTIONS};
use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::escape_html;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct ButtonWidget;

fn state_colors(selector: &str, text: &str, background: &str) -> BuilderResult<Vec<(&'static str, FieldDefinition)>> {
    Ok(vec![
        (
            "text_color",
            FieldDefinition::color("Text Color")
                .default_value(json!(text))
                .selector(selector, "color: {{VALUE}};")
                .build()?,
        ),
        (
            "background_color",
            FieldDefinition::color("Background Color")
                .default_value(json!(background))
                .selector(selector, "background-color: {{VALUE}};")
                .build()?,
        ),
    ])
}

impl Widget for ButtonWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "button".into(),
            name: "Button".into(),
            icon: "hand-pointer".into(),
            description: "Call-to-action link styled as a button".into(),
            category: Category::Basic,
            tags: vec!["link".into(), "cta".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Button")?
            .register_field(
                "text",
                FieldDefinition::text("Text")
                    .default_value(json!("Click here"))
                    .max_length(80)
                    .required()
                    .build()?,
            )?
            .register_field(
                "link",
                FieldDefinition::url("Link")
                    .placeholder("https://your-link.com")
                    .validate_url()
                    .build()?,
            )?
            .register_field(
                "size",
                FieldDefinition::select("Size")
                    .options(&[("sm", "Small"), ("md", "Medium"), ("lg", "Large")])
                    .default_value(json!("md"))
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("button_style", "Button")?
            .register_field(
                "colors",
                FieldDefinition::tab_group("Colors")
                    .tab(
                        "normal",
                        "Normal",
                        state_colors("{{WRAPPER}} .pb-button", "#ffffff", "#2271b1")?,
                    )
                    .tab(
                        "hover",
                        "Hover",
                        state_colors("{{WRAPPER}} .pb-button:hover", "#ffffff", "#135e96")?,
                    )
                    .build()?,
            )?
            .register_field(
                "border_radius",
                FieldDefinition::dimension("Border Radius")
                    .units(&["px", "%", "em"])
                    .selector("{{WRAPPER}} .pb-button", "border-radius: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "button_padding",
                FieldDefinition::dimension("Padding")
                    .units(&["px", "em", "%"])
                    .selector("{{WRAPPER}} .pb-button", "padding: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "align",
                FieldDefinition::select("Alignment")
                    .options(ALIGN_OPTIONS)
                    .default_value(json!("left"))
                    .selector("{{WRAPPER}}", "text-align: {{VALUE}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let size = match settings.text("size") {
            size @ ("sm" | "md" | "lg") => size,
            _ => "md",
        };
        let text = escape_html(settings.text("text"));
        let class = format!("pb-button pb-button-{}", size);
        Ok(match link_attributes(settings, "link") {
            Some(attrs) => format!(
                "<a class=\"{}\"{} role=\"button\"><span class=\"pb-button-text\">{}</span></a>",
                class, attrs, text
            ),
            None => format!(
                "<button type=\"button\" class=\"{}\"><span class=\"pb-button-text\">{}</span></button>",
                class, text
            ),
        })
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let mut css = ctx.controls_css();
        let wrapper = ctx.wrapper();
        css.push_str(&format!(
            "{w} .pb-button-sm {{ font-size: 13px; padding: 8px 16px; }}\n\
             {w} .pb-button-md {{ font-size: 15px; padding: 12px 24px; }}\n\
             {w} .pb-button-lg {{ font-size: 18px; padding: 16px 32px; }}\n",
            w = wrapper
        ));
        Ok(css)
    }
}
