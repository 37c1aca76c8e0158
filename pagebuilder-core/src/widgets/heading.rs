use serde_json::json;

use super::{link_attributes, ALIGN_OPTIONS, FONT_WEIGHT_OPTIONS};
use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::escape_html;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

const TITLE_SELECTOR: &str = "{{WRAPPER}} .pb-heading-title";

pub struct HeadingWidget;

impl Widget for HeadingWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "heading".into(),
            name: "Heading".into(),
            icon: "heading".into(),
            description: "Section title from h1 to h6".into(),
            category: Category::Basic,
            tags: vec!["title".into(), "text".into(), "headline".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Content")?
            .register_field(
                "title",
                FieldDefinition::textarea("Title")
                    .rows(2)
                    .default_value(json!("Add Your Heading Text Here"))
                    .required()
                    .build()?,
            )?
            .register_field("link", FieldDefinition::url("Link").placeholder("https://").build()?)?
            .register_field(
                "header_size",
                FieldDefinition::select("HTML Tag")
                    .options(&[
                        ("h1", "H1"),
                        ("h2", "H2"),
                        ("h3", "H3"),
                        ("h4", "H4"),
                        ("h5", "H5"),
                        ("h6", "H6"),
                    ])
                    .default_value(json!("h2"))
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("typography", "Typography")?
            .register_field(
                "title_color",
                FieldDefinition::color("Text Color")
                    .selector(TITLE_SELECTOR, "color: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "font_size",
                FieldDefinition::responsive_number("Font Size")
                    .min(6.0)
                    .max(200.0)
                    .unit("px")
                    .selector(TITLE_SELECTOR, "font-size: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "font_weight",
                FieldDefinition::select("Font Weight")
                    .options(FONT_WEIGHT_OPTIONS)
                    .selector(TITLE_SELECTOR, "font-weight: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "align",
                FieldDefinition::select("Alignment")
                    .options(ALIGN_OPTIONS)
                    .selector("{{WRAPPER}}", "text-align: {{VALUE}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let tag = match settings.text("header_size") {
            tag @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6") => tag,
            _ => "h2",
        };
        let title = escape_html(settings.text("title"));
        let inner = match link_attributes(settings, "link") {
            Some(attrs) => format!("<a{}>{}</a>", attrs, title),
            None => title,
        };
        Ok(format!(
            "<{tag} class=\"pb-heading-title\">{inner}</{tag}>",
            tag = tag,
            inner = inner
        ))
    }
}
