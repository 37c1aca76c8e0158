use serde_json::json;

use super::link_attributes;
use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::escape_html;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct ImageWidget;

impl Widget for ImageWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "image".into(),
            name: "Image".into(),
            icon: "image".into(),
            description: "Single image with optional caption and link".into(),
            category: Category::Media,
            tags: vec!["photo".into(), "picture".into(), "media".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Image")?
            .register_field("image", FieldDefinition::image("Image").build()?)?
            .register_field(
                "caption",
                FieldDefinition::text("Caption").max_length(300).build()?,
            )?
            .register_field("link", FieldDefinition::url("Link").build()?)?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("image_style", "Image")?
            .register_field(
                "width",
                FieldDefinition::responsive_number("Width")
                    .min(1.0)
                    .max(100.0)
                    .unit("%")
                    .default_value(json!({"desktop": 100}))
                    .selector("{{WRAPPER}} img", "width: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "border_radius",
                FieldDefinition::number("Border Radius")
                    .min(0.0)
                    .unit("px")
                    .selector("{{WRAPPER}} img", "border-radius: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "align",
                FieldDefinition::select("Alignment")
                    .options(&[("left", "Left"), ("center", "Center"), ("right", "Right")])
                    .default_value(json!("center"))
                    .selector("{{WRAPPER}} .pb-image", "text-align: {{VALUE}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let image = settings.object("image");
        let url = image.text("url");
        if url.is_empty() {
            return Ok("<div class=\"pb-image pb-image-placeholder\">No image selected</div>".into());
        }

        let img = format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape_html(url),
            escape_html(image.text("alt"))
        );
        let img = match link_attributes(settings, "link") {
            Some(attrs) => format!("<a{}>{}</a>", attrs, img),
            None => img,
        };
        let caption = settings.text("caption");
        Ok(if caption.is_empty() {
            format!("<div class=\"pb-image\">{}</div>", img)
        } else {
            format!(
                "<figure class=\"pb-image\">{}<figcaption>{}</figcaption></figure>",
                img,
                escape_html(caption)
            )
        })
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let mut css = ctx.controls_css();
        css.push_str(&format!(
            "{} img {{ max-width: 100%; height: auto; display: inline-block; }}\n",
            ctx.wrapper()
        ));
        Ok(css)
    }
}
