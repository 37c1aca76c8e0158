use serde_json::json;

use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::escape_html;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct GalleryWidget;

impl Widget for GalleryWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "gallery".into(),
            name: "Image Gallery".into(),
            icon: "images".into(),
            description: "Grid of images with captions".into(),
            category: Category::Media,
            tags: vec!["images".into(), "grid".into(), "photos".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Gallery")?
            .register_field(
                "images",
                FieldDefinition::repeater("Images")
                    .field("image", FieldDefinition::image("Image").required().build()?)
                    .field("caption", FieldDefinition::text("Caption").build()?)
                    .title_field("caption")
                    .max(100.0)
                    .build()?,
            )?
            .register_field(
                "lightbox",
                FieldDefinition::toggle("Open in Lightbox")
                    .default_value(json!(true))
                    .build()?,
            )?
            .register_field(
                "show_captions",
                FieldDefinition::toggle("Show Captions")
                    .default_value(json!(true))
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("layout", "Layout")?
            .register_field(
                "columns",
                FieldDefinition::responsive_number("Columns")
                    .min(1.0)
                    .max(12.0)
                    .default_value(json!({"desktop": 3, "tablet": 2, "mobile": 1}))
                    .selector(
                        "{{WRAPPER}} .pb-gallery",
                        "grid-template-columns: repeat({{VALUE}}, 1fr);",
                    )
                    .build()?,
            )?
            .register_field(
                "gap",
                FieldDefinition::number("Gap")
                    .min(0.0)
                    .max(100.0)
                    .unit("px")
                    .default_value(json!(10))
                    .selector("{{WRAPPER}} .pb-gallery", "gap: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "caption_color",
                FieldDefinition::color("Caption Color")
                    .condition("show_captions", json!(true))
                    .selector("{{WRAPPER}} .pb-gallery-caption", "color: {{VALUE}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let rows = settings.rows("images");
        if rows.is_empty() {
            return Ok("<div class=\"pb-gallery pb-gallery-empty\">No images added</div>".into());
        }

        let show_captions = settings.flag("show_captions");
        let mut items = String::new();
        for row in &rows {
            let image = row.object("image");
            let url = escape_html(image.text("url"));
            let alt = escape_html(image.text("alt"));
            let img = format!("<img src=\"{}\" alt=\"{}\" loading=\"lazy\">", url, alt);
            let img = if settings.flag("lightbox") {
                format!("<a href=\"{}\" data-lightbox=\"{}\">{}</a>", url, escape_html(ctx.instance_id), img)
            } else {
                img
            };
            let caption = row.text("caption");
            let caption = if show_captions && !caption.is_empty() {
                format!("<figcaption class=\"pb-gallery-caption\">{}</figcaption>", escape_html(caption))
            } else {
                String::new()
            };
            items.push_str(&format!("<figure class=\"pb-gallery-item\">{}{}</figure>", img, caption));
        }
        Ok(format!("<div class=\"pb-gallery\">{}</div>", items))
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let wrapper = ctx.wrapper();
        let mut css = format!(
            "{w} .pb-gallery {{ display: grid; }}\n\
             {w} .pb-gallery-item {{ margin: 0; overflow: hidden; }}\n\
             {w} .pb-gallery-item img {{ display: block; width: 100%; height: auto; object-fit: cover; }}\n",
            w = wrapper
        );
        css.push_str(&ctx.controls_css());
        Ok(css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Breakpoints;
    use crate::settings::Settings;
    use crate::widget::WidgetSchema;
    use pretty_assertions::assert_eq;

    #[test]
    fn columns_are_emitted_per_breakpoint() {
        let schema = WidgetSchema::from_widget(&GalleryWidget).unwrap();
        let resolved = schema.resolve(&Settings::new().with("columns", json!({"desktop": 4})));
        let ctx = RenderContext {
            instance_id: "g",
            settings: &resolved.values,
            schema: &schema,
            breakpoints: &Breakpoints::default(),
        };
        let css = GalleryWidget.generate_css(&ctx).unwrap();
        assert!(css.contains("#g .pb-gallery { grid-template-columns: repeat(4, 1fr); }\n"));
        assert!(!css.contains("@media"));
        assert!(css.contains("#g .pb-gallery { gap: 10px; }\n"));
    }

    #[test]
    fn rows_render_in_order_and_bad_rows_reject_the_list() {
        let schema = WidgetSchema::from_widget(&GalleryWidget).unwrap();
        let good = schema.resolve(&Settings::new().with(
            "images",
            json!([
                {"image": {"url": "/1.jpg", "alt": "one"}, "caption": "First"},
                {"image": "/2.jpg"}
            ]),
        ));
        let ctx = RenderContext {
            instance_id: "g",
            settings: &good.values,
            schema: &schema,
            breakpoints: &Breakpoints::default(),
        };
        let html = GalleryWidget.render(&ctx).unwrap();
        assert_eq!(html.matches("pb-gallery-item").count(), 2);
        assert!(html.find("/1.jpg").unwrap() < html.find("/2.jpg").unwrap());
        assert!(html.contains("<figcaption class=\"pb-gallery-caption\">First</figcaption>"));

        let bad = schema.resolve(&Settings::new().with("images", json!([{"caption": "no image"}])));
        assert_eq!(bad.issues.len(), 1);
        assert_eq!(bad.values.rows("images").len(), 0);
    }
}
