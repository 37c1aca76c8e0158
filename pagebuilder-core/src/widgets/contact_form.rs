use serde_json::json;

use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::{css_ident, escape_html};
use crate::field::FieldDefinition;
use crate::settings::Settings;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct ContactFormWidget;

const INPUT_TYPES: &[(&str, &str)] = &[
    ("text", "Text"),
    ("email", "Email"),
    ("tel", "Phone"),
    ("number", "Number"),
    ("url", "URL"),
    ("textarea", "Textarea"),
];

impl Widget for ContactFormWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "contact-form".into(),
            name: "Contact Form".into(),
            icon: "envelope".into(),
            description: "Configurable contact form with optional captcha".into(),
            category: Category::Form,
            tags: vec!["form".into(), "email".into(), "contact".into(), "captcha".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("form", "Form Fields")?
            .register_field(
                "form_fields",
                FieldDefinition::repeater("Fields")
                    .field("label", FieldDefinition::text("Label").required().build()?)
                    .field(
                        "field_type",
                        FieldDefinition::select("Type")
                            .options(INPUT_TYPES)
                            .default_value(json!("text"))
                            .build()?,
                    )
                    .field("placeholder", FieldDefinition::text("Placeholder").build()?)
                    .field("required", FieldDefinition::toggle("Required").build()?)
                    .title_field("label")
                    .min(1.0)
                    .max(20.0)
                    .default_value(json!([
                        {"label": "Name", "field_type": "text", "required": true},
                        {"label": "Email", "field_type": "email", "required": true},
                        {"label": "Message", "field_type": "textarea"}
                    ]))
                    .build()?,
            )?
            .register_field(
                "submit_text",
                FieldDefinition::text("Submit Button")
                    .default_value(json!("Send Message"))
                    .build()?,
            )?
            .register_field(
                "success_message",
                FieldDefinition::text("Success Message")
                    .default_value(json!("Thanks! We will be in touch."))
                    .build()?,
            )?
            .end_group()
            .add_group("captcha", "Captcha")?
            .register_field("enable_captcha", FieldDefinition::toggle("Enable Captcha").build()?)?
            .register_field(
                "captcha_site_key",
                FieldDefinition::text("Site Key")
                    .required()
                    .condition("enable_captcha", json!(true))
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("form_style", "Form")?
            .register_field(
                "label_color",
                FieldDefinition::color("Label Color")
                    .selector("{{WRAPPER}} .pb-form-field label", "color: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "input_border_color",
                FieldDefinition::color("Input Border")
                    .default_value(json!("#cccccc"))
                    .selector(
                        "{{WRAPPER}} .pb-form-field input, {{WRAPPER}} .pb-form-field textarea",
                        "border: 1px solid {{VALUE}};",
                    )
                    .build()?,
            )?
            .register_field(
                "button_color",
                FieldDefinition::color("Button Color")
                    .default_value(json!("#2271b1"))
                    .selector("{{WRAPPER}} .pb-form-submit", "background-color: {{VALUE}};")
                    .build()?,
            )?
            .register_field(
                "captcha_spacing",
                FieldDefinition::number("Captcha Spacing")
                    .min(0.0)
                    .unit("px")
                    .default_value(json!(16))
                    .condition("enable_captcha", json!(true))
                    .selector("{{WRAPPER}} .pb-captcha", "margin-bottom: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let form_id = css_ident(ctx.instance_id);
        let mut html = format!(
            "<form class=\"pb-contact-form\" method=\"post\" data-widget=\"{}\" novalidate>",
            escape_html(&form_id)
        );
        for (index, row) in settings.rows("form_fields").iter().enumerate() {
            html.push_str(&render_field(&form_id, index, row));
        }

        let site_key = settings.text("captcha_site_key");
        if settings.flag("enable_captcha") && !site_key.is_empty() {
            html.push_str(&format!(
                "<div class=\"pb-captcha\" data-sitekey=\"{}\"></div>",
                escape_html(site_key)
            ));
        }
        html.push_str(&format!(
            "<button type=\"submit\" class=\"pb-button pb-form-submit\">{}</button>",
            escape_html(settings.text("submit_text"))
        ));
        html.push_str(&format!(
            "<div class=\"pb-form-success pb-hidden\" role=\"status\">{}</div></form>",
            escape_html(settings.text("success_message"))
        ));
        Ok(html)
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let w = ctx.wrapper();
        let mut css = format!(
            "{w} .pb-form-field {{ display: flex; flex-direction: column; margin-bottom: 12px; }}\n\
             {w} .pb-form-field input, {w} .pb-form-field textarea {{ padding: 8px 10px; font: inherit; border-radius: 3px; }}\n\
             {w} .pb-form-submit {{ color: #ffffff; padding: 10px 20px; }}\n",
            w = w
        );
        css.push_str(&ctx.controls_css());
        Ok(css)
    }
}

fn render_field(form_id: &str, index: usize, row: &Settings) -> String {
    let input_id = format!("{}-field-{}", form_id, index);
    let name = format!("field_{}", index);
    let label = escape_html(row.text("label"));
    let placeholder = escape_html(row.text("placeholder"));
    let required = if row.flag("required") { " required" } else { "" };
    let marker = if row.flag("required") {
        "<span class=\"pb-required\">*</span>"
    } else {
        ""
    };
    let input_type = match row.text("field_type") {
        kind @ ("text" | "email" | "tel" | "number" | "url" | "textarea") => kind,
        _ => "text",
    };
    let control = if input_type == "textarea" {
        format!(
            "<textarea id=\"{}\" name=\"{}\" placeholder=\"{}\" rows=\"5\"{}></textarea>",
            input_id, name, placeholder, required
        )
    } else {
        format!(
            "<input type=\"{}\" id=\"{}\" name=\"{}\" placeholder=\"{}\"{}>",
            input_type, input_id, name, placeholder, required
        )
    };
    format!(
        "<div class=\"pb-form-field\"><label for=\"{}\">{}{}</label>{}</div>",
        input_id, label, marker, control
    )
}
