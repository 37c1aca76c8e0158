use serde_json::json;

use crate::control::ControlManager;
use crate::error::BuilderResult;
use crate::escape::escape_html;
use crate::field::FieldDefinition;
use crate::widget::{Category, RenderContext, Widget, WidgetConfig};

pub struct CodeBlockWidget;

const LANGUAGES: &[(&str, &str)] = &[
    ("plaintext", "Plain Text"),
    ("rust", "Rust"),
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("python", "Python"),
    ("bash", "Bash"),
    ("json", "JSON"),
    ("yaml", "YAML"),
    ("sql", "SQL"),
];

impl Widget for CodeBlockWidget {
    fn config(&self) -> WidgetConfig {
        WidgetConfig {
            widget_type: "code-block".into(),
            name: "Code Block".into(),
            icon: "code".into(),
            description: "Preformatted source code with optional line numbers".into(),
            category: Category::Advanced,
            tags: vec!["code".into(), "snippet".into(), "syntax".into()],
            pro: false,
        }
    }

    fn general_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("content", "Code")?
            .register_field(
                "code",
                FieldDefinition::textarea("Code")
                    .rows(12)
                    .placeholder("// your code here")
                    .build()?,
            )?
            .register_field(
                "language",
                FieldDefinition::select("Language")
                    .options(LANGUAGES)
                    .default_value(json!("plaintext"))
                    .build()?,
            )?
            .register_field("title", FieldDefinition::text("File Name").build()?)?
            .register_field(
                "line_numbers",
                FieldDefinition::toggle("Line Numbers")
                    .default_value(json!(true))
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        let mut controls = ControlManager::new();
        controls
            .add_group("code_style", "Code")?
            .register_field(
                "theme",
                FieldDefinition::select("Theme")
                    .options(&[("dark", "Dark"), ("light", "Light")])
                    .default_value(json!("dark"))
                    .build()?,
            )?
            .register_field(
                "font_size",
                FieldDefinition::number("Font Size")
                    .min(8.0)
                    .max(32.0)
                    .unit("px")
                    .default_value(json!(14))
                    .selector("{{WRAPPER}} .pb-code pre", "font-size: {{VALUE}}{{UNIT}};")
                    .build()?,
            )?
            .register_field(
                "background",
                FieldDefinition::color("Background")
                    .selector("{{WRAPPER}} .pb-code pre", "background-color: {{VALUE}};")
                    .build()?,
            )?
            .end_group();
        Ok(controls)
    }

    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let settings = ctx.settings;
        let theme = match settings.text("theme") {
            "light" => "light",
            _ => "dark",
        };
        let language = escape_html(settings.text("language"));
        let code = settings.text("code").replace("\r\n", "\n");

        let body = if settings.flag("line_numbers") {
            code.lines()
                .map(|line| format!("<span class=\"pb-code-line\">{}</span>", escape_html(line)))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            escape_html(&code)
        };
        let numbered = if settings.flag("line_numbers") {
            " pb-code-numbered"
        } else {
            ""
        };

        let title = settings.text("title");
        let header = if title.is_empty() {
            String::new()
        } else {
            format!("<div class=\"pb-code-title\">{}</div>", escape_html(title))
        };
        Ok(format!(
            "<div class=\"pb-code pb-code-{}{}\">{}<pre><code class=\"language-{}\">{}</code></pre></div>",
            theme, numbered, header, language, body
        ))
    }

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        let w = ctx.wrapper();
        let mut css = format!(
            "{w} .pb-code pre {{ margin: 0; padding: 16px; overflow-x: auto; font-family: ui-monospace, SFMono-Regular, Menlo, monospace; }}\n\
             {w} .pb-code-title {{ padding: 6px 16px; font-size: 12px; opacity: 0.8; }}\n",
            w = w
        );
        css.push_str(&match ctx.settings.text("theme") {
            "light" => format!("{w} .pb-code-light pre {{ background-color: #f6f8fa; color: #24292f; }}\n", w = w),
            _ => format!("{w} .pb-code-dark pre {{ background-color: #1e1e1e; color: #d4d4d4; }}\n", w = w),
        });
        if ctx.settings.flag("line_numbers") {
            css.push_str(&format!(
                "{w} .pb-code-numbered code {{ counter-reset: line; }}\n\
                 {w} .pb-code-line::before {{ counter-increment: line; content: counter(line); display: inline-block; width: 2.5em; margin-right: 1em; text-align: right; opacity: 0.5; }}\n",
                w = w
            ));
        }
        // Field bindings last so a chosen background overrides the theme.
        css.push_str(&ctx.controls_css());
        Ok(css)
    }
}
