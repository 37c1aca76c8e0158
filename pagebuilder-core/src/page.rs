//! Page documents and whole-page rendering.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::css::{CssManager, CssStats};
use crate::error::{BuilderError, BuilderResult};
use crate::escape::escape_html;
use crate::registry::WidgetRegistry;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(default)]
    pub settings: Settings,
}

/// An ordered list of widget instances, as stored by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub widgets: Vec<WidgetInstance>,
}

impl PageDocument {
    pub fn from_yaml_str(yaml: &str) -> BuilderResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> BuilderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a `.json` file as JSON and anything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> BuilderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderFailure {
    pub instance_id: String,
    pub widget_type: String,
    pub error: BuilderError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub title: String,
    /// Concatenated widget markup.
    pub body: String,
    /// The page `<style>` element, or `""` when no widget produced CSS.
    pub styles: String,
    pub failures: Vec<RenderFailure>,
    /// Rejected settings per instance id; the widget still rendered with defaults.
    pub issues: Vec<(String, BuilderError)>,
    pub stats: CssStats,
}

impl RenderedPage {
    pub fn to_html_document(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}\n</head>\n<body>\n{}\n</body>\n</html>\n",
            escape_html(&self.title),
            self.styles,
            self.body
        )
    }
}

/// Marker rendered in place of a widget that failed.
pub fn failure_placeholder(widget_type: &str) -> String {
    format!(
        "<div class=\"pb-widget pb-widget-error\" data-widget-type=\"{}\" role=\"alert\">Widget failed to render</div>",
        escape_html(widget_type)
    )
}

/// Render every instance with a fresh CSS collector. A failing instance is
/// replaced by a placeholder and the rest of the page still renders.
pub fn render_page(registry: &WidgetRegistry, page: &PageDocument) -> RenderedPage {
    let mut css = CssManager::new(registry.config());
    let mut seen = HashSet::new();
    let mut body = String::new();
    let mut failures = Vec::new();
    let mut issues = Vec::new();

    for instance in &page.widgets {
        let result = if seen.insert(instance.id.as_str()) {
            registry.render_into(&instance.widget_type, &instance.id, &instance.settings, &mut css)
        } else {
            Err(BuilderError::render(&instance.id, "duplicate instance id on page"))
        };
        match result {
            Ok(output) => {
                body.push_str(&output.html);
                body.push('\n');
                issues.extend(output.issues.into_iter().map(|e| (instance.id.clone(), e)));
            }
            Err(error) => {
                log::warn!(
                    "Widget '{}' ({}) failed to render: {}",
                    instance.id,
                    instance.widget_type,
                    error
                );
                body.push_str(&failure_placeholder(&instance.widget_type));
                body.push('\n');
                failures.push(RenderFailure {
                    instance_id: instance.id.clone(),
                    widget_type: instance.widget_type.clone(),
                    error,
                });
            }
        }
    }

    let styles = css.output_page_css(true);
    RenderedPage {
        title: page.title.clone(),
        body,
        styles,
        failures,
        issues,
        stats: css.stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageBuilderConfig;

    const PAGE: &str = r##"
title: Landing
widgets:
  - id: hero
    type: heading
    settings:
      title: Welcome
      title_color: "#112233"
  - id: broken
    type: carousel
  - id: hero
    type: spacer
  - id: cta
    type: button
    settings:
      text: Start
      size: huge
"##;

    #[test]
    fn failing_widgets_become_placeholders() {
        let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
        let page = PageDocument::from_yaml_str(PAGE).unwrap();
        let rendered = render_page(&registry, &page);

        assert_eq!(rendered.failures.len(), 2);
        assert_eq!(rendered.failures[0].instance_id, "broken");
        assert_eq!(rendered.failures[1].widget_type, "spacer");
        assert_eq!(rendered.body.matches("Widget failed to render").count(), 2);
        assert!(rendered.body.contains(">Welcome</h2>"));
        assert!(rendered.body.contains("pb-button-md"));

        assert_eq!(rendered.issues.len(), 1);
        assert_eq!(rendered.issues[0].0, "cta");

        assert!(rendered.styles.contains("#hero .pb-heading-title{color:#112233;}"));
        assert_eq!(rendered.stats.widget_count, 2);
        assert!(rendered.stats.emitted);
    }

    #[test]
    fn json_documents_parse() {
        let page = PageDocument::from_json_str(
            r#"{"widgets": [{"id": "s", "type": "spacer", "settings": {"height": 10}}]}"#,
        )
        .unwrap();
        assert_eq!(page.title, "");
        assert_eq!(page.widgets[0].settings.number("height"), Some(10.0));
    }

    #[test]
    fn document_wraps_styles_in_head() {
        let rendered = RenderedPage {
            title: "A & B".into(),
            body: "<p>x</p>".into(),
            styles: "<style id=\"s\">a{}</style>".into(),
            failures: Vec::new(),
            issues: Vec::new(),
            stats: CssManager::default().stats(),
        };
        let html = rendered.to_html_document();
        assert!(html.contains("<title>A &amp; B</title>\n<style id=\"s\">a{}</style>\n</head>"));
    }
}
