//! Widget discovery and the render/preview boundary.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::config::PageBuilderConfig;
use crate::css::{CssManager, ResponsiveSpacing};
use crate::error::{BuilderError, BuilderResult};
use crate::escape::{css_ident, escape_html};
use crate::settings::Settings;
use crate::widget::{
    responsive_spacing, wrapper_classes, Category, RenderContext, Widget, WidgetConfig,
    WidgetSchema,
};
use crate::widgets::builtin_widgets;

/// Instance id used by [`WidgetRegistry::preview`].
pub const PREVIEW_INSTANCE_ID: &str = "pb-preview";

struct RegisteredWidget {
    widget: Box<dyn Widget>,
    config: WidgetConfig,
    schema: WidgetSchema,
}

/// Markup and CSS produced for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub html: String,
    pub css: String,
    #[serde(skip)]
    pub spacing: ResponsiveSpacing,
    /// Settings that were rejected and replaced by defaults.
    #[serde(skip)]
    pub issues: Vec<BuilderError>,
}

/// JSON answer of the preview boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub html: String,
    pub css: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Immutable once built; share it behind an `Arc` across renders.
pub struct WidgetRegistry {
    widgets: IndexMap<String, RegisteredWidget>,
    config: PageBuilderConfig,
}

impl WidgetRegistry {
    pub fn new(config: PageBuilderConfig) -> Self {
        Self {
            widgets: IndexMap::new(),
            config,
        }
    }

    /// A registry holding every built-in widget type.
    pub fn with_builtin_widgets(config: PageBuilderConfig) -> BuilderResult<Self> {
        let mut registry = Self::new(config);
        for widget in builtin_widgets() {
            registry.register(widget)?;
        }
        Ok(registry)
    }

    pub fn config(&self) -> &PageBuilderConfig {
        &self.config
    }

    /// Add a widget type. Its field sets are built and checked here, once.
    pub fn register(&mut self, widget: Box<dyn Widget>) -> BuilderResult<()> {
        static TYPE_REGEX: OnceLock<Regex> = OnceLock::new();
        let type_re = TYPE_REGEX.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").unwrap());

        let config = widget.config();
        if !type_re.is_match(&config.widget_type) {
            return Err(BuilderError::config(
                config.widget_type.clone(),
                "widget type must be lowercase kebab-case",
            ));
        }
        if self.widgets.contains_key(&config.widget_type) {
            return Err(BuilderError::DuplicateWidget {
                widget_type: config.widget_type,
            });
        }
        let schema = WidgetSchema::from_widget(widget.as_ref()).map_err(|err| match err {
            BuilderError::Config { context, reason } => BuilderError::config(
                format!("{}.{}", config.widget_type, context),
                reason,
            ),
            other => other,
        })?;
        log::debug!("Registered widget '{}'", config.widget_type);
        self.widgets.insert(
            config.widget_type.clone(),
            RegisteredWidget {
                widget,
                config,
                schema,
            },
        );
        Ok(())
    }

    pub fn contains(&self, widget_type: &str) -> bool {
        self.widgets.contains_key(widget_type)
    }

    pub fn get(&self, widget_type: &str) -> Option<&dyn Widget> {
        self.widgets.get(widget_type).map(|w| w.widget.as_ref())
    }

    pub fn widget_config(&self, widget_type: &str) -> Option<&WidgetConfig> {
        self.widgets.get(widget_type).map(|w| &w.config)
    }

    pub fn schema(&self, widget_type: &str) -> Option<&WidgetSchema> {
        self.widgets.get(widget_type).map(|w| &w.schema)
    }

    /// Registered types in registration order.
    pub fn list_widget_types(&self) -> Vec<&str> {
        self.widgets.keys().map(String::as_str).collect()
    }

    pub fn configs(&self) -> Vec<&WidgetConfig> {
        self.widgets.values().map(|w| &w.config).collect()
    }

    /// Non-empty categories in [`Category::ALL`] order.
    pub fn by_category(&self) -> IndexMap<Category, Vec<&WidgetConfig>> {
        let mut grouped = IndexMap::new();
        for category in Category::ALL {
            let configs: Vec<&WidgetConfig> = self
                .widgets
                .values()
                .map(|w| &w.config)
                .filter(|c| c.category == category)
                .collect();
            if !configs.is_empty() {
                grouped.insert(category, configs);
            }
        }
        grouped
    }

    pub fn search(&self, query: &str) -> Vec<&WidgetConfig> {
        self.widgets
            .values()
            .map(|w| &w.config)
            .filter(|c| c.matches(query))
            .collect()
    }

    /// `{general, style, advanced}` schemas for the settings form.
    pub fn field_schema(&self, widget_type: &str) -> BuilderResult<Value> {
        self.registered(widget_type).map(|w| w.schema.field_schema())
    }

    fn registered(&self, widget_type: &str) -> BuilderResult<&RegisteredWidget> {
        self.widgets
            .get(widget_type)
            .ok_or_else(|| BuilderError::UnknownWidget {
                widget_type: widget_type.to_string(),
            })
    }

    /// Render one instance: wrapped markup plus the instance's own CSS.
    pub fn render(
        &self,
        widget_type: &str,
        instance_id: &str,
        settings: &Settings,
    ) -> BuilderResult<RenderOutput> {
        let registered = self.registered(widget_type)?;
        let id = css_ident(instance_id);
        if id.is_empty() || id != instance_id {
            return Err(BuilderError::render(
                instance_id,
                "instance id may only contain letters, digits, '-' and '_'",
            ));
        }

        let resolved = registered.schema.resolve(settings);
        let ctx = RenderContext {
            instance_id: &id,
            settings: &resolved.values,
            schema: &registered.schema,
            breakpoints: &self.config.breakpoints,
        };
        let widget = registered.widget.as_ref();
        let inner = widget.render(&ctx).map_err(|err| as_render_error(&id, err))?;
        let css = widget.generate_css(&ctx).map_err(|err| as_render_error(&id, err))?;

        let anchor = match css_ident(resolved.values.text("css_id")) {
            anchor if anchor.is_empty() => String::new(),
            anchor => format!("<span id=\"{}\" class=\"pb-anchor\"></span>", anchor),
        };
        let html = format!(
            "<div id=\"{}\" class=\"{}\" data-widget-type=\"{}\">{}{}</div>",
            id,
            escape_html(&wrapper_classes(widget_type, &resolved.values)),
            escape_html(widget_type),
            anchor,
            inner
        );
        Ok(RenderOutput {
            html,
            css,
            spacing: responsive_spacing(&resolved.values),
            issues: resolved.issues,
        })
    }

    /// Render and file the instance's CSS into the page collector; returns the markup.
    pub fn render_into(
        &self,
        widget_type: &str,
        instance_id: &str,
        settings: &Settings,
        css: &mut CssManager,
    ) -> BuilderResult<RenderOutput> {
        let output = self.render(widget_type, instance_id, settings)?;
        css.add_widget_css(instance_id, &output.css, widget_type);
        css.set_responsive_spacing(instance_id, output.spacing.clone());
        Ok(output)
    }

    pub fn generate_css(
        &self,
        widget_type: &str,
        instance_id: &str,
        settings: &Settings,
    ) -> BuilderResult<String> {
        self.render(widget_type, instance_id, settings)
            .map(|output| output.css)
    }

    /// Render a single widget in isolation, as the editor preview does.
    /// Failures are reported in the response instead of as an error.
    pub fn preview(&self, widget_type: &str, settings: &Settings) -> PreviewResponse {
        let mut css = CssManager::new(&self.config);
        match self.render_into(widget_type, PREVIEW_INSTANCE_ID, settings, &mut css) {
            Ok(output) => PreviewResponse {
                success: true,
                html: output.html,
                css: css.output_page_css(false),
                error: None,
                warnings: output.issues.iter().map(ToString::to_string).collect(),
            },
            Err(err) => {
                log::warn!("Preview of '{}' failed: {}", widget_type, err);
                PreviewResponse {
                    success: false,
                    html: String::new(),
                    css: String::new(),
                    error: Some(err.to_string()),
                    warnings: Vec::new(),
                }
            }
        }
    }
}

fn as_render_error(instance_id: &str, err: BuilderError) -> BuilderError {
    match err {
        BuilderError::Render { .. } => err,
        other => BuilderError::render(instance_id, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlManager;
    use crate::field::FieldDefinition;
    use serde_json::json;

    fn registry() -> WidgetRegistry {
        WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap()
    }

    struct Clash;

    impl Widget for Clash {
        fn config(&self) -> WidgetConfig {
            WidgetConfig {
                widget_type: "clash".into(),
                name: "Clash".into(),
                icon: "x".into(),
                description: String::new(),
                category: Category::Advanced,
                tags: Vec::new(),
                pro: false,
            }
        }

        fn general_fields(&self) -> BuilderResult<ControlManager> {
            let mut controls = ControlManager::new();
            controls
                .add_group("content", "Content")?
                .register_field("margin", FieldDefinition::text("Margin").build()?)?
                .end_group();
            Ok(controls)
        }

        fn render(&self, _ctx: &RenderContext<'_>) -> BuilderResult<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn builtins_are_listed_in_order() {
        assert_eq!(
            registry().list_widget_types(),
            [
                "heading",
                "text",
                "button",
                "image",
                "gallery",
                "code-block",
                "contact-form",
                "spacer"
            ]
        );
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register(Box::new(crate::widgets::HeadingWidget))
            .unwrap_err();
        assert_eq!(
            err,
            BuilderError::DuplicateWidget {
                widget_type: "heading".into()
            }
        );
    }

    #[test]
    fn field_key_shared_with_advanced_set_is_rejected() {
        let mut registry = WidgetRegistry::new(PageBuilderConfig::default());
        let err = registry.register(Box::new(Clash)).unwrap_err();
        assert!(matches!(err, BuilderError::DuplicateField { ref field, .. } if field == "margin"));
    }

    #[test]
    fn category_and_search() {
        let registry = registry();
        let grouped = registry.by_category();
        let media: Vec<&str> = grouped[&Category::Media]
            .iter()
            .map(|c| c.widget_type.as_str())
            .collect();
        assert_eq!(media, ["image", "gallery"]);
        assert_eq!(grouped.keys().next(), Some(&Category::Basic));

        let found: Vec<&str> = registry
            .search("captcha")
            .iter()
            .map(|c| c.widget_type.as_str())
            .collect();
        assert_eq!(found, ["contact-form"]);
    }

    #[test]
    fn render_wraps_markup_and_applies_advanced_classes() {
        let output = registry()
            .render(
                "heading",
                "heading-1",
                &Settings::new()
                    .with("title", json!("Hello"))
                    .with("hide_tablet", json!(true))
                    .with("css_id", json!("intro")),
            )
            .unwrap();
        assert_eq!(
            output.html,
            "<div id=\"heading-1\" class=\"pb-widget pb-widget-heading pb-hide-tablet\" data-widget-type=\"heading\">\
             <span id=\"intro\" class=\"pb-anchor\"></span>\
             <h2 class=\"pb-heading-title\">Hello</h2></div>"
        );
    }

    #[test]
    fn unknown_type_and_bad_id_are_errors() {
        let registry = registry();
        assert!(matches!(
            registry.render("carousel", "c1", &Settings::new()),
            Err(BuilderError::UnknownWidget { .. })
        ));
        assert!(matches!(
            registry.render("heading", "a b", &Settings::new()),
            Err(BuilderError::Render { .. })
        ));
    }

    #[test]
    fn preview_reports_failures_as_data() {
        let registry = registry();
        let ok = registry.preview("button", &Settings::new().with("text", json!("Go")));
        assert!(ok.success);
        assert!(ok.html.contains("Go"));
        assert!(ok.css.contains("#pb-preview .pb-button{color:#ffffff;background-color:#2271b1;}"));

        let failed = registry.preview("carousel", &Settings::new());
        assert!(!failed.success);
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"success": false, "html": "", "css": "", "error": "Unknown widget type 'carousel'"})
        );
    }

    #[test]
    fn render_into_feeds_responsive_spacing() {
        let registry = registry();
        let mut css = CssManager::new(&PageBuilderConfig {
            include_base_styles: false,
            minify: false,
            ..PageBuilderConfig::default()
        });
        registry
            .render_into(
                "spacer",
                "s1",
                &Settings::new().with("padding_tablet", json!({"top": 5, "bottom": 5})),
                &mut css,
            )
            .unwrap();
        assert!(css.has_widget_css("s1"));
        assert!(css
            .consolidated_css(false)
            .contains("@media (max-width: 1024px) { #s1 { padding: 5px 0 5px 0; } }"));
    }
}
