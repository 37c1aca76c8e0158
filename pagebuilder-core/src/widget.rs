//! The widget contract and the schema shared by all widget types.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::Breakpoints;
use crate::control::{dimension_shorthand, resolve_entries, ControlManager, ResolvedSettings};
use crate::css::{ResponsiveSpacing, SpacingValues};
use crate::error::{BuilderError, BuilderResult};
use crate::escape::{css_ident, sanitize_class_list};
use crate::field::FieldDefinition;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Basic,
    Media,
    Form,
    Layout,
    Advanced,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Basic,
        Category::Media,
        Category::Form,
        Category::Layout,
        Category::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Basic => "basic",
            Category::Media => "media",
            Category::Form => "form",
            Category::Layout => "layout",
            Category::Advanced => "advanced",
        }
    }
}

/// Static identity of a widget type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub pro: bool,
}

impl WidgetConfig {
    /// Case-insensitive match against type, name, description and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.widget_type.to_lowercase().contains(&query)
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// The three field sets of a widget type, built once at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSchema {
    pub general: ControlManager,
    pub style: ControlManager,
    pub advanced: ControlManager,
}

impl WidgetSchema {
    pub fn from_widget(widget: &dyn Widget) -> BuilderResult<Self> {
        let schema = WidgetSchema {
            general: widget.general_fields()?,
            style: widget.style_fields()?,
            advanced: widget.advanced_fields()?,
        };
        let mut seen = HashSet::new();
        for (set, manager) in schema.sets() {
            for (key, _) in manager.field_entries() {
                if !seen.insert(key.to_string()) {
                    return Err(BuilderError::DuplicateField {
                        group: set.to_string(),
                        field: key.to_string(),
                    });
                }
            }
        }
        Ok(schema)
    }

    fn sets(&self) -> [(&'static str, &ControlManager); 3] {
        [
            ("general", &self.general),
            ("style", &self.style),
            ("advanced", &self.advanced),
        ]
    }

    /// `{general, style, advanced}` as consumed by the settings form.
    pub fn field_schema(&self) -> Value {
        json!({
            "general": self.general.fields(),
            "style": self.style.fields(),
            "advanced": self.advanced.fields(),
        })
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.sets().into_iter().find_map(|(_, m)| m.field(key))
    }

    /// Resolve over all three sets at once so conditions may refer across them.
    pub fn resolve(&self, settings: &Settings) -> ResolvedSettings {
        let entries = self
            .general
            .field_entries()
            .chain(self.style.field_entries())
            .chain(self.advanced.field_entries());
        resolve_entries(entries, settings)
    }
}

/// Everything a widget sees while rendering one instance.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub instance_id: &'a str,
    /// Resolved settings: defaults applied, inactive and rejected values handled.
    pub settings: &'a Settings,
    pub schema: &'a WidgetSchema,
    pub breakpoints: &'a Breakpoints,
}

impl RenderContext<'_> {
    /// `#<instance id>`, the value of `{{WRAPPER}}`.
    pub fn wrapper(&self) -> String {
        format!("#{}", css_ident(self.instance_id))
    }

    /// CSS from the style and advanced selector bindings plus the custom CSS field.
    pub fn controls_css(&self) -> String {
        let mut css = self
            .schema
            .style
            .compile_css(self.instance_id, self.settings, self.breakpoints);
        css.push_str(
            &self
                .schema
                .advanced
                .compile_css(self.instance_id, self.settings, self.breakpoints),
        );
        let custom = custom_css(self.settings.text("custom_css"), &self.wrapper());
        if !custom.is_empty() {
            css.push_str(&custom);
            css.push('\n');
        }
        css
    }
}

pub trait Widget: Send + Sync {
    fn config(&self) -> WidgetConfig;

    fn general_fields(&self) -> BuilderResult<ControlManager>;

    fn style_fields(&self) -> BuilderResult<ControlManager> {
        Ok(ControlManager::new())
    }

    fn advanced_fields(&self) -> BuilderResult<ControlManager> {
        common_advanced_fields()
    }

    /// Inner markup for one instance. Every user-supplied string must be escaped.
    fn render(&self, ctx: &RenderContext<'_>) -> BuilderResult<String>;

    fn generate_css(&self, ctx: &RenderContext<'_>) -> BuilderResult<String> {
        Ok(ctx.controls_css())
    }
}

/// Spacing, visibility, attribute and custom CSS controls shared by every widget.
pub fn common_advanced_fields() -> BuilderResult<ControlManager> {
    let spacing = |label: &str, property: &str| {
        FieldDefinition::dimension(label)
            .units(&["px", "em", "rem", "%"])
            .selector("{{WRAPPER}}", &format!("{}: {{{{VALUE}}}};", property))
            .build()
    };
    let breakpoint_spacing = |label: &str| {
        FieldDefinition::dimension(label)
            .units(&["px", "em", "rem", "%"])
            .description("Overrides the desktop value at this breakpoint")
            .build()
    };

    let mut controls = ControlManager::new();
    controls
        .add_group("spacing", "Spacing")?
        .register_field("margin", spacing("Margin", "margin")?)?
        .register_field("margin_tablet", breakpoint_spacing("Margin (Tablet)")?)?
        .register_field("margin_mobile", breakpoint_spacing("Margin (Mobile)")?)?
        .register_field("padding", spacing("Padding", "padding")?)?
        .register_field("padding_tablet", breakpoint_spacing("Padding (Tablet)")?)?
        .register_field("padding_mobile", breakpoint_spacing("Padding (Mobile)")?)?
        .end_group()
        .add_group("attributes", "Attributes")?
        .register_field(
            "css_id",
            FieldDefinition::text("CSS ID")
                .max_length(64)
                .description("Anchor id for in-page links")
                .build()?,
        )?
        .register_field(
            "css_classes",
            FieldDefinition::text("CSS Classes")
                .placeholder("class-one class-two")
                .build()?,
        )?
        .end_group()
        .add_group("visibility", "Responsive Visibility")?
        .register_field("hide_desktop", FieldDefinition::toggle("Hide on Desktop").build()?)?
        .register_field("hide_tablet", FieldDefinition::toggle("Hide on Tablet").build()?)?
        .register_field("hide_mobile", FieldDefinition::toggle("Hide on Mobile").build()?)?
        .end_group()
        .add_group("custom", "Custom CSS")?
        .register_field(
            "custom_css",
            FieldDefinition::textarea("Custom CSS")
                .rows(8)
                .description("Use \"selector\" to target this widget")
                .build()?,
        )?
        .end_group();
    Ok(controls)
}

/// Wrapper classes contributed by the advanced controls.
pub fn wrapper_classes(widget_type: &str, settings: &Settings) -> String {
    let mut classes = vec![
        "pb-widget".to_string(),
        format!("pb-widget-{}", css_ident(widget_type)),
    ];
    for device in ["desktop", "tablet", "mobile"] {
        if settings.flag(&format!("hide_{}", device)) {
            classes.push(format!("pb-hide-{}", device));
        }
    }
    let extra = sanitize_class_list(settings.text("css_classes"));
    if !extra.is_empty() {
        classes.push(extra);
    }
    classes.join(" ")
}

/// Per-breakpoint padding and margin taken from the advanced controls.
pub fn responsive_spacing(settings: &Settings) -> ResponsiveSpacing {
    let shorthand = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_object)
            .and_then(|map| dimension_shorthand(map, "px"))
    };
    ResponsiveSpacing {
        tablet: SpacingValues {
            padding: shorthand("padding_tablet"),
            margin: shorthand("margin_tablet"),
        },
        mobile: SpacingValues {
            padding: shorthand("padding_mobile"),
            margin: shorthand("margin_mobile"),
        },
    }
}

/// Scope a custom CSS snippet to the widget by replacing the `selector` keyword.
pub fn custom_css(css: &str, wrapper: &str) -> String {
    static SELECTOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = SELECTOR_REGEX.get_or_init(|| Regex::new(r"\bselector\b").unwrap());
    let css = css.trim();
    if css.is_empty() {
        return String::new();
    }
    re.replace_all(css, wrapper).into_owned()
}
