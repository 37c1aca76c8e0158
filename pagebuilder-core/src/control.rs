//! Control groups and selector bindings.
//!
//! A [`ControlManager`] owns ordered groups of fields and every selector binding
//! declared on them. Settings are resolved against the whole manager (field keys
//! are unique across groups) and compiled into CSS in registration order.

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

use crate::config::Breakpoints;
use crate::error::{BuilderError, BuilderResult};
use crate::escape::{css_ident, css_value};
use crate::field::{field_set_config, resolve_field_set, FieldDefinition, FieldKind};
use crate::settings::Settings;

/// A labeled, ordered collection of fields shown together in the settings form.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGroup {
    pub key: String,
    pub label: String,
    pub fields: IndexMap<String, FieldDefinition>,
}

/// A field value bound to a CSS rule template.
#[derive(Debug, Clone, PartialEq)]
struct Binding {
    /// Keys from the settings root down to the bound field.
    path: Vec<String>,
    selector: String,
    declarations: String,
    /// Fallback for `{{UNIT}}`.
    unit: Option<String>,
    /// Fields nested under a responsive-group breakpoint apply only at that breakpoint.
    breakpoint: Option<String>,
    responsive: bool,
}

/// Settings after defaults, conditions and validation have been applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSettings {
    pub values: Settings,
    #[serde(skip)]
    pub issues: Vec<BuilderError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlManager {
    groups: IndexMap<String, FieldGroup>,
    bindings: Vec<Binding>,
}

/// Adds fields to one group; obtained from [`ControlManager::add_group`].
pub struct GroupBuilder<'a> {
    manager: &'a mut ControlManager,
    key: String,
}

impl<'a> GroupBuilder<'a> {
    pub fn register_field(self, key: &str, field: FieldDefinition) -> BuilderResult<Self> {
        if self.manager.field(key).is_some() {
            return Err(BuilderError::DuplicateField {
                group: self.key.clone(),
                field: key.to_string(),
            });
        }
        if key.is_empty() {
            return Err(BuilderError::config(&self.key, "field key is empty"));
        }
        collect_bindings(&[key.to_string()], &field, None, &mut self.manager.bindings);
        if let Some(group) = self.manager.groups.get_mut(&self.key) {
            group.fields.insert(key.to_string(), field);
        }
        Ok(self)
    }

    pub fn end_group(self) -> &'a mut ControlManager {
        self.manager
    }
}

fn collect_bindings(
    path: &[String],
    field: &FieldDefinition,
    breakpoint: Option<&str>,
    out: &mut Vec<Binding>,
) {
    for (selector, declarations) in &field.selectors {
        out.push(Binding {
            path: path.to_vec(),
            selector: selector.clone(),
            declarations: declarations.clone(),
            unit: field.kind.default_unit().map(str::to_string),
            breakpoint: breakpoint.map(str::to_string),
            responsive: matches!(field.kind, FieldKind::ResponsiveNumber { .. }),
        });
    }
    let responsive_group = matches!(field.kind, FieldKind::ResponsiveGroup { .. });
    if let Some(tabs) = field.kind.tabs() {
        for (tab_key, tab) in tabs {
            let nested_breakpoint = if responsive_group {
                Some(tab_key.as_str())
            } else {
                breakpoint
            };
            for (nested_key, nested) in &tab.fields {
                let mut nested_path = path.to_vec();
                nested_path.push(tab_key.clone());
                nested_path.push(nested_key.clone());
                collect_bindings(&nested_path, nested, nested_breakpoint, out);
            }
        }
    }
}

impl ControlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new group. Fails if `key` is already used.
    pub fn add_group(&mut self, key: &str, label: &str) -> BuilderResult<GroupBuilder<'_>> {
        if self.groups.contains_key(key) {
            return Err(BuilderError::DuplicateGroup {
                group: key.to_string(),
            });
        }
        self.groups.insert(
            key.to_string(),
            FieldGroup {
                key: key.to_string(),
                label: label.to_string(),
                fields: IndexMap::new(),
            },
        );
        Ok(GroupBuilder {
            manager: self,
            key: key.to_string(),
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &FieldGroup> {
        self.groups.values()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(|g| g.fields.is_empty())
    }

    /// Every field across all groups, in registration order.
    pub fn field_entries(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.groups
            .values()
            .flat_map(|g| g.fields.iter().map(|(k, f)| (k.as_str(), f)))
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.groups.values().find_map(|g| g.fields.get(key))
    }

    /// Number of selector bindings, nested fields included.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Full schema: `{group: {label, fields: {key: config}}}`.
    pub fn fields(&self) -> Value {
        let map: Map<String, Value> = self
            .groups
            .values()
            .map(|group| {
                (
                    group.key.clone(),
                    json!({ "label": group.label, "fields": field_set_config(&group.fields) }),
                )
            })
            .collect();
        Value::Object(map)
    }

    /// Resolve settings leniently: rejected values fall back to defaults and are reported.
    pub fn resolve(&self, settings: &Settings) -> ResolvedSettings {
        resolve_entries(self.field_entries(), settings)
    }

    /// Every constraint violation among the active fields.
    pub fn validate(&self, settings: &Settings) -> Vec<BuilderError> {
        self.resolve(settings).issues
    }

    pub fn generate_css(&self, instance_id: &str, settings: &Settings) -> String {
        self.generate_css_with(instance_id, settings, &Breakpoints::default())
    }

    pub fn generate_css_with(
        &self,
        instance_id: &str,
        settings: &Settings,
        breakpoints: &Breakpoints,
    ) -> String {
        let resolved = self.resolve(settings);
        self.compile_css(instance_id, &resolved.values, breakpoints)
    }

    /// Compile already-resolved values. One rule per binding with a value,
    /// in registration order.
    pub fn compile_css(
        &self,
        instance_id: &str,
        values: &Settings,
        breakpoints: &Breakpoints,
    ) -> String {
        let wrapper = format!("#{}", css_ident(instance_id));
        let mut css = String::new();
        for binding in &self.bindings {
            let Some(value) = lookup(values.as_map(), &binding.path) else {
                continue;
            };
            emit_binding(&mut css, binding, value, &wrapper, breakpoints);
        }
        css
    }
}

pub(crate) fn resolve_entries<'a, I>(entries: I, settings: &Settings) -> ResolvedSettings
where
    I: IntoIterator<Item = (&'a str, &'a FieldDefinition)>,
{
    match resolve_field_set(entries, settings.as_map(), false) {
        Ok(outcome) => ResolvedSettings {
            values: Settings::from(outcome.values),
            issues: outcome.issues,
        },
        Err(err) => ResolvedSettings {
            values: Settings::default(),
            issues: vec![err],
        },
    }
}

fn lookup<'v>(values: &'v Map<String, Value>, path: &[String]) -> Option<&'v Value> {
    let (first, rest) = path.split_first()?;
    let mut current = values.get(first)?;
    for key in rest {
        current = current.as_object()?.get(key)?;
    }
    (!current.is_null()).then_some(current)
}

fn emit_binding(
    css: &mut String,
    binding: &Binding,
    value: &Value,
    wrapper: &str,
    breakpoints: &Breakpoints,
) {
    let explicit_subkeys = binding.declarations.contains("{{VALUE.");
    if binding.responsive && !explicit_subkeys {
        let unit = value_unit(value, binding);
        for key in crate::field::BREAKPOINT_KEYS {
            let Some(point) = value.get(*key).filter(|v| !v.is_null()) else {
                continue;
            };
            if let Some(rule) = render_rule(binding, point, &unit, wrapper) {
                push_rule(css, rule, breakpoints.media_query(key));
            }
        }
        return;
    }

    let unit = value_unit(value, binding);
    if let Some(rule) = render_rule(binding, value, &unit, wrapper) {
        let media = binding
            .breakpoint
            .as_deref()
            .and_then(|bp| breakpoints.media_query(bp));
        push_rule(css, rule, media);
    }
}

fn push_rule(css: &mut String, rule: String, media: Option<String>) {
    match media {
        Some(query) => css.push_str(&format!("{} {{ {} }}\n", query, rule)),
        None => {
            css.push_str(&rule);
            css.push('\n');
        }
    }
}

fn value_unit(value: &Value, binding: &Binding) -> String {
    value
        .get("unit")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .or_else(|| binding.unit.clone())
        .unwrap_or_default()
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*(WRAPPER|UNIT|VALUE(?:\.([A-Za-z0-9_]+))?)\s*\}\}").unwrap()
    })
}

/// `selector { declarations }`, or `None` when the value or a referenced part is empty.
fn render_rule(binding: &Binding, value: &Value, unit: &str, wrapper: &str) -> Option<String> {
    if matches!(value, Value::Bool(false)) {
        return None;
    }
    let selector = substitute(&binding.selector, value, unit, wrapper)?;
    let declarations = substitute(&binding.declarations, value, unit, wrapper)?;
    let declarations = declarations.trim();
    if selector.trim().is_empty() || declarations.is_empty() {
        return None;
    }
    Some(format!("{} {{ {} }}", selector.trim(), declarations))
}

fn substitute(template: &str, value: &Value, unit: &str, wrapper: &str) -> Option<String> {
    let mut missing = false;
    let out = placeholder_regex().replace_all(template, |caps: &Captures| {
        let text = match (&caps[1], caps.get(2)) {
            ("WRAPPER", _) => Some(wrapper.to_string()),
            ("UNIT", _) => Some(unit.to_string()),
            (_, Some(sub)) => value
                .get(sub.as_str())
                .and_then(|part| value_text(part, unit)),
            _ => value_text(value, unit),
        };
        text.unwrap_or_else(|| {
            missing = true;
            String::new()
        })
    });
    (!missing).then(|| out.into_owned())
}

/// CSS text for a resolved value.
fn value_text(value: &Value, unit: &str) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::String(s) => Some(css_value(s)).filter(|s| !s.is_empty()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|v| value_text(v, unit)).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(map) => {
            if map.contains_key("top") {
                dimension_shorthand(map, unit)
            } else if let Some(url) = map.get("url") {
                url.as_str()
                    .filter(|u| !u.is_empty())
                    .map(|u| css_value(&u.replace('"', "%22")))
            } else {
                map.get("desktop").and_then(|v| value_text(v, unit))
            }
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    // f64's Display already omits a trailing `.0`.
    let rounded = (n * 10_000.0).round() / 10_000.0;
    format!("{}", rounded)
}

/// `top right bottom left` with the value's unit; unset sides read as zero.
pub(crate) fn dimension_shorthand(map: &Map<String, Value>, unit: &str) -> Option<String> {
    let sides = ["top", "right", "bottom", "left"];
    if sides
        .iter()
        .all(|s| map.get(*s).map(Value::is_null).unwrap_or(true))
    {
        return None;
    }
    let unit = map
        .get("unit")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .unwrap_or(unit);
    let parts: Vec<String> = sides
        .iter()
        .map(|s| match map.get(*s).and_then(Value::as_f64) {
            Some(n) if n != 0.0 => format!("{}{}", format_number(n), unit),
            _ => "0".to_string(),
        })
        .collect();
    Some(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading_controls() -> ControlManager {
        let mut controls = ControlManager::new();
        controls
            .add_group("style", "Style")
            .unwrap()
            .register_field(
                "color",
                FieldDefinition::color("Color")
                    .default_value(json!("#333333"))
                    .selector("{{WRAPPER}} .pb-heading", "color: {{VALUE}};")
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .register_field(
                "font_size",
                FieldDefinition::responsive_number("Font Size")
                    .unit("px")
                    .selector("{{WRAPPER}} .pb-heading", "font-size: {{VALUE}}{{UNIT}};")
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .register_field(
                "padding",
                FieldDefinition::dimension("Padding")
                    .units(&["px", "em"])
                    .selector("{{WRAPPER}}", "padding: {{VALUE}};")
                    .selector("{{WRAPPER}} .inner", "padding-top: {{VALUE.top}}{{UNIT}};")
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .end_group();
        controls
    }

    #[test]
    fn duplicate_group_and_field_are_rejected() {
        let mut controls = heading_controls();
        assert!(matches!(
            controls.add_group("style", "Again"),
            Err(BuilderError::DuplicateGroup { .. })
        ));
        let err = controls
            .add_group("other", "Other")
            .unwrap()
            .register_field("color", FieldDefinition::text("Color").build().unwrap())
            .err()
            .unwrap();
        assert_eq!(
            err,
            BuilderError::DuplicateField {
                group: "other".into(),
                field: "color".into()
            }
        );
    }

    #[test]
    fn css_follows_registration_order() {
        let controls = heading_controls();
        let settings = Settings::new()
            .with("font_size", json!({"desktop": 32, "mobile": 20}))
            .with("padding", json!({"top": 10, "right": 5, "unit": "px"}));
        let css = controls.generate_css("heading-1", &settings);
        assert_eq!(
            css,
            "#heading-1 .pb-heading { color: #333333; }\n\
             #heading-1 .pb-heading { font-size: 32px; }\n\
             @media (max-width: 767px) { #heading-1 .pb-heading { font-size: 20px; } }\n\
             #heading-1 { padding: 10px 5px 0 0; }\n\
             #heading-1 .inner { padding-top: 10px; }\n"
        );
    }

    #[test]
    fn absent_values_emit_nothing() {
        let mut controls = ControlManager::new();
        controls
            .add_group("style", "Style")
            .unwrap()
            .register_field(
                "bg",
                FieldDefinition::color("Background")
                    .selector("{{WRAPPER}}", "background: {{VALUE}};")
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .register_field(
                "padding",
                FieldDefinition::dimension("Padding")
                    .selector("{{WRAPPER}}", "padding-left: {{VALUE.left}}{{UNIT}};")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let settings = Settings::new().with("padding", json!({"top": 4}));
        assert_eq!(controls.generate_css("w", &settings), "");
    }

    #[test]
    fn invalid_values_degrade_to_defaults() {
        let controls = heading_controls();
        let settings = Settings::new().with("color", json!("red;}body{x"));
        let resolved = controls.resolve(&settings);
        assert_eq!(resolved.values.text("color"), "#333333");
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(controls.validate(&settings).len(), 1);
    }

    #[test]
    fn conditional_field_is_suppressed() {
        let mut controls = ControlManager::new();
        controls
            .add_group("form", "Form")
            .unwrap()
            .register_field("enable_captcha", FieldDefinition::toggle("Captcha").build().unwrap())
            .unwrap()
            .register_field(
                "captcha_color",
                FieldDefinition::color("Captcha Color")
                    .default_value(json!("#ff0000"))
                    .condition("enable_captcha", json!(true))
                    .selector("{{WRAPPER}} .captcha", "border-color: {{VALUE}};")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let off = Settings::new().with("enable_captcha", json!(false));
        assert_eq!(controls.generate_css("form-1", &off), "");
        assert!(!controls.resolve(&off).values.contains("captcha_color"));

        let on = Settings::new().with("enable_captcha", json!(true));
        assert_eq!(
            controls.generate_css("form-1", &on),
            "#form-1 .captcha { border-color: #ff0000; }\n"
        );
    }

    #[test]
    fn nested_tab_fields_bind_selectors() {
        let color = |default: &str, selector: &str| {
            FieldDefinition::color("Text")
                .default_value(json!(default))
                .selector(selector, "color: {{VALUE}};")
                .build()
                .unwrap()
        };
        let mut controls = ControlManager::new();
        controls
            .add_group("style", "Style")
            .unwrap()
            .register_field(
                "colors",
                FieldDefinition::tab_group("Colors")
                    .tab("normal", "Normal", vec![("text", color("#111111", "{{WRAPPER}} a"))])
                    .tab("hover", "Hover", vec![("text", color("#222222", "{{WRAPPER}} a:hover"))])
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(controls.binding_count(), 2);
        assert_eq!(
            controls.generate_css("b", &Settings::new()),
            "#b a { color: #111111; }\n#b a:hover { color: #222222; }\n"
        );
    }

    #[test]
    fn schema_serializes_groups_in_order() {
        let controls = heading_controls();
        let schema = controls.fields();
        let group = &schema["style"];
        assert_eq!(group["label"], json!("Style"));
        let keys: Vec<&String> = group["fields"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["color", "font_size", "padding"]);
    }
}
