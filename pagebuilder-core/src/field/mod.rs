//! Typed, conditionally-visible configuration fields.
//!
//! A [`FieldDefinition`] is immutable once built. Construct one through the
//! per-type constructors, which return a [`FieldBuilder`] value:
//!
//! ```ignore
//! use pagebuilder_core::field::FieldDefinition;
//! use serde_json::json;
//!
//! let color = FieldDefinition::color("Text Color")
//!     .default_value(json!("#333333"))
//!     .selector("{{WRAPPER}} .pb-heading", "color: {{VALUE}};")
//!     .build()?;
//! ```

pub mod condition;
mod validate;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{BuilderError, BuilderResult};

pub use condition::{Condition, Conditions, Operator};

/// Accepted notation for color values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    /// Any CSS color literal (hex, rgb/rgba, hsl/hsla, named, `var(--x)`).
    Any,
    /// `#rgb`, `#rrggbb` or `#rrggbbaa` only.
    Hex,
}

impl ColorFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ColorFormat::Any => "any",
            ColorFormat::Hex => "hex",
        }
    }
}

/// One tab (or breakpoint) of a container field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTab {
    pub label: String,
    pub fields: IndexMap<String, FieldDefinition>,
}

/// Breakpoint keys accepted by responsive values.
pub const BREAKPOINT_KEYS: &[&str] = &["desktop", "tablet", "mobile"];

/// The closed set of field types together with their type-specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text {
        max_length: Option<usize>,
    },
    Textarea {
        rows: u32,
        max_length: Option<usize>,
    },
    Wysiwyg,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
        unit: Option<String>,
    },
    Color {
        format: ColorFormat,
        alpha: bool,
    },
    Select {
        options: IndexMap<String, String>,
        multiple: bool,
    },
    Toggle,
    Url {
        validate_url: bool,
    },
    Image,
    Dimension {
        units: Vec<String>,
    },
    ResponsiveNumber {
        min: Option<f64>,
        max: Option<f64>,
        unit: Option<String>,
    },
    Repeater {
        fields: IndexMap<String, FieldDefinition>,
        min: Option<usize>,
        max: Option<usize>,
        title_field: Option<String>,
    },
    TabGroup {
        tabs: IndexMap<String, FieldTab>,
    },
    ResponsiveGroup {
        breakpoints: IndexMap<String, FieldTab>,
    },
}

impl FieldKind {
    /// Wire name of the type.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Wysiwyg => "wysiwyg",
            FieldKind::Number { .. } => "number",
            FieldKind::Color { .. } => "color",
            FieldKind::Select { .. } => "select",
            FieldKind::Toggle => "toggle",
            FieldKind::Url { .. } => "url",
            FieldKind::Image => "image",
            FieldKind::Dimension { .. } => "dimension",
            FieldKind::ResponsiveNumber { .. } => "responsive-number",
            FieldKind::Repeater { .. } => "repeater",
            FieldKind::TabGroup { .. } => "tab-group",
            FieldKind::ResponsiveGroup { .. } => "responsive-group",
        }
    }

    /// Containers hold nested field sets instead of a scalar value.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            FieldKind::Repeater { .. } | FieldKind::TabGroup { .. } | FieldKind::ResponsiveGroup { .. }
        )
    }

    /// Tabs of a tab or responsive group.
    pub fn tabs(&self) -> Option<&IndexMap<String, FieldTab>> {
        match self {
            FieldKind::TabGroup { tabs } => Some(tabs),
            FieldKind::ResponsiveGroup { breakpoints } => Some(breakpoints),
            _ => None,
        }
    }

    /// Unit used for `{{UNIT}}` when the value does not carry its own.
    pub fn default_unit(&self) -> Option<&str> {
        match self {
            FieldKind::Number { unit, .. } | FieldKind::ResponsiveNumber { unit, .. } => {
                unit.as_deref()
            }
            FieldKind::Dimension { units } => units.first().map(String::as_str),
            _ => None,
        }
    }

    fn type_specific_config(&self, out: &mut Map<String, Value>) {
        match self {
            FieldKind::Text { max_length } => {
                insert_opt(out, "maxLength", max_length.map(Value::from));
            }
            FieldKind::Textarea { rows, max_length } => {
                out.insert("rows".into(), json!(rows));
                insert_opt(out, "maxLength", max_length.map(Value::from));
            }
            FieldKind::Wysiwyg | FieldKind::Toggle | FieldKind::Image => {}
            FieldKind::Number {
                min,
                max,
                step,
                unit,
            } => {
                insert_opt(out, "min", min.map(Value::from));
                insert_opt(out, "max", max.map(Value::from));
                insert_opt(out, "step", step.map(Value::from));
                insert_opt(out, "unit", unit.clone().map(Value::from));
            }
            FieldKind::Color { format, alpha } => {
                out.insert("format".into(), json!(format.as_str()));
                out.insert("alpha".into(), json!(alpha));
            }
            FieldKind::Select { options, multiple } => {
                let options: Map<String, Value> = options
                    .iter()
                    .map(|(value, label)| (value.clone(), Value::from(label.clone())))
                    .collect();
                out.insert("options".into(), Value::Object(options));
                out.insert("multiple".into(), json!(multiple));
            }
            FieldKind::Url { validate_url } => {
                out.insert("validateUrl".into(), json!(validate_url));
            }
            FieldKind::Dimension { units } => {
                out.insert("units".into(), json!(units));
            }
            FieldKind::ResponsiveNumber { min, max, unit } => {
                insert_opt(out, "min", min.map(Value::from));
                insert_opt(out, "max", max.map(Value::from));
                insert_opt(out, "unit", unit.clone().map(Value::from));
                out.insert("breakpoints".into(), json!(BREAKPOINT_KEYS));
            }
            FieldKind::Repeater {
                fields,
                min,
                max,
                title_field,
            } => {
                out.insert("fields".into(), field_set_config(fields));
                insert_opt(out, "min", min.map(Value::from));
                insert_opt(out, "max", max.map(Value::from));
                insert_opt(out, "titleField", title_field.clone().map(Value::from));
            }
            FieldKind::TabGroup { tabs } => {
                out.insert("tabs".into(), tabs_config(tabs));
            }
            FieldKind::ResponsiveGroup { breakpoints } => {
                out.insert("breakpoints".into(), tabs_config(breakpoints));
            }
        }
    }
}

fn insert_opt(out: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        out.insert(key.to_string(), value);
    }
}

pub(crate) fn field_set_config(fields: &IndexMap<String, FieldDefinition>) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(key, field)| (key.clone(), field.to_config()))
        .collect();
    Value::Object(map)
}

fn tabs_config(tabs: &IndexMap<String, FieldTab>) -> Value {
    let map: Map<String, Value> = tabs
        .iter()
        .map(|(key, tab)| {
            (
                key.clone(),
                json!({ "label": tab.label, "fields": field_set_config(&tab.fields) }),
            )
        })
        .collect();
    Value::Object(map)
}

/// An immutable field descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub kind: FieldKind,
    pub label: String,
    pub default: Value,
    pub required: bool,
    pub placeholder: Option<String>,
    pub description: Option<String>,
    pub condition: Conditions,
    /// Selector template → declaration template, in registration order.
    pub selectors: IndexMap<String, String>,
}

impl FieldDefinition {
    pub fn text(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Text { max_length: None }, label)
    }

    pub fn textarea(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::Textarea {
                rows: 5,
                max_length: None,
            },
            label,
        )
    }

    pub fn wysiwyg(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Wysiwyg, label)
    }

    pub fn number(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::Number {
                min: None,
                max: None,
                step: None,
                unit: None,
            },
            label,
        )
    }

    pub fn color(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::Color {
                format: ColorFormat::Any,
                alpha: true,
            },
            label,
        )
    }

    pub fn select(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::Select {
                options: IndexMap::new(),
                multiple: false,
            },
            label,
        )
    }

    pub fn toggle(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Toggle, label).default_value(Value::Bool(false))
    }

    pub fn url(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Url { validate_url: false }, label)
    }

    pub fn image(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Image, label)
    }

    pub fn dimension(label: &str) -> FieldBuilder {
        FieldBuilder::new(FieldKind::Dimension { units: Vec::new() }, label)
    }

    pub fn responsive_number(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::ResponsiveNumber {
                min: None,
                max: None,
                unit: None,
            },
            label,
        )
    }

    pub fn repeater(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::Repeater {
                fields: IndexMap::new(),
                min: None,
                max: None,
                title_field: None,
            },
            label,
        )
    }

    pub fn tab_group(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::TabGroup {
                tabs: IndexMap::new(),
            },
            label,
        )
    }

    pub fn responsive_group(label: &str) -> FieldBuilder {
        FieldBuilder::new(
            FieldKind::ResponsiveGroup {
                breakpoints: IndexMap::new(),
            },
            label,
        )
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Serialize to the plain configuration object consumed by the settings form.
    pub fn to_config(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), json!(self.type_name()));
        out.insert("label".into(), json!(self.label));
        out.insert("default".into(), self.default.clone());
        out.insert("required".into(), json!(self.required));
        out.insert(
            "placeholder".into(),
            self.placeholder.clone().map(Value::from).unwrap_or(Value::Null),
        );
        out.insert(
            "condition".into(),
            if self.condition.is_empty() {
                Value::Null
            } else {
                self.condition.to_value()
            },
        );
        insert_opt(&mut out, "description", self.description.clone().map(Value::from));
        self.kind.type_specific_config(&mut out);
        if !self.selectors.is_empty() {
            let selectors: Map<String, Value> = self
                .selectors
                .iter()
                .map(|(s, d)| (s.clone(), Value::from(d.clone())))
                .collect();
            out.insert("selectors".into(), Value::Object(selectors));
        }
        Value::Object(out)
    }

    /// Whether the field is active given its siblings' values.
    pub fn is_active(&self, siblings: &Map<String, Value>) -> bool {
        self.condition.evaluate(siblings)
    }

    /// Shape `raw` into this field's value, applying the default when absent.
    pub fn build(&self, raw: Option<&Value>) -> BuilderResult<Value> {
        self.build_as(&self.label, raw)
    }

    /// Like [`build`](Self::build) but reports errors under `name`.
    pub(crate) fn build_as(&self, name: &str, raw: Option<&Value>) -> BuilderResult<Value> {
        let supplied = raw.filter(|v| !v.is_null());
        let value = match supplied {
            Some(v) => v.clone(),
            None if !self.default.is_null() => self.default.clone(),
            None => match &self.kind {
                // Containers still resolve their nested defaults.
                FieldKind::TabGroup { .. } | FieldKind::ResponsiveGroup { .. } => {
                    Value::Object(Map::new())
                }
                FieldKind::Repeater { .. } => Value::Array(Vec::new()),
                _ => {
                    if self.required {
                        return Err(BuilderError::validation(name, "a value is required"));
                    }
                    return Ok(Value::Null);
                }
            },
        };

        let normalized = validate::normalize(&self.kind, name, &value)?;
        if self.required && is_blank(&normalized) {
            return Err(BuilderError::validation(name, "a value is required"));
        }
        Ok(normalized)
    }

    /// Value used when a supplied value is rejected during lenient resolution.
    pub(crate) fn fallback(&self, name: &str) -> Value {
        self.build_as(name, None).unwrap_or(Value::Null)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map
            .get("url")
            .map(|url| url.as_str().map(str::is_empty).unwrap_or(true))
            .unwrap_or(false),
        _ => false,
    }
}

/// Outcome of resolving a set of sibling fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FieldSetOutcome {
    pub values: Map<String, Value>,
    pub issues: Vec<BuilderError>,
}

/// Resolve sibling fields against `raw`.
///
/// Conditions are evaluated against the normalized sibling values, with defaults
/// standing in for missing or rejected ones; inactive fields are left out of the
/// result. In strict mode the first validation failure of an active field is
/// returned; otherwise failures are collected and the field falls back to its
/// default.
pub(crate) fn resolve_field_set<'a, I>(
    fields: I,
    raw: &Map<String, Value>,
    strict: bool,
) -> BuilderResult<FieldSetOutcome>
where
    I: IntoIterator<Item = (&'a str, &'a FieldDefinition)>,
{
    let fields: Vec<(&str, &FieldDefinition)> = fields.into_iter().collect();
    let built: Vec<BuilderResult<Value>> = fields
        .iter()
        .map(|(key, field)| field.build_as(key, raw.get(*key)))
        .collect();

    let mut provisional = raw.clone();
    for ((key, field), result) in fields.iter().zip(&built) {
        let value = match result {
            Ok(value) => value.clone(),
            Err(_) => field.fallback(key),
        };
        if value.is_null() {
            provisional.remove(*key);
        } else {
            provisional.insert(key.to_string(), value);
        }
    }

    let mut outcome = FieldSetOutcome::default();
    for ((key, field), result) in fields.iter().zip(built) {
        if !field.is_active(&provisional) {
            continue;
        }
        match result {
            Ok(Value::Null) => {}
            Ok(value) => {
                outcome.values.insert(key.to_string(), value);
            }
            Err(err) if strict => return Err(err),
            Err(err) => {
                log::warn!("Setting '{}' rejected, using default: {}", key, err);
                outcome.issues.push(err);
                let fallback = field.fallback(key);
                if !fallback.is_null() {
                    outcome.values.insert(key.to_string(), fallback);
                }
            }
        }
    }
    Ok(outcome)
}

/// Fluent construction of a [`FieldDefinition`].
///
/// Setters consume and return the builder; errors from setters that do not apply
/// to the field's type are reported by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: FieldDefinition,
    errors: Vec<String>,
}

impl FieldBuilder {
    fn new(kind: FieldKind, label: &str) -> Self {
        Self {
            field: FieldDefinition {
                kind,
                label: label.to_string(),
                default: Value::Null,
                required: false,
                placeholder: None,
                description: None,
                condition: Conditions::new(),
                selectors: IndexMap::new(),
            },
            errors: Vec::new(),
        }
    }

    fn unsupported(mut self, setting: &str) -> Self {
        self.errors.push(format!(
            "'{}' is not supported by {} fields",
            setting,
            self.field.type_name()
        ));
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.field.default = value;
        self
    }

    pub fn required(mut self) -> Self {
        self.field.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.field.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.field.description = Some(description.to_string());
        self
    }

    /// Show the field only when `field` equals `value`.
    pub fn condition(mut self, field: &str, value: Value) -> Self {
        self.field.condition.insert(field, Condition::Equals(value));
        self
    }

    /// Show the field only when `field` is one of `values`.
    pub fn condition_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.field.condition.insert(field, Condition::OneOf(values));
        self
    }

    /// Show the field only when `field <operator> value` holds.
    pub fn condition_op(mut self, field: &str, operator: &str, value: Value) -> Self {
        match Operator::parse(operator) {
            Some(op) => self.field.condition.insert(field, Condition::Compare(op, value)),
            None => self.errors.push(format!(
                "unknown condition operator '{}' for field '{}'",
                operator, field
            )),
        }
        self
    }

    /// Bind the field's value to a CSS declaration at `selector`.
    pub fn selector(mut self, selector: &str, declarations: &str) -> Self {
        self.field
            .selectors
            .insert(selector.to_string(), declarations.to_string());
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        match &mut self.field.kind {
            FieldKind::Number { min, .. } | FieldKind::ResponsiveNumber { min, .. } => {
                *min = Some(value)
            }
            FieldKind::Repeater { min, .. } => *min = Some(value as usize),
            _ => return self.unsupported("min"),
        }
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        match &mut self.field.kind {
            FieldKind::Number { max, .. } | FieldKind::ResponsiveNumber { max, .. } => {
                *max = Some(value)
            }
            FieldKind::Repeater { max, .. } => *max = Some(value as usize),
            _ => return self.unsupported("max"),
        }
        self
    }

    pub fn step(mut self, value: f64) -> Self {
        match &mut self.field.kind {
            FieldKind::Number { step, .. } => *step = Some(value),
            _ => return self.unsupported("step"),
        }
        self
    }

    pub fn unit(mut self, value: &str) -> Self {
        match &mut self.field.kind {
            FieldKind::Number { unit, .. } | FieldKind::ResponsiveNumber { unit, .. } => {
                *unit = Some(value.to_string())
            }
            _ => return self.unsupported("unit"),
        }
        self
    }

    pub fn units(mut self, values: &[&str]) -> Self {
        match &mut self.field.kind {
            FieldKind::Dimension { units } => {
                *units = values.iter().map(|u| u.to_string()).collect()
            }
            _ => return self.unsupported("units"),
        }
        self
    }

    pub fn rows(mut self, value: u32) -> Self {
        match &mut self.field.kind {
            FieldKind::Textarea { rows, .. } => *rows = value,
            _ => return self.unsupported("rows"),
        }
        self
    }

    pub fn max_length(mut self, value: usize) -> Self {
        match &mut self.field.kind {
            FieldKind::Text { max_length } | FieldKind::Textarea { max_length, .. } => {
                *max_length = Some(value)
            }
            _ => return self.unsupported("maxLength"),
        }
        self
    }

    pub fn format(mut self, value: ColorFormat) -> Self {
        match &mut self.field.kind {
            FieldKind::Color { format, .. } => *format = value,
            _ => return self.unsupported("format"),
        }
        self
    }

    pub fn alpha(mut self, value: bool) -> Self {
        match &mut self.field.kind {
            FieldKind::Color { alpha, .. } => *alpha = value,
            _ => return self.unsupported("alpha"),
        }
        self
    }

    /// Add one `value → label` option.
    pub fn option(mut self, value: &str, label: &str) -> Self {
        match &mut self.field.kind {
            FieldKind::Select { options, .. } => {
                options.insert(value.to_string(), label.to_string());
            }
            _ => return self.unsupported("options"),
        }
        self
    }

    pub fn options(self, pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .fold(self, |builder, (value, label)| builder.option(value, label))
    }

    pub fn multiple(mut self) -> Self {
        match &mut self.field.kind {
            FieldKind::Select { multiple, .. } => *multiple = true,
            _ => return self.unsupported("multiple"),
        }
        self
    }

    pub fn validate_url(mut self) -> Self {
        match &mut self.field.kind {
            FieldKind::Url { validate_url } => *validate_url = true,
            _ => return self.unsupported("validateUrl"),
        }
        self
    }

    /// Add a nested field to a repeater row.
    pub fn field(mut self, key: &str, definition: FieldDefinition) -> Self {
        let duplicate = match &mut self.field.kind {
            FieldKind::Repeater { fields, .. } => {
                fields.insert(key.to_string(), definition).is_some()
            }
            _ => return self.unsupported("fields"),
        };
        if duplicate {
            self.errors.push(format!("duplicate nested field '{}'", key));
        }
        self
    }

    pub fn title_field(mut self, key: &str) -> Self {
        match &mut self.field.kind {
            FieldKind::Repeater { title_field, .. } => *title_field = Some(key.to_string()),
            _ => return self.unsupported("titleField"),
        }
        self
    }

    /// Add a tab (or breakpoint) with its nested fields.
    pub fn tab(mut self, key: &str, label: &str, fields: Vec<(&str, FieldDefinition)>) -> Self {
        let mut nested = IndexMap::new();
        for (field_key, definition) in fields {
            if nested.insert(field_key.to_string(), definition).is_some() {
                self.errors
                    .push(format!("duplicate field '{}' in tab '{}'", field_key, key));
            }
        }
        let tab = FieldTab {
            label: label.to_string(),
            fields: nested,
        };
        let duplicate = match &mut self.field.kind {
            FieldKind::TabGroup { tabs } => tabs.insert(key.to_string(), tab).is_some(),
            FieldKind::ResponsiveGroup { breakpoints } => {
                if !BREAKPOINT_KEYS.contains(&key) {
                    self.errors.push(format!("unknown breakpoint '{}'", key));
                }
                breakpoints.insert(key.to_string(), tab).is_some()
            }
            _ => return self.unsupported("tabs"),
        };
        if duplicate {
            self.errors.push(format!("duplicate tab '{}'", key));
        }
        self
    }

    /// Finish the definition, checking it for consistency.
    pub fn build(self) -> BuilderResult<FieldDefinition> {
        let FieldBuilder { mut field, errors } = self;
        let context = field.label.clone();
        if let Some(reason) = errors.into_iter().next() {
            return Err(BuilderError::config(context, reason));
        }

        match &mut field.kind {
            FieldKind::Number { min, max, .. } | FieldKind::ResponsiveNumber { min, max, .. } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(BuilderError::config(context, "min is greater than max"));
                    }
                }
            }
            FieldKind::Repeater {
                fields,
                min,
                max,
                title_field,
            } => {
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(BuilderError::config(context, "min rows exceed max rows"));
                    }
                }
                if fields.is_empty() {
                    return Err(BuilderError::config(context, "repeater has no fields"));
                }
                if let Some(title) = title_field {
                    if !fields.contains_key(title.as_str()) {
                        return Err(BuilderError::config(
                            context,
                            format!("title field '{}' is not a repeater field", title),
                        ));
                    }
                }
                if fields.values().any(|f| !f.selectors.is_empty()) {
                    return Err(BuilderError::config(
                        context,
                        "repeater fields cannot bind selectors",
                    ));
                }
            }
            FieldKind::Select { options, .. } => {
                if options.is_empty() {
                    return Err(BuilderError::config(context, "select has no options"));
                }
            }
            FieldKind::Dimension { units } => {
                if units.is_empty() {
                    units.push("px".to_string());
                }
            }
            FieldKind::TabGroup { tabs } | FieldKind::ResponsiveGroup { breakpoints: tabs } => {
                if tabs.is_empty() {
                    return Err(BuilderError::config(context, "container has no tabs"));
                }
            }
            _ => {}
        }

        if field.kind.is_container() && !field.selectors.is_empty() {
            return Err(BuilderError::config(
                context,
                "container fields cannot bind selectors; bind their nested fields instead",
            ));
        }

        if !field.default.is_null() {
            validate::normalize(&field.kind, &context, &field.default).map_err(|err| {
                BuilderError::config(context.clone(), format!("invalid default: {}", err))
            })?;
        }

        Ok(field)
    }
}
