use regex::Regex;
use serde_json::{json, Map, Number, Value};
use std::sync::OnceLock;

use super::{resolve_field_set, ColorFormat, FieldKind, FieldTab, BREAKPOINT_KEYS};
use crate::error::{BuilderError, BuilderResult};
use crate::escape::is_safe_url;
use indexmap::IndexMap;

const SIDES: &[&str] = &["top", "right", "bottom", "left"];

/// Check `value` against the kind's constraints and return its normalized form.
pub(super) fn normalize(kind: &FieldKind, name: &str, value: &Value) -> BuilderResult<Value> {
    match kind {
        FieldKind::Text { max_length } | FieldKind::Textarea { max_length, .. } => {
            let text = expect_string(name, value)?;
            if let Some(max) = max_length {
                let len = text.chars().count();
                if len > *max {
                    return Err(BuilderError::validation(
                        name,
                        format!("text is {} characters long, maximum is {}", len, max),
                    ));
                }
            }
            Ok(Value::String(text))
        }
        FieldKind::Wysiwyg => expect_string(name, value).map(Value::String),
        FieldKind::Number { min, max, .. } => {
            let number = expect_number(name, value)?;
            check_range(name, number, *min, *max)?;
            to_number(name, number)
        }
        FieldKind::Color { format, .. } => {
            let color = expect_string(name, value)?;
            validate_color(name, &color, *format)?;
            Ok(Value::String(color))
        }
        FieldKind::Select { options, multiple } => normalize_select(name, value, options, *multiple),
        FieldKind::Toggle => parse_flag(value)
            .map(Value::Bool)
            .ok_or_else(|| BuilderError::validation(name, "expected a boolean")),
        FieldKind::Url { validate_url } => normalize_url(name, value, *validate_url),
        FieldKind::Image => normalize_image(name, value),
        FieldKind::Dimension { units } => normalize_dimension(name, value, units),
        FieldKind::ResponsiveNumber { min, max, unit } => {
            normalize_responsive(name, value, *min, *max, unit.as_deref())
        }
        FieldKind::Repeater {
            fields, min, max, ..
        } => {
            let rows = value
                .as_array()
                .ok_or_else(|| BuilderError::validation(name, "expected a list of rows"))?;
            if let Some(min) = min {
                if rows.len() < *min {
                    return Err(BuilderError::validation(
                        name,
                        format!("expected at least {} rows, got {}", min, rows.len()),
                    ));
                }
            }
            if let Some(max) = max {
                if rows.len() > *max {
                    return Err(BuilderError::validation(
                        name,
                        format!("expected at most {} rows, got {}", max, rows.len()),
                    ));
                }
            }
            let mut normalized = Vec::with_capacity(rows.len());
            for (index, row) in rows.iter().enumerate() {
                let row_name = format!("{}[{}]", name, index);
                let row = row
                    .as_object()
                    .ok_or_else(|| BuilderError::validation(&row_name, "row must be an object"))?;
                let outcome =
                    resolve_field_set(fields.iter().map(|(k, f)| (k.as_str(), f)), row, true)
                        .map_err(|err| err.within(&row_name))?;
                normalized.push(Value::Object(outcome.values));
            }
            Ok(Value::Array(normalized))
        }
        FieldKind::TabGroup { tabs } | FieldKind::ResponsiveGroup { breakpoints: tabs } => {
            normalize_tabs(name, value, tabs)
        }
    }
}

fn expect_string(name: &str, value: &Value) -> BuilderResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(BuilderError::validation(name, "expected a string")),
    }
}

fn expect_number(name: &str, value: &Value) -> BuilderResult<f64> {
    parse_number(value).ok_or_else(|| BuilderError::validation(name, "expected a number"))
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn to_number(name: &str, number: f64) -> BuilderResult<Value> {
    Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| BuilderError::validation(name, "number is not finite"))
}

fn check_range(name: &str, number: f64, min: Option<f64>, max: Option<f64>) -> BuilderResult<()> {
    let below = min.map(|lo| number < lo).unwrap_or(false);
    let above = max.map(|hi| number > hi).unwrap_or(false);
    if below || above {
        let bound = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_else(|| "∞".to_string());
        return Err(BuilderError::validation(
            name,
            format!(
                "{} is outside the allowed range {} to {}",
                number,
                bound(min),
                bound(max)
            ),
        ));
    }
    Ok(())
}

pub(super) fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" | "1" => Some(true),
            "no" | "false" | "off" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn validate_color(name: &str, color: &str, format: ColorFormat) -> BuilderResult<()> {
    static HEX_COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    static FUNC_COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let hex = HEX_COLOR_REGEX.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
    });
    let func = FUNC_COLOR_REGEX.get_or_init(|| {
        Regex::new(r"^(?:(?:rgba?|hsla?)\([0-9.,%\s/]+\)|var\(--[a-zA-Z0-9_-]+\)|[a-zA-Z]+)$")
            .unwrap()
    });

    let color = color.trim();
    let valid = match format {
        ColorFormat::Hex => hex.is_match(color),
        ColorFormat::Any => hex.is_match(color) || func.is_match(color),
    };
    if valid {
        Ok(())
    } else {
        Err(BuilderError::validation(
            name,
            format!("'{}' is not a valid color", color),
        ))
    }
}

fn normalize_select(
    name: &str,
    value: &Value,
    options: &IndexMap<String, String>,
    multiple: bool,
) -> BuilderResult<Value> {
    let check = |item: &Value| -> BuilderResult<String> {
        let key = match item {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(BuilderError::validation(name, "expected an option value")),
        };
        if options.contains_key(&key) {
            Ok(key)
        } else {
            let allowed: Vec<&str> = options.keys().map(String::as_str).collect();
            Err(BuilderError::validation(
                name,
                format!("'{}' is not one of: {}", key, allowed.join(", ")),
            ))
        }
    };

    match (value, multiple) {
        (Value::Array(items), true) => items
            .iter()
            .map(|item| check(item).map(Value::String))
            .collect::<BuilderResult<Vec<_>>>()
            .map(Value::Array),
        (single, true) => Ok(Value::Array(vec![Value::String(check(single)?)])),
        (Value::Array(_), false) => Err(BuilderError::validation(
            name,
            "expected a single option value",
        )),
        (single, false) => check(single).map(Value::String),
    }
}

fn check_url_format(name: &str, url: &str) -> BuilderResult<()> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = URL_REGEX.get_or_init(|| {
        Regex::new(r"^(?:https?://[^\s/$.?#][^\s]*|mailto:[^\s@]+@[^\s@]+|tel:[+0-9 ()-]+|/[^\s]*|#[^\s]*)$")
            .unwrap()
    });
    if url.is_empty() || re.is_match(url) {
        Ok(())
    } else {
        Err(BuilderError::validation(
            name,
            format!("'{}' is not a valid URL", url),
        ))
    }
}

fn normalize_url(name: &str, value: &Value, validate_url: bool) -> BuilderResult<Value> {
    let (url, is_external, nofollow) = match value {
        Value::String(s) => (s.trim().to_string(), false, false),
        Value::Object(map) => {
            let url = match map.get("url") {
                Some(Value::String(s)) => s.trim().to_string(),
                None | Some(Value::Null) => String::new(),
                Some(_) => return Err(BuilderError::validation(name, "url must be a string")),
            };
            let flag = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| map.get(*k))
                    .and_then(parse_flag)
                    .unwrap_or(false)
            };
            (url, flag(&["isExternal", "is_external"]), flag(&["nofollow"]))
        }
        _ => return Err(BuilderError::validation(name, "expected a URL")),
    };

    if !is_safe_url(&url) {
        return Err(BuilderError::validation(name, "URL scheme is not allowed"));
    }
    if validate_url {
        check_url_format(name, &url)?;
    }
    Ok(json!({ "url": url, "isExternal": is_external, "nofollow": nofollow }))
}

fn normalize_image(name: &str, value: &Value) -> BuilderResult<Value> {
    let (url, alt) = match value {
        Value::String(s) => (s.trim().to_string(), String::new()),
        Value::Object(map) => {
            let url = map
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            let alt = map
                .get("alt")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (url, alt)
        }
        _ => return Err(BuilderError::validation(name, "expected an image")),
    };
    if !is_safe_url(&url) {
        return Err(BuilderError::validation(name, "image URL scheme is not allowed"));
    }
    Ok(json!({ "url": url, "alt": alt }))
}

fn side_value(name: &str, side: &str, value: Option<&Value>) -> BuilderResult<Value> {
    match value {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Value::Null),
        Some(v) => {
            let number = parse_number(v).ok_or_else(|| {
                BuilderError::validation(name, format!("{} must be a number", side))
            })?;
            to_number(name, number)
        }
    }
}

fn check_unit(name: &str, unit: &str, units: &[String]) -> BuilderResult<()> {
    if units.is_empty() || units.iter().any(|u| u == unit) {
        Ok(())
    } else {
        Err(BuilderError::validation(
            name,
            format!("unit '{}' is not one of: {}", unit, units.join(", ")),
        ))
    }
}

fn normalize_dimension(name: &str, value: &Value, units: &[String]) -> BuilderResult<Value> {
    let default_unit = units.first().cloned().unwrap_or_else(|| "px".to_string());
    let mut out = Map::new();
    match value {
        Value::Number(_) | Value::String(_) => {
            let side = side_value(name, "value", Some(value))?;
            if side.is_null() {
                return Ok(Value::Null);
            }
            for s in SIDES {
                out.insert(s.to_string(), side.clone());
            }
            out.insert("unit".into(), Value::String(default_unit));
        }
        Value::Object(map) => {
            if let Some(key) = map
                .keys()
                .find(|k| !SIDES.contains(&k.as_str()) && *k != "unit" && *k != "linked")
            {
                return Err(BuilderError::validation(
                    name,
                    format!("unknown dimension key '{}'", key),
                ));
            }
            for s in SIDES {
                out.insert(s.to_string(), side_value(name, s, map.get(*s))?);
            }
            if SIDES.iter().all(|s| out[*s].is_null()) {
                return Ok(Value::Null);
            }
            let unit = match map.get("unit") {
                Some(Value::String(u)) if !u.is_empty() => u.clone(),
                _ => default_unit,
            };
            check_unit(name, &unit, units)?;
            out.insert("unit".into(), Value::String(unit));
        }
        _ => return Err(BuilderError::validation(name, "expected a dimension")),
    }
    Ok(Value::Object(out))
}

fn normalize_responsive(
    name: &str,
    value: &Value,
    min: Option<f64>,
    max: Option<f64>,
    unit: Option<&str>,
) -> BuilderResult<Value> {
    let mut out = Map::new();
    let put = |out: &mut Map<String, Value>, key: &str, raw: Option<&Value>| -> BuilderResult<()> {
        let v = side_value(name, key, raw)?;
        if let Some(number) = v.as_f64() {
            check_range(&format!("{}.{}", name, key), number, min, max)?;
            out.insert(key.to_string(), v);
        }
        Ok(())
    };

    let mut value_unit = unit.map(str::to_string);
    match value {
        Value::Number(_) | Value::String(_) => put(&mut out, "desktop", Some(value))?,
        Value::Object(map) => {
            if let Some(key) = map
                .keys()
                .find(|k| !BREAKPOINT_KEYS.contains(&k.as_str()) && *k != "unit")
            {
                return Err(BuilderError::validation(
                    name,
                    format!("unknown breakpoint '{}'", key),
                ));
            }
            for key in BREAKPOINT_KEYS {
                put(&mut out, key, map.get(*key))?;
            }
            if let Some(Value::String(u)) = map.get("unit") {
                if !u.is_empty() {
                    value_unit = Some(u.clone());
                }
            }
        }
        _ => return Err(BuilderError::validation(name, "expected a number per breakpoint")),
    }

    if out.is_empty() {
        return Ok(Value::Null);
    }
    if let Some(u) = value_unit {
        out.insert("unit".into(), Value::String(u));
    }
    Ok(Value::Object(out))
}

fn normalize_tabs(
    name: &str,
    value: &Value,
    tabs: &IndexMap<String, FieldTab>,
) -> BuilderResult<Value> {
    let map = value
        .as_object()
        .ok_or_else(|| BuilderError::validation(name, "expected an object keyed by tab"))?;
    if let Some(unknown) = map.keys().find(|k| !tabs.contains_key(k.as_str())) {
        return Err(BuilderError::validation(
            name,
            format!("unknown tab '{}'", unknown),
        ));
    }

    let empty = Map::new();
    let mut out = Map::new();
    for (tab_key, tab) in tabs {
        let tab_name = format!("{}.{}", name, tab_key);
        let raw = match map.get(tab_key.as_str()) {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(m)) => m,
            Some(_) => {
                return Err(BuilderError::validation(
                    &tab_name,
                    "tab value must be an object",
                ))
            }
        };
        let outcome = resolve_field_set(tab.fields.iter().map(|(k, f)| (k.as_str(), f)), raw, true)
            .map_err(|err| err.within(&tab_name))?;
        out.insert(tab_key.clone(), Value::Object(outcome.values));
    }
    Ok(Value::Object(out))
}
