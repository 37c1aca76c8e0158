use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A widget instance's settings object, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(Map<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from a JSON value; anything but an object yields empty settings.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Settings(map),
            _ => Settings::default(),
        }
    }

    /// Chainable insert, handy when assembling settings by hand.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String value, or `""` when unset or not a string.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The `url` member of a url or image value.
    pub fn url(&self, key: &str) -> &str {
        match self.get(key) {
            Some(Value::String(s)) => s,
            Some(Value::Object(map)) => map.get("url").and_then(Value::as_str).unwrap_or(""),
            _ => "",
        }
    }

    /// A nested object (tab group value, image, url…).
    pub fn object(&self, key: &str) -> Settings {
        match self.get(key) {
            Some(Value::Object(map)) => Settings(map.clone()),
            _ => Settings::default(),
        }
    }

    /// Repeater rows; non-object rows are skipped.
    pub fn rows(&self, key: &str) -> Vec<Settings> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_object().cloned().map(Settings))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(map: Map<String, Value>) -> Self {
        Settings(map)
    }
}
