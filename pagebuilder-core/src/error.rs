use thiserror::Error;

pub type BuilderResult<T> = Result<T, BuilderError>;

/// Broad classification of a [`BuilderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed field, group or widget declaration. Fatal at registration.
    Config,
    /// A settings value violates a field constraint.
    Validation,
    /// A widget failed to produce markup or CSS.
    Render,
    /// A page document or config file could not be read.
    Input,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("Configuration error in '{context}': {reason}")]
    Config { context: String, reason: String },

    #[error("Duplicate control group '{group}'")]
    DuplicateGroup { group: String },

    #[error("Duplicate field '{field}' in group '{group}'")]
    DuplicateField { group: String, field: String },

    #[error("Unknown condition operator '{operator}' for field '{field}'")]
    UnknownOperator { field: String, operator: String },

    #[error("Widget type '{widget_type}' is already registered")]
    DuplicateWidget { widget_type: String },

    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Widget '{widget}' failed to render: {reason}")]
    Render { widget: String, reason: String },

    #[error("Unknown widget type '{widget_type}'")]
    UnknownWidget { widget_type: String },

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl BuilderError {
    pub fn config(context: impl Into<String>, reason: impl Into<String>) -> Self {
        BuilderError::Config {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BuilderError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn render(widget: impl Into<String>, reason: impl Into<String>) -> Self {
        BuilderError::Render {
            widget: widget.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BuilderError::Config { .. }
            | BuilderError::DuplicateGroup { .. }
            | BuilderError::DuplicateField { .. }
            | BuilderError::UnknownOperator { .. }
            | BuilderError::DuplicateWidget { .. } => ErrorKind::Config,
            BuilderError::Validation { .. } => ErrorKind::Validation,
            BuilderError::Render { .. } | BuilderError::UnknownWidget { .. } => ErrorKind::Render,
            BuilderError::Yaml(_) | BuilderError::Json(_) | BuilderError::Io(_) => {
                ErrorKind::Input
            }
        }
    }

    /// Prefix the field path of a validation error, e.g. `title` becomes `items[2].title`.
    pub(crate) fn within(self, prefix: &str) -> Self {
        match self {
            BuilderError::Validation { field, reason } => BuilderError::Validation {
                field: format!("{}.{}", prefix, field),
                reason,
            },
            other => other,
        }
    }
}

impl From<serde_yaml::Error> for BuilderError {
    fn from(err: serde_yaml::Error) -> Self {
        BuilderError::Yaml(err.to_string())
    }
}

impl From<serde_json::Error> for BuilderError {
    fn from(err: serde_json::Error) -> Self {
        BuilderError::Json(err.to_string())
    }
}

impl From<std::io::Error> for BuilderError {
    fn from(err: std::io::Error) -> Self {
        BuilderError::Io(err.to_string())
    }
}
