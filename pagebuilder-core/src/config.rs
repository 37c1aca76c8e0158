use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BuilderError, BuilderResult};

/// Widest breakpoint accepted by [`PageBuilderConfig::validate`].
pub const MAX_BREAKPOINT: u32 = 100_000;

/// Max-width breakpoints, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    pub tablet: u32,
    pub mobile: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            tablet: 1024,
            mobile: 767,
        }
    }
}

impl Breakpoints {
    /// Media query for a breakpoint key (`tablet` / `mobile`); `None` for desktop.
    pub fn media_query(&self, breakpoint: &str) -> Option<String> {
        match breakpoint {
            "tablet" => Some(format!("@media (max-width: {}px)", self.tablet)),
            "mobile" => Some(format!("@media (max-width: {}px)", self.mobile)),
            _ => None,
        }
    }
}

/// Render configuration shared by the registry and every page's CSS collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageBuilderConfig {
    /// Minify the consolidated stylesheet.
    pub minify: bool,
    /// `id` attribute of the emitted `<style>` element.
    pub style_element_id: String,
    /// Emit the shared structural styles ahead of widget rules.
    pub include_base_styles: bool,
    pub breakpoints: Breakpoints,
}

impl Default for PageBuilderConfig {
    fn default() -> Self {
        Self {
            minify: true,
            style_element_id: "pagebuilder-widget-styles".to_string(),
            include_base_styles: true,
            breakpoints: Breakpoints::default(),
        }
    }
}

impl PageBuilderConfig {
    pub fn from_yaml_str(yaml: &str) -> BuilderResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PageBuilderConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> BuilderResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> BuilderResult<()> {
        let bp = &self.breakpoints;
        if bp.mobile == 0 || bp.tablet == 0 {
            return Err(BuilderError::config("breakpoints", "breakpoints must be positive"));
        }
        if bp.tablet > MAX_BREAKPOINT {
            return Err(BuilderError::config(
                "breakpoints",
                format!("breakpoints must not exceed {}px", MAX_BREAKPOINT),
            ));
        }
        if bp.mobile >= bp.tablet {
            return Err(BuilderError::config(
                "breakpoints",
                format!(
                    "mobile breakpoint ({}px) must be narrower than tablet ({}px)",
                    bp.mobile, bp.tablet
                ),
            ));
        }
        let id = &self.style_element_id;
        let valid_id = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid_id {
            return Err(BuilderError::config(
                "styleElementId",
                format!("'{}' is not a valid element id", id),
            ));
        }
        Ok(())
    }
}
