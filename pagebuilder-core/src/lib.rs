//! # Page Builder Core
//!
//! Server-side core of a visual page builder: typed widget fields, control
//! groups that compile settings into CSS, a registry of widget types and a
//! per-render collector that consolidates every widget's CSS into one stylesheet.
//!
//! ## Example
//! ```ignore
//! use pagebuilder_core::{render_page, PageBuilderConfig, PageDocument, WidgetRegistry};
//!
//! let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default())?;
//! let page = PageDocument::from_yaml_str(r#"
//! title: Home
//! widgets:
//!   - id: heading-1
//!     type: heading
//!     settings:
//!       title: Hello
//!       title_color: "#1a1a1a"
//! "#)?;
//!
//! let rendered = render_page(&registry, &page);
//! println!("{}", rendered.to_html_document());
//! ```

pub mod config;
pub mod control;
pub mod css;
pub mod error;
pub mod escape;
pub mod field;
pub mod page;
pub mod registry;
pub mod settings;
pub mod widget;
pub mod widgets;

// --- Core types ---
pub use config::{Breakpoints, PageBuilderConfig};
pub use control::{ControlManager, FieldGroup, GroupBuilder, ResolvedSettings};
pub use css::{CssManager, CssStats, ResponsiveSpacing, SpacingValues};
pub use error::{BuilderError, BuilderResult, ErrorKind};
pub use field::{FieldBuilder, FieldDefinition, FieldKind};
pub use page::{render_page, PageDocument, RenderedPage, WidgetInstance};
pub use registry::{PreviewResponse, RenderOutput, WidgetRegistry};
pub use settings::Settings;
pub use widget::{Category, RenderContext, Widget, WidgetConfig, WidgetSchema};

/// Parse and render a YAML page document with the built-in widgets.
pub fn render_yaml_page(yaml: &str, config: PageBuilderConfig) -> BuilderResult<RenderedPage> {
    let registry = WidgetRegistry::with_builtin_widgets(config)?;
    let page = PageDocument::from_yaml_str(yaml)?;
    Ok(render_page(&registry, &page))
}
