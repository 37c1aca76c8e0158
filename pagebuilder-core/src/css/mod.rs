//! Page-scoped CSS collection.
//!
//! One [`CssManager`] is created per page render and handed to every widget.
//! It files each widget's CSS under its selectors, merges rules shared between
//! widgets and emits the consolidated stylesheet at most once until cleared.

pub mod base;
pub mod minify;
pub mod parser;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{Breakpoints, PageBuilderConfig};
use crate::escape::css_ident;

pub use minify::minify;
pub use parser::{parse_rules, CssRule, Declaration, ParsedCss, RuleBody};

/// Raw CSS received from one widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedCss {
    pub css: String,
    pub widget_type: String,
    pub collected_at: DateTime<Utc>,
    pub dropped: usize,
}

/// What one instance contributed to one selector.
#[derive(Debug, Clone, Default, PartialEq)]
struct Contribution {
    declarations: Vec<Declaration>,
    blocks: Vec<String>,
}

/// Padding and margin shorthands applied at one breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacingValues {
    pub padding: Option<String>,
    pub margin: Option<String>,
}

impl SpacingValues {
    pub fn is_empty(&self) -> bool {
        self.padding.is_none() && self.margin.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveSpacing {
    pub tablet: SpacingValues,
    pub mobile: SpacingValues,
}

impl ResponsiveSpacing {
    pub fn is_empty(&self) -> bool {
        self.tablet.is_empty() && self.mobile.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emission {
    NotEmitted,
    Emitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssStats {
    pub widget_count: usize,
    pub selector_count: usize,
    pub global_count: usize,
    pub responsive_count: usize,
    pub total_bytes: usize,
    pub dropped_fragments: usize,
    pub emitted: bool,
    /// Instances per widget type, in first-seen order.
    pub widget_types: IndexMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct CssManager {
    collected: IndexMap<String, CollectedCss>,
    by_selector: IndexMap<String, IndexMap<String, Contribution>>,
    global: IndexMap<String, String>,
    responsive: IndexMap<String, ResponsiveSpacing>,
    emission: Emission,
    minify: bool,
    include_base_styles: bool,
    style_element_id: String,
    breakpoints: Breakpoints,
}

impl Default for CssManager {
    fn default() -> Self {
        Self::new(&PageBuilderConfig::default())
    }
}

impl CssManager {
    pub fn new(config: &PageBuilderConfig) -> Self {
        Self {
            collected: IndexMap::new(),
            by_selector: IndexMap::new(),
            global: IndexMap::new(),
            responsive: IndexMap::new(),
            emission: Emission::NotEmitted,
            minify: config.minify,
            include_base_styles: config.include_base_styles,
            style_element_id: config.style_element_id.clone(),
            breakpoints: config.breakpoints,
        }
    }

    /// Collect `css` for `widget_id`, replacing anything previously collected for it.
    pub fn add_widget_css(&mut self, widget_id: &str, css: &str, widget_type: &str) {
        if css.trim().is_empty() {
            return;
        }
        let parsed = parse_rules(css);
        if parsed.dropped > 0 {
            log::warn!(
                "Dropped {} unparsable CSS fragment(s) from widget '{}' ({})",
                parsed.dropped,
                widget_id,
                widget_type
            );
        }
        log::debug!(
            "Collected {} rule(s) from widget '{}' ({})",
            parsed.rules.len(),
            widget_id,
            widget_type
        );

        let entry = CollectedCss {
            css: css.to_string(),
            widget_type: widget_type.to_string(),
            collected_at: Utc::now(),
            dropped: parsed.dropped,
        };
        let replaced = self.collected.insert(widget_id.to_string(), entry).is_some();
        if replaced {
            // Keep the selector index identical to a reparse of `collected`.
            self.reindex();
        } else {
            self.file_rules(widget_id, parsed.rules);
        }
    }

    fn file_rules(&mut self, widget_id: &str, rules: Vec<CssRule>) {
        for rule in rules {
            let contribution = self
                .by_selector
                .entry(rule.selector)
                .or_default()
                .entry(widget_id.to_string())
                .or_default();
            match rule.body {
                RuleBody::Declarations(declarations) => {
                    contribution.declarations.extend(declarations)
                }
                RuleBody::Block(block) => contribution.blocks.push(block),
            }
        }
    }

    fn reindex(&mut self) {
        self.by_selector.clear();
        let entries: Vec<(String, String)> = self
            .collected
            .iter()
            .map(|(id, entry)| (id.clone(), entry.css.clone()))
            .collect();
        for (id, css) in entries {
            self.file_rules(&id, parse_rules(&css).rules);
        }
    }

    /// Register a page-wide CSS blob once. The key is `identifier` when given,
    /// otherwise a hash of the content. Returns false if it was already present.
    pub fn add_global_css(&mut self, css: &str, identifier: Option<&str>) -> bool {
        if css.trim().is_empty() {
            return false;
        }
        let key = match identifier {
            Some(id) => format!("global:{}", id),
            None => {
                let digest = format!("{:x}", Sha256::digest(css.as_bytes()));
                format!("global:{}", &digest[..16])
            }
        };
        if self.global.contains_key(&key) {
            return false;
        }
        log::debug!("Registered global CSS '{}'", key);
        self.global.insert(key, css.trim().to_string());
        true
    }

    /// Store per-breakpoint spacing for `widget_id`; empty spacing removes the entry.
    pub fn set_responsive_spacing(&mut self, widget_id: &str, spacing: ResponsiveSpacing) {
        if spacing.is_empty() {
            self.responsive.shift_remove(widget_id);
        } else {
            self.responsive.insert(widget_id.to_string(), spacing);
        }
    }

    pub fn has_widget_css(&self, widget_id: &str) -> bool {
        self.collected.contains_key(widget_id)
    }

    pub fn widget_css(&self, widget_id: &str) -> Option<&str> {
        self.collected.get(widget_id).map(|entry| entry.css.as_str())
    }

    pub fn collected(&self) -> impl Iterator<Item = (&str, &CollectedCss)> {
        self.collected.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn is_emitted(&self) -> bool {
        self.emission == Emission::Emitted
    }

    fn is_empty(&self) -> bool {
        self.collected.is_empty() && self.global.is_empty() && self.responsive.is_empty()
    }

    /// The merged stylesheet, or `""` when nothing has been collected.
    pub fn consolidated_css(&self, minify: bool) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut body = String::new();
        if self.include_base_styles {
            body.push_str(&base::base_styles(&self.breakpoints));
        }
        for css in self.global.values() {
            body.push_str(css);
            body.push('\n');
        }
        body.push_str(&self.merged_rules());
        body.push_str(&self.responsive_rules());

        let body = if minify { minify::minify(&body) } else { body };
        format!("{}\n{}", self.header(), body)
    }

    fn header(&self) -> String {
        format!(
            "/* Page builder styles | {} widget(s) | generated {} */",
            self.collected.len(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    /// One rule per selector in first-insertion order. Declarations repeated with
    /// the same property and value are kept once; differing values are all kept in
    /// insertion order, so the last contributor wins by source order.
    fn merged_rules(&self) -> String {
        let mut out = String::new();
        for (selector, contributions) in &self.by_selector {
            let mut declarations: IndexSet<&Declaration> = IndexSet::new();
            let mut blocks: IndexSet<&str> = IndexSet::new();
            for contribution in contributions.values() {
                declarations.extend(contribution.declarations.iter());
                blocks.extend(contribution.blocks.iter().map(String::as_str));
            }
            if !declarations.is_empty() {
                let text: Vec<String> = declarations
                    .iter()
                    .map(|d| format!("{}: {};", d.property, d.value))
                    .collect();
                out.push_str(&format!("{} {{ {} }}\n", selector, text.join(" ")));
            }
            for block in blocks {
                out.push_str(&format!("{} {{ {} }}\n", selector, block));
            }
        }
        out
    }

    fn responsive_rules(&self) -> String {
        let mut out = String::new();
        for breakpoint in ["tablet", "mobile"] {
            let mut rules = Vec::new();
            for (id, spacing) in &self.responsive {
                let values = if breakpoint == "tablet" {
                    &spacing.tablet
                } else {
                    &spacing.mobile
                };
                let mut decls = Vec::new();
                if let Some(padding) = &values.padding {
                    decls.push(format!("padding: {};", padding));
                }
                if let Some(margin) = &values.margin {
                    decls.push(format!("margin: {};", margin));
                }
                if !decls.is_empty() {
                    rules.push(format!("#{} {{ {} }}", css_ident(id), decls.join(" ")));
                }
            }
            if let (false, Some(query)) = (rules.is_empty(), self.breakpoints.media_query(breakpoint))
            {
                out.push_str(&format!("{} {{ {} }}\n", query, rules.join(" ")));
            }
        }
        out
    }

    /// Emit the page stylesheet once. Later calls return `""` until [`clear_css`](Self::clear_css).
    pub fn output_page_css(&mut self, include_wrapper_tags: bool) -> String {
        if self.emission == Emission::Emitted {
            return String::new();
        }
        let css = self.consolidated_css(self.minify);
        if css.is_empty() {
            return css;
        }
        self.emission = Emission::Emitted;
        log::debug!(
            "Emitting page CSS: {} bytes from {} widget(s)",
            css.len(),
            self.collected.len()
        );
        let css = css.replace("</style", "<\\/style");
        if include_wrapper_tags {
            format!("<style id=\"{}\">\n{}\n</style>", self.style_element_id, css)
        } else {
            css
        }
    }

    /// Forget everything collected and re-arm the emission latch.
    pub fn clear_css(&mut self) {
        self.collected.clear();
        self.by_selector.clear();
        self.global.clear();
        self.responsive.clear();
        self.emission = Emission::NotEmitted;
    }

    pub fn stats(&self) -> CssStats {
        let mut widget_types: IndexMap<String, usize> = IndexMap::new();
        for entry in self.collected.values() {
            *widget_types.entry(entry.widget_type.clone()).or_default() += 1;
        }
        CssStats {
            widget_count: self.collected.len(),
            selector_count: self.by_selector.len(),
            global_count: self.global.len(),
            responsive_count: self.responsive.len(),
            total_bytes: self.collected.values().map(|e| e.css.len()).sum::<usize>()
                + self.global.values().map(String::len).sum::<usize>(),
            dropped_fragments: self.collected.values().map(|e| e.dropped).sum(),
            emitted: self.is_emitted(),
            widget_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bare() -> CssManager {
        CssManager::new(&PageBuilderConfig {
            minify: false,
            include_base_styles: false,
            ..PageBuilderConfig::default()
        })
    }

    /// Consolidated output without the timestamped header line.
    fn rules(manager: &CssManager, minify: bool) -> String {
        let css = manager.consolidated_css(minify);
        css.split_once('\n').map(|(_, rest)| rest.to_string()).unwrap_or_default()
    }

    #[test]
    fn empty_collector_yields_nothing() {
        let mut manager = CssManager::default();
        assert_eq!(manager.consolidated_css(true), "");
        manager.add_widget_css("a", "   ", "heading");
        assert!(!manager.has_widget_css("a"));
        assert_eq!(manager.output_page_css(true), "");
        assert!(!manager.is_emitted());
    }

    #[test]
    fn identical_rules_are_merged_once() {
        let mut manager = bare();
        manager.add_widget_css("x", ".a{color:red;}", "text");
        manager.add_widget_css("y", ".a{color:red;}", "text");
        assert_eq!(rules(&manager, false), ".a { color: red; }\n");
    }

    #[test]
    fn distinct_declarations_are_unioned() {
        let mut manager = bare();
        manager.add_widget_css("x", ".a{color:red;}", "text");
        manager.add_widget_css("y", ".a{font-size:12px;}", "text");
        assert_eq!(rules(&manager, false), ".a { color: red; font-size: 12px; }\n");
    }

    #[test]
    fn divergent_values_keep_source_order() {
        let mut manager = bare();
        manager.add_widget_css("x", ".a{color:red;}", "text");
        manager.add_widget_css("y", ".a{color: blue}", "text");
        assert_eq!(rules(&manager, true), ".a{color:red;color:blue;}");
    }

    #[test]
    fn overwrite_replaces_previous_contribution() {
        let mut manager = bare();
        manager.add_widget_css("x", ".a{color:red;} .old{top:0;}", "text");
        manager.add_widget_css("y", ".b{color:green;}", "text");
        manager.add_widget_css("x", ".a{color:black;}", "text");
        assert_eq!(manager.widget_css("x"), Some(".a{color:black;}"));
        assert_eq!(
            rules(&manager, false),
            ".a { color: black; }\n.b { color: green; }\n"
        );
        assert_eq!(manager.stats().widget_count, 2);
    }

    #[test]
    fn media_blocks_dedupe_by_body() {
        let mut manager = bare();
        let css = "@media (max-width: 767px) { .a { display: none; } }";
        manager.add_widget_css("x", css, "text");
        manager.add_widget_css("y", css, "text");
        manager.add_widget_css("z", "@media (max-width: 767px){.b{top:0}}", "text");
        assert_eq!(
            rules(&manager, false),
            "@media (max-width: 767px) { .a { display: none; } }\n\
             @media (max-width: 767px) { .b{top:0} }\n"
        );
    }

    #[test]
    fn global_css_is_added_once() {
        let mut manager = bare();
        assert!(manager.add_global_css(".lib{top:0}", Some("lib")));
        assert!(!manager.add_global_css(".other{top:1}", Some("lib")));
        assert!(manager.add_global_css(".x{a:b}", None));
        assert!(!manager.add_global_css(".x{a:b}", None));
        assert_eq!(manager.stats().global_count, 2);
        assert_eq!(rules(&manager, false), ".lib{top:0}\n.x{a:b}\n");
    }

    #[test]
    fn latch_emits_once_per_cycle() {
        let mut manager = CssManager::default();
        manager.add_widget_css("x", ".a{color:red;}", "text");

        let first = manager.output_page_css(true);
        assert!(first.starts_with("<style id=\"pagebuilder-widget-styles\">"));
        assert!(first.contains(".a{color:red;}"));
        assert_eq!(manager.output_page_css(true), "");
        assert!(manager.stats().emitted);

        manager.clear_css();
        assert_eq!(manager.consolidated_css(true), "");
        manager.add_widget_css("x", ".a{color:red;}", "text");
        assert!(!manager.output_page_css(false).is_empty());
    }

    #[test]
    fn responsive_spacing_becomes_media_blocks() {
        let mut manager = bare();
        manager.set_responsive_spacing(
            "hero",
            ResponsiveSpacing {
                tablet: SpacingValues {
                    padding: Some("20px 0 20px 0".into()),
                    margin: None,
                },
                mobile: SpacingValues {
                    padding: Some("8px 0 8px 0".into()),
                    margin: Some("0 0 10px 0".into()),
                },
            },
        );
        assert_eq!(
            rules(&manager, false),
            "@media (max-width: 1024px) { #hero { padding: 20px 0 20px 0; } }\n\
             @media (max-width: 767px) { #hero { padding: 8px 0 8px 0; margin: 0 0 10px 0; } }\n"
        );
    }

    #[test]
    fn header_comment_survives_minification() {
        let mut manager = CssManager::default();
        manager.add_widget_css("x", ".a{color:red;}", "text");
        let css = manager.consolidated_css(true);
        assert!(css.starts_with("/* Page builder styles | 1 widget(s) | generated "));
        assert!(css.contains(".pb-hide-mobile{display:none !important;}"));
    }

    #[test]
    fn stats_count_dropped_fragments() {
        let mut manager = bare();
        manager.add_widget_css("x", ".a{color:red;} garbage", "text");
        manager.add_widget_css("y", ".b{top:0}", "button");
        let stats = manager.stats();
        assert_eq!(stats.dropped_fragments, 1);
        assert_eq!(stats.selector_count, 2);
        assert_eq!(stats.widget_types.get("text"), Some(&1));
        assert_eq!(stats.widget_types.get("button"), Some(&1));
    }
}
