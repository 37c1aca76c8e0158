use pagebuilder_core::{
    render_page, render_yaml_page, BuilderError, ControlManager, CssManager, ErrorKind,
    FieldDefinition, PageBuilderConfig, PageDocument, ResponsiveSpacing, Settings, SpacingValues,
    WidgetRegistry,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

fn fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("fixtures");
    path.push(filename);
    path
}

fn unminified() -> PageBuilderConfig {
    PageBuilderConfig {
        minify: false,
        include_base_styles: false,
        ..PageBuilderConfig::default()
    }
}

// CSS collection

#[test]
fn test_two_headings_share_one_rule() {
    let mut css = CssManager::default();
    css.add_widget_css("heading-1", "h1{color:blue;}", "heading");
    css.add_widget_css("heading-2", "h1{color:blue;} h1{font-weight:700;}", "heading");

    let out = css.consolidated_css(true);
    assert_eq!(out.matches("h1{").count(), 1);
    assert!(out.contains("h1{color:blue;font-weight:700;}"));
}

#[test]
fn test_divergent_values_keep_source_order() {
    let mut css = CssManager::new(&unminified());
    css.add_widget_css("a", ".x { color: red; }", "heading");
    css.add_widget_css("b", ".x { color: blue; }", "heading");

    let out = css.consolidated_css(false);
    assert!(out.contains(".x { color: red; color: blue; }"));
}

#[test]
fn test_overwriting_widget_css_replaces_its_rules() {
    let mut css = CssManager::new(&unminified());
    css.add_widget_css("a", ".x { color: red; }", "heading");
    css.add_widget_css("a", ".y { color: green; }", "heading");

    let out = css.consolidated_css(false);
    assert!(!out.contains(".x"));
    assert!(out.contains(".y { color: green; }"));
    assert_eq!(css.stats().widget_count, 1);
    assert_eq!(css.widget_css("a"), Some(".y { color: green; }"));
}

#[test]
fn test_media_blocks_are_deduplicated() {
    let mut css = CssManager::new(&unminified());
    let block = "@media (max-width: 767px) { .x { display: none; } }";
    css.add_widget_css("a", block, "spacer");
    css.add_widget_css("b", block, "spacer");

    let out = css.consolidated_css(false);
    assert_eq!(out.matches("@media (max-width: 767px)").count(), 1);
}

#[test]
fn test_page_css_is_emitted_once() {
    let mut css = CssManager::default();
    css.add_widget_css("a", ".x{color:red}", "heading");

    let first = css.output_page_css(true);
    assert!(first.starts_with("<style id=\"pagebuilder-widget-styles\">\n"));
    assert!(first.ends_with("\n</style>"));
    assert!(css.is_emitted());
    assert_eq!(css.output_page_css(true), "");

    css.clear_css();
    assert!(!css.is_emitted());
    assert_eq!(css.output_page_css(true), "");
}

#[test]
fn test_empty_collector_emits_nothing() {
    let mut css = CssManager::default();
    css.add_widget_css("a", "   ", "heading");
    assert_eq!(css.consolidated_css(true), "");
    assert_eq!(css.output_page_css(true), "");
    assert!(!css.is_emitted());
}

#[test]
fn test_global_css_registered_once() {
    let mut css = CssManager::new(&unminified());
    assert!(css.add_global_css(":root { --accent: #2271b1; }", None));
    assert!(!css.add_global_css(":root { --accent: #2271b1; }", None));
    assert!(css.add_global_css(".font { font-family: serif; }", Some("fonts")));
    assert!(!css.add_global_css(".other { color: red; }", Some("fonts")));
    assert_eq!(css.stats().global_count, 2);
}

#[test]
fn test_responsive_spacing_emits_media_blocks() {
    let mut css = CssManager::new(&unminified());
    css.set_responsive_spacing(
        "hero",
        ResponsiveSpacing {
            tablet: SpacingValues {
                padding: Some("20px 0 20px 0".into()),
                margin: None,
            },
            mobile: SpacingValues::default(),
        },
    );

    let out = css.consolidated_css(false);
    assert!(out.contains("@media (max-width: 1024px) { #hero { padding: 20px 0 20px 0; } }"));
    assert!(!out.contains("767px"));
}

#[test]
fn test_style_end_tag_is_escaped() {
    let mut css = CssManager::default();
    css.add_widget_css("a", ".x { content: \"</style>\"; }", "text");
    let out = css.output_page_css(true);
    assert_eq!(out.matches("</style").count(), 1);
    assert!(out.contains("<\\/style"));
}

// Controls

fn contact_controls() -> ControlManager {
    let mut controls = ControlManager::new();
    controls
        .add_group("form", "Form")
        .unwrap()
        .register_field(
            "enable_captcha",
            FieldDefinition::toggle("Enable Captcha")
                .default_value(json!(false))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register_field(
            "captcha_site_key",
            FieldDefinition::text("Site Key")
                .required()
                .condition("enable_captcha", json!(true))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register_field(
            "fields",
            FieldDefinition::repeater("Fields")
                .field("label", FieldDefinition::text("Label").required().build().unwrap())
                .min(1.0)
                .max(2.0)
                .default_value(json!([{"label": "Email"}]))
                .build()
                .unwrap(),
        )
        .unwrap()
        .register_field(
            "accent",
            FieldDefinition::color("Accent")
                .default_value(json!("#2271b1"))
                .selector("{{WRAPPER}} .pb-form-submit", "background-color: {{VALUE}};")
                .build()
                .unwrap(),
        )
        .unwrap()
        .end_group();
    controls
}

#[test]
fn test_defaults_fill_missing_settings() {
    let resolved = contact_controls().resolve(&Settings::new());
    assert!(resolved.issues.is_empty());
    assert_eq!(resolved.values.get("accent"), Some(&json!("#2271b1")));
    assert_eq!(resolved.values.rows("fields").len(), 1);
}

#[test]
fn test_inactive_required_field_is_skipped() {
    let controls = contact_controls();
    assert!(controls.validate(&Settings::new()).is_empty());
    assert!(!controls.resolve(&Settings::new()).values.contains("captcha_site_key"));

    let errors = controls.validate(&Settings::new().with("enable_captcha", json!(true)));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Validation);
}

#[test]
fn test_repeater_bounds_are_enforced() {
    let controls = contact_controls();
    let too_many = json!([{"label": "a"}, {"label": "b"}, {"label": "c"}]);
    let errors = controls.validate(&Settings::new().with("fields", too_many));
    assert!(matches!(
        &errors[..],
        [BuilderError::Validation { field, .. }] if field == "fields"
    ));

    let missing_label = json!([{"label": "ok"}, {}]);
    let errors = controls.validate(&Settings::new().with("fields", missing_label));
    assert!(matches!(
        &errors[..],
        [BuilderError::Validation { field, .. }] if field == "fields[1].label"
    ));
}

#[test]
fn test_rejected_value_falls_back_to_default_css() {
    let controls = contact_controls();
    let resolved = controls.resolve(&Settings::new().with("accent", json!("not-a-color")));
    assert_eq!(resolved.issues.len(), 1);
    assert_eq!(
        controls.generate_css("form-1", &resolved.values),
        "#form-1 .pb-form-submit { background-color: #2271b1; }\n"
    );
}

#[test]
fn test_duplicate_field_keys_are_rejected() {
    let mut controls = ControlManager::new();
    let result = controls
        .add_group("a", "A")
        .unwrap()
        .register_field("title", FieldDefinition::text("Title").build().unwrap())
        .unwrap()
        .end_group()
        .add_group("b", "B")
        .unwrap()
        .register_field("title", FieldDefinition::text("Title").build().unwrap());
    assert!(matches!(result, Err(BuilderError::DuplicateField { .. })));
}

#[test]
fn test_unknown_condition_operator_fails_at_build() {
    let result = FieldDefinition::text("Key")
        .condition_op("mode", "~=", json!("x"))
        .build();
    assert!(result.is_err());
}

// Registry

#[test]
fn test_builtin_widgets_are_registered() {
    let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
    assert_eq!(
        registry.list_widget_types(),
        vec![
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
    assert!(registry.search("form").iter().any(|c| c.widget_type == "contact-form"));
}

#[test]
fn test_field_schema_lists_all_tabs() {
    let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
    let schema = registry.field_schema("heading").unwrap();
    assert!(schema["general"].is_object());
    assert!(schema["style"].is_object());
    assert!(schema["advanced"].is_object());
    assert!(matches!(
        registry.field_schema("carousel"),
        Err(BuilderError::UnknownWidget { .. })
    ));
}

#[test]
fn test_numeric_toggle_enables_conditional_fields() {
    let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
    let settings = Settings::new()
        .with("enable_captcha", json!(1))
        .with("captcha_site_key", json!("abc"));
    let output = registry.render("contact-form", "signup", &settings).unwrap();
    assert!(output.issues.is_empty());
    assert!(output.html.contains("data-sitekey=\"abc\""));
}

#[test]
fn test_preview_reports_failure_without_panicking() {
    let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
    let response = registry.preview("carousel", &Settings::new());
    assert!(!response.success);
    assert!(response.error.is_some());
    assert_eq!(response.html, "");
}

// Pages

#[test]
fn test_landing_fixture_renders() {
    let registry = WidgetRegistry::with_builtin_widgets(PageBuilderConfig::default()).unwrap();
    let page = PageDocument::load(fixture_path("landing.yaml")).unwrap();
    let rendered = render_page(&registry, &page);

    assert_eq!(rendered.failures.len(), 1);
    assert_eq!(rendered.failures[0].instance_id, "legacy-slider");
    assert!(matches!(
        rendered.failures[0].error,
        BuilderError::UnknownWidget { .. }
    ));

    let body = &rendered.body;
    assert!(body.contains("<h1 class=\"pb-heading-title\">Build pages faster</h1>"));
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!body.contains("<script>"));
    assert!(body.contains("href=\"https://example.com/signup\""));
    assert!(body.contains("Widget failed to render"));
    assert_eq!(body.matches("class=\"pb-form-field\"").count(), 3);
    assert!(!body.contains("never-rendered"));

    let styles = &rendered.styles;
    assert_eq!(styles.matches("<style").count(), 1);
    assert!(styles.contains("#hero-title .pb-heading-title{color:#1a1a1a;}"));
    assert!(styles.contains("@media (max-width:1024px){#hero-title{margin:10px 10px 10px 10px;}}"));
    assert_eq!(rendered.stats.responsive_count, 1);
}

#[test]
fn test_json_fixture_merges_shared_selectors() {
    let registry = WidgetRegistry::with_builtin_widgets(unminified()).unwrap();
    let page = PageDocument::load(fixture_path("two-headings.json")).unwrap();
    let rendered = render_page(&registry, &page);

    assert!(rendered.failures.is_empty());
    assert!(rendered.styles.contains("#heading-1 .pb-heading-title { color: #0000ff; }"));
    assert!(rendered
        .styles
        .contains("#heading-2 .pb-heading-title { color: #0000ff; font-weight: 700; }"));
    assert_eq!(rendered.stats.widget_types.get("heading"), Some(&2));
}

#[test]
fn test_config_fixture_applies() {
    let config = PageBuilderConfig::load(fixture_path("config.yaml")).unwrap();
    assert!(!config.minify);
    assert_eq!(config.style_element_id, "landing-styles");
    assert_eq!(config.breakpoints.tablet, 960);

    let rendered = render_yaml_page(
        "widgets:\n  - id: gap\n    type: spacer\n    settings:\n      height:\n        desktop: 40\n        tablet: 30\n",
        config,
    )
    .unwrap();
    assert!(rendered.styles.starts_with("<style id=\"landing-styles\">"));
    assert!(rendered
        .styles
        .contains("@media (max-width: 960px) { #gap .pb-spacer { height: 30px; } }"));
}

#[test]
fn test_invalid_config_fixture_is_rejected() {
    let err = PageBuilderConfig::load(fixture_path("invalid-config.yaml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_page_without_css_has_no_style_element() {
    let rendered = render_yaml_page("title: Empty\nwidgets: []\n", PageBuilderConfig::default())
        .unwrap();
    assert_eq!(rendered.styles, "");
    assert!(!rendered.stats.emitted);
    assert!(rendered.to_html_document().contains("<title>Empty</title>"));
}
