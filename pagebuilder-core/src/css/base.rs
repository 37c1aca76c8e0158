use crate::config::Breakpoints;

/// Structural rules shared by every widget: wrapper box model, device visibility
/// classes, heading/button resets and the failed-render marker.
pub fn base_styles(breakpoints: &Breakpoints) -> String {
    format!(
        r#".pb-widget {{ position: relative; box-sizing: border-box; }}
.pb-widget *, .pb-widget *::before, .pb-widget *::after {{ box-sizing: inherit; }}
.pb-hidden {{ display: none !important; }}
@media (min-width: {desktop_min}px) {{ .pb-hide-desktop {{ display: none !important; }} }}
@media (min-width: {tablet_min}px) and (max-width: {tablet}px) {{ .pb-hide-tablet {{ display: none !important; }} }}
@media (max-width: {mobile}px) {{ .pb-hide-mobile {{ display: none !important; }} }}
.pb-heading-title {{ margin: 0; padding: 0; line-height: 1.2; }}
.pb-button {{ display: inline-block; cursor: pointer; text-decoration: none; border: none; transition: all 0.2s ease; }}
.pb-button:focus-visible {{ outline: 2px solid currentColor; outline-offset: 2px; }}
.pb-widget-error {{ padding: 12px; border: 1px dashed #d63638; color: #d63638; font-size: 13px; }}
"#,
        desktop_min = breakpoints.tablet.saturating_add(1),
        tablet_min = breakpoints.mobile.saturating_add(1),
        tablet = breakpoints.tablet,
        mobile = breakpoints.mobile,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_breakpoints_do_not_overflow() {
        let css = base_styles(&Breakpoints {
            tablet: u32::MAX,
            mobile: 10,
        });
        assert!(css.contains(&format!("@media (min-width: {}px)", u32::MAX)));
        assert!(css.contains("@media (min-width: 11px) and (max-width: 4294967295px)"));
    }
}
