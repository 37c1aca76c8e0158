//! Escaping helpers shared by widget render functions.

use regex::Regex;
use std::sync::OnceLock;

/// Tags kept by [`sanitize_rich_text`]; everything else is escaped.
const RICH_TEXT_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "a", "ul", "ol", "li", "blockquote", "code",
    "pre", "h2", "h3", "h4", "span", "sub", "sup",
];

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Keep the space-separated tokens that are valid class names.
pub fn sanitize_class_list(classes: &str) -> String {
    static CLASS_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = CLASS_REGEX.get_or_init(|| Regex::new(r"^-?[A-Za-z_][A-Za-z0-9_-]*$").unwrap());
    classes
        .split_whitespace()
        .filter(|token| re.is_match(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce an instance id to characters valid in an `id` attribute and `#id` selector.
pub fn css_ident(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Strip characters that would let a substituted value escape its declaration.
pub fn css_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | ';' | '<' | '>' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Keep a small set of formatting tags from rich text; escape every other tag.
///
/// Attributes are dropped, except `href` on links, which is kept when it does not
/// use a script scheme.
pub fn sanitize_rich_text(html: &str) -> String {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    static HREF_REGEX: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_REGEX
        .get_or_init(|| Regex::new(r"(?s)<(/?)([A-Za-z][A-Za-z0-9]*)([^<>]*)>").unwrap());
    let href_re = HREF_REGEX
        .get_or_init(|| Regex::new(r#"href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for caps in tag_re.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape_text(&html[last..whole.start()]));
        last = whole.end();

        let closing = &caps[1] == "/";
        let tag = caps[2].to_ascii_lowercase();
        if !RICH_TEXT_TAGS.contains(&tag.as_str()) {
            out.push_str(&escape_html(whole.as_str()));
            continue;
        }
        if closing {
            out.push_str(&format!("</{}>", tag));
            continue;
        }
        let href = (tag == "a")
            .then(|| href_re.captures(&caps[3]))
            .flatten()
            .and_then(|h| h.get(1).or_else(|| h.get(2)).map(|m| m.as_str().to_string()))
            .filter(|href| is_safe_url(href));
        match href {
            Some(href) => out.push_str(&format!("<a href=\"{}\">", escape_html(&href))),
            None => out.push_str(&format!("<{}>", tag)),
        }
    }
    out.push_str(&escape_text(&html[last..]));
    out
}

/// Escape `<` and `>` in text between tags, leaving entities already present intact.
fn escape_text(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

/// False for `javascript:`, `vbscript:` and `data:text/html` URLs.
pub fn is_safe_url(url: &str) -> bool {
    let lowered: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !(lowered.starts_with("javascript:")
        || lowered.starts_with("vbscript:")
        || lowered.starts_with("data:text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn class_list_drops_invalid_tokens() {
        assert_eq!(
            sanitize_class_list("hero  \"onclick=x 2col big-title _x"),
            "hero big-title _x"
        );
    }

    #[test]
    fn css_value_cannot_close_a_rule() {
        assert_eq!(css_value("red;} body{display:none"), "red bodydisplay:none");
    }

    #[test]
    fn rich_text_keeps_formatting_only() {
        assert_eq!(
            sanitize_rich_text(r#"<p onclick="x()">Hi <strong>there</strong><script>bad()</script></p>"#),
            "<p>Hi <strong>there</strong>&lt;script&gt;bad()&lt;/script&gt;</p>"
        );
        assert_eq!(
            sanitize_rich_text(r#"<a href="javascript:alert(1)">x</a> <a href='/about' target="_blank">y</a>"#),
            r#"<a>x</a> <a href="/about">y</a>"#
        );
    }
}
