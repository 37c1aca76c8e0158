use regex::Regex;
use std::sync::OnceLock;

use super::parser::{skip_string, strip_comments};

fn punctuation_regex() -> &'static Regex {
    static PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();
    PUNCTUATION_REGEX.get_or_init(|| Regex::new(r"\s*([{};,>])\s*").unwrap())
}

fn colon_regex() -> &'static Regex {
    static COLON_REGEX: OnceLock<Regex> = OnceLock::new();
    COLON_REGEX.get_or_init(|| Regex::new(r":\s+").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strip comments, collapse whitespace and tighten punctuation.
///
/// Repeats until the output stops changing, so `minify(minify(x)) == minify(x)`.
pub fn minify(css: &str) -> String {
    let mut current = css.to_string();
    loop {
        let next = minify_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn minify_pass(css: &str) -> String {
    let chars: Vec<char> = strip_comments(css).chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut plain = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            // String literals are copied through untouched.
            '"' | '\'' => {
                out.push_str(&tighten(&plain));
                plain.clear();
                let end = skip_string(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            c => {
                plain.push(c);
                i += 1;
            }
        }
    }
    out.push_str(&tighten(&plain));
    out.trim().to_string()
}

fn tighten(css: &str) -> String {
    let css = whitespace_regex().replace_all(css, " ");
    let css = punctuation_regex().replace_all(&css, "$1");
    colon_regex().replace_all(&css, ":").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tightens_punctuation() {
        assert_eq!(
            minify("/* c */\n.a ,  .b > p {\n  color:  red;\n  margin: 0 auto;\n}\n"),
            ".a,.b>p{color:red;margin:0 auto;}"
        );
    }

    #[test]
    fn string_literals_are_preserved() {
        assert_eq!(
            minify(".q::before { content: \"a   b\" ; }\n.r { content: '/* x */' }"),
            ".q::before{content:\"a   b\";}.r{content:'/* x */'}"
        );
        assert_eq!(
            minify(r#".q::before{content:"/*";} .b{color:red;} .c::after{content:"*/";} .d{top:0}"#),
            r#".q::before{content:"/*";}.b{color:red;}.c::after{content:"*/";}.d{top:0}"#
        );
    }

    #[test]
    fn idempotent() {
        let samples = [
            "h1 { color: blue; }\n@media (max-width: 767px) { #a { padding: 1px 2px; } }",
            "  a  /* x */ b{c:d}  ",
            "/* unterminated",
            "",
            ".x{content:\"a  b\"}",
        ];
        for sample in samples {
            let once = minify(sample);
            assert_eq!(minify(&once), once, "{:?}", sample);
        }
    }
}
