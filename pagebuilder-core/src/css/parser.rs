//! Permissive rule tokenizer.
//!
//! Finds balanced top-level `selector { body }` pairs. At-rules (`@media`,
//! `@supports`, `@keyframes`...) are kept as opaque blocks: their bodies are not
//! descended into, so nested at-rules are merged only when byte-identical after
//! whitespace collapsing. Anything that does not form a rule is dropped and
//! counted.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: property.trim().to_string(),
            value: value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleBody {
    Declarations(Vec<Declaration>),
    /// Verbatim body of an at-rule or of a rule containing nested blocks.
    Block(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub body: RuleBody,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCss {
    pub rules: Vec<CssRule>,
    /// Fragments that could not be filed under a selector.
    pub dropped: usize,
}

/// Remove `/* ... */` comments outside string literals. An unterminated
/// comment runs to the end of the input.
pub fn strip_comments(css: &str) -> String {
    let chars: Vec<char> = css.chars().collect();
    let mut out = String::with_capacity(css.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                let end = skip_string(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => i = comment_end(&chars, i + 2),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Index just past the `*/` closing a comment whose body starts at `from`.
fn comment_end(chars: &[char], from: usize) -> usize {
    let mut i = from;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

/// Collapse whitespace runs outside string literals to one space and trim.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        if c == '"' || c == '\'' {
            let end = skip_string(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Collapse whitespace and tighten selector lists (`a , b` → `a,b`).
pub fn normalize_selector(selector: &str) -> String {
    collapse_whitespace(selector)
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_rules(css: &str) -> ParsedCss {
    let source = strip_comments(css);
    let chars: Vec<char> = source.chars().collect();
    let mut parsed = ParsedCss::default();
    let mut prelude = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                let end = skip_string(&chars, i);
                prelude.extend(&chars[i..end]);
                i = end;
                continue;
            }
            ';' => {
                // Block-less statements (`@import`, `@charset`) and stray declarations.
                if !prelude.trim().is_empty() {
                    parsed.dropped += 1;
                }
                prelude.clear();
            }
            '}' => {
                parsed.dropped += 1;
                prelude.clear();
            }
            '{' => {
                let Some(close) = matching_brace(&chars, i) else {
                    parsed.dropped += 1;
                    prelude.clear();
                    break;
                };
                let body: String = chars[i + 1..close].iter().collect();
                let selector = normalize_selector(&prelude);
                prelude.clear();
                i = close + 1;

                if selector.is_empty() {
                    parsed.dropped += 1;
                    continue;
                }
                if selector.starts_with('@') || body.contains('{') {
                    parsed.rules.push(CssRule {
                        selector,
                        body: RuleBody::Block(collapse_whitespace(&body)),
                    });
                    continue;
                }
                let (declarations, dropped) = parse_declarations(&body);
                parsed.dropped += dropped;
                if !declarations.is_empty() {
                    parsed.rules.push(CssRule {
                        selector,
                        body: RuleBody::Declarations(declarations),
                    });
                }
                continue;
            }
            _ => prelude.push(c),
        }
        i += 1;
    }

    if !prelude.trim().is_empty() {
        parsed.dropped += 1;
    }
    parsed
}

/// Index just past the string literal opening at `start`.
pub(crate) fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                i = skip_string(chars, i);
                continue;
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split a declaration block on `;` outside strings and parentheses.
pub fn parse_declarations(body: &str) -> (Vec<Declaration>, usize) {
    let chars: Vec<char> = body.chars().collect();
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut parens = 0usize;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                let end = skip_string(&chars, i);
                current.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            ';' if parens == 0 => {
                pieces.push(std::mem::take(&mut current));
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(chars[i]);
        i += 1;
    }
    pieces.push(current);

    let mut declarations = Vec::new();
    let mut dropped = 0;
    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        match piece.split_once(':') {
            Some((property, value)) if !property.trim().is_empty() && !value.trim().is_empty() => {
                declarations.push(Declaration::new(
                    &collapse_whitespace(property),
                    &collapse_whitespace(value),
                ));
            }
            _ => dropped += 1,
        }
    }
    (declarations, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decls(pairs: &[(&str, &str)]) -> RuleBody {
        RuleBody::Declarations(pairs.iter().map(|(p, v)| Declaration::new(p, v)).collect())
    }

    #[test]
    fn simple_rules() {
        let parsed = parse_rules("h1{color:blue;} h1 { font-weight : 700 }");
        assert_eq!(parsed.dropped, 0);
        assert_eq!(
            parsed.rules,
            vec![
                CssRule {
                    selector: "h1".into(),
                    body: decls(&[("color", "blue")]),
                },
                CssRule {
                    selector: "h1".into(),
                    body: decls(&[("font-weight", "700")]),
                },
            ]
        );
    }

    #[test]
    fn comments_and_selector_lists() {
        let parsed = parse_rules("/* hi */ .a ,\n .b  > p { margin: 0 /* x */; }");
        assert_eq!(parsed.rules[0].selector, ".a,.b > p");
        assert_eq!(parsed.rules[0].body, decls(&[("margin", "0")]));
    }

    #[test]
    fn comment_markers_inside_strings_are_text() {
        let parsed = parse_rules(
            r#".q::before{content:"/*";} .b{color:red;} .c::after{content:"*/";} .d{top:0}"#,
        );
        assert_eq!(parsed.dropped, 0);
        let selectors: Vec<&str> = parsed.rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec![".q::before", ".b", ".c::after", ".d"]);
        assert_eq!(parsed.rules[0].body, decls(&[("content", "\"/*\"")]));
    }

    #[test]
    fn whitespace_inside_strings_is_kept() {
        let parsed = parse_rules(".q::before {  content:   \"a   b\"  ; }");
        assert_eq!(parsed.rules[0].body, decls(&[("content", "\"a   b\"")]));
    }

    #[test]
    fn unterminated_comment_runs_to_the_end() {
        let parsed = parse_rules(".a{top:0} /* .b{top:1}");
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn media_blocks_are_opaque() {
        let parsed = parse_rules("@media (max-width: 767px) {\n  #w { padding: 4px; }\n}");
        assert_eq!(
            parsed.rules,
            vec![CssRule {
                selector: "@media (max-width: 767px)".into(),
                body: RuleBody::Block("#w { padding: 4px; }".into()),
            }]
        );
    }

    #[test]
    fn strings_and_urls_do_not_split() {
        let parsed = parse_rules(
            r#".q::before { content: "a;b}"; background: url(data:image/png;base64,AAA); }"#,
        );
        assert_eq!(parsed.dropped, 0);
        assert_eq!(
            parsed.rules[0].body,
            decls(&[
                ("content", "\"a;b}\""),
                ("background", "url(data:image/png;base64,AAA)")
            ])
        );
    }

    #[test]
    fn leftovers_are_counted() {
        let parsed = parse_rules("} .a{color:red; oops; :x} @import url(x.css); stray { .b{");
        assert_eq!(parsed.rules.len(), 1);
        // stray `}`, `oops`, `:x`, `@import`, then the unterminated block
        assert_eq!(parsed.dropped, 5);
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_rules("  \n "), ParsedCss::default());
    }
}
