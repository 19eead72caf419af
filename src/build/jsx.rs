//! Scanner for embedded component tags inside raw HTML.
//!
//! The markdown parser hands us embedded elements as raw HTML (block or
//! inline). This module splits that HTML into component open/close tags,
//! plain HTML tags and text. Component names start with an uppercase letter,
//! the JSX convention; everything else is ordinary HTML.

/// A prop value as written in the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// `key="value"` or `key='value'`
    Literal(String),
    /// `key={expression}`
    Expression(String),
    /// Bare `key`
    Flag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open {
        name: String,
        props: Vec<(String, PropValue)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    /// A non-component tag or comment, kept verbatim
    Html(String),
    Text(String),
}

/// Returns true if `name` follows the component naming convention.
pub fn is_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Split raw HTML into tokens.
pub fn scan(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        let candidate = &rest[lt..];

        match scan_tag(candidate) {
            Some((token, consumed)) => {
                flush_text(&mut text, &mut tokens);
                // Merge consecutive raw HTML so pass-through stays compact
                match (tokens.last_mut(), token) {
                    (Some(Token::Html(prev)), Token::Html(next)) => prev.push_str(&next),
                    (_, token) => tokens.push(token),
                }
                rest = &candidate[consumed..];
            }
            None => {
                text.push('<');
                rest = &candidate[1..];
            }
        }
    }
    text.push_str(rest);
    flush_text(&mut text, &mut tokens);

    tokens
}

fn flush_text(text: &mut String, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Text(std::mem::take(text)));
    }
}

/// Try to read one tag at the start of `input` (which begins with `<`).
/// Returns the token and the number of bytes consumed.
fn scan_tag(input: &str) -> Option<(Token, usize)> {
    if input.starts_with("<!--") {
        let end = input.find("-->")? + 3;
        return Some((Token::Html(input[..end].to_string()), end));
    }

    let bytes = input.as_bytes();
    let closing = bytes.get(1) == Some(&b'/');
    let name_start = if closing { 2 } else { 1 };
    let name_len = input[name_start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == ':'))
        .unwrap_or(input.len() - name_start);
    if name_len == 0 || !input[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name = &input[name_start..name_start + name_len];
    let end = find_tag_end(input, name_start + name_len)?;
    let raw = &input[..=end];

    if !is_component_name(name) {
        return Some((Token::Html(raw.to_string()), end + 1));
    }

    if closing {
        return Some((
            Token::Close {
                name: name.to_string(),
            },
            end + 1,
        ));
    }

    let inner = &input[name_start + name_len..end];
    let (inner, self_closing) = match inner.trim_end().strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (inner, false),
    };
    let props = parse_props(inner)?;

    Some((
        Token::Open {
            name: name.to_string(),
            props,
            self_closing,
        },
        end + 1,
    ))
}

/// Index of the `>` ending the tag, skipping quoted strings and `{...}` expressions.
fn find_tag_end(input: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, c) in input[from..].char_indices() {
        let i = from + i;
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'' | '`') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.checked_sub(1)?,
            (None, '>') if depth == 0 => return Some(i),
            (None, '<') if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

fn parse_props(mut s: &str) -> Option<Vec<(String, PropValue)>> {
    let mut props = Vec::new();

    loop {
        s = s.trim_start();
        if s.is_empty() {
            return Some(props);
        }

        let key_len = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        if key_len == 0 {
            return None;
        }
        let key = s[..key_len].to_string();
        s = s[key_len..].trim_start();

        let Some(after_eq) = s.strip_prefix('=') else {
            props.push((key, PropValue::Flag));
            continue;
        };
        s = after_eq.trim_start();

        let (value, consumed) = match s.chars().next()? {
            q @ ('"' | '\'') => {
                let close = s[1..].find(q)? + 1;
                (PropValue::Literal(s[1..close].to_string()), close + 1)
            }
            '{' => {
                let close = matching_brace(s)?;
                (
                    PropValue::Expression(s[1..close].trim().to_string()),
                    close + 1,
                )
            }
            _ => return None,
        };
        props.push((key, value));
        s = &s[consumed..];
    }
}

fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'' | '`') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_component_name() {
        assert!(is_component_name("Callout"));
        assert!(is_component_name("Chart.Bar"));
        assert!(!is_component_name("div"));
        assert!(!is_component_name(""));
        assert!(!is_component_name("Bad-Name"));
    }

    #[test]
    fn test_scan_component_block() {
        let tokens = scan("<Callout type=\"note\" dismissible>\nhello\n</Callout>\n");
        assert_eq!(
            tokens,
            vec![
                Token::Open {
                    name: "Callout".to_string(),
                    props: vec![
                        ("type".to_string(), PropValue::Literal("note".to_string())),
                        ("dismissible".to_string(), PropValue::Flag),
                    ],
                    self_closing: false,
                },
                Token::Text("\nhello\n".to_string()),
                Token::Close {
                    name: "Callout".to_string()
                },
                Token::Text("\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_self_closing_with_expression() {
        let tokens = scan("<Badge count={3} label={title} />");
        assert_eq!(
            tokens,
            vec![Token::Open {
                name: "Badge".to_string(),
                props: vec![
                    ("count".to_string(), PropValue::Expression("3".to_string())),
                    ("label".to_string(), PropValue::Expression("title".to_string())),
                ],
                self_closing: true,
            }]
        );
    }

    #[test]
    fn test_scan_plain_html_passes_through() {
        let tokens = scan("<div class=\"x\"><br/></div>");
        assert_eq!(
            tokens,
            vec![Token::Html("<div class=\"x\"><br/></div>".to_string())]
        );
    }

    #[test]
    fn test_scan_comment() {
        let tokens = scan("<!-- note --><Foo/>");
        assert_eq!(tokens[0], Token::Html("<!-- note -->".to_string()));
        assert!(matches!(&tokens[1], Token::Open { name, self_closing: true, .. } if name == "Foo"));
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        let tokens = scan("a < b and 3<4");
        assert_eq!(tokens, vec![Token::Text("a < b and 3<4".to_string())]);
    }

    #[test]
    fn test_quoted_gt_inside_prop() {
        let tokens = scan("<Note text=\"a > b\">");
        assert!(matches!(
            &tokens[0],
            Token::Open { props, .. } if props[0].1 == PropValue::Literal("a > b".to_string())
        ));
    }
}
