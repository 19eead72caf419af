use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

use crate::util::html_escape;

/// A syntax highlighter using autumnus (tree-sitter based).
///
/// Output is line-oriented: every source line gets its own HTML fragment
/// with all tags balanced inside the line, so lines can be wrapped,
/// numbered and marked individually.
#[derive(Debug, Clone)]
pub struct SyntaxHighlighter {
    /// Theme name for CSS generation.
    theme_name: String,
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the given theme.
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight code, one HTML fragment per source line.
    ///
    /// Unknown languages and formatter failures fall back to escaped plain text.
    pub fn highlight_lines(&self, code: &str, language: &str) -> Vec<String> {
        let source_lines: Vec<&str> = code.lines().collect();

        match self.highlight_block(code, language) {
            Some(html) => {
                let inner = strip_code_wrapper(&html);
                let mut lines = if inner.contains(LINE_WRAPPER) {
                    wrapped_lines(inner)
                } else {
                    split_html_lines(inner)
                };
                while lines.len() > source_lines.len()
                    && lines.last().is_some_and(|line| strip_tags(line).trim().is_empty())
                {
                    lines.pop();
                }
                if lines.len() == source_lines.len() {
                    return lines;
                }
                tracing::debug!(
                    language,
                    expected = source_lines.len(),
                    got = lines.len(),
                    "highlighted output does not line up with source, using plain text"
                );
                Self::plain_lines(&source_lines)
            }
            None => Self::plain_lines(&source_lines),
        }
    }

    /// Run the formatter over the whole block so multi-line tokens keep their context.
    fn highlight_block(&self, code: &str, language: &str) -> Option<String> {
        if language.is_empty() || language == "plaintext" || language == "text" {
            return None;
        }

        // Use Language::guess which handles language detection from name or extension
        let lang = Language::guess(language, code);
        if matches!(lang, Language::PlainText) {
            return None;
        }

        let formatter = HtmlLinkedBuilder::new()
            .source(code)
            .lang(lang)
            .build()
            .ok()?;
        let mut output: Vec<u8> = Vec::new();
        formatter.format(&mut output).ok()?;
        String::from_utf8(output).ok()
    }

    /// Generate CSS for the current theme.
    pub fn generate_css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false)) // false = don't enable italic
    }

    fn plain_lines(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| html_escape(line)).collect()
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("github_light")
    }
}

/// Strip the `<pre ...><code ...>` wrapper the formatter puts around the block.
fn strip_code_wrapper(html: &str) -> &str {
    let mut inner = html.trim();
    for open in ["<pre", "<code"] {
        if inner.starts_with(open)
            && let Some(gt) = inner.find('>')
        {
            inner = &inner[gt + 1..];
        }
    }
    for close in ["</pre>", "</code>"] {
        inner = inner.trim_end().strip_suffix(close).unwrap_or(inner);
    }
    inner
}

/// Opening of the per-line wrapper some formatter versions emit.
const LINE_WRAPPER: &str = "<div class=\"line\"";

/// Pull the content out of each `<div class="line" ...>` wrapper.
fn wrapped_lines(html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find(LINE_WRAPPER) {
        let after = &rest[start..];
        let Some(gt) = after.find('>') else {
            break;
        };
        let body = &after[gt + 1..];
        let end = body.find("</div>").unwrap_or(body.len());
        lines.push(body[..end].trim_end_matches('\n').to_string());
        rest = &body[end..];
    }
    lines
}

/// Split highlighted HTML at newlines, closing open tags at the end of each
/// line and reopening them at the start of the next.
fn split_html_lines(html: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut open: Vec<&str> = Vec::new();
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => {
                let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                let tag = &rest[..end];
                if tag.starts_with("</") {
                    open.pop();
                } else if !tag.ends_with("/>") && !tag.starts_with("<!") {
                    open.push(tag);
                }
                current.push_str(tag);
                rest = &rest[end..];
            }
            '\n' => {
                for tag in open.iter().rev() {
                    current.push_str("</");
                    current.push_str(tag_name(tag));
                    current.push('>');
                }
                lines.push(std::mem::take(&mut current));
                for tag in &open {
                    current.push_str(tag);
                }
                rest = &rest[1..];
            }
            c => {
                current.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn tag_name(open_tag: &str) -> &str {
    let name = &open_tag[1..];
    let end = name
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(name.len());
    &name[..end]
}

fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
