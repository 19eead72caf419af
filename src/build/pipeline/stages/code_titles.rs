use crate::build::pipeline::{PipelineError, Stage, StageContext};
use crate::build::tree::{Node, RenderTree};

/// Extracts code block titles from the fence info string.
///
/// Both ```` ```rust:src/main.rs ```` and ```` ```rust title="src/main.rs" ````
/// produce language `rust` and title `src/main.rs`. The language form wins
/// when both are present.
pub struct CodeTitlesStage;

impl Stage for CodeTitlesStage {
    fn name(&self) -> &'static str {
        "code-titles"
    }

    fn process(&self, tree: &mut RenderTree, _ctx: &StageContext) -> Result<(), PipelineError> {
        tree.walk_mut(&mut |node| {
            if let Node::CodeBlock {
                language,
                title,
                meta,
                ..
            } = node
            {
                if let Some(lang) = language.take() {
                    let (lang, lang_title) = split_language(&lang);
                    *language = lang;
                    if title.is_none() {
                        *title = lang_title;
                    }
                }
                if let Some(rest) = meta.take() {
                    let (meta_title, remainder) = take_title_attr(&rest);
                    if title.is_none() {
                        *title = meta_title;
                    }
                    *meta = remainder;
                }
            }
        });
        Ok(())
    }
}

/// `rust:main.rs` -> (`rust`, `main.rs`). An empty side becomes `None`.
fn split_language(info: &str) -> (Option<String>, Option<String>) {
    match info.split_once(':') {
        Some((lang, title)) => (non_empty(lang), non_empty(title)),
        None => (non_empty(info), None),
    }
}

/// Remove a `title="..."` (or `title='...'`) attribute from fence meta.
fn take_title_attr(meta: &str) -> (Option<String>, Option<String>) {
    let Some(start) = meta.find("title=") else {
        return (None, non_empty(meta.trim()));
    };
    let after = &meta[start + "title=".len()..];
    let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return (None, non_empty(meta.trim()));
    };
    let Some(close) = after[1..].find(quote) else {
        return (None, non_empty(meta.trim()));
    };
    let title = &after[1..1 + close];
    let remainder = format!("{} {}", &meta[..start], &after[close + 2..]);
    (non_empty(title), non_empty(remainder.trim()))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::highlight::SyntaxHighlighter;

    fn code_block(language: Option<&str>, meta: Option<&str>) -> Node {
        Node::CodeBlock {
            language: language.map(String::from),
            title: None,
            meta: meta.map(String::from),
            code: "x\n".to_string(),
            lines: vec![],
        }
    }

    fn run(node: Node) -> Node {
        let mut tree = RenderTree::new(vec![node]);
        let highlighter = SyntaxHighlighter::default();
        CodeTitlesStage
            .process(
                &mut tree,
                &StageContext {
                    highlighter: &highlighter,
                },
            )
            .unwrap();
        tree.children.remove(0)
    }

    #[test]
    fn test_language_colon_title() {
        let node = run(code_block(Some("rust:src/main.rs"), Some("{1}")));
        let Node::CodeBlock {
            language,
            title,
            meta,
            ..
        } = node
        else {
            panic!("expected code block");
        };
        assert_eq!(language.as_deref(), Some("rust"));
        assert_eq!(title.as_deref(), Some("src/main.rs"));
        assert_eq!(meta.as_deref(), Some("{1}"));
    }

    #[test]
    fn test_title_attribute() {
        let node = run(code_block(Some("js"), Some("{2} title=\"app.js\"")));
        let Node::CodeBlock { title, meta, .. } = node else {
            panic!("expected code block");
        };
        assert_eq!(title.as_deref(), Some("app.js"));
        assert_eq!(meta.as_deref(), Some("{2}"));
    }

    #[test]
    fn test_no_title() {
        let node = run(code_block(Some("python"), None));
        let Node::CodeBlock {
            language, title, ..
        } = node
        else {
            panic!("expected code block");
        };
        assert_eq!(language.as_deref(), Some("python"));
        assert_eq!(title, None);
    }

    #[test]
    fn test_title_only() {
        let node = run(code_block(Some(":notes.txt"), None));
        let Node::CodeBlock {
            language, title, ..
        } = node
        else {
            panic!("expected code block");
        };
        assert_eq!(language, None);
        assert_eq!(title.as_deref(), Some("notes.txt"));
    }
}
