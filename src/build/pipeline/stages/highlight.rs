use std::collections::BTreeSet;

use crate::build::pipeline::{PipelineError, Stage, StageContext};
use crate::build::tree::{CodeLine, Node, RenderTree};

/// Highlights code blocks line by line.
///
/// Each line becomes a [`CodeLine`] so the renderer can number it and mark
/// it. Lines listed in a `{1,3-5}` range in the fence meta are flagged as
/// highlighted. Runs after code titles so the language is already clean.
pub struct HighlightStage;

impl Stage for HighlightStage {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn requires(&self) -> &'static [&'static str] {
        &["code-titles"]
    }

    fn process(&self, tree: &mut RenderTree, ctx: &StageContext) -> Result<(), PipelineError> {
        tree.walk_mut(&mut |node| {
            if let Node::CodeBlock {
                language,
                meta,
                code,
                lines,
                ..
            } = node
            {
                let marked = meta.as_deref().map(parse_line_ranges).unwrap_or_default();
                let html = ctx
                    .highlighter
                    .highlight_lines(code, language.as_deref().unwrap_or(""));
                *lines = html
                    .into_iter()
                    .enumerate()
                    .map(|(index, html)| CodeLine {
                        number: index + 1,
                        html,
                        highlighted: marked.contains(&(index + 1)),
                    })
                    .collect();
            }
        });
        Ok(())
    }
}

/// Parse `{1,3-5}` out of fence meta. Malformed parts are ignored.
pub fn parse_line_ranges(meta: &str) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    let Some(start) = meta.find('{') else {
        return lines;
    };
    let Some(len) = meta[start..].find('}') else {
        return lines;
    };
    for part in meta[start + 1..start + len].split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((from, to)) => {
                if let (Ok(from), Ok(to)) = (from.trim().parse::<usize>(), to.trim().parse::<usize>())
                    && from <= to
                {
                    lines.extend(from..=to);
                }
            }
            None => {
                if let Ok(line) = part.parse() {
                    lines.insert(line);
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::highlight::SyntaxHighlighter;

    #[test]
    fn test_parse_line_ranges() {
        let lines = parse_line_ranges("{1,3-5}");
        assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![1, 3, 4, 5]);
        assert!(parse_line_ranges("title=\"x\"").is_empty());
        assert_eq!(
            parse_line_ranges("{2, x, 7-6}").into_iter().collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[test]
    fn test_lines_are_numbered_and_marked() {
        let mut tree = RenderTree::new(vec![Node::CodeBlock {
            language: Some("text".to_string()),
            title: None,
            meta: Some("{2}".to_string()),
            code: "one\ntwo\nthree\n".to_string(),
            lines: vec![],
        }]);
        let highlighter = SyntaxHighlighter::default();
        HighlightStage
            .process(
                &mut tree,
                &StageContext {
                    highlighter: &highlighter,
                },
            )
            .unwrap();

        let Node::CodeBlock { lines, .. } = &tree.children[0] else {
            panic!("expected code block");
        };
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].number, 2);
        assert_eq!(lines[1].html, "two");
        assert!(lines[1].highlighted);
        assert!(!lines[0].highlighted);
    }
}
