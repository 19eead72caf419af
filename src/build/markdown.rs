//! Markdown parsing into a render tree, with embedded components.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::components::ComponentRegistry;
use super::document::FrontMatter;
use super::jsx::{self, PropValue, Token};
use super::tree::{Alignment, Node, Props, RenderTree};

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Map configured extension names to parser options.
pub fn parser_options(extensions: &[String]) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "smart_punctuation" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Result of parsing a body.
#[derive(Debug)]
pub struct ParsedTree {
    pub tree: RenderTree,
    /// Names of embedded elements with no registered handler, in order of appearance
    pub unresolved: Vec<String>,
}

/// Parse markdown into a render tree.
///
/// Embedded component tags are resolved against `registry`; `{key}`
/// expressions in text and props are looked up in `scope`.
pub fn parse_tree(
    markdown: &str,
    options: Options,
    registry: &ComponentRegistry,
    scope: &FrontMatter,
) -> ParsedTree {
    let mut builder = TreeBuilder::new(registry, scope, options);
    builder.feed(markdown);
    builder.finish()
}

/// An open container while building the tree.
struct Frame {
    node: Node,
    kind: FrameKind,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Markdown,
    /// Opened by an embedded tag rather than markdown structure
    Component,
    /// A markdown construct with no node of its own; children are spliced into the parent
    Transparent,
}

struct TreeBuilder<'a> {
    registry: &'a ComponentRegistry,
    scope: &'a FrontMatter,
    options: Options,
    root: Vec<Node>,
    stack: Vec<Frame>,
    unresolved: Vec<String>,
    /// Fence info and accumulated text of the open code block
    code: Option<(Option<String>, String)>,
    table_alignments: Vec<Alignment>,
    table_cell: usize,
    in_table_head: bool,
    in_html_block: bool,
    /// Text inside a component that shares an HTML block with its tags
    block_markdown: String,
}

impl<'a> TreeBuilder<'a> {
    fn new(registry: &'a ComponentRegistry, scope: &'a FrontMatter, options: Options) -> Self {
        Self {
            registry,
            scope,
            options,
            root: Vec::new(),
            stack: Vec::new(),
            unresolved: Vec::new(),
            code: None,
            table_alignments: Vec::new(),
            table_cell: 0,
            in_table_head: false,
            in_html_block: false,
            block_markdown: String::new(),
        }
    }

    fn feed(&mut self, markdown: &str) {
        for event in Parser::new_ext(markdown, self.options) {
            self.event(event);
        }
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, code)) = &mut self.code {
                    code.push_str(&text);
                } else if self.in_html_block {
                    self.html(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(code) => self.push(Node::InlineCode {
                value: code.to_string(),
            }),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.push_text(&math),
            Event::Html(html) | Event::InlineHtml(html) => self.html(&html),
            Event::FootnoteReference(label) => self.push(Node::FootnoteReference {
                label: label.to_string(),
            }),
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push(Node::LineBreak),
            Event::Rule => self.push(Node::ThematicBreak),
            Event::TaskListMarker(checked) => {
                if let Some(Frame {
                    node: Node::ListItem { checked: slot, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    *slot = Some(checked);
                }
            }
        }
    }

    fn start(&mut self, tag: Tag) {
        let node = match tag {
            Tag::Paragraph => Node::Paragraph { children: vec![] },
            Tag::Heading {
                level, id, classes, ..
            } => Node::Heading {
                level: level as u8,
                id: id.map(|id| id.to_string()),
                classes: classes.iter().map(|c| c.to_string()).collect(),
                permalink: false,
                children: vec![],
            },
            Tag::BlockQuote(_) => Node::Blockquote { children: vec![] },
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                        Some(info.trim().to_string())
                    }
                    _ => None,
                };
                self.code = Some((info, String::new()));
                return;
            }
            Tag::HtmlBlock => {
                self.in_html_block = true;
                return;
            }
            Tag::List(start) => Node::List {
                ordered: start.is_some(),
                start,
                children: vec![],
            },
            Tag::Item => Node::ListItem {
                checked: None,
                children: vec![],
            },
            Tag::FootnoteDefinition(label) => Node::FootnoteDefinition {
                label: label.to_string(),
                children: vec![],
            },
            Tag::Table(alignments) => {
                self.table_alignments = alignments.into_iter().map(Alignment::from).collect();
                Node::Table {
                    alignments: self.table_alignments.clone(),
                    children: vec![],
                }
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.table_cell = 0;
                Node::TableRow {
                    header: true,
                    children: vec![],
                }
            }
            Tag::TableRow => {
                self.table_cell = 0;
                Node::TableRow {
                    header: false,
                    children: vec![],
                }
            }
            Tag::TableCell => {
                let alignment = self
                    .table_alignments
                    .get(self.table_cell)
                    .copied()
                    .unwrap_or_default();
                self.table_cell += 1;
                Node::TableCell {
                    alignment,
                    header: self.in_table_head,
                    children: vec![],
                }
            }
            Tag::Emphasis => Node::Emphasis { children: vec![] },
            Tag::Strong => Node::Strong { children: vec![] },
            Tag::Strikethrough => Node::Strikethrough { children: vec![] },
            Tag::Link {
                dest_url, title, ..
            } => Node::Link {
                href: dest_url.to_string(),
                title: non_empty(&title),
                children: vec![],
            },
            Tag::Image {
                dest_url, title, ..
            } => Node::Image {
                src: dest_url.to_string(),
                alt: String::new(),
                title: non_empty(&title),
            },
            // Definition lists, superscripts and the like keep their content only
            _ => {
                self.stack.push(Frame {
                    node: Node::Paragraph { children: vec![] },
                    kind: FrameKind::Transparent,
                });
                return;
            }
        };
        self.stack.push(Frame {
            node,
            kind: FrameKind::Markdown,
        });
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                if let Some((info, code)) = self.code.take() {
                    let (language, meta) = split_info(info);
                    self.push(Node::CodeBlock {
                        language,
                        title: None,
                        meta,
                        code,
                        lines: vec![],
                    });
                }
            }
            TagEnd::HtmlBlock => {
                self.flush_block_markdown();
                self.in_html_block = false;
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close_frame();
            }
            _ => self.close_frame(),
        }
    }

    /// Close the innermost markdown frame, auto-closing components left open inside it.
    fn close_frame(&mut self) {
        while self
            .stack
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::Component)
        {
            self.pop();
        }
        self.pop();
    }

    fn pop(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match (frame.kind, frame.node) {
            (FrameKind::Transparent, Node::Paragraph { children }) => {
                for child in children {
                    self.push(child);
                }
            }
            (_, node) => self.push(node),
        }
    }

    fn html(&mut self, html: &str) {
        for token in jsx::scan(html) {
            if let Token::Text(text) = &token
                && self.in_html_block
                && self.in_component()
            {
                self.block_markdown.push_str(text);
                continue;
            }
            self.flush_block_markdown();
            match token {
                Token::Open {
                    name,
                    props,
                    self_closing,
                } => {
                    let node = self.component(name, props);
                    if self_closing {
                        self.push(node);
                    } else {
                        self.stack.push(Frame {
                            node,
                            kind: FrameKind::Component,
                        });
                    }
                }
                Token::Close { name } => self.close_component(&name),
                Token::Html(raw) => self.push(Node::Html { value: raw }),
                Token::Text(text) => {
                    // Line breaks between tags in an HTML block are layout, not content
                    if !(self.in_html_block && text.trim().is_empty()) {
                        self.push_text(&text);
                    }
                }
            }
        }
    }

    fn in_component(&self) -> bool {
        self.stack
            .last()
            .is_some_and(|frame| frame.kind == FrameKind::Component)
    }

    /// Parse text collected from an HTML block as markdown of its own.
    ///
    /// A component written without blank lines around its content is a single
    /// HTML block, so the parser hands its content over unparsed.
    fn flush_block_markdown(&mut self) {
        let markdown = std::mem::take(&mut self.block_markdown);
        if markdown.trim().is_empty() {
            return;
        }
        let mut nested = TreeBuilder::new(self.registry, self.scope, self.options);
        nested.feed(&markdown);
        let (nodes, unresolved) = nested.into_parts();
        for name in unresolved {
            if !self.unresolved.contains(&name) {
                self.unresolved.push(name);
            }
        }
        for node in nodes {
            self.push(node);
        }
    }

    fn component(&mut self, name: String, props: Vec<(String, PropValue)>) -> Node {
        let props: Props = props
            .into_iter()
            .map(|(key, value)| (key, self.prop_value(value)))
            .collect();

        if self.registry.get(&name).is_some() {
            Node::Component {
                name,
                props,
                children: vec![],
            }
        } else {
            if !self.unresolved.contains(&name) {
                self.unresolved.push(name.clone());
            }
            Node::Unresolved {
                name,
                props,
                children: vec![],
            }
        }
    }

    fn prop_value(&self, value: PropValue) -> serde_json::Value {
        match value {
            PropValue::Literal(s) => serde_json::Value::String(interpolate(&s, self.scope)),
            PropValue::Flag => serde_json::Value::Bool(true),
            PropValue::Expression(expr) => match self.scope.get(&expr) {
                Some(value) => serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                None => serde_json::from_str(&expr).unwrap_or(serde_json::Value::String(expr)),
            },
        }
    }

    fn close_component(&mut self, name: &str) {
        let open = self
            .stack
            .iter()
            .rev()
            .take_while(|frame| frame.kind == FrameKind::Component)
            .any(|frame| frame_name(&frame.node) == Some(name));
        if !open {
            tracing::debug!(component = %name, "ignoring closing tag with no matching open tag");
            return;
        }
        while let Some(frame) = self.stack.last() {
            let matched = frame_name(&frame.node) == Some(name);
            self.pop();
            if matched {
                break;
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        self.push(Node::Text {
            value: text.to_string(),
        });
    }

    /// Attach a finished node to the innermost open container.
    fn push(&mut self, node: Node) {
        let siblings = match self.stack.last_mut() {
            Some(Frame {
                node: Node::Image { alt, .. },
                ..
            }) => {
                alt.push_str(&node.text_content());
                return;
            }
            Some(frame) => match frame.node.children_mut() {
                Some(children) => children,
                None => return,
            },
            None => &mut self.root,
        };

        // Merge adjacent text so expressions split across events still resolve
        if let (Some(Node::Text { value: prev }), Node::Text { value }) = (siblings.last_mut(), &node)
        {
            prev.push_str(value);
            return;
        }
        siblings.push(node);
    }

    fn into_parts(mut self) -> (Vec<Node>, Vec<String>) {
        self.flush_block_markdown();
        while !self.stack.is_empty() {
            self.pop();
        }
        (self.root, self.unresolved)
    }

    fn finish(self) -> ParsedTree {
        let scope = self.scope;
        let (root, unresolved) = self.into_parts();
        let mut tree = RenderTree::new(root);
        tree.walk_mut(&mut |node| {
            if let Node::Text { value } = node {
                *value = interpolate(value, scope);
            }
        });

        ParsedTree { tree, unresolved }
    }
}

fn frame_name(node: &Node) -> Option<&str> {
    match node {
        Node::Component { name, .. } | Node::Unresolved { name, .. } => Some(name),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Split a fence info string into language and the rest.
fn split_info(info: Option<String>) -> (Option<String>, Option<String>) {
    let Some(info) = info else {
        return (None, None);
    };
    match info.split_once(char::is_whitespace) {
        Some((language, meta)) => (Some(language.to_string()), non_empty(meta.trim())),
        None => (Some(info), None),
    }
}

/// Replace `{key}` with the matching front matter scalar. Unknown keys stay as written.
pub fn interpolate(text: &str, scope: &FrontMatter) -> String {
    if !text.contains('{') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = after[..close].trim();
            let valid = !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            valid
                .then(|| scope.scalar(key))
                .flatten()
                .map(|value| (value, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl From<pulldown_cmark::Alignment> for Alignment {
    fn from(alignment: pulldown_cmark::Alignment) -> Self {
        match alignment {
            pulldown_cmark::Alignment::None => Alignment::None,
            pulldown_cmark::Alignment::Left => Alignment::Left,
            pulldown_cmark::Alignment::Center => Alignment::Center,
            pulldown_cmark::Alignment::Right => Alignment::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tree::NodeKind;

    fn parse(markdown: &str) -> ParsedTree {
        let options = parser_options(&["tables".to_string(), "tasklists".to_string()]).unwrap();
        parse_tree(
            markdown,
            options,
            &ComponentRegistry::with_defaults(),
            &FrontMatter::default(),
        )
    }

    fn text(value: &str) -> Node {
        Node::Text {
            value: value.to_string(),
        }
    }

    #[test]
    fn test_single_paragraph() {
        let parsed = parse("Hi");
        assert_eq!(
            parsed.tree.children,
            vec![Node::Paragraph {
                children: vec![text("Hi")]
            }]
        );
    }

    #[test]
    fn test_block_structure() {
        let parsed = parse("# Title\n\n> quoted\n\n- one\n- two\n\n1. first\n");
        let kinds: Vec<_> = parsed.tree.children.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(NodeKind::Heading(1)),
                Some(NodeKind::Blockquote),
                Some(NodeKind::UnorderedList),
                Some(NodeKind::OrderedList),
            ]
        );
        assert_eq!(parsed.tree.children[2].children().len(), 2);
    }

    #[test]
    fn test_inline_nodes() {
        let parsed = parse("*em* **strong** `code` [link](https://example.com \"t\")");
        let para = &parsed.tree.children[0];
        assert!(matches!(&para.children()[0], Node::Emphasis { .. }));
        assert!(para
            .children()
            .iter()
            .any(|n| matches!(n, Node::Strong { .. })));
        assert!(para
            .children()
            .iter()
            .any(|n| matches!(n, Node::InlineCode { value } if value == "code")));
        assert!(para.children().iter().any(|n| matches!(
            n,
            Node::Link { href, title: Some(t), .. } if href == "https://example.com" && t == "t"
        )));
    }

    #[test]
    fn test_image_alt_collected() {
        let parsed = parse("![a *cat*](cat.png)");
        assert_eq!(
            parsed.tree.children[0].children()[0],
            Node::Image {
                src: "cat.png".to_string(),
                alt: "a cat".to_string(),
                title: None,
            }
        );
    }

    #[test]
    fn test_code_block_info_split() {
        let parsed = parse("```rust:main.rs {1}\nfn main() {}\n```");
        assert_eq!(
            parsed.tree.children[0],
            Node::CodeBlock {
                language: Some("rust:main.rs".to_string()),
                title: None,
                meta: Some("{1}".to_string()),
                code: "fn main() {}\n".to_string(),
                lines: vec![],
            }
        );
    }

    #[test]
    fn test_table_with_alignment() {
        let parsed = parse("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        let Node::Table { alignments, children } = &parsed.tree.children[0] else {
            panic!("expected table, got {:?}", parsed.tree.children[0]);
        };
        assert_eq!(alignments, &vec![Alignment::Left, Alignment::Right]);
        assert_eq!(children.len(), 2);
        assert!(matches!(&children[0], Node::TableRow { header: true, .. }));
        assert!(matches!(
            &children[1].children()[1],
            Node::TableCell { alignment: Alignment::Right, header: false, .. }
        ));
    }

    #[test]
    fn test_task_list() {
        let parsed = parse("- [x] done\n- [ ] todo\n");
        let items = parsed.tree.children[0].children();
        assert!(matches!(&items[0], Node::ListItem { checked: Some(true), .. }));
        assert!(matches!(&items[1], Node::ListItem { checked: Some(false), .. }));
    }

    #[test]
    fn test_block_component_wraps_markdown() {
        let parsed = parse("<Callout type=\"note\">\n\nSome **bold** text.\n\n</Callout>\n\nAfter");
        assert!(parsed.unresolved.is_empty());
        let Node::Component { name, props, children } = &parsed.tree.children[0] else {
            panic!("expected component, got {:?}", parsed.tree.children[0]);
        };
        assert_eq!(name, "Callout");
        assert_eq!(props["type"], "note");
        assert!(matches!(&children[0], Node::Paragraph { .. }));
        assert!(matches!(&parsed.tree.children[1], Node::Paragraph { .. }));
    }

    #[test]
    fn test_component_content_without_blank_lines_is_markdown() {
        let parsed = parse("<Callout>\n**Note** hi <Chart />\n</Callout>\n\nAfter");
        assert_eq!(parsed.unresolved, vec!["Chart"]);
        let Node::Component { name, children, .. } = &parsed.tree.children[0] else {
            panic!("expected component, got {:?}", parsed.tree.children[0]);
        };
        assert_eq!(name, "Callout");
        let Node::Paragraph { children: para } = &children[0] else {
            panic!("expected paragraph, got {:?}", children[0]);
        };
        assert!(matches!(&para[0], Node::Strong { .. }));
        assert_eq!(para[1], text(" hi"));
        assert!(matches!(&children[1], Node::Unresolved { name, .. } if name == "Chart"));
        assert!(matches!(&parsed.tree.children[1], Node::Paragraph { .. }));
    }

    #[test]
    fn test_inline_component() {
        let parsed = parse("New <Badge>beta</Badge> feature");
        let para = parsed.tree.children[0].children();
        assert_eq!(para[0], text("New "));
        assert!(matches!(
            &para[1],
            Node::Component { name, children, .. } if name == "Badge" && children == &vec![text("beta")]
        ));
        assert_eq!(para[2], text(" feature"));
    }

    #[test]
    fn test_unregistered_component_is_opaque() {
        let parsed = parse("<Chart data={3} />\n\n<Chart />");
        assert_eq!(parsed.unresolved, vec!["Chart"]);
        assert!(matches!(
            &parsed.tree.children[0],
            Node::Unresolved { name, props, .. } if name == "Chart" && props["data"] == serde_json::json!(3)
        ));
    }

    #[test]
    fn test_unclosed_inline_component_closed_with_paragraph() {
        let parsed = parse("a <Badge>b\n\nc");
        assert_eq!(parsed.tree.children.len(), 2);
        assert!(matches!(
            &parsed.tree.children[0].children()[1],
            Node::Component { name, .. } if name == "Badge"
        ));
    }

    #[test]
    fn test_plain_html_passes_through() {
        let parsed = parse("<div class=\"x\">raw</div>\n");
        assert!(matches!(&parsed.tree.children[0], Node::Html { value } if value.contains("<div")));
    }

    #[test]
    fn test_scope_interpolation() {
        let mut scope = FrontMatter::default();
        scope.insert("title", serde_yaml::Value::String("Hello".to_string()));
        scope.insert("views", serde_yaml::Value::Number(42.into()));
        let parsed = parse_tree(
            "Welcome to {title} ({views} views, {missing})\n\n<Badge label={title} />",
            Options::empty(),
            &ComponentRegistry::with_defaults(),
            &scope,
        );
        assert_eq!(
            parsed.tree.children[0].text_content(),
            "Welcome to Hello (42 views, {missing})"
        );
        assert!(matches!(
            &parsed.tree.children[1],
            Node::Component { props, .. } if props["label"] == "Hello"
        ));
    }

    #[test]
    fn test_interpolate_leaves_code_like_braces() {
        let scope = FrontMatter::default();
        assert_eq!(interpolate("fn x() { y }", &scope), "fn x() { y }");
        assert_eq!(interpolate("{", &scope), "{");
    }

    #[test]
    fn test_invalid_extension() {
        assert!(matches!(
            parser_options(&["not_a_real_extension".to_string()]),
            Err(MarkdownError::InvalidExtension(_))
        ));
    }
}
