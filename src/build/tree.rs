//! The render tree: a serializable structural representation of a post body.
//!
//! Node kinds are a closed set. Embedded components are either resolved
//! against the component registry (`Component`) or kept as opaque
//! `Unresolved` nodes that carry their name through to the output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Props passed to an embedded component.
pub type Props = BTreeMap<String, serde_json::Value>;

/// A compiled post body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderTree {
    pub children: Vec<Node>,
}

/// Column alignment for table cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// One line of a highlighted code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeLine {
    /// 1-based line number
    pub number: usize,
    /// Highlighted HTML for this line (tags balanced within the line)
    pub html: String,
    /// Marked by a `{1,3-4}` range in the fence meta
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Heading {
        level: u8,
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        classes: Vec<String>,
        #[serde(default)]
        permalink: bool,
        children: Vec<Node>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Blockquote {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        children: Vec<Node>,
    },
    ListItem {
        checked: Option<bool>,
        children: Vec<Node>,
    },
    CodeBlock {
        language: Option<String>,
        title: Option<String>,
        /// Fence info after the language, e.g. `{1,3} title="x"`
        meta: Option<String>,
        code: String,
        /// Filled in by the highlight stage
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        lines: Vec<CodeLine>,
    },
    InlineCode {
        value: String,
    },
    Link {
        href: String,
        title: Option<String>,
        children: Vec<Node>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Strikethrough {
        children: Vec<Node>,
    },
    Table {
        alignments: Vec<Alignment>,
        children: Vec<Node>,
    },
    TableRow {
        header: bool,
        children: Vec<Node>,
    },
    TableCell {
        alignment: Alignment,
        header: bool,
        children: Vec<Node>,
    },
    FootnoteReference {
        label: String,
    },
    FootnoteDefinition {
        label: String,
        children: Vec<Node>,
    },
    ThematicBreak,
    LineBreak,
    Text {
        value: String,
    },
    /// Raw HTML passed through untouched.
    Html {
        value: String,
    },
    /// An embedded element with a registered handler.
    Component {
        name: String,
        props: Props,
        children: Vec<Node>,
    },
    /// An embedded element nobody registered. Rendered as an opaque wrapper.
    Unresolved {
        name: String,
        props: Props,
        children: Vec<Node>,
    },
}

/// Node kind, the key of the style mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Heading(u8),
    Paragraph,
    Blockquote,
    UnorderedList,
    OrderedList,
    ListItem,
    CodeBlock,
    InlineCode,
    Link,
    Image,
    Emphasis,
    Strong,
    Strikethrough,
    Table,
    TableRow,
    TableCell,
    ThematicBreak,
}

impl NodeKind {
    pub const ALL: [NodeKind; 22] = [
        NodeKind::Heading(1),
        NodeKind::Heading(2),
        NodeKind::Heading(3),
        NodeKind::Heading(4),
        NodeKind::Heading(5),
        NodeKind::Heading(6),
        NodeKind::Paragraph,
        NodeKind::Blockquote,
        NodeKind::UnorderedList,
        NodeKind::OrderedList,
        NodeKind::ListItem,
        NodeKind::CodeBlock,
        NodeKind::InlineCode,
        NodeKind::Link,
        NodeKind::Image,
        NodeKind::Emphasis,
        NodeKind::Strong,
        NodeKind::Strikethrough,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::ThematicBreak,
    ];

    /// Config key and default class suffix, named after the HTML element.
    pub fn key(self) -> &'static str {
        match self {
            NodeKind::Heading(1) => "h1",
            NodeKind::Heading(2) => "h2",
            NodeKind::Heading(3) => "h3",
            NodeKind::Heading(4) => "h4",
            NodeKind::Heading(5) => "h5",
            NodeKind::Heading(_) => "h6",
            NodeKind::Paragraph => "p",
            NodeKind::Blockquote => "blockquote",
            NodeKind::UnorderedList => "ul",
            NodeKind::OrderedList => "ol",
            NodeKind::ListItem => "li",
            NodeKind::CodeBlock => "pre",
            NodeKind::InlineCode => "code",
            NodeKind::Link => "a",
            NodeKind::Image => "img",
            NodeKind::Emphasis => "em",
            NodeKind::Strong => "strong",
            NodeKind::Strikethrough => "del",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tr",
            NodeKind::TableCell => "td",
            NodeKind::ThematicBreak => "hr",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl Node {
    /// The styled kind of this node, if it has one.
    pub fn kind(&self) -> Option<NodeKind> {
        Some(match self {
            Node::Heading { level, .. } => NodeKind::Heading(*level),
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Blockquote { .. } => NodeKind::Blockquote,
            Node::List { ordered: true, .. } => NodeKind::OrderedList,
            Node::List { ordered: false, .. } => NodeKind::UnorderedList,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::Link { .. } => NodeKind::Link,
            Node::Image { .. } => NodeKind::Image,
            Node::Emphasis { .. } => NodeKind::Emphasis,
            Node::Strong { .. } => NodeKind::Strong,
            Node::Strikethrough { .. } => NodeKind::Strikethrough,
            Node::Table { .. } => NodeKind::Table,
            Node::TableRow { .. } => NodeKind::TableRow,
            Node::TableCell { .. } => NodeKind::TableCell,
            Node::ThematicBreak => NodeKind::ThematicBreak,
            _ => return None,
        })
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Link { children, .. }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Strikethrough { children }
            | Node::Table { children, .. }
            | Node::TableRow { children, .. }
            | Node::TableCell { children, .. }
            | Node::FootnoteDefinition { children, .. }
            | Node::Component { children, .. }
            | Node::Unresolved { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children, .. }
            | Node::Link { children, .. }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Strikethrough { children }
            | Node::Table { children, .. }
            | Node::TableRow { children, .. }
            | Node::TableCell { children, .. }
            | Node::FootnoteDefinition { children, .. }
            | Node::Component { children, .. }
            | Node::Unresolved { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated text content, as a reader would see it.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { value } | Node::InlineCode { value } => out.push_str(value),
            Node::CodeBlock { code, .. } => out.push_str(code),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::LineBreak => out.push(' '),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl RenderTree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        fn visit(nodes: &mut [Node], f: &mut impl FnMut(&mut Node)) {
            for node in nodes {
                f(node);
                if let Some(children) = node.children_mut() {
                    visit(children, f);
                }
            }
        }
        visit(&mut self.children, f);
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk(&self, f: &mut impl FnMut(&Node)) {
        fn visit(nodes: &[Node], f: &mut impl FnMut(&Node)) {
            for node in nodes {
                f(node);
                visit(node.children(), f);
            }
        }
        visit(&self.children, f);
    }

    /// Number of words a reader will go through, code included.
    pub fn word_count(&self) -> usize {
        self.children
            .iter()
            .map(|node| node.text_content().split_whitespace().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Node {
        Node::Text {
            value: value.to_string(),
        }
    }

    #[test]
    fn test_node_kind_keys_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(NodeKind::from_key("marquee"), None);
    }

    #[test]
    fn test_text_content_and_word_count() {
        let tree = RenderTree::new(vec![
            Node::Heading {
                level: 1,
                id: None,
                classes: vec![],
                permalink: false,
                children: vec![text("Hello "), Node::Emphasis { children: vec![text("world")] }],
            },
            Node::Paragraph {
                children: vec![text("one two three")],
            },
        ]);
        assert_eq!(tree.children[0].text_content(), "Hello world");
        assert_eq!(tree.word_count(), 5);
    }

    #[test]
    fn test_walk_mut_visits_nested_nodes() {
        let mut tree = RenderTree::new(vec![Node::Blockquote {
            children: vec![Node::Paragraph {
                children: vec![text("a"), text("b")],
            }],
        }]);
        let mut count = 0;
        tree.walk_mut(&mut |node| {
            if let Node::Text { value } = node {
                value.push('!');
                count += 1;
            }
        });
        assert_eq!(count, 2);
        assert_eq!(tree.children[0].text_content(), "a!b!");
    }

    #[test]
    fn test_serialized_node_is_tagged() {
        let json = serde_json::to_value(text("Hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["value"], "Hi");
    }
}
