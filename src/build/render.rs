//! Render tree to HTML.
//!
//! Rendering is a pure walk: the same tree and the same style sheet always
//! produce byte-identical output. All presentation decisions come from the
//! injected [`StyleSheet`] and [`ComponentRegistry`].

use std::fmt::Write;

use super::components::ComponentRegistry;
use super::style::StyleSheet;
use super::tree::{Alignment, CodeLine, Node, NodeKind, Props, RenderTree};
use crate::util::html_escape;

pub struct Renderer {
    styles: StyleSheet,
    components: ComponentRegistry,
}

impl Renderer {
    pub fn new(styles: StyleSheet, components: ComponentRegistry) -> Self {
        Self { styles, components }
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Render a whole tree to an HTML fragment.
    pub fn render(&self, tree: &RenderTree) -> String {
        let mut out = String::new();
        self.render_nodes(&tree.children, &mut out);
        out
    }

    fn render_nodes(&self, nodes: &[Node], out: &mut String) {
        for node in nodes {
            self.render_node(node, out);
        }
    }

    fn open(&self, out: &mut String, tag: &str, kind: NodeKind) {
        let _ = write!(out, "<{tag} class=\"{}\">", self.styles.class(kind));
    }

    fn wrap(&self, out: &mut String, tag: &str, kind: NodeKind, children: &[Node]) {
        self.open(out, tag, kind);
        self.render_nodes(children, out);
        let _ = write!(out, "</{tag}>");
    }

    fn render_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Heading {
                level,
                id,
                classes,
                permalink,
                children,
            } => {
                let kind = NodeKind::Heading(*level);
                let mut class = self.styles.class(kind).to_string();
                for extra in classes {
                    class.push(' ');
                    class.push_str(&html_escape(extra));
                }
                let _ = write!(out, "<h{level}");
                if let Some(id) = id {
                    let _ = write!(out, " id=\"{}\"", html_escape(id));
                }
                let _ = write!(out, " class=\"{class}\">");
                self.render_nodes(children, out);
                if *permalink && let Some(id) = id {
                    let _ = write!(
                        out,
                        "<a class=\"heading-anchor\" href=\"#{}\" aria-hidden=\"true\">#</a>",
                        html_escape(id)
                    );
                }
                let _ = write!(out, "</h{level}>");
            }
            Node::Paragraph { children } => self.wrap(out, "p", NodeKind::Paragraph, children),
            Node::Blockquote { children } => {
                self.wrap(out, "blockquote", NodeKind::Blockquote, children)
            }
            Node::List {
                ordered: true,
                start,
                children,
            } => {
                let _ = write!(out, "<ol class=\"{}\"", self.styles.class(NodeKind::OrderedList));
                if let Some(start) = start.filter(|s| *s != 1) {
                    let _ = write!(out, " start=\"{start}\"");
                }
                out.push('>');
                self.render_nodes(children, out);
                out.push_str("</ol>");
            }
            Node::List {
                ordered: false,
                children,
                ..
            } => self.wrap(out, "ul", NodeKind::UnorderedList, children),
            Node::ListItem { checked, children } => {
                self.open(out, "li", NodeKind::ListItem);
                if let Some(checked) = checked {
                    let mark = if *checked { " checked" } else { "" };
                    let _ = write!(out, "<input type=\"checkbox\" disabled{mark}> ");
                }
                self.render_nodes(children, out);
                out.push_str("</li>");
            }
            Node::CodeBlock {
                language,
                title,
                code,
                lines,
                ..
            } => self.render_code_block(language.as_deref(), title.as_deref(), code, lines, out),
            Node::InlineCode { value } => {
                self.open(out, "code", NodeKind::InlineCode);
                out.push_str(&html_escape(value));
                out.push_str("</code>");
            }
            Node::Link {
                href,
                title,
                children,
            } => {
                let _ = write!(
                    out,
                    "<a class=\"{}\" href=\"{}\"",
                    self.styles.class(NodeKind::Link),
                    html_escape(href)
                );
                if let Some(title) = title {
                    let _ = write!(out, " title=\"{}\"", html_escape(title));
                }
                out.push('>');
                self.render_nodes(children, out);
                out.push_str("</a>");
            }
            Node::Image { src, alt, title } => {
                let _ = write!(
                    out,
                    "<img class=\"{}\" src=\"{}\" alt=\"{}\"",
                    self.styles.class(NodeKind::Image),
                    html_escape(src),
                    html_escape(alt)
                );
                if let Some(title) = title {
                    let _ = write!(out, " title=\"{}\"", html_escape(title));
                }
                out.push('>');
            }
            Node::Emphasis { children } => self.wrap(out, "em", NodeKind::Emphasis, children),
            Node::Strong { children } => self.wrap(out, "strong", NodeKind::Strong, children),
            Node::Strikethrough { children } => {
                self.wrap(out, "del", NodeKind::Strikethrough, children)
            }
            Node::Table { children, .. } => {
                self.open(out, "table", NodeKind::Table);
                let (head, body): (Vec<&Node>, Vec<&Node>) = children
                    .iter()
                    .partition(|row| matches!(row, Node::TableRow { header: true, .. }));
                if !head.is_empty() {
                    out.push_str("<thead>");
                    for row in head {
                        self.render_node(row, out);
                    }
                    out.push_str("</thead>");
                }
                if !body.is_empty() {
                    out.push_str("<tbody>");
                    for row in body {
                        self.render_node(row, out);
                    }
                    out.push_str("</tbody>");
                }
                out.push_str("</table>");
            }
            Node::TableRow { children, .. } => self.wrap(out, "tr", NodeKind::TableRow, children),
            Node::TableCell {
                alignment,
                header,
                children,
            } => {
                let tag = if *header { "th" } else { "td" };
                let _ = write!(out, "<{tag} class=\"{}\"", self.styles.class(NodeKind::TableCell));
                if let Some(align) = alignment_attr(*alignment) {
                    let _ = write!(out, " style=\"text-align: {align}\"");
                }
                out.push('>');
                self.render_nodes(children, out);
                let _ = write!(out, "</{tag}>");
            }
            Node::FootnoteReference { label } => {
                let label = html_escape(label);
                let _ = write!(
                    out,
                    "<sup class=\"footnote-reference\"><a href=\"#fn-{label}\">{label}</a></sup>"
                );
            }
            Node::FootnoteDefinition { label, children } => {
                let label = html_escape(label);
                let _ = write!(
                    out,
                    "<div class=\"footnote-definition\" id=\"fn-{label}\"><sup class=\"footnote-definition-label\">{label}</sup>"
                );
                self.render_nodes(children, out);
                out.push_str("</div>");
            }
            Node::ThematicBreak => {
                let _ = write!(out, "<hr class=\"{}\">", self.styles.class(NodeKind::ThematicBreak));
            }
            Node::LineBreak => out.push_str("<br>"),
            Node::Text { value } => out.push_str(&html_escape(value)),
            Node::Html { value } => out.push_str(value),
            Node::Component {
                name,
                props,
                children,
            } => match self.components.get(name) {
                Some(handler) => {
                    let _ = write!(out, "<{} class=\"{}\"", handler.tag, handler.class);
                    write_props(props, out);
                    out.push('>');
                    self.render_nodes(children, out);
                    let _ = write!(out, "</{}>", handler.tag);
                }
                None => self.render_opaque(name, props, children, out),
            },
            Node::Unresolved {
                name,
                props,
                children,
            } => self.render_opaque(name, props, children, out),
        }
    }

    /// An element nobody knows how to render. Keeps its name and props.
    fn render_opaque(&self, name: &str, props: &Props, children: &[Node], out: &mut String) {
        let _ = write!(
            out,
            "<div class=\"mdx-unresolved\" data-component=\"{}\"",
            html_escape(name)
        );
        write_props(props, out);
        out.push('>');
        self.render_nodes(children, out);
        out.push_str("</div>");
    }

    fn render_code_block(
        &self,
        language: Option<&str>,
        title: Option<&str>,
        code: &str,
        lines: &[CodeLine],
        out: &mut String,
    ) {
        out.push_str("<div class=\"code-block\">");
        if let Some(title) = title {
            let _ = write!(out, "<div class=\"code-title\">{}</div>", html_escape(title));
        }
        let _ = write!(out, "<pre class=\"{}\"><code", self.styles.class(NodeKind::CodeBlock));
        if let Some(language) = language {
            let _ = write!(out, " class=\"language-{}\"", html_escape(language));
        }
        out.push('>');
        if lines.is_empty() {
            out.push_str(&html_escape(code));
        } else {
            for line in lines {
                let marked = if line.highlighted { " highlight-line" } else { "" };
                let _ = writeln!(
                    out,
                    "<span class=\"code-line{marked}\" data-line=\"{}\">{}</span>",
                    line.number, line.html
                );
            }
        }
        out.push_str("</code></pre></div>");
    }
}

fn alignment_attr(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

/// Props as `data-*` attributes. Keys are lowercased, non-string values as JSON.
fn write_props(props: &Props, out: &mut String) {
    for (key, value) in props {
        let key: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let _ = write!(out, " data-{key}=\"{}\"", html_escape(&value));
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

    fn renderer() -> Renderer {
        Renderer::new(StyleSheet::with_defaults(), ComponentRegistry::with_defaults())
    }

    #[test]
    fn test_render_paragraph_with_link() {
        let tree = RenderTree::new(vec![Node::Paragraph {
            children: vec![
                text("see "),
                Node::Link {
                    href: "https://example.com?a=1&b=2".to_string(),
                    title: None,
                    children: vec![text("here")],
                },
            ],
        }]);
        assert_eq!(
            renderer().render(&tree),
            "<p class=\"post-p\">see <a class=\"post-a\" href=\"https://example.com?a=1&amp;b=2\">here</a></p>"
        );
    }

    #[test]
    fn test_render_heading_with_permalink() {
        let tree = RenderTree::new(vec![Node::Heading {
            level: 2,
            id: Some("intro".to_string()),
            classes: vec![],
            permalink: true,
            children: vec![text("Intro")],
        }]);
        assert_eq!(
            renderer().render(&tree),
            "<h2 id=\"intro\" class=\"post-h2\">Intro<a class=\"heading-anchor\" href=\"#intro\" aria-hidden=\"true\">#</a></h2>"
        );
    }

    #[test]
    fn test_text_is_escaped_html_is_not() {
        let tree = RenderTree::new(vec![
            text("<script>"),
            Node::Html {
                value: "<br/>".to_string(),
            },
        ]);
        assert_eq!(renderer().render(&tree), "&lt;script&gt;<br/>");
    }

    #[test]
    fn test_render_component_and_unresolved() {
        let props = Props::from([("type".to_string(), serde_json::json!("warning"))]);
        let tree = RenderTree::new(vec![
            Node::Component {
                name: "Callout".to_string(),
                props: props.clone(),
                children: vec![text("careful")],
            },
            Node::Unresolved {
                name: "Chart".to_string(),
                props: Props::from([("data".to_string(), serde_json::json!(3))]),
                children: vec![],
            },
        ]);
        assert_eq!(
            renderer().render(&tree),
            "<aside class=\"mdx-callout\" data-type=\"warning\">careful</aside>\
             <div class=\"mdx-unresolved\" data-component=\"Chart\" data-data=\"3\"></div>"
        );
    }

    #[test]
    fn test_render_code_block_lines() {
        let tree = RenderTree::new(vec![Node::CodeBlock {
            language: Some("rust".to_string()),
            title: Some("main.rs".to_string()),
            meta: None,
            code: "a\nb\n".to_string(),
            lines: vec![
                CodeLine {
                    number: 1,
                    html: "a".to_string(),
                    highlighted: false,
                },
                CodeLine {
                    number: 2,
                    html: "b".to_string(),
                    highlighted: true,
                },
            ],
        }]);
        let html = renderer().render(&tree);
        assert!(html.starts_with("<div class=\"code-block\"><div class=\"code-title\">main.rs</div>"));
        assert!(html.contains("<code class=\"language-rust\">"));
        assert!(html.contains("<span class=\"code-line\" data-line=\"1\">a</span>"));
        assert!(html.contains("<span class=\"code-line highlight-line\" data-line=\"2\">b</span>"));
    }

    #[test]
    fn test_render_uses_injected_styles() {
        let mut overrides = std::collections::BTreeMap::new();
        overrides.insert(
            "p".to_string(),
            crate::config::StyleOverride {
                class: Some("prose".to_string()),
                ..Default::default()
            },
        );
        let renderer = Renderer::new(
            StyleSheet::from_overrides(&overrides).unwrap(),
            ComponentRegistry::new(),
        );
        let tree = RenderTree::new(vec![Node::Paragraph {
            children: vec![text("x")],
        }]);
        assert_eq!(renderer.render(&tree), "<p class=\"prose\">x</p>");
    }

    #[test]
    fn test_render_table() {
        let cell = |header: bool, value: &str| Node::TableCell {
            alignment: Alignment::Center,
            header,
            children: vec![text(value)],
        };
        let tree = RenderTree::new(vec![Node::Table {
            alignments: vec![Alignment::Center],
            children: vec![
                Node::TableRow {
                    header: true,
                    children: vec![cell(true, "h")],
                },
                Node::TableRow {
                    header: false,
                    children: vec![cell(false, "d")],
                },
            ],
        }]);
        let html = renderer().render(&tree);
        assert!(html.contains("<thead><tr class=\"post-tr\"><th class=\"post-td\" style=\"text-align: center\">h</th></tr></thead>"));
        assert!(html.contains("<tbody><tr class=\"post-tr\"><td class=\"post-td\" style=\"text-align: center\">d</td></tr></tbody>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let tree = RenderTree::new(vec![Node::Component {
            name: "Badge".to_string(),
            props: Props::from([
                ("b".to_string(), serde_json::json!(true)),
                ("a".to_string(), serde_json::json!("x")),
            ]),
            children: vec![],
        }]);
        let r = renderer();
        assert_eq!(r.render(&tree), r.render(&tree));
        assert_eq!(
            r.render(&tree),
            "<span class=\"mdx-badge\" data-a=\"x\" data-b=\"true\"></span>"
        );
    }
}
