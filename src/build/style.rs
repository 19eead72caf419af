//! Style mapping from node kinds to classes and CSS.
//!
//! The renderer never decides how things look: every styled node gets the
//! class from this sheet, and the sheet is emitted once as `styles.css`.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::tree::NodeKind;
use crate::config::StyleOverride;

/// Page chrome and code block rules that are not tied to a single node kind.
const CHROME_CSS: &str = "\
.post-title { font-size: 42px; font-weight: 800; }
.post-meta > span + span::before { content: \"·\"; margin: 0 0.5em; }
.code-block { position: relative; }
.code-title { font-family: monospace; font-size: 0.875em; padding: 0.5em 1em; border-bottom: 1px solid #e5e7eb; }
.code-line { display: block; }
.code-line.highlight-line { background-color: rgba(59, 130, 246, 0.1); }
.heading-anchor { margin-left: 0.25em; text-decoration: none; opacity: 0.5; }
.mdx-unresolved { display: contents; }
";

#[derive(thiserror::Error, Debug)]
pub enum StyleError {
    #[error("unknown style key '{0}'")]
    UnknownKind(String),

    #[error("invalid class '{class}' for '{key}'")]
    InvalidClass { key: String, class: String },
}

/// Styling for one node kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleRule {
    pub class: String,
    pub declarations: BTreeMap<String, String>,
    /// Child selector (e.g. `> a:hover`) to declarations
    pub nested: BTreeMap<String, BTreeMap<String, String>>,
}

/// Immutable mapping handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    rules: BTreeMap<NodeKind, StyleRule>,
}

impl StyleSheet {
    /// Every kind gets a `post-<key>` class and no declarations.
    pub fn unstyled() -> Self {
        let rules = NodeKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    StyleRule {
                        class: format!("post-{}", kind.key()),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self { rules }
    }

    /// The blog's default look.
    pub fn with_defaults() -> Self {
        let mut sheet = Self::unstyled();

        sheet.declare(
            NodeKind::Heading(2),
            &[
                ("font-weight", "700"),
                ("font-size", "1.5em"),
                ("margin-top", "2em"),
                ("margin-bottom", "1em"),
                ("line-height", "1.3333"),
                ("color", "#111827"),
            ],
        );

        sheet.declare(
            NodeKind::Paragraph,
            &[("margin-top", "1.25em"), ("margin-bottom", "1.25em")],
        );
        sheet.nest(
            NodeKind::Paragraph,
            "> a",
            &[
                ("color", "#3b82f6"),
                ("text-decoration", "underline"),
                ("font-weight", "600"),
                ("transition", "color 150ms ease-in-out"),
            ],
        );
        sheet.nest(NodeKind::Paragraph, "> a:hover", &[("color", "#1d4ed8")]);

        sheet.declare(
            NodeKind::Blockquote,
            &[
                ("font-style", "italic"),
                ("border-left-width", ".25rem"),
                ("border-left-style", "solid"),
                ("border-left-color", "#e5e7eb"),
                ("color", "#111827"),
                ("margin-top", "1.6em"),
                ("margin-bottom", "1.6em"),
                ("padding-left", "1em"),
            ],
        );
        sheet.nest(NodeKind::Blockquote, "> p", &[("font-weight", "600")]);

        sheet.declare(
            NodeKind::UnorderedList,
            &[("list-style-type", "disc"), ("padding-left", "1.625em")],
        );
        sheet.nest(
            NodeKind::UnorderedList,
            "> li",
            &[
                ("padding-left", ".375em"),
                ("margin-top", ".5em"),
                ("margin-bottom", ".5em"),
            ],
        );

        sheet
    }

    /// Defaults with config overrides applied. Overrides merge per property.
    pub fn from_overrides(overrides: &BTreeMap<String, StyleOverride>) -> Result<Self, StyleError> {
        let mut sheet = Self::with_defaults();
        for (key, style) in overrides {
            let kind = NodeKind::from_key(key).ok_or_else(|| StyleError::UnknownKind(key.clone()))?;
            let rule = sheet.rules.entry(kind).or_default();
            if let Some(class) = &style.class {
                if !is_valid_class(class) {
                    return Err(StyleError::InvalidClass {
                        key: key.clone(),
                        class: class.clone(),
                    });
                }
                rule.class = class.clone();
            }
            rule.declarations.extend(style.declarations.clone());
            for (selector, declarations) in &style.nested {
                rule.nested
                    .entry(selector.clone())
                    .or_default()
                    .extend(declarations.clone());
            }
        }
        Ok(sheet)
    }

    /// Class for a node kind.
    pub fn class(&self, kind: NodeKind) -> &str {
        self.rules.get(&kind).map(|rule| rule.class.as_str()).unwrap_or("")
    }

    pub fn rule(&self, kind: NodeKind) -> Option<&StyleRule> {
        self.rules.get(&kind)
    }

    /// Emit the sheet as CSS, in node kind order.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for rule in self.rules.values() {
            if rule.class.is_empty() {
                continue;
            }
            write_block(&mut css, &format!(".{}", rule.class), &rule.declarations);
            for (selector, declarations) in &rule.nested {
                write_block(&mut css, &format!(".{} {}", rule.class, selector), declarations);
            }
        }
        css.push_str(CHROME_CSS);
        css
    }

    fn declare(&mut self, kind: NodeKind, declarations: &[(&str, &str)]) {
        let rule = self.rules.entry(kind).or_default();
        for (property, value) in declarations {
            rule.declarations
                .insert(property.to_string(), value.to_string());
        }
    }

    fn nest(&mut self, kind: NodeKind, selector: &str, declarations: &[(&str, &str)]) {
        let rule = self.rules.entry(kind).or_default();
        let nested = rule.nested.entry(selector.to_string()).or_default();
        for (property, value) in declarations {
            nested.insert(property.to_string(), value.to_string());
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn write_block(css: &mut String, selector: &str, declarations: &BTreeMap<String, String>) {
    if declarations.is_empty() {
        return;
    }
    let _ = writeln!(css, "{selector} {{");
    for (property, value) in declarations {
        let _ = writeln!(css, "  {property}: {value};");
    }
    css.push_str("}\n");
}

fn is_valid_class(class: &str) -> bool {
    !class.is_empty()
        && class
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_class() {
        let sheet = StyleSheet::with_defaults();
        for kind in NodeKind::ALL {
            assert!(!sheet.class(kind).is_empty());
        }
        assert_eq!(sheet.class(NodeKind::Heading(2)), "post-h2");
    }

    #[test]
    fn test_default_css_contains_nested_rules() {
        let css = StyleSheet::with_defaults().to_css();
        assert!(css.contains(".post-h2 {\n  color: #111827;"));
        assert!(css.contains(".post-p > a:hover {\n  color: #1d4ed8;\n}"));
        assert!(css.contains(".post-ul > li {"));
        assert!(css.contains(".post-blockquote > p {\n  font-weight: 600;\n}"));
    }

    #[test]
    fn test_overrides_merge() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "h2".to_string(),
            StyleOverride {
                class: Some("title".to_string()),
                declarations: BTreeMap::from([("color".to_string(), "red".to_string())]),
                nested: BTreeMap::new(),
            },
        );
        let sheet = StyleSheet::from_overrides(&overrides).unwrap();
        let rule = sheet.rule(NodeKind::Heading(2)).unwrap();
        assert_eq!(rule.class, "title");
        assert_eq!(rule.declarations["color"], "red");
        assert_eq!(rule.declarations["font-weight"], "700");
    }

    #[test]
    fn test_unknown_override_key() {
        let overrides = BTreeMap::from([("marquee".to_string(), StyleOverride::default())]);
        assert!(matches!(
            StyleSheet::from_overrides(&overrides),
            Err(StyleError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_invalid_override_class() {
        let overrides = BTreeMap::from([(
            "p".to_string(),
            StyleOverride {
                class: Some("a\"b".to_string()),
                ..Default::default()
            },
        )]);
        assert!(matches!(
            StyleSheet::from_overrides(&overrides),
            Err(StyleError::InvalidClass { .. })
        ));
    }

    #[test]
    fn test_css_is_stable() {
        assert_eq!(
            StyleSheet::with_defaults().to_css(),
            StyleSheet::with_defaults().to_css()
        );
    }
}
