//! Registry of embedded components.
//!
//! Posts can embed elements like `<Callout type="warning">...</Callout>`.
//! Each name maps to a handler describing the element it renders as. The
//! registry is closed: it is built and validated once at startup, and names
//! missing from it compile to opaque pass-through nodes.

use std::collections::BTreeMap;

use super::jsx::is_component_name;
use crate::config::ComponentConfig;

#[derive(thiserror::Error, Debug)]
pub enum ComponentError {
    #[error("invalid component name '{0}': must start with an uppercase letter")]
    InvalidName(String),

    #[error("invalid tag '{tag}' for component '{name}'")]
    InvalidTag { name: String, tag: String },

    #[error("invalid class '{class}' for component '{name}'")]
    InvalidClass { name: String, class: String },
}

/// How one component renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandler {
    /// HTML element emitted for the component
    pub tag: String,
    /// Class attribute of the element
    pub class: String,
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    handlers: BTreeMap<String, ComponentHandler>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in components.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (name, tag) in [("Callout", "aside"), ("Badge", "span"), ("Figure", "figure")] {
            registry.handlers.insert(
                name.to_string(),
                ComponentHandler {
                    tag: tag.to_string(),
                    class: default_class(name),
                },
            );
        }
        registry
    }

    /// Built-in components plus the ones from config. Config entries win.
    pub fn from_config(
        components: &BTreeMap<String, ComponentConfig>,
    ) -> Result<Self, ComponentError> {
        let mut registry = Self::with_defaults();
        for (name, config) in components {
            let class = config.class.clone().unwrap_or_else(|| default_class(name));
            registry.register(name, ComponentHandler {
                tag: config.tag.clone(),
                class,
            })?;
        }
        Ok(registry)
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        name: &str,
        handler: ComponentHandler,
    ) -> Result<(), ComponentError> {
        if !is_component_name(name) {
            return Err(ComponentError::InvalidName(name.to_string()));
        }
        let tag_ok = handler
            .tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && handler
                .tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !tag_ok {
            return Err(ComponentError::InvalidTag {
                name: name.to_string(),
                tag: handler.tag,
            });
        }
        if handler
            .class
            .chars()
            .any(|c| matches!(c, '"' | '\'' | '<' | '>' | '&'))
        {
            return Err(ComponentError::InvalidClass {
                name: name.to_string(),
                class: handler.class,
            });
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ComponentHandler> {
        self.handlers.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// "Callout" -> "mdx-callout", "CodeSandbox" -> "mdx-code-sandbox"
fn default_class(name: &str) -> String {
    let mut class = String::from("mdx-");
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                class.push('-');
            }
            class.push(c.to_ascii_lowercase());
        } else if c == '.' || c == '_' {
            class.push('-');
        } else {
            class.push(c);
        }
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = ComponentRegistry::with_defaults();
        assert!(registry.get("Callout").is_some());
        assert_eq!(registry.get("Badge").unwrap().tag, "span");
        assert!(registry.get("callout").is_none());
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["Badge", "Callout", "Figure"]
        );
    }

    #[test]
    fn test_default_class() {
        assert_eq!(default_class("Callout"), "mdx-callout");
        assert_eq!(default_class("CodeSandbox"), "mdx-code-sandbox");
    }

    #[test]
    fn test_from_config_overrides_and_adds() {
        let mut components = BTreeMap::new();
        components.insert(
            "Callout".to_string(),
            ComponentConfig {
                tag: "section".to_string(),
                class: Some("note".to_string()),
            },
        );
        components.insert(
            "YouTube".to_string(),
            ComponentConfig {
                tag: "div".to_string(),
                class: None,
            },
        );
        let registry = ComponentRegistry::from_config(&components).unwrap();
        assert_eq!(
            registry.get("Callout"),
            Some(&ComponentHandler {
                tag: "section".to_string(),
                class: "note".to_string(),
            })
        );
        assert_eq!(registry.get("YouTube").unwrap().class, "mdx-you-tube");
    }

    #[test]
    fn test_invalid_registrations_rejected() {
        let mut registry = ComponentRegistry::new();
        let handler = ComponentHandler {
            tag: "div".to_string(),
            class: "x".to_string(),
        };
        assert!(matches!(
            registry.register("lowercase", handler.clone()),
            Err(ComponentError::InvalidName(_))
        ));
        assert!(matches!(
            registry.register(
                "Good",
                ComponentHandler {
                    tag: "<script>".to_string(),
                    class: "x".to_string(),
                }
            ),
            Err(ComponentError::InvalidTag { .. })
        ));
        assert!(matches!(
            registry.register(
                "Good",
                ComponentHandler {
                    tag: "div".to_string(),
                    class: "\" onload=\"x".to_string(),
                }
            ),
            Err(ComponentError::InvalidClass { .. })
        ));
        assert!(registry.register("Good", handler).is_ok());
    }
}
