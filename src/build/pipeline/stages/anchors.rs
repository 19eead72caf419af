use std::collections::{HashMap, HashSet};

use crate::build::pipeline::{PipelineError, Stage, StageContext};
use crate::build::tree::{Node, RenderTree};

/// Assigns every heading a unique id derived from its text.
///
/// Ids already present (from `{#custom}` attributes) are kept and reserved
/// up front. Repeats get a numeric suffix in document order: `intro`,
/// `intro-1`, `intro-2`.
pub struct AnchorsStage;

impl Stage for AnchorsStage {
    fn name(&self) -> &'static str {
        "anchors"
    }

    fn process(&self, tree: &mut RenderTree, _ctx: &StageContext) -> Result<(), PipelineError> {
        let mut slugger = Slugger::default();
        tree.walk(&mut |node| {
            if let Node::Heading { id: Some(id), .. } = node {
                slugger.reserve(id);
            }
        });
        tree.walk_mut(&mut |node| {
            if matches!(node, Node::Heading { id: None, .. }) {
                let text = node.text_content();
                if let Node::Heading { id, .. } = node {
                    *id = Some(slugger.slug(&text));
                }
            }
        });
        Ok(())
    }
}

/// Produces unique slugs within one document.
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
    counts: HashMap<String, usize>,
}

impl Slugger {
    /// Mark an id as taken without generating it.
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// Slug for `text`, suffixed until it is unique.
    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }
        let mut id = base.clone();
        let count = self.counts.entry(base.clone()).or_insert(0);
        while self.used.contains(&id) {
            *count += 1;
            id = format!("{base}-{count}");
        }
        self.used.insert(id.clone());
        id
    }
}

/// Lowercase, whitespace to dashes, drop punctuation.
pub fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '_', "")
}
