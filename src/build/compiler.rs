//! Body compilation: markdown + embedded components to a transformed render tree.

use std::sync::Arc;

use pulldown_cmark::Options;

use super::components::ComponentRegistry;
use super::document::{CompiledDocument, Document, FrontMatter};
use super::highlight::SyntaxHighlighter;
use super::markdown::{MarkdownError, parse_tree, parser_options};
use super::pipeline::{Pipeline, PipelineError, StageContext};
use super::tree::RenderTree;
use crate::config::{HighlightConfig, MarkdownConfig};

/// Average reading speed used for the reading time estimate.
const WORDS_PER_MINUTE: usize = 200;

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("markdown error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("compile task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Compiles post bodies. Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Compiler {
    inner: Arc<CompilerInner>,
}

struct CompilerInner {
    options: Options,
    registry: ComponentRegistry,
    pipeline: Pipeline,
    highlighter: SyntaxHighlighter,
}

impl Compiler {
    /// Create a compiler with the default transform pipeline.
    pub fn new(
        markdown: &MarkdownConfig,
        highlight: &HighlightConfig,
        registry: ComponentRegistry,
    ) -> Result<Self, CompileError> {
        Self::with_pipeline(markdown, highlight, registry, Pipeline::default_pipeline())
    }

    /// Create a compiler with a custom pipeline. Stage order is checked here.
    pub fn with_pipeline(
        markdown: &MarkdownConfig,
        highlight: &HighlightConfig,
        registry: ComponentRegistry,
        pipeline: Pipeline,
    ) -> Result<Self, CompileError> {
        pipeline.validate()?;
        let options = parser_options(&markdown.extensions)? | pipeline.parser_options();
        Ok(Self {
            inner: Arc::new(CompilerInner {
                options,
                registry,
                pipeline,
                highlighter: SyntaxHighlighter::new(&highlight.theme),
            }),
        })
    }

    pub fn highlighter(&self) -> &SyntaxHighlighter {
        &self.inner.highlighter
    }

    /// Compile a body on the blocking pool.
    pub async fn compile(&self, body: String, scope: FrontMatter) -> Result<RenderTree, CompileError> {
        let compiler = self.clone();
        tokio::task::spawn_blocking(move || compiler.compile_sync(&body, &scope)).await?
    }

    /// Compile a body on the current thread.
    pub fn compile_sync(&self, body: &str, scope: &FrontMatter) -> Result<RenderTree, CompileError> {
        let inner = &self.inner;
        let parsed = parse_tree(body, inner.options, &inner.registry, scope);
        for name in &parsed.unresolved {
            tracing::warn!(component = %name, "no handler registered, rendering as opaque element");
        }

        let mut tree = parsed.tree;
        let ctx = StageContext {
            highlighter: &inner.highlighter,
        };
        inner.pipeline.run(&mut tree, &ctx)?;
        Ok(tree)
    }

    /// Compile a whole document into its stored form.
    pub async fn compile_document(&self, document: Document) -> Result<CompiledDocument, CompileError> {
        let Document {
            slug,
            front_matter,
            body,
            ..
        } = document;
        let render_tree = self.compile(body, front_matter.clone()).await?;
        let reading_minutes = reading_minutes(render_tree.word_count());
        Ok(CompiledDocument {
            slug,
            front_matter,
            render_tree,
            reading_minutes,
        })
    }
}

/// Minutes to read `words`, rounded up, at least one.
fn reading_minutes(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::tree::Node;

    fn compiler() -> Compiler {
        Compiler::new(
            &MarkdownConfig::default(),
            &HighlightConfig::default(),
            ComponentRegistry::with_defaults(),
        )
        .unwrap()
    }

    fn heading_ids(tree: &RenderTree) -> Vec<String> {
        let mut ids = Vec::new();
        tree.walk(&mut |node| {
            if let Node::Heading { id: Some(id), .. } = node {
                ids.push(id.clone());
            }
        });
        ids
    }

    #[tokio::test]
    async fn test_compile_runs_all_transforms() {
        let body = "# Intro\n\n## Intro\n\n| a | b |\n|---|:-:|\n| 1 |\n\n```rust:main.rs {1}\nfn main() {}\n```\n";
        let tree = compiler()
            .compile(body.to_string(), FrontMatter::new())
            .await
            .unwrap();

        assert_eq!(heading_ids(&tree), vec!["intro", "intro-1"]);
        assert!(matches!(tree.children[0], Node::Heading { permalink: true, .. }));

        let table = tree
            .children
            .iter()
            .find(|n| matches!(n, Node::Table { .. }))
            .unwrap();
        assert!(table.children().iter().all(|row| row.children().len() == 2));

        let Some(Node::CodeBlock {
            language,
            title,
            lines,
            ..
        }) = tree.children.last()
        else {
            panic!("expected code block");
        };
        assert_eq!(language.as_deref(), Some("rust"));
        assert_eq!(title.as_deref(), Some("main.rs"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].highlighted);
    }

    #[tokio::test]
    async fn test_compile_is_deterministic() {
        let body = "## Setup\n\nSome *text* with <Badge>new</Badge>.\n\n## Setup\n".to_string();
        let compiler = compiler();
        let a = compiler.compile(body.clone(), FrontMatter::new()).await.unwrap();
        let b = compiler.compile(body, FrontMatter::new()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unresolved_component_is_not_fatal() {
        let tree = compiler()
            .compile("<Mystery />\n\nafter\n".to_string(), FrontMatter::new())
            .await
            .unwrap();
        let mut found = false;
        tree.walk(&mut |node| {
            if let Node::Unresolved { name, .. } = node {
                found = name == "Mystery";
            }
        });
        assert!(found);
    }

    #[tokio::test]
    async fn test_compile_document_reading_time() {
        let body = "word ".repeat(450);
        let document = Document::from_source(
            "long".to_string(),
            &format!("---\ntitle: Long\n---\n{body}\n"),
        )
        .unwrap();
        let compiled = compiler().compile_document(document).await.unwrap();
        assert_eq!(compiled.slug, "long");
        assert_eq!(compiled.title(), "Long");
        assert_eq!(compiled.reading_minutes, 3);
    }

    #[test]
    fn test_reading_minutes_floor() {
        assert_eq!(reading_minutes(0), 1);
        assert_eq!(reading_minutes(200), 1);
        assert_eq!(reading_minutes(201), 2);
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let markdown = MarkdownConfig {
            extensions: vec!["emoji".to_string()],
        };
        let result = Compiler::new(
            &markdown,
            &HighlightConfig::default(),
            ComponentRegistry::new(),
        );
        assert!(matches!(result, Err(CompileError::Markdown(_))));
    }
}
