//! Build-time page generation.
//!
//! For each post: read, split front matter, compile, then persist the
//! compiled document as the page's static props and render its HTML.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream;

use crate::config::{BlogConfig, ErrorPolicy};

use super::compiler::{CompileError, Compiler};
use super::components::{ComponentError, ComponentRegistry};
use super::document::{CompiledDocument, Document, FrontMatterError};
use super::paths::{BLOG_PREFIX, post_output_path, resolve_path, url_to_output_path};
use super::render::Renderer;
use super::source::{ContentSource, EnumerationError, SlugPath};
use super::store::{PageStore, StoreError};
use super::style::{StyleError, StyleSheet};
use super::template::{IndexContext, PageContext, PageInfo, SiteContext, TemplateError, Templates};

/// Why a single post failed. Other posts are unaffected.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("front matter error: {0}")]
    Parse(#[from] FrontMatterError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

/// A post that did not make it into the build.
#[derive(Debug)]
pub struct DocumentFailure {
    pub slug: String,
    pub error: DocumentError,
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),

    #[error("component error: {0}")]
    Component(#[from] ComponentError),

    #[error("style error: {0}")]
    Style(#[from] StyleError),

    #[error("compiler setup error: {0}")]
    Compiler(#[from] CompileError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} post(s) failed to build:\n{}", .0.len(), describe_failures(.0))]
    Documents(Vec<DocumentFailure>),
}

fn describe_failures(failures: &[DocumentFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {}: {}", failure.slug, failure.error))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Posts written
    pub pages: usize,
    /// Posts left out under the `skip` policy
    pub skipped: Vec<String>,
}

/// Turns stored props into HTML. Shared by the build and the dev server.
pub struct PageView {
    renderer: Renderer,
    templates: Templates,
    site: SiteContext,
    /// Theme settings from config, exposed to templates
    theme: serde_json::Value,
    live_reload: bool,
}

impl PageView {
    /// Render one post page.
    pub fn render_page(&self, document: &CompiledDocument) -> Result<String, TemplateError> {
        self.templates.render_page(&PageContext {
            site: self.site.clone(),
            page: PageInfo::from_document(document, &self.site),
            content: self.renderer.render(&document.render_tree),
            theme: self.theme.clone(),
            live_reload: self.live_reload,
        })
    }

    /// Render the post listing.
    pub fn render_index(&self, store: &PageStore) -> Result<String, TemplateError> {
        self.templates.render_index(&IndexContext {
            site: self.site.clone(),
            posts: store.summaries(),
            theme: self.theme.clone(),
            live_reload: self.live_reload,
        })
    }

    pub fn styles(&self) -> &StyleSheet {
        self.renderer.styles()
    }
}

/// Everything a build needs that does not change between posts.
struct BuildContext {
    compiler: Compiler,
    view: PageView,
}

pub struct PageGenerator {
    config: BlogConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
    live_reload: bool,
}

impl PageGenerator {
    pub fn new(config: BlogConfig, base_path: PathBuf) -> Self {
        Self {
            config,
            base_path,
            live_reload: false,
        }
    }

    /// Inject the live reload script into generated pages.
    pub fn with_live_reload(mut self, live_reload: bool) -> Self {
        self.live_reload = live_reload;
        self
    }

    /// Get the output directory path, resolved against base_path.
    pub fn output_dir(&self) -> PathBuf {
        resolve_path(&self.config.site.output, &self.base_path)
    }

    pub fn content_dir(&self) -> PathBuf {
        resolve_path(&self.config.content.path, &self.base_path)
    }

    pub fn theme_dir(&self) -> Option<PathBuf> {
        self.config
            .theme
            .path
            .as_deref()
            .map(|path| resolve_path(path, &self.base_path))
    }

    pub async fn generate(&self) -> Result<BuildResult, GenerateError> {
        // Build pipeline:
        // 1. Enumerate posts (fatal on failure, nothing written)
        // 2. Set up compiler, renderer and templates
        // 3. Compile every post, collecting per-post failures
        // 4. Apply the error policy
        // 5. Write props, pages, index and stylesheet

        let source = ContentSource::new(self.content_dir(), self.config.content.extensions.clone());
        let slugs = source.enumerate()?;
        tracing::info!(
            posts = slugs.len(),
            path = %source.root().display(),
            "enumerated content"
        );

        let ctx = self.build_context()?;

        let concurrency = self.config.build.concurrency.max(1);
        let results: Vec<(String, Result<CompiledDocument, DocumentError>)> =
            stream::iter(slugs.into_iter().map(|entry| {
                let compiler = ctx.compiler.clone();
                async move {
                    let slug = entry.slug.clone();
                    (slug, compile_entry(&compiler, entry).await)
                }
            }))
            .buffered(concurrency)
            .collect()
            .await;

        let mut store = PageStore::new();
        let mut failures = Vec::new();
        for (slug, result) in results {
            match result {
                Ok(document) => {
                    tracing::debug!(slug = %slug, minutes = document.reading_minutes, "compiled post");
                    store.insert(document);
                }
                Err(error) => failures.push(DocumentFailure { slug, error }),
            }
        }

        let mut skipped = Vec::new();
        if !failures.is_empty() {
            match self.config.build.on_error {
                ErrorPolicy::Fail => {
                    for failure in &failures {
                        tracing::error!(slug = %failure.slug, error = %failure.error, "post failed");
                    }
                    return Err(GenerateError::Documents(failures));
                }
                ErrorPolicy::Skip => {
                    for failure in failures {
                        tracing::warn!(slug = %failure.slug, error = %failure.error, "skipping post");
                        skipped.push(failure.slug);
                    }
                }
            }
        }

        let output_dir = self.output_dir();
        self.write_output(&ctx, &store, &output_dir).await?;
        tracing::info!(pages = store.len(), output = %output_dir.display(), "build finished");

        Ok(BuildResult {
            output_dir,
            pages: store.len(),
            skipped,
        })
    }

    /// Renderer and templates for this config.
    pub fn page_view(&self) -> Result<PageView, GenerateError> {
        let registry = ComponentRegistry::from_config(&self.config.components)?;
        self.page_view_with(registry)
    }

    fn page_view_with(&self, registry: ComponentRegistry) -> Result<PageView, GenerateError> {
        let styles = StyleSheet::from_overrides(&self.config.styles)?;
        let templates = Templates::load(self.theme_dir().as_deref())?;
        Ok(PageView {
            renderer: Renderer::new(styles, registry),
            templates,
            site: site_context(&self.config),
            theme: self.config.theme.settings.clone(),
            live_reload: self.live_reload,
        })
    }

    fn build_context(&self) -> Result<BuildContext, GenerateError> {
        let registry = ComponentRegistry::from_config(&self.config.components)?;
        tracing::debug!(components = ?registry.names().collect::<Vec<_>>(), "component registry ready");
        let compiler = Compiler::new(&self.config.markdown, &self.config.highlight, registry.clone())?;
        Ok(BuildContext {
            compiler,
            view: self.page_view_with(registry)?,
        })
    }

    async fn write_output(
        &self,
        ctx: &BuildContext,
        store: &PageStore,
        output_dir: &Path,
    ) -> Result<(), GenerateError> {
        store.write(output_dir).await?;

        // Pages of removed posts must not survive a rebuild
        let blog_dir = output_dir.join(BLOG_PREFIX.trim_start_matches('/'));
        if tokio::fs::try_exists(&blog_dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&blog_dir)
                .await
                .map_err(|source| GenerateError::Write {
                    path: blog_dir.clone(),
                    source,
                })?;
        }

        for document in store.documents() {
            let html = ctx.view.render_page(document)?;
            write_file(&post_output_path(&document.slug, output_dir), html).await?;
        }

        let index = ctx.view.render_index(store)?;
        write_file(&url_to_output_path(BLOG_PREFIX, output_dir), index).await?;

        let mut css = ctx.view.styles().to_css();
        if let Some(code_css) = ctx.compiler.highlighter().generate_css() {
            css.push('\n');
            css.push_str(&code_css);
        }
        write_file(&output_dir.join("styles.css"), css).await?;
        Ok(())
    }
}

/// Read, split and compile one post.
async fn compile_entry(compiler: &Compiler, entry: SlugPath) -> Result<CompiledDocument, DocumentError> {
    let raw = tokio::fs::read_to_string(&entry.path)
        .await
        .map_err(|e| DocumentError::Read {
            path: entry.path.clone(),
            source: e,
        })?;
    let document = Document::from_source(entry.slug, &raw)?;
    Ok(compiler.compile_document(document).await?)
}

fn site_context(config: &BlogConfig) -> SiteContext {
    SiteContext {
        name: config.site.name.clone(),
        url: config.site.url.clone(),
        author: config.site.author.clone(),
    }
}

async fn write_file(path: &Path, contents: String) -> Result<(), GenerateError> {
    let write_error = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, contents).await.map_err(write_error)
}
