//! Page chrome around rendered posts, using Tera.
//!
//! Built-in templates ship inside the binary. A theme directory can replace
//! any of them by providing a file with the same name under `templates/`.

use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use super::document::{CompiledDocument, FrontMatter};
use super::paths::post_url;

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("page.html", include_str!("../../templates/page.html")),
    ("index.html", include_str!("../../templates/index.html")),
];

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Tera(#[from] tera::Error),

    #[error("theme not found: {0}")]
    ThemeNotFound(String),
}

/// The template renderer, wrapping Tera.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Only the built-in templates.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES)?;
        Ok(Self { tera })
    }

    /// Built-in templates, overridden by `<theme>/templates/*.html` when a theme is set.
    pub fn load(theme_path: Option<&Path>) -> Result<Self, TemplateError> {
        let builtin = Self::builtin()?;
        let Some(theme_path) = theme_path else {
            return Ok(builtin);
        };

        let templates_path = theme_path.join("templates");
        if !templates_path.is_dir() {
            return Err(TemplateError::ThemeNotFound(
                theme_path.display().to_string(),
            ));
        }

        let glob = templates_path.join("**/*.html");
        // Parse without resolving inheritance: theme templates may extend built-ins
        let mut tera = Tera::parse(&glob.to_string_lossy())?;
        // Theme templates win; built-ins fill the gaps
        tera.extend(&builtin.tera)?;
        Ok(Self { tera })
    }

    /// Render a post page.
    pub fn render_page(&self, context: &PageContext) -> Result<String, TemplateError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("page", &context.page);
        tera_context.insert("content", &context.content);
        tera_context.insert("theme", &context.theme);
        tera_context.insert("live_reload", &context.live_reload);

        Ok(self.tera.render("page.html", &tera_context)?)
    }

    /// Render the post listing.
    pub fn render_index(&self, context: &IndexContext) -> Result<String, TemplateError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("posts", &context.posts);
        tera_context.insert("theme", &context.theme);
        tera_context.insert("live_reload", &context.live_reload);

        Ok(self.tera.render("index.html", &tera_context)?)
    }
}

/// Context passed to the page template.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub site: SiteContext,
    pub page: PageInfo,
    pub content: String,
    /// Theme settings from config, accessible as `theme.*` in templates
    pub theme: serde_json::Value,
    pub live_reload: bool,
}

/// Context passed to the index template.
#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub site: SiteContext,
    /// Newest first
    pub posts: Vec<PostSummary>,
    pub theme: serde_json::Value,
    pub live_reload: bool,
}

/// Site-level information.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteContext {
    pub name: String,
    pub url: Option<String>,
    pub author: Option<String>,
}

/// Information about the current post.
#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// Front matter author, or the site author
    pub author: Option<String>,
    pub date: Option<String>,
    pub reading_minutes: u32,
    pub views: Option<u64>,
    pub tags: Vec<String>,
    /// All front matter fields, e.g. `page.meta.cover`
    pub meta: FrontMatter,
}

impl PageInfo {
    pub fn from_document(document: &CompiledDocument, site: &SiteContext) -> Self {
        let front_matter = &document.front_matter;
        Self {
            slug: document.slug.clone(),
            url: post_url(&document.slug),
            title: document.title(),
            description: front_matter.description(),
            author: front_matter.author().or_else(|| site.author.clone()),
            date: front_matter.date(),
            reading_minutes: document.reading_minutes,
            views: front_matter.views(),
            tags: front_matter.tags(),
            meta: front_matter.clone(),
        }
    }
}

/// A post as shown in the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub views: Option<u64>,
    pub reading_minutes: u32,
}

impl PostSummary {
    pub fn from_document(document: &CompiledDocument) -> Self {
        Self {
            slug: document.slug.clone(),
            url: post_url(&document.slug),
            title: document.title(),
            description: document.front_matter.description(),
            date: document.front_matter.date(),
            views: document.front_matter.views(),
            reading_minutes: document.reading_minutes,
        }
    }

    /// Newest date first, undated posts last, ties by slug.
    pub fn sort_newest_first(posts: &mut [PostSummary]) {
        posts.sort_by(|a, b| match (&a.date, &b.date) {
            (Some(x), Some(y)) => y.cmp(x).then_with(|| a.slug.cmp(&b.slug)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.slug.cmp(&b.slug),
        });
    }
}
