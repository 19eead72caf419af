//! Configuration type definitions.
//!
//! This module contains all the data structures used in `blogsmith.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Root config
// =============================================================================

/// Blog configuration, loaded from `blogsmith.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub site: SiteConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Per node kind style overrides, keyed by kind name (`h2`, `p`, `blockquote`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, StyleOverride>,
    /// Embedded components available to posts, keyed by element name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, ComponentConfig>,
    /// Development-specific settings (watch mode, etc.)
    #[serde(default)]
    pub dev: DevConfig,
}

// =============================================================================
// Site configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: Option<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Default author shown on posts that don't name one
    pub author: Option<String>,
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

// =============================================================================
// Content configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding the posts, relative to the config file
    #[serde(default = "default_content_path")]
    pub path: PathBuf,
    /// File extensions treated as posts (without the dot)
    #[serde(default = "default_content_extensions")]
    pub extensions: Vec<String>,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("posts")
}

fn default_content_extensions() -> Vec<String> {
    vec!["mdx".to_string(), "md".to_string()]
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            path: default_content_path(),
            extensions: default_content_extensions(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Highlight configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// autumnus theme used to generate the highlight stylesheet
    #[serde(default = "default_highlight_theme")]
    pub theme: String,
}

fn default_highlight_theme() -> String {
    "github_light".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: default_highlight_theme(),
        }
    }
}

// =============================================================================
// Build configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// How many posts may compile at once (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// What to do when a single post fails to parse or compile
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_concurrency() -> usize {
    1
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            on_error: ErrorPolicy::default(),
        }
    }
}

/// Policy for per-post failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Attempt every post, then fail the build if any post failed.
    #[default]
    Fail,
    /// Leave failed posts out of the route table and keep going.
    Skip,
}

// =============================================================================
// Theme configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Directory with `page.html` / `index.html` templates overriding the built-in ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Arbitrary settings passed to templates as `theme.*`
    #[serde(default)]
    pub settings: serde_json::Value,
}

// =============================================================================
// Styles and components
// =============================================================================

/// Override for one node kind's style rule. Unset fields keep the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleOverride {
    pub class: Option<String>,
    /// CSS declarations, e.g. `font-weight: "700"`
    #[serde(default)]
    pub declarations: BTreeMap<String, String>,
    /// Child selector rules, e.g. `"> a": { color: "#3b82f6" }`
    #[serde(default)]
    pub nested: BTreeMap<String, BTreeMap<String, String>>,
}

/// How an embedded component is rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// HTML element emitted for the component
    #[serde(default = "default_component_tag")]
    pub tag: String,
    /// Class applied to the element (defaults to `mdx-<name>`)
    pub class: Option<String>,
}

fn default_component_tag() -> String {
    "div".to_string()
}

// =============================================================================
// Development configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// File watching configuration
    #[serde(default)]
    pub watch: WatchConfig,
    /// Enable live reload in the browser when files change (default: true)
    #[serde(default = "default_live_reload")]
    pub live_reload: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            watch: WatchConfig::default(),
            live_reload: true,
        }
    }
}

fn default_live_reload() -> bool {
    true
}

/// Configuration for file watching during development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Use polling-based watcher instead of native file system events.
    #[serde(default)]
    pub poll: bool,
    /// Poll interval in milliseconds (only used if poll=true).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Debounce timeout in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll: false,
            poll_interval_ms: default_poll_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}
