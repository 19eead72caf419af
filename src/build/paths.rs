//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Slugs (stable post identifiers)
//! - URL paths (the URL at which a post is served)
//! - Output file paths (where files are written in the output directory)

use std::path::{Path, PathBuf};

/// URL prefix every post lives under.
pub const BLOG_PREFIX: &str = "/blog";

/// Directory, relative to the output root, holding stored page props.
pub const PROPS_DIR: &str = "_props";

/// URL path of a post.
///
/// # Examples
/// ```ignore
/// post_url("hello-world") => "/blog/hello-world"
/// ```
pub fn post_url(slug: &str) -> String {
    format!("{BLOG_PREFIX}/{slug}")
}

/// Convert a URL path to an output file path.
///
/// Documents (no extension) become `path/index.html`.
/// Static files (with extension) keep their path.
///
/// # Examples
/// ```ignore
/// url_to_output_path("/blog/hello", output_dir) => output_dir/blog/hello/index.html
/// url_to_output_path("/", output_dir) => output_dir/index.html
/// url_to_output_path("/styles.css", output_dir) => output_dir/styles.css
/// ```
pub fn url_to_output_path(url_path: &str, output_dir: &Path) -> PathBuf {
    let url_path = url_path.trim_start_matches('/');

    if url_path.is_empty() {
        // Root path
        output_dir.join("index.html")
    } else if url_path.contains('.') {
        // Already has extension (static file)
        output_dir.join(url_path)
    } else {
        // Document - create directory with index.html
        output_dir.join(url_path).join("index.html")
    }
}

/// Output file of a post page. Unlike `url_to_output_path`, dots in the slug are fine.
pub fn post_output_path(slug: &str, output_dir: &Path) -> PathBuf {
    output_dir
        .join(BLOG_PREFIX.trim_start_matches('/'))
        .join(slug)
        .join("index.html")
}

/// Where the stored props of a post are written.
pub fn props_path(slug: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(PROPS_DIR).join(format!("{slug}.json"))
}

/// Resolve a configured path against the base path unless it is absolute.
pub fn resolve_path(path: &Path, base_path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_post_url() {
        assert_eq!(post_url("hello-world"), "/blog/hello-world");
    }

    #[test]
    fn test_url_to_output_path_document() {
        let output = Path::new("/site");
        assert_eq!(
            url_to_output_path(&post_url("installation"), output),
            PathBuf::from("/site/blog/installation/index.html")
        );
    }

    #[test]
    fn test_url_to_output_path_root() {
        let output = Path::new("/site");
        assert_eq!(
            url_to_output_path("/", output),
            PathBuf::from("/site/index.html")
        );
    }

    #[test]
    fn test_url_to_output_path_static() {
        let output = Path::new("/site");
        assert_eq!(
            url_to_output_path("/styles.css", output),
            PathBuf::from("/site/styles.css")
        );
    }

    #[test]
    fn test_post_output_path_with_dot() {
        assert_eq!(
            post_output_path("v1.0-notes", Path::new("/site")),
            PathBuf::from("/site/blog/v1.0-notes/index.html")
        );
    }

    #[test]
    fn test_props_path() {
        assert_eq!(
            props_path("hello", Path::new("/site")),
            PathBuf::from("/site/_props/hello.json")
        );
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/project");
        assert_eq!(
            resolve_path(Path::new("posts"), base),
            PathBuf::from("/project/posts")
        );
        assert_eq!(
            resolve_path(Path::new("/abs/posts"), base),
            PathBuf::from("/abs/posts")
        );
    }

    #[test]
    fn test_base_path_from_config() {
        assert_eq!(
            base_path_from_config(Path::new("/project/blogsmith.yaml")),
            PathBuf::from("/project")
        );
        assert_eq!(
            base_path_from_config(Path::new("blogsmith.yaml")),
            PathBuf::from("")
        );
    }
}
