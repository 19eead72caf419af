use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Errors
// =============================================================================

/// Listing the content directory failed. Fatal for a build.
#[derive(thiserror::Error, Debug)]
pub enum EnumerationError {
    #[error("content path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("slug '{slug}' is produced by both {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

// =============================================================================
// Slug list
// =============================================================================

/// One post file and the slug it is served under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugPath {
    pub slug: String,
    pub path: PathBuf,
}

/// Every post of one build, sorted by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugPathList {
    entries: Vec<SlugPath>,
}

impl SlugPathList {
    pub fn entries(&self) -> &[SlugPath] {
        &self.entries
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.slug.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries
            .binary_search_by(|entry| entry.slug.as_str().cmp(slug))
            .is_ok()
    }
}

impl IntoIterator for SlugPathList {
    type Item = SlugPath;
    type IntoIter = std::vec::IntoIter<SlugPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// =============================================================================
// Content source
// =============================================================================

/// The directory posts are read from.
#[derive(Debug, Clone)]
pub struct ContentSource {
    root: PathBuf,
    /// Accepted extensions without the dot, in priority order
    extensions: Vec<String>,
}

impl ContentSource {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the posts directly inside the root.
    ///
    /// Subdirectories, hidden files and files with other extensions are
    /// skipped. Two files with the same slug are an error.
    pub fn enumerate(&self) -> Result<SlugPathList, EnumerationError> {
        if !self.root.exists() {
            return Err(EnumerationError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(EnumerationError::NotADirectory(self.root.clone()));
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| EnumerationError::ReadDir {
            path: self.root.clone(),
            source: e,
        })?;

        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| EnumerationError::ReadEntry {
                path: self.root.clone(),
                source: e,
            })?;

            let path = entry.path();
            let file_name = entry.file_name();
            let file_name_str = file_name.to_string_lossy();

            // Skip hidden files
            if file_name_str.starts_with('.') || !path.is_file() {
                continue;
            }

            let Some(slug) = slug_from_file_name(&file_name_str, &self.extensions) else {
                continue;
            };

            if let Some(first) = found.get(slug) {
                return Err(EnumerationError::DuplicateSlug {
                    slug: slug.to_string(),
                    first: first.clone(),
                    second: path,
                });
            }
            found.insert(slug.to_string(), path);
        }

        Ok(SlugPathList {
            entries: found
                .into_iter()
                .map(|(slug, path)| SlugPath { slug, path })
                .collect(),
        })
    }
}

/// Strip an accepted extension from a file name.
///
/// `hello-world.mdx` -> `hello-world`. Returns `None` for other extensions
/// and for names that are only an extension.
pub fn slug_from_file_name<'a>(file_name: &'a str, extensions: &[String]) -> Option<&'a str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || !extensions.iter().any(|e| e == extension) {
        return None;
    }
    Some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["mdx".to_string(), "md".to_string()]
    }

    #[test]
    fn test_slug_from_file_name() {
        let ext = extensions();
        assert_eq!(slug_from_file_name("hello-world.mdx", &ext), Some("hello-world"));
        assert_eq!(slug_from_file_name("notes.md", &ext), Some("notes"));
        assert_eq!(slug_from_file_name("v1.2.mdx", &ext), Some("v1.2"));
        assert_eq!(slug_from_file_name("image.png", &ext), None);
        assert_eq!(slug_from_file_name("README", &ext), None);
        assert_eq!(slug_from_file_name(".mdx", &ext), None);
    }

    #[test]
    fn test_enumerate_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zebra.md"), "").unwrap();
        std::fs::write(dir.path().join("alpha.mdx"), "").unwrap();
        std::fs::write(dir.path().join(".draft.mdx"), "").unwrap();
        std::fs::write(dir.path().join("cover.png"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/deep.md"), "").unwrap();

        let source = ContentSource::new(dir.path(), extensions());
        let list = source.enumerate().unwrap();
        assert_eq!(list.slugs().collect::<Vec<_>>(), vec!["alpha", "zebra"]);
        assert!(list.contains("zebra"));
        assert!(!list.contains("deep"));
        assert_eq!(list.entries()[0].path, dir.path().join("alpha.mdx"));
    }

    #[test]
    fn test_enumerate_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let list = ContentSource::new(dir.path(), extensions()).enumerate().unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_enumerate_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = ContentSource::new(dir.path().join("missing"), extensions()).enumerate();
        assert!(matches!(result, Err(EnumerationError::PathNotFound(_))));
    }

    #[test]
    fn test_enumerate_root_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("posts");
        std::fs::write(&file, "").unwrap();
        let result = ContentSource::new(file, extensions()).enumerate();
        assert!(matches!(result, Err(EnumerationError::NotADirectory(_))));
    }

    #[test]
    fn test_enumerate_duplicate_slug() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "").unwrap();
        std::fs::write(dir.path().join("a.mdx"), "").unwrap();
        let result = ContentSource::new(dir.path(), extensions()).enumerate();
        assert!(matches!(
            result,
            Err(EnumerationError::DuplicateSlug { ref slug, .. }) if slug == "a"
        ));
    }
}
