//! Stored page props: one JSON file per post plus a route manifest.
//!
//! Posts live in `_props/<slug>.json`. The manifest sits outside that
//! directory so no slug can collide with it.
//!
//! This is the boundary between build time and serve time. The server only
//! ever reads what was written here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::document::CompiledDocument;
use super::paths::{PROPS_DIR, props_path};
use super::template::PostSummary;

const MANIFEST_FILE: &str = "_routes.json";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid page data in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("props for '{slug}' do not match their file name")]
    SlugMismatch { slug: String },
}

/// The list of routes produced by one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub slugs: Vec<String>,
}

/// Compiled posts by slug.
#[derive(Debug, Clone, Default)]
pub struct PageStore {
    pages: BTreeMap<String, CompiledDocument>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: impl IntoIterator<Item = CompiledDocument>) -> Self {
        let mut store = Self::new();
        for document in documents {
            store.insert(document);
        }
        store
    }

    pub fn insert(&mut self, document: CompiledDocument) {
        self.pages.insert(document.slug.clone(), document);
    }

    /// Look up a post. Unknown slugs are `None`, never a fallback page.
    pub fn get(&self, slug: &str) -> Option<&CompiledDocument> {
        self.pages.get(slug)
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn documents(&self) -> impl Iterator<Item = &CompiledDocument> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn manifest(&self) -> Manifest {
        Manifest {
            slugs: self.pages.keys().cloned().collect(),
        }
    }

    /// Listing entries, newest first.
    pub fn summaries(&self) -> Vec<PostSummary> {
        let mut posts: Vec<PostSummary> = self.pages.values().map(PostSummary::from_document).collect();
        PostSummary::sort_newest_first(&mut posts);
        posts
    }

    /// Replace `<output>/_props` with this store's contents.
    pub async fn write(&self, output_dir: &Path) -> Result<(), StoreError> {
        let props_dir = output_dir.join(PROPS_DIR);
        if tokio::fs::try_exists(&props_dir).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&props_dir)
                .await
                .map_err(|e| io_error(&props_dir, e))?;
        }
        tokio::fs::create_dir_all(&props_dir)
            .await
            .map_err(|e| io_error(&props_dir, e))?;

        for document in self.pages.values() {
            let path = props_path(&document.slug, output_dir);
            write_json(&path, document).await?;
        }
        write_json(&output_dir.join(MANIFEST_FILE), &self.manifest()).await
    }

    /// Load every page listed in `<output>/_routes.json`.
    pub async fn load(output_dir: &Path) -> Result<Self, StoreError> {
        let manifest_path = output_dir.join(MANIFEST_FILE);
        let manifest: Manifest = read_json(&manifest_path).await?;

        let mut store = Self::new();
        for slug in manifest.slugs {
            let document: CompiledDocument = read_json(&props_path(&slug, output_dir)).await?;
            if document.slug != slug {
                return Err(StoreError::SlugMismatch { slug });
            }
            store.insert(document);
        }
        Ok(store)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| io_error(path, e))
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
