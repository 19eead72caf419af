//! Configuration loading and types for blogsmith.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files (`load`)

mod load;
mod types;

// Re-export the types other modules name
pub use types::{
    BlogConfig, ComponentConfig, ErrorPolicy, HighlightConfig, MarkdownConfig, StyleOverride,
    WatchConfig,
};

/// Default config file name, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "blogsmith.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}

impl BlogConfig {
    /// Check invariants serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "invalid config: 'content.extensions' must list at least one extension".to_string(),
            ));
        }
        if let Some(ext) = self
            .content
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "invalid config: content extension '{ext}' must be non-empty and written without a leading dot"
            )));
        }
        if self.build.concurrency == 0 {
            return Err(ConfigError::Validation(
                "invalid config: 'build.concurrency' must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
