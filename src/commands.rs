use std::path::{Path, PathBuf};

use crate::config::DEFAULT_CONFIG_FILE;

pub mod build;
pub mod clean;
pub mod init;
pub mod serve;

/// Absolute path of the config file named on the command line.
fn config_path(config_file: Option<&Path>) -> std::io::Result<PathBuf> {
    let config_path = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if config_path.is_relative() {
        Ok(std::env::current_dir()?.join(config_path))
    } else {
        Ok(config_path.to_path_buf())
    }
}
