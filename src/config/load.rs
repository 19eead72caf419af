//! Configuration loading from files.

use std::path::Path;

use super::{BlogConfig, ConfigError, DEFAULT_CONFIG_FILE};

impl BlogConfig {
    /// Load the config from the command line argument, defaulting to `blogsmith.yaml`
    pub async fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        Self::load_from_file(&config_file).await
    }

    /// Load the config from a file path
    pub(crate) async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate a config from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: BlogConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorPolicy;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = BlogConfig::from_yaml("site:\n  name: My Blog\n").unwrap();
        assert_eq!(config.site.name, "My Blog");
        assert_eq!(config.site.output, Path::new("_site"));
        assert_eq!(config.content.path, Path::new("posts"));
        assert_eq!(config.content.extensions, vec!["mdx", "md"]);
        assert_eq!(config.build.concurrency, 1);
        assert_eq!(config.build.on_error, ErrorPolicy::Fail);
        assert!(config.dev.live_reload);
    }

    #[test]
    fn test_full_config() {
        let yaml = r##"
site:
  name: Notes
  author: Jane
  output: public
content:
  path: content/blog
  extensions: [mdx]
build:
  concurrency: 4
  on_error: skip
styles:
  h2:
    declarations:
      color: "#ff0000"
components:
  Callout:
    tag: aside
"##;
        let config = BlogConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.site.author.as_deref(), Some("Jane"));
        assert_eq!(config.build.on_error, ErrorPolicy::Skip);
        assert_eq!(config.build.concurrency, 4);
        assert_eq!(config.styles["h2"].declarations["color"], "#ff0000");
        assert_eq!(config.components["Callout"].tag, "aside");
    }

    #[test]
    fn test_missing_site_is_error() {
        assert!(matches!(
            BlogConfig::from_yaml("content:\n  path: posts\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let yaml = "site:\n  name: x\nbuild:\n  concurrency: 0\n";
        assert!(matches!(
            BlogConfig::from_yaml(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let yaml = "site:\n  name: x\ncontent:\n  extensions: [\".md\"]\n";
        assert!(matches!(
            BlogConfig::from_yaml(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = BlogConfig::load_from_file(&dir.path().join("nope.yaml")).await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
