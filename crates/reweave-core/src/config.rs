//! Parser configuration.
//!
//! Load order: `reweave.toml` in the project root → environment variables →
//! defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration recognized by the parsing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Skip parsing build descriptors entirely. The build-file stage then
    /// returns an empty list without invoking the descriptor parser.
    pub skip_build_file_parsing: bool,

    /// Enable the durable build-metadata cache. With `false` only the
    /// in-memory cache is used.
    pub metadata_cache_enabled: bool,

    /// Directory backing the durable metadata cache when
    /// `metadata_cache_enabled` is set.
    pub metadata_cache_dir: PathBuf,

    /// Filename masks parsed as plain text rather than by format.
    pub plain_text_masks: Vec<String>,

    /// Resources exceeding this threshold (in megabytes) are carried as
    /// opaque quarks instead of being fully parsed.
    pub size_threshold_mb: u64,

    /// Whether only the current submodule should be parsed. Carried for
    /// downstream consumers; the pipeline currently always parses the full
    /// module tree.
    pub run_per_submodule: bool,

    /// Active build profile names.
    pub active_profiles: Vec<String>,

    /// Glob patterns excluding paths from scanning and parsing.
    pub ignored_path_patterns: Vec<String>,

    /// Whether recipe discovery should fail on an invalid recipe selection.
    /// Consumed by the downstream recipe engine, not by this pipeline.
    pub fail_on_invalid_recipe_selection: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_build_file_parsing: false,
            metadata_cache_enabled: false,
            metadata_cache_dir: default_cache_dir(),
            plain_text_masks: vec!["*.txt".to_string()],
            size_threshold_mb: 10,
            run_per_submodule: false,
            active_profiles: vec!["default".to_string()],
            ignored_path_patterns: vec![
                "**/target/**".to_string(),
                "target/**".to_string(),
                "**/.idea/**".to_string(),
                ".idea/**".to_string(),
                "**/.mvn/**".to_string(),
                ".mvn/**".to_string(),
                "**/.git/**".to_string(),
                ".git/**".to_string(),
            ],
            fail_on_invalid_recipe_selection: true,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".reweave-cache")
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl ParserConfig {
    /// Load config from `reweave.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("reweave.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override(
            "REWEAVE_SKIP_BUILD_FILE_PARSING",
            &mut config.skip_build_file_parsing,
        );
        env_override(
            "REWEAVE_METADATA_CACHE_ENABLED",
            &mut config.metadata_cache_enabled,
        );
        env_override("REWEAVE_SIZE_THRESHOLD_MB", &mut config.size_threshold_mb);

        if config.size_threshold_mb == 0 {
            anyhow::bail!("size_threshold_mb must be at least 1");
        }

        Ok(config)
    }

    /// The size threshold in bytes.
    pub fn size_threshold_bytes(&self) -> u64 {
        self.size_threshold_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert!(!config.skip_build_file_parsing);
        assert!(!config.metadata_cache_enabled);
        assert_eq!(config.plain_text_masks, vec!["*.txt"]);
        assert_eq!(config.size_threshold_mb, 10);
        assert_eq!(config.active_profiles, vec!["default"]);
        assert!(config
            .ignored_path_patterns
            .contains(&"**/target/**".to_string()));
        assert!(config.fail_on_invalid_recipe_selection);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
skip_build_file_parsing = true
size_threshold_mb = 2
active_profiles = ["ci", "default"]
plain_text_masks = ["*.txt", "*.adoc"]
"#;
        let config: ParserConfig = toml::from_str(toml_str).unwrap();
        assert!(config.skip_build_file_parsing);
        assert_eq!(config.size_threshold_mb, 2);
        assert_eq!(config.active_profiles, vec!["ci", "default"]);
        assert_eq!(config.plain_text_masks.len(), 2);
        // Defaults for unspecified fields
        assert!(!config.metadata_cache_enabled);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let config = ParserConfig::load(Path::new("/nonexistent/path")).unwrap();
        assert_eq!(config.size_threshold_mb, 10);
    }

    #[test]
    fn test_load_rejects_zero_threshold() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("reweave.toml"), "size_threshold_mb = 0").unwrap();
        assert!(ParserConfig::load(tmp.path()).is_err());
    }
}
