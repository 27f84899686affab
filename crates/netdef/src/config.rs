//! Configuration management for the definition compiler.
//!
//! Settings are loaded from a TOML file. A missing file is created with the
//! defaults so users have something to edit.

use netdef_core::{BuiltinModule, TemplateRules};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

fn default_output_directory() -> String {
    "network_data".to_string()
}

fn default_search_paths() -> Vec<String> {
    vec!["templates".to_string()]
}

fn default_base_class() -> String {
    "Replicable".to_string()
}

fn default_reserved_prefix() -> String {
    "_".to_string()
}

fn default_hidden_bases() -> Vec<String> {
    vec!["Entity".to_string()]
}

fn default_builtin_modules() -> Vec<BuiltinModule> {
    TemplateRules::default().builtin_modules
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_version_url() -> String {
    "http://coldcinder.co.uk/bge_network_addon/version.php".to_string()
}

fn default_mismatch_url() -> String {
    "http://coldcinder.co.uk/bge_network_addon/mismatch.php".to_string()
}

fn default_network_version_file() -> String {
    "network/version.txt".to_string()
}

fn default_addon_version_file() -> String {
    "version.txt".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub templates: TemplateSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub version_check: VersionCheckSettings,
}

/// Where definition files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

/// Template discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Directories searched for schema files, in order
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<String>,
    #[serde(default = "default_base_class")]
    pub base_class: String,
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: String,
    #[serde(default = "default_hidden_bases")]
    pub hidden_bases: Vec<String>,
    /// Attached to every object in this order, each with the classes that
    /// must stay active
    #[serde(default = "default_builtin_modules")]
    pub builtin_modules: Vec<BuiltinModule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionCheckSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_version_url")]
    pub url: String,
    #[serde(default = "default_mismatch_url")]
    pub mismatch_url: String,
    #[serde(default = "default_network_version_file")]
    pub network_version_file: String,
    #[serde(default = "default_addon_version_file")]
    pub addon_version_file: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
            base_class: default_base_class(),
            reserved_prefix: default_reserved_prefix(),
            hidden_bases: default_hidden_bases(),
            builtin_modules: default_builtin_modules(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for VersionCheckSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_version_url(),
            mismatch_url: default_mismatch_url(),
            network_version_file: default_network_version_file(),
            addon_version_file: default_addon_version_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, creating a default file if it
    /// does not exist.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Discovery rules for the core pipeline.
    pub fn to_template_rules(&self) -> TemplateRules {
        TemplateRules {
            base_class: self.templates.base_class.clone(),
            reserved_prefix: self.templates.reserved_prefix.clone(),
            hidden_bases: self.templates.hidden_bases.clone(),
            builtin_modules: self.templates.builtin_modules.clone(),
        }
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.templates.search_paths.iter().map(PathBuf::from).collect()
    }

    pub fn version_timeout(&self) -> Duration {
        Duration::from_secs(self.version_check.timeout_secs)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.output.directory.trim().is_empty() {
            return Err("Output directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        if !netdef_core::types::is_valid_identifier(&self.templates.base_class) {
            return Err(format!("Invalid template base class: {}", self.templates.base_class));
        }

        if self.templates.reserved_prefix.is_empty() {
            return Err("templates.reserved_prefix cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for module in &self.templates.builtin_modules {
            if !netdef_core::types::is_valid_module_path(&module.path) {
                return Err(format!("Invalid builtin module path: {}", module.path));
            }
            if !seen.insert(module.path.as_str()) {
                return Err(format!("Builtin module listed twice: {}", module.path));
            }
        }

        if self.version_check.enabled {
            if self.version_check.url.is_empty() {
                return Err("version_check.url is required when the check is enabled".to_string());
            }
            if self.version_check.mismatch_url.is_empty() {
                return Err("version_check.mismatch_url is required when the check is enabled".to_string());
            }
            if self.version_check.timeout_secs == 0 {
                return Err("version_check.timeout_secs must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.output.directory, "network_data");
        assert_eq!(config.templates.search_paths, vec!["templates".to_string()]);
        assert_eq!(config.templates.base_class, "Replicable");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(!config.version_check.enabled);
        assert_eq!(config.version_check.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_rules_conversion() {
        let config = AppConfig::default();
        let rules = config.to_template_rules();

        assert_eq!(rules.base_class, "Replicable");
        assert_eq!(rules.hidden_bases, vec!["Entity".to_string()]);
        assert_eq!(rules.required_classes("game_system.entities").to_vec(), vec!["Actor".to_string()]);
        assert!(rules.is_builtin("network_addon.actors"));
        let paths: Vec<&str> = rules.builtin_modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["game_system.entities", "network_addon.actors"]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "debug".to_string();

        config.output.directory = " ".to_string();
        assert!(config.validate().is_err());
        config.output.directory = "out".to_string();

        config.templates.builtin_modules.push(BuiltinModule::new("bad path", &[]));
        assert!(config.validate().is_err());
        config.templates.builtin_modules.pop();

        let first = config.templates.builtin_modules[0].clone();
        config.templates.builtin_modules.push(first);
        assert!(config.validate().is_err());
        config.templates.builtin_modules.pop();
        assert!(config.validate().is_ok());

        config.version_check.enabled = true;
        config.version_check.url.clear();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netdef.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[output]
directory = "build/net"

[templates]
search_paths = ["schemas", "vendor/schemas"]

[[templates.builtin_modules]]
path = "zeta.actors"
required = ["Actor"]

[[templates.builtin_modules]]
path = "alpha.traits"

[logging]
level = "debug"
json_format = true
"#;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netdef.toml");
        tokio::fs::write(&path, toml_content).await.unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.output.directory, "build/net");
        assert_eq!(config.search_paths(), vec![PathBuf::from("schemas"), PathBuf::from("vendor/schemas")]);
        assert_eq!(config.templates.base_class, "Replicable");
        assert_eq!(
            config.to_template_rules().builtin_modules,
            vec![BuiltinModule::new("zeta.actors", &["Actor"]), BuiltinModule::new("alpha.traits", &[])]
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.version_check.timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_load_invalid_toml_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netdef.toml");
        tokio::fs::write(&path, "[output\ndirectory = ").await.unwrap();

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }
}
