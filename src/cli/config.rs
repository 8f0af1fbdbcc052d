//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./legalitea.toml or ./.legalitea/config.toml
//! 2. User config: ~/.legalitea/config.toml
//! 3. System config: /etc/legalitea/config.toml
//! 4. Built-in defaults

use crate::{AssistantConfig, env};
use anyhow::{Context, Result};
use std::env as std_env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

impl AssistantConfig {
    /// Load from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AssistantConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load `explicit` if given, otherwise discover using the hierarchy.
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(AssistantConfig, Option<PathBuf>)> {
        if let Some(path) = explicit {
            info!("Loading configuration from: {:?}", path);
            let config = AssistantConfig::from_toml_file(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            let config = AssistantConfig::from_toml_file(&config_path)?;
            return Ok((config, Some(config_path)));
        }

        info!("No configuration file found, using defaults");
        Ok((AssistantConfig::default(), None))
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        Self::first_existing(Self::get_config_candidates())
    }

    fn first_existing(candidates: Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in candidates {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    pub fn get_config_candidates() -> Vec<PathBuf> {
        Self::candidates_for(
            std_env::current_dir().ok().as_deref(),
            Self::get_home_dir().as_deref(),
        )
    }

    fn candidates_for(current_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(current_dir) = current_dir {
            candidates.push(env::local_standalone_config_path(current_dir));
            candidates.push(env::local_config_file_path(current_dir));
        }

        if let Some(home_dir) = home_dir {
            candidates.push(env::user_config_file_path(home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from("/etc/legalitea/config.toml"));

        #[cfg(windows)]
        if let Ok(program_data) = std_env::var("PROGRAMDATA") {
            candidates.push(PathBuf::from(program_data).join("legalitea").join(env::CONFIG_FILE_NAME));
        }

        candidates
    }

    /// Get home directory path
    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Human-readable discovery hierarchy with per-candidate status
    pub fn discovery_report() -> String {
        let mut report = String::from("Configuration Discovery Hierarchy:\n\n");

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };
            report.push_str(&format!("  {}. {:?} - {}\n", i + 1, candidate, status));
        }

        report.push('\n');
        match Self::find_config_file() {
            Some(found) => report.push_str(&format!("Active configuration: {:?}\n", found)),
            None => report.push_str("Active configuration: Built-in defaults\n"),
        }
        report
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        print!("{}", Self::discovery_report());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ValidationMode;
    use crate::llm::ProviderType;
    use tempfile::TempDir;

    #[test]
    fn test_config_serialization() {
        let config = AssistantConfig::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: AssistantConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("legalitea.toml");

        let mut original_config = AssistantConfig::default();
        original_config.language = "es".to_string();
        original_config.orchestrator.breaker_reset_secs = Some(300);

        original_config.to_toml_file(&config_path).unwrap();
        assert!(config_path.exists());

        let loaded_config = AssistantConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(loaded_config.language, "es");
        assert_eq!(loaded_config.orchestrator.breaker_reset_secs, Some(300));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AssistantConfig = toml::from_str(
            r#"
            language = "hi"

            [orchestrator]
            validation = "uniform"

            [[providers]]
            provider_type = "gemini"
            model = "gemini-2.5-pro"
            "#,
        )
        .unwrap();

        assert_eq!(config.language, "hi");
        assert_eq!(config.difficulty, "medium");
        assert_eq!(config.document_type, "document");
        assert_eq!(config.orchestrator.validation, ValidationMode::Uniform);
        assert!(!config.orchestrator.offline);
        assert_eq!(config.extraction.max_attempts, 3);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].provider_type, ProviderType::Gemini);
        assert_eq!(config.providers[0].model_id(), "gemini-2.5-pro");
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "language = [").unwrap();

        let error = AssistantConfig::from_toml_file(&config_path).unwrap_err();
        assert!(format!("{:#}", error).contains("broken.toml"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(&config_path, "difficulty = \"hard\"\n").unwrap();

        let (config, source) = ConfigDiscovery::load(Some(&config_path)).unwrap();
        assert_eq!(config.difficulty, "hard");
        assert_eq!(source.as_deref(), Some(config_path.as_path()));

        assert!(ConfigDiscovery::load(Some(&temp_dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_config_candidates_order() {
        let candidates = ConfigDiscovery::candidates_for(
            Some(Path::new("/work")),
            Some(Path::new("/home/user")),
        );

        assert_eq!(candidates[0], Path::new("/work/legalitea.toml"));
        assert_eq!(candidates[1], Path::new("/work/.legalitea/config.toml"));
        assert_eq!(candidates[2], Path::new("/home/user/.legalitea/config.toml"));
    }

    #[test]
    fn test_first_existing_candidate_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let home = temp_dir.path().join("home");
        fs::create_dir_all(env::app_dir_path(&home)).unwrap();
        fs::write(env::user_config_file_path(&home), "language = \"fr\"\n").unwrap();

        let candidates = ConfigDiscovery::candidates_for(Some(temp_dir.path()), Some(&home));
        let found = ConfigDiscovery::first_existing(candidates).unwrap();
        assert_eq!(found, env::user_config_file_path(&home));

        fs::write(env::local_standalone_config_path(temp_dir.path()), "").unwrap();
        let candidates = ConfigDiscovery::candidates_for(Some(temp_dir.path()), Some(&home));
        let found = ConfigDiscovery::first_existing(candidates).unwrap();
        assert_eq!(found, env::local_standalone_config_path(temp_dir.path()));
    }

    #[test]
    fn test_discovery_report_lists_candidates() {
        let report = ConfigDiscovery::discovery_report();
        assert!(report.starts_with("Configuration Discovery Hierarchy:"));
        assert!(report.contains("legalitea.toml"));
        assert!(report.contains("Active configuration:"));
    }
}
