//! Configuration management for prism-guard.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults. The configuration is an
//! immutable snapshot: it is loaded once and then passed explicitly to the
//! components that need it.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use super::security::CaseSensitivity;
use crate::domains::retention::SourceCodeRetention;

/// Name of the folder below a build directory that holds copied source files.
pub const DEFAULT_SOURCE_FOLDER: &str = "prism-sources";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Approved directories and path comparison settings.
    pub security: SecurityConfig,

    /// Retention of source files copied into old builds.
    pub retention: RetentionConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for approved source directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Absolute directories outside of build workspaces whose files may be shown.
    pub approved_directories: Vec<String>,

    /// Optional JSON file with additional approved directories.
    /// The file must contain an array of strings.
    pub approved_directories_file: Option<PathBuf>,

    /// How paths are compared. Defaults to the convention of the platform.
    pub case_sensitivity: CaseSensitivity,
}

/// Configuration for cleaning up source files of old builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Which old builds lose their copied source files.
    pub strategy: SourceCodeRetention,

    /// Folder below each build directory that holds the copied source files.
    pub source_folder: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            // Only the workspace is visible by default
            approved_directories: Vec::new(),
            approved_directories_file: None,
            case_sensitivity: CaseSensitivity::platform(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            strategy: SourceCodeRetention::default(),
            source_folder: DEFAULT_SOURCE_FOLDER.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            security: SecurityConfig::default(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `PRISM_`.
    /// For example: `PRISM_LOG_LEVEL`, `PRISM_APPROVED_DIRS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(level) = env::var("PRISM_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Approved directories use the platform path list syntax (':' or ';')
        if let Some(directories) = env::var_os("PRISM_APPROVED_DIRS") {
            config.security.approved_directories = env::split_paths(&directories)
                .filter(|path| !path.as_os_str().is_empty())
                .map(|path| path.to_string_lossy().into_owned())
                .collect();
            info!(
                "Approved source directories: {:?}",
                config.security.approved_directories
            );
        }

        if let Ok(file) = env::var("PRISM_APPROVED_DIRS_FILE") {
            config.security.approved_directories_file = Some(PathBuf::from(file));
            info!(
                "Approved source directories file: {:?}",
                config.security.approved_directories_file
            );
        }

        if let Ok(case_insensitive) = env::var("PRISM_CASE_INSENSITIVE") {
            match case_insensitive.parse::<bool>() {
                Ok(true) => config.security.case_sensitivity = CaseSensitivity::Insensitive,
                Ok(false) => config.security.case_sensitivity = CaseSensitivity::Sensitive,
                Err(_) => warn!(
                    "Ignoring PRISM_CASE_INSENSITIVE='{}', expected true or false",
                    case_insensitive
                ),
            }
        }

        if let Ok(retention) = env::var("PRISM_SOURCE_RETENTION") {
            match retention.parse() {
                Ok(strategy) => config.retention.strategy = strategy,
                Err(e) => warn!("Ignoring PRISM_SOURCE_RETENTION: {}", e),
            }
        }

        if let Ok(folder) = env::var("PRISM_SOURCE_FOLDER") {
            config.retention.source_folder = folder;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARIABLES: [&str; 6] = [
        "PRISM_LOG_LEVEL",
        "PRISM_APPROVED_DIRS",
        "PRISM_APPROVED_DIRS_FILE",
        "PRISM_CASE_INSENSITIVE",
        "PRISM_SOURCE_RETENTION",
        "PRISM_SOURCE_FOLDER",
    ];

    fn clear_env() {
        for variable in VARIABLES {
            unsafe {
                std::env::remove_var(variable);
            }
        }
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();

        let config = Config::from_env();
        assert!(config.security.approved_directories.is_empty());
        assert!(config.security.approved_directories_file.is_none());
        assert_eq!(config.security.case_sensitivity, CaseSensitivity::platform());
        assert_eq!(config.retention.strategy, SourceCodeRetention::Never);
        assert_eq!(config.retention.source_folder, DEFAULT_SOURCE_FOLDER);
    }

    #[test]
    fn test_approved_directories_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        let joined = env::join_paths(["/opt/shared", "/srv/sources"]).unwrap();
        unsafe {
            std::env::set_var("PRISM_APPROVED_DIRS", &joined);
            std::env::set_var("PRISM_APPROVED_DIRS_FILE", "/etc/prism/approved.json");
        }

        let config = Config::from_env();
        assert_eq!(
            config.security.approved_directories,
            vec!["/opt/shared".to_string(), "/srv/sources".to_string()]
        );
        assert_eq!(
            config.security.approved_directories_file,
            Some(PathBuf::from("/etc/prism/approved.json"))
        );
        clear_env();
    }

    #[test]
    fn test_retention_and_case_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("PRISM_SOURCE_RETENTION", "last-build");
            std::env::set_var("PRISM_CASE_INSENSITIVE", "true");
            std::env::set_var("PRISM_SOURCE_FOLDER", "coverage-sources");
        }

        let config = Config::from_env();
        assert_eq!(config.retention.strategy, SourceCodeRetention::LastBuild);
        assert_eq!(config.retention.source_folder, "coverage-sources");
        assert_eq!(config.security.case_sensitivity, CaseSensitivity::Insensitive);
        clear_env();
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();
        unsafe {
            std::env::set_var("PRISM_SOURCE_RETENTION", "sometimes");
            std::env::set_var("PRISM_CASE_INSENSITIVE", "maybe");
        }

        let config = Config::from_env();
        assert_eq!(config.retention.strategy, SourceCodeRetention::Never);
        assert_eq!(config.security.case_sensitivity, CaseSensitivity::platform());
        clear_env();
    }

    #[test]
    fn test_config_serializes_to_json() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["retention"]["strategy"], "never");
        assert_eq!(json["security"]["approved_directories"], serde_json::json!([]));
    }
}
