//! Normalized snapshot of the approved directories.

use std::collections::BTreeSet;

use tracing::{info, warn};

use super::error::ApprovalError;
use super::store::{ApprovedDirectoryStore, JsonFileApprovedDirectories, StaticApprovedDirectories};
use crate::core::config::SecurityConfig;
use crate::core::security::paths::{self, CaseSensitivity};

/// Immutable set of approved directories.
///
/// Every entry is stored in canonical absolute form. Relative entries cannot
/// be approved: such a directory would depend on the workspace of the build,
/// and workspace directories never need approval anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedDirectories {
    directories: BTreeSet<String>,
    case: CaseSensitivity,
}

impl ApprovedDirectories {
    pub fn new<I>(directories: I, case: CaseSensitivity) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut normalized = BTreeSet::new();
        for directory in directories {
            let directory = directory.as_ref().trim();
            if directory.is_empty() {
                continue;
            }
            if !paths::is_absolute(directory) {
                warn!("Ignoring approved directory '{}': not an absolute path", directory);
                continue;
            }
            normalized.insert(paths::absolute_path(directory));
        }

        Self {
            directories: normalized,
            case,
        }
    }

    /// Takes a snapshot of the directories listed by `store`.
    pub fn from_store<S>(store: &S, case: CaseSensitivity) -> Result<Self, ApprovalError>
    where
        S: ApprovedDirectoryStore + ?Sized,
    {
        Ok(Self::new(store.list_approved_directories()?, case))
    }

    /// Takes a snapshot of the configured directories and, if configured, of
    /// the approved directories file.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ApprovalError> {
        let mut directories = StaticApprovedDirectories::new(config.approved_directories.iter().cloned())
            .list_approved_directories()?;
        if let Some(file) = &config.approved_directories_file {
            directories.extend(JsonFileApprovedDirectories::new(file).list_approved_directories()?);
        }

        let approved = Self::new(directories, config.case_sensitivity);
        info!("Loaded {} approved source directories", approved.len());
        Ok(approved)
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Returns whether `directory` is registered as approved source directory.
    pub fn is_allowed_source_directory(&self, directory: &str) -> bool {
        let candidate = paths::absolute_path(directory);
        self.directories
            .iter()
            .any(|approved| paths::is_same_path(approved, &candidate, self.case))
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.directories.iter()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

impl<'a> IntoIterator for &'a ApprovedDirectories {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.directories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_entries_are_normalized() {
        let approved = ApprovedDirectories::new(["/opt/shared/", "/opt/./other/../shared"], CaseSensitivity::Sensitive);

        assert_eq!(approved.len(), 1);
        assert!(approved.is_allowed_source_directory("/opt/shared"));
        assert!(approved.is_allowed_source_directory("/opt/shared/"));
        assert!(!approved.is_allowed_source_directory("/opt/shared/sub"));
        assert!(!approved.is_allowed_source_directory("/opt"));
    }

    #[test]
    fn test_relative_and_blank_entries_are_ignored() {
        let approved = ApprovedDirectories::new(["relative/dir", "", "   ", "-"], CaseSensitivity::Sensitive);
        assert!(approved.is_empty());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let approved = ApprovedDirectories::new(["C:\\Shared"], CaseSensitivity::Insensitive);

        assert!(approved.is_allowed_source_directory("c:\\shared"));
        assert!(approved.is_allowed_source_directory("C:/SHARED/"));
        assert!(!approved.is_allowed_source_directory("C:\\Shared2"));
    }

    #[test]
    fn test_from_store() {
        let store = StaticApprovedDirectories::new(["/a", "/b"]);
        let approved = ApprovedDirectories::from_store(&store, CaseSensitivity::Sensitive).unwrap();
        assert_eq!(approved.len(), 2);
    }

    #[test]
    fn test_from_config_merges_file_entries() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("approved.json");
        fs::write(&file, r#"["/srv/generated"]"#).unwrap();

        let config = SecurityConfig {
            approved_directories: vec!["/opt/shared".to_string()],
            approved_directories_file: Some(file),
            case_sensitivity: CaseSensitivity::Sensitive,
        };
        let approved = ApprovedDirectories::from_config(&config).unwrap();

        assert!(approved.is_allowed_source_directory("/opt/shared"));
        assert!(approved.is_allowed_source_directory("/srv/generated"));
    }

    #[test]
    fn test_from_config_with_missing_file_fails() {
        let config = SecurityConfig {
            approved_directories_file: Some(PathBuf::from("/nonexistent/approved-12345.json")),
            ..SecurityConfig::default()
        };
        assert!(ApprovedDirectories::from_config(&config).is_err());
    }
}
