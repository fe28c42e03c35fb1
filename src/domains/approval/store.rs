//! Sources of administrator approved directories.
//!
//! The approved directories are persisted and administered outside of this
//! crate. A store only has to list them; the list is read once and then used
//! as an immutable snapshot.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::ApprovalError;

/// Read access to the approved directories.
pub trait ApprovedDirectoryStore {
    fn list_approved_directories(&self) -> Result<BTreeSet<String>, ApprovalError>;
}

/// Approved directories held in memory, e.g. taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticApprovedDirectories {
    directories: Vec<String>,
}

impl StaticApprovedDirectories {
    pub fn new<I, S>(directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directories: directories.into_iter().map(Into::into).collect(),
        }
    }
}

impl ApprovedDirectoryStore for StaticApprovedDirectories {
    fn list_approved_directories(&self) -> Result<BTreeSet<String>, ApprovalError> {
        Ok(self.directories.iter().cloned().collect())
    }
}

/// Entry of an approved directories file: either a plain path or an object
/// with a `path` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApprovedEntry {
    Path(String),
    Directory { path: String },
}

impl ApprovedEntry {
    fn into_path(self) -> String {
        match self {
            Self::Path(path) | Self::Directory { path } => path,
        }
    }
}

/// Approved directories stored as JSON array on disk.
///
/// ```json
/// ["/opt/shared/sources", { "path": "/srv/generated" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileApprovedDirectories {
    path: PathBuf,
}

impl JsonFileApprovedDirectories {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ApprovedDirectoryStore for JsonFileApprovedDirectories {
    #[instrument(skip_all, fields(path = ?self.path))]
    fn list_approved_directories(&self) -> Result<BTreeSet<String>, ApprovalError> {
        let content = fs::read_to_string(&self.path).map_err(|error| ApprovalError::Read {
            path: self.path.clone(),
            error,
        })?;
        let entries: Vec<ApprovedEntry> =
            serde_json::from_str(&content).map_err(|error| ApprovalError::Parse {
                path: self.path.clone(),
                error,
            })?;

        let directories: BTreeSet<String> = entries.into_iter().map(ApprovedEntry::into_path).collect();
        debug!("Loaded {} approved directories", directories.len());
        Ok(directories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_static_store_deduplicates() {
        let store = StaticApprovedDirectories::new(["/a", "/b", "/a"]);
        let directories = store.list_approved_directories().unwrap();
        assert_eq!(directories.len(), 2);
        assert!(directories.contains("/a"));
    }

    #[test]
    fn test_json_file_with_plain_and_object_entries() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("approved.json");
        fs::write(&file, r#"["/opt/shared", {"path": "/srv/generated"}]"#).unwrap();

        let store = JsonFileApprovedDirectories::new(&file);
        let directories = store.list_approved_directories().unwrap();

        assert_eq!(
            directories,
            BTreeSet::from(["/opt/shared".to_string(), "/srv/generated".to_string()])
        );
    }

    #[test]
    fn test_missing_json_file() {
        let store = JsonFileApprovedDirectories::new("/nonexistent/approved-12345.json");
        let result = store.list_approved_directories();
        assert!(matches!(result, Err(ApprovalError::Read { .. })));
    }

    #[test]
    fn test_malformed_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("approved.json");
        fs::write(&file, r#"{"not": "an array"}"#).unwrap();

        let result = JsonFileApprovedDirectories::new(&file).list_approved_directories();
        assert!(matches!(result, Err(ApprovalError::Parse { .. })));
    }
}
