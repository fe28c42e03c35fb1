//! Access to the builds of a job.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::RetentionError;

/// A finished or running build that may hold copied source files.
pub trait BuildRecord {
    /// Human readable name of the build, e.g. `#42`.
    fn display_name(&self) -> String;

    /// Directory holding the artifacts of the build.
    fn root_dir(&self) -> &Path;

    /// The closest older build that has completed, if any.
    fn previous_completed_build(&self) -> Option<Box<dyn BuildRecord>>;
}

/// A build stored in a numbered directory below the builds folder of a job,
/// e.g. `jobs/app/builds/42`.
///
/// All numbered siblings with a smaller number count as completed builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBuild {
    root: PathBuf,
    number: u64,
}

impl LocalBuild {
    /// Opens the build stored in `root`. The directory name is the build number.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RetentionError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(RetentionError::InvalidBuildDirectory { path: root });
        }
        let Some(number) = build_number(&root) else {
            return Err(RetentionError::InvalidBuildDirectory { path: root });
        };
        Ok(Self { root, number })
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

fn build_number(path: &Path) -> Option<u64> {
    path.file_name()?.to_str()?.parse().ok()
}

impl BuildRecord for LocalBuild {
    fn display_name(&self) -> String {
        format!("#{}", self.number)
    }

    fn root_dir(&self) -> &Path {
        &self.root
    }

    fn previous_completed_build(&self) -> Option<Box<dyn BuildRecord>> {
        let builds = self.root.parent()?;
        let entries = match fs::read_dir(builds) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list builds in {:?}: {}", builds, e);
                return None;
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_dir()))
            .filter_map(|entry| {
                let root = entry.path();
                build_number(&root).map(|number| LocalBuild { root, number })
            })
            .filter(|build| build.number < self.number)
            .max_by_key(|build| build.number)
            .map(|build| Box::new(build) as Box<dyn BuildRecord>)
    }
}
