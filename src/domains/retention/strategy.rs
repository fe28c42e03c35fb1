//! Retention strategies for copied source files.

use std::fmt;
use std::fs;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::build::BuildRecord;
use super::error::RetentionError;
use crate::core::log::LogSink;
use crate::core::security::paths;

/// Defines which builds keep their copied source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCodeRetention {
    /// Source files are never stored, so there is nothing to clean.
    #[default]
    Never,
    /// Only the last build keeps its source files.
    LastBuild,
    /// Every build keeps its source files, they are never deleted.
    EveryBuild,
}

impl SourceCodeRetention {
    pub const ALL: [Self; 3] = [Self::Never, Self::LastBuild, Self::EveryBuild];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Never => "Never store source code files",
            Self::LastBuild => "Store source code files of the last build, delete older artifacts",
            Self::EveryBuild => "Store source code files for all builds, never delete those files automatically",
        }
    }

    /// Identifier used in configuration files and environment variables.
    pub fn id(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::LastBuild => "last-build",
            Self::EveryBuild => "every-build",
        }
    }

    /// Removes the source folder `directory` from older builds if this
    /// strategy asks for it. Failures are logged, never returned.
    #[instrument(skip_all, fields(strategy = self.id(), build = %build.display_name()))]
    pub fn cleanup<B, L>(self, build: &B, directory: &str, log: &mut L)
    where
        B: BuildRecord + ?Sized,
        L: LogSink + ?Sized,
    {
        match self {
            Self::Never | Self::EveryBuild => skip_cleanup(log),
            Self::LastBuild => delete_previous_sources(build, directory, log),
        }
    }
}

fn skip_cleanup<L: LogSink + ?Sized>(log: &mut L) {
    log.info("Skipping cleaning of source code files in old builds".to_string());
}

fn delete_previous_sources<B, L>(build: &B, directory: &str, log: &mut L)
where
    B: BuildRecord + ?Sized,
    L: LogSink + ?Sized,
{
    if !is_plain_folder(directory) {
        log.error(format!(
            "Refusing to clean source folder '{directory}': it must be a folder name inside the build directory"
        ));
        return;
    }

    let mut previous = build.previous_completed_build();
    while let Some(old) = previous {
        let sources = old.root_dir().join(directory);
        if sources.exists() {
            match fs::remove_dir_all(&sources) {
                Ok(()) => log.info(format!(
                    "Deleting source code files of build {}",
                    old.display_name()
                )),
                Err(e) => log.error(format!(
                    "Could not delete source code files of build {}: {}",
                    old.display_name(),
                    e
                )),
            }
        }
        previous = old.previous_completed_build();
    }
}

/// A relative folder that stays below the build directory.
fn is_plain_folder(directory: &str) -> bool {
    if directory.trim().is_empty() || paths::is_absolute(directory) {
        return false;
    }
    let normalized = paths::normalize(directory);
    normalized != "." && normalized != ".." && !normalized.starts_with("../")
}

impl fmt::Display for SourceCodeRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SourceCodeRetention {
    type Err = RetentionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|retention| retention.id() == id)
            .ok_or_else(|| RetentionError::UnknownStrategy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log::FilteredLog;
    use crate::domains::retention::LocalBuild;
    use std::path::Path;
    use tempfile::TempDir;

    const SOURCES: &str = "prism-sources";

    fn create_build(builds: &Path, number: u64, with_sources: bool) {
        let root = builds.join(number.to_string());
        fs::create_dir(&root).unwrap();
        if with_sources {
            fs::create_dir(root.join(SOURCES)).unwrap();
            fs::write(root.join(SOURCES).join("Main.java"), "class Main {}").unwrap();
        }
    }

    fn job(with_sources: &[(u64, bool)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (number, sources) in with_sources {
            create_build(temp_dir.path(), *number, *sources);
        }
        temp_dir
    }

    #[test]
    fn test_parse_strategies() {
        assert_eq!("never".parse::<SourceCodeRetention>().unwrap(), SourceCodeRetention::Never);
        assert_eq!("LAST_BUILD".parse::<SourceCodeRetention>().unwrap(), SourceCodeRetention::LastBuild);
        assert_eq!("every-build".parse::<SourceCodeRetention>().unwrap(), SourceCodeRetention::EveryBuild);
        assert!(matches!(
            "sometimes".parse::<SourceCodeRetention>(),
            Err(RetentionError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_never_and_every_build_skip_cleanup() {
        let job = job(&[(1, true), (2, true)]);
        let current = LocalBuild::open(job.path().join("2")).unwrap();

        for retention in [SourceCodeRetention::Never, SourceCodeRetention::EveryBuild] {
            let mut log = FilteredLog::new("Retention");
            retention.cleanup(&current, SOURCES, &mut log);
            assert_eq!(
                log.info_messages(),
                vec!["Skipping cleaning of source code files in old builds"]
            );
        }
        assert!(job.path().join("1").join(SOURCES).exists());
    }

    #[test]
    fn test_last_build_deletes_older_sources() {
        let job = job(&[(1, true), (2, false), (3, true), (4, true)]);
        let current = LocalBuild::open(job.path().join("4")).unwrap();
        let mut log = FilteredLog::new("Retention");

        SourceCodeRetention::LastBuild.cleanup(&current, SOURCES, &mut log);

        assert!(job.path().join("4").join(SOURCES).exists());
        assert!(!job.path().join("3").join(SOURCES).exists());
        assert!(!job.path().join("1").join(SOURCES).exists());
        assert!(job.path().join("1").exists());
        assert_eq!(
            log.info_messages(),
            vec![
                "Deleting source code files of build #3",
                "Deleting source code files of build #1"
            ]
        );
        assert!(!log.has_errors());
    }

    #[test]
    fn test_last_build_refuses_escaping_folder() {
        let job = job(&[(1, true), (2, true)]);
        let current = LocalBuild::open(job.path().join("2")).unwrap();
        let mut log = FilteredLog::new("Retention");

        SourceCodeRetention::LastBuild.cleanup(&current, "../2", &mut log);
        SourceCodeRetention::LastBuild.cleanup(&current, "/tmp", &mut log);
        SourceCodeRetention::LastBuild.cleanup(&current, "", &mut log);

        assert_eq!(log.error_messages().len(), 3);
        assert!(job.path().join("2").join(SOURCES).exists());
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(
            SourceCodeRetention::Never.to_string(),
            "Never store source code files"
        );
        assert_eq!(
            serde_json::to_string(&SourceCodeRetention::LastBuild).unwrap(),
            "\"last-build\""
        );
    }
}
