//! Validation of source directories entered in a job configuration.
//!
//! This mirrors the decisions of the directory filter, but reports them up
//! front so that users learn about unapproved directories while configuring a
//! job rather than from the build log.

use std::fmt;

use super::registry::ApprovedDirectories;
use crate::core::security::filter::{DirectoryMatcher, RequestedDirectory};
use crate::core::security::paths;

/// Result of validating one configured source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Warning(String),
    Error(String),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Warning(message) => write!(f, "warning: {message}"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Validates configured source directories against the approved directories.
#[derive(Debug, Clone, Copy)]
pub struct SourceDirectoryValidation<'a> {
    approved: &'a ApprovedDirectories,
}

impl<'a> SourceDirectoryValidation<'a> {
    pub fn new(approved: &'a ApprovedDirectories) -> Self {
        Self { approved }
    }

    /// Validates one entry. If the workspace of the job is not known (no build
    /// ran yet), absolute directories that are not approved only get a warning.
    pub fn validate_source_directory(&self, workspace_root: Option<&str>, directory: &str) -> Validation {
        let case = self.approved.case_sensitivity();

        match RequestedDirectory::classify(directory) {
            RequestedDirectory::Placeholder => Validation::Ok,
            RequestedDirectory::Pattern(pattern) => match DirectoryMatcher::parse(pattern, case) {
                Ok(_) => Validation::Ok,
                Err(e) => Validation::Error(e.to_string()),
            },
            RequestedDirectory::Relative(relative) => {
                let normalized = paths::normalize(relative);
                if normalized == ".." || normalized.starts_with("../") {
                    Validation::Error(format!(
                        "Relative directory '{relative}' points outside of the workspace"
                    ))
                } else {
                    Validation::Ok
                }
            }
            RequestedDirectory::Absolute(absolute) => {
                if self.approved.is_allowed_source_directory(absolute) {
                    return Validation::Ok;
                }
                let normalized = paths::absolute_path(absolute);
                match workspace_root {
                    Some(workspace) if paths::is_within(&normalized, &paths::absolute_path(workspace), case) => {
                        Validation::Ok
                    }
                    Some(_) => Validation::Error(format!(
                        "Directory '{normalized}' is outside of the workspace and not approved in the global configuration"
                    )),
                    None => Validation::Warning(format!(
                        "Directory '{normalized}' must be inside the workspace or approved in the global configuration"
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::security::CaseSensitivity;

    fn approved() -> ApprovedDirectories {
        ApprovedDirectories::new(["/opt/shared"], CaseSensitivity::Sensitive)
    }

    #[test]
    fn test_placeholders_are_valid() {
        let approved = approved();
        let validation = SourceDirectoryValidation::new(&approved);

        assert!(validation.validate_source_directory(None, "").is_ok());
        assert!(validation.validate_source_directory(None, "-").is_ok());
    }

    #[test]
    fn test_relative_directories() {
        let approved = approved();
        let validation = SourceDirectoryValidation::new(&approved);

        assert!(validation.validate_source_directory(None, "src/main/java").is_ok());
        assert!(validation.validate_source_directory(None, "src/../../other").is_error());
    }

    #[test]
    fn test_patterns_are_checked_for_syntax() {
        let approved = approved();
        let validation = SourceDirectoryValidation::new(&approved);

        assert!(validation.validate_source_directory(None, "glob:**/src").is_ok());
        assert!(validation.validate_source_directory(None, "regex:.*/src").is_ok());
        assert!(validation.validate_source_directory(None, "regex:([").is_error());
    }

    #[test]
    fn test_absolute_directories() {
        let approved = approved();
        let validation = SourceDirectoryValidation::new(&approved);

        assert!(validation.validate_source_directory(None, "/opt/shared").is_ok());
        assert!(validation.validate_source_directory(Some("/workspace"), "/workspace/sub").is_ok());
        assert!(validation.validate_source_directory(Some("/workspace"), "/etc").is_error());
        assert!(matches!(
            validation.validate_source_directory(None, "/etc"),
            Validation::Warning(_)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Validation::Ok.to_string(), "ok");
        assert_eq!(Validation::Error("bad".to_string()).to_string(), "error: bad");
    }
}
