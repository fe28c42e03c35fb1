use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use glob::MatchOptions;
use regex::RegexBuilder;
use tracing::{debug, info, instrument};

use super::paths::{self, CaseSensitivity};
use crate::core::log::LogSink;

/// Placeholder some report formats use for "no source directory".
pub const PLACEHOLDER: &str = "-";

/// Scheme tag of glob pattern entries.
pub const GLOB_SCHEME: &str = "glob:";

/// Scheme tag of regular expression pattern entries.
pub const REGEX_SCHEME: &str = "regex:";

/// Errors that can occur while resolving a directory pattern.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid glob pattern '{pattern}': {error}")]
    InvalidGlob {
        pattern: String,
        error: glob::PatternError,
    },

    #[error("Invalid regex pattern '{pattern}': {error}")]
    InvalidRegex { pattern: String, error: regex::Error },

    #[error("Cannot find subdirectories in '{directory}': {error}")]
    Walk { directory: String, error: io::Error },
}

/// A requested source directory, classified by its syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedDirectory<'a> {
    /// Blank entry or the `-` placeholder.
    Placeholder,
    /// A `glob:` or `regex:` pattern, scheme tag included.
    Pattern(&'a str),
    Absolute(&'a str),
    Relative(&'a str),
}

impl<'a> RequestedDirectory<'a> {
    pub fn classify(entry: &'a str) -> Self {
        if entry.trim().is_empty() || entry == PLACEHOLDER {
            Self::Placeholder
        } else if is_pattern(entry) {
            Self::Pattern(entry)
        } else if paths::is_absolute(entry) {
            Self::Absolute(entry)
        } else {
            Self::Relative(entry)
        }
    }
}

/// Returns `true` if the entry carries a `glob:` or `regex:` scheme tag.
pub fn is_pattern(entry: &str) -> bool {
    entry.starts_with(GLOB_SCHEME) || entry.starts_with(REGEX_SCHEME)
}

/// Compiled `glob:` or `regex:` pattern, matched against absolute directory paths.
#[derive(Debug)]
pub enum DirectoryMatcher {
    Glob {
        pattern: glob::Pattern,
        options: MatchOptions,
    },
    Regex(regex::Regex),
}

impl DirectoryMatcher {
    /// Compiles a pattern entry including its scheme tag.
    ///
    /// Glob patterns follow the usual rules: `*` stays within one path segment,
    /// `**` spans any number of segments. Regular expressions must match the
    /// whole path.
    pub fn parse(entry: &str, case: CaseSensitivity) -> Result<Self, PatternError> {
        if let Some(glob) = entry.strip_prefix(GLOB_SCHEME) {
            let pattern = glob::Pattern::new(glob).map_err(|error| PatternError::InvalidGlob {
                pattern: entry.to_string(),
                error,
            })?;
            let options = MatchOptions {
                case_sensitive: !case.is_insensitive(),
                require_literal_separator: true,
                require_literal_leading_dot: false,
            };
            return Ok(Self::Glob { pattern, options });
        }

        let expression = entry.strip_prefix(REGEX_SCHEME).unwrap_or(entry);
        RegexBuilder::new(&format!("^(?:{expression})$"))
            .case_insensitive(case.is_insensitive())
            .build()
            .map(Self::Regex)
            .map_err(|error| PatternError::InvalidRegex {
                pattern: entry.to_string(),
                error,
            })
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Glob { pattern, options } => pattern.matches_with(path, *options),
            Self::Regex(regex) => regex.is_match(path),
        }
    }
}

/// Collects all directories below `root` (including `root`) whose absolute
/// path matches `matcher`.
///
/// Directories are visited in post order. Symbolic links are never followed.
/// Only a failure to read `root` itself is reported; unreadable subtrees are
/// skipped.
pub fn find_matching_directories(root: &Path, matcher: &DirectoryMatcher) -> io::Result<Vec<String>> {
    let entries = fs::read_dir(root)?;

    let mut matches = Vec::new();
    for entry in entries.flatten() {
        if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
            visit_directory(&entry.path(), matcher, &mut matches);
        }
    }
    add_if_matching(root, matcher, &mut matches);
    Ok(matches)
}

fn visit_directory(directory: &Path, matcher: &DirectoryMatcher, matches: &mut Vec<String>) {
    match fs::read_dir(directory) {
        Ok(entries) => {
            for entry in entries.flatten() {
                if entry.file_type().is_ok_and(|file_type| file_type.is_dir()) {
                    visit_directory(&entry.path(), matcher, matches);
                }
            }
        }
        Err(e) => debug!("Skipping unreadable directory {:?}: {}", directory, e),
    }
    add_if_matching(directory, matcher, matches);
}

fn add_if_matching(directory: &Path, matcher: &DirectoryMatcher, matches: &mut Vec<String>) {
    let path = paths::path_to_string(directory);
    if matcher.matches(&path) {
        matches.push(paths::absolute_path(&path));
    }
}

/// Filters requested source directories down to the ones that may be
/// registered for a build.
///
/// A directory is safe if it is inside the agent workspace. Directories outside
/// the workspace must be approved by an administrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceDirectoryFilter {
    case: CaseSensitivity,
}

impl SourceDirectoryFilter {
    /// Creates a filter using the case convention of the current platform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_sensitivity(case: CaseSensitivity) -> Self {
        Self { case }
    }

    /// Returns the permitted subset of `requested` for the given workspace.
    ///
    /// - blank entries and `-` are skipped
    /// - `glob:` and `regex:` patterns are resolved below the workspace and
    ///   every matching directory is returned as absolute path
    /// - absolute paths inside the workspace are returned relative to it, the
    ///   workspace itself is dropped since it is always permitted
    /// - absolute paths outside the workspace are returned only if they are in
    ///   `approved`; all others are removed and logged as error
    /// - relative paths are returned as absolute paths below the workspace
    ///
    /// Never fails: problems are reported to `log` and the entry is omitted.
    #[instrument(skip_all, fields(workspace = %workspace_root))]
    pub fn filter_permitted<A, R, L>(
        &self,
        workspace_root: &str,
        approved: A,
        requested: R,
        log: &mut L,
    ) -> BTreeSet<String>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
        L: LogSink + ?Sized,
    {
        let workspace = paths::absolute_path(workspace_root);
        let approved: BTreeSet<String> = approved
            .into_iter()
            .map(|directory| paths::comparison_key(&paths::absolute_path(directory.as_ref()), self.case))
            .collect();

        let mut permitted = BTreeSet::new();
        for entry in requested {
            let entry = entry.as_ref();
            match RequestedDirectory::classify(entry) {
                RequestedDirectory::Placeholder => {}
                RequestedDirectory::Pattern(pattern) => {
                    permitted.extend(self.resolve_pattern(&workspace, pattern, log));
                }
                RequestedDirectory::Absolute(directory) => {
                    self.verify_absolute(&workspace, &approved, &paths::absolute_path(directory), &mut permitted, log);
                }
                RequestedDirectory::Relative(directory) => {
                    let absolute = paths::absolute_path(&paths::create_absolute_path(&workspace, directory));
                    if paths::is_within(&absolute, &workspace, self.case) {
                        permitted.insert(absolute);
                    } else {
                        // "../other" style entries are treated like the absolute path they name
                        self.verify_absolute(&workspace, &approved, &absolute, &mut permitted, log);
                    }
                }
            }
        }

        info!("Permitted {} source directories", permitted.len());
        permitted
    }

    fn verify_absolute<L: LogSink + ?Sized>(
        &self,
        workspace: &str,
        approved: &BTreeSet<String>,
        directory: &str,
        permitted: &mut BTreeSet<String>,
        log: &mut L,
    ) {
        if paths::is_same_path(directory, workspace, self.case) {
            debug!("Skipping workspace '{}', it is always permitted", directory);
            return;
        }
        if let Some(relative) = paths::relative_path(workspace, directory, self.case) {
            permitted.insert(relative);
        } else if approved.contains(&paths::comparison_key(directory, self.case)) {
            permitted.insert(directory.to_string());
        } else {
            log.error(format!(
                "Removing non-workspace source directory '{directory}' - it is not approved in the global configuration"
            ));
        }
    }

    fn resolve_pattern<L: LogSink + ?Sized>(&self, workspace: &str, pattern: &str, log: &mut L) -> Vec<String> {
        let resolved = DirectoryMatcher::parse(pattern, self.case).and_then(|matcher| {
            find_matching_directories(Path::new(workspace), &matcher).map_err(|error| PatternError::Walk {
                directory: workspace.to_string(),
                error,
            })
        });

        match resolved {
            Ok(matches) => {
                debug!("Pattern '{}' matched {} directories", pattern, matches.len());
                matches
            }
            Err(e) => {
                log.warning(format!("Skipping source directory pattern '{pattern}': {e}"));
                Vec::new()
            }
        }
    }
}

/// Resolves filter results against the workspace so that relative and
/// absolute spellings of the same directory compare equal.
pub fn resolve_permitted<I>(workspace_root: &str, directories: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let workspace = paths::absolute_path(workspace_root);
    directories
        .into_iter()
        .map(|directory| paths::absolute_path(&paths::create_absolute_path(&workspace, directory.as_ref())))
        .collect()
}
