//! Resolution of requested source files for one build.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::error::{DenialReason, PermissionDenied, ViewerError};
use crate::core::log::LogSink;
use crate::core::security::paths;
use crate::core::security::{PathPermissionEnforcer, SourceDirectoryFilter, resolve_permitted};
use crate::core::workspace::Workspace;
use crate::domains::approval::ApprovedDirectories;

/// Identifier of the permission required to view source code.
pub const VIEW_SOURCE_CODE: &str = "ViewSourceCode";

/// Outcome of a file request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewDecision {
    /// The file may be shown; the path is absolute.
    Permitted(PathBuf),
    /// The caller must render a denial view instead.
    Denied(PermissionDenied),
}

impl ViewDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted(_))
    }
}

/// Source file access for the files of one build.
///
/// The capability check is explicit: whoever builds the viewer decides whether
/// the current user may view source code at all. The workspace and the
/// approved directories are always passed in, never looked up globally.
#[derive(Debug, Clone)]
pub struct SourceViewer<W: Workspace> {
    workspace: W,
    workspace_root: String,
    may_view_source: bool,
    approved: ApprovedDirectories,
    source_directories: BTreeSet<String>,
    enforcer: PathPermissionEnforcer,
}

impl<W: Workspace> SourceViewer<W> {
    pub fn new(workspace: W, approved: ApprovedDirectories) -> Self {
        let workspace_root = paths::absolute_path(workspace.remote_path());
        let enforcer = PathPermissionEnforcer::with_case_sensitivity(approved.case_sensitivity());
        Self {
            workspace,
            workspace_root,
            may_view_source: true,
            approved,
            source_directories: BTreeSet::new(),
            enforcer,
        }
    }

    /// Sets whether the current user holds the [`VIEW_SOURCE_CODE`] permission.
    pub fn with_permission(mut self, may_view_source: bool) -> Self {
        self.may_view_source = may_view_source;
        self
    }

    /// Registers the source directories requested by a build report. Only the
    /// directories the filter permits are kept; rejections go to `log`.
    pub fn with_source_directories<R, L>(mut self, requested: R, log: &mut L) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        L: LogSink + ?Sized,
    {
        let filter = SourceDirectoryFilter::with_case_sensitivity(self.approved.case_sensitivity());
        let permitted = filter.filter_permitted(&self.workspace_root, &self.approved, requested, log);
        self.source_directories
            .extend(resolve_permitted(&self.workspace_root, &permitted));
        self
    }

    /// Absolute source directories searched for relative file names.
    pub fn source_directories(&self) -> &BTreeSet<String> {
        &self.source_directories
    }

    /// Decides whether `file_name` may be shown and where it lives.
    ///
    /// Relative names are looked up in the workspace first and then in every
    /// registered source directory; the first existing file wins.
    #[instrument(skip(self))]
    pub fn resolve(&self, file_name: &str) -> ViewDecision {
        if !self.may_view_source {
            warn!("Missing permission {} to view '{}'", VIEW_SOURCE_CODE, file_name);
            return self.deny(file_name, DenialReason::MissingPermission);
        }

        let candidate = self.locate(file_name);
        let permitted_directories = self.approved.iter().chain(&self.source_directories);
        if self
            .enforcer
            .is_permitted(&candidate, &self.workspace, permitted_directories)
        {
            info!("Showing source file '{}'", candidate);
            ViewDecision::Permitted(PathBuf::from(candidate))
        } else {
            warn!("Refusing to show '{}' outside of the permitted directories", file_name);
            self.deny(file_name, DenialReason::OutsidePermittedDirectories)
        }
    }

    /// Reads a permitted source file.
    pub fn read(&self, file_name: &str) -> Result<String, ViewerError> {
        match self.resolve(file_name) {
            ViewDecision::Permitted(path) => {
                fs::read_to_string(&path).map_err(|error| ViewerError::Io { path, error })
            }
            ViewDecision::Denied(denied) => Err(denied.into()),
        }
    }

    fn locate(&self, file_name: &str) -> String {
        if paths::is_absolute(file_name) {
            return paths::normalize(file_name);
        }

        let in_workspace = paths::create_absolute_path(&self.workspace_root, file_name);
        std::iter::once(in_workspace.clone())
            .chain(
                self.source_directories
                    .iter()
                    .map(|directory| paths::create_absolute_path(directory, file_name)),
            )
            .find(|candidate| Path::new(candidate).is_file())
            .unwrap_or(in_workspace)
    }

    fn deny(&self, file_name: &str, reason: DenialReason) -> ViewDecision {
        ViewDecision::Denied(PermissionDenied {
            file_name: file_name.to_string(),
            reason,
            required_permission: VIEW_SOURCE_CODE,
        })
    }
}
