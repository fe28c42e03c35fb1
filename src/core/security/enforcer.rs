use std::collections::BTreeSet;

use tracing::{debug, instrument};

use super::paths::{self, CaseSensitivity};
use crate::core::workspace::Workspace;

/// Decides whether a file may be shown because it lives inside the build
/// workspace or inside one of the additionally permitted directories.
///
/// Files inside the workspace are always permitted. Directories outside of it
/// must be passed explicitly, usually the administrator approved directories
/// plus the output of [`SourceDirectoryFilter`](super::SourceDirectoryFilter).
///
/// # Examples
///
/// ```rust
/// use prism_guard::core::{LocalWorkspace, PathPermissionEnforcer};
///
/// let enforcer = PathPermissionEnforcer::new();
/// let workspace = LocalWorkspace::new("/workspace");
///
/// assert!(enforcer.is_permitted("/workspace/src/main.c", &workspace, ["/a"]));
/// assert!(enforcer.is_permitted("/a/b.c", &workspace, ["/a"]));
/// assert!(!enforcer.is_permitted("/a/b.c", &workspace, ["/a/b"]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPermissionEnforcer {
    case: CaseSensitivity,
}

impl PathPermissionEnforcer {
    /// Creates an enforcer using the case convention of the current platform.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_sensitivity(case: CaseSensitivity) -> Self {
        Self { case }
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case
    }

    /// Returns `true` if `candidate` resolves inside the workspace or one of
    /// `permitted_directories`.
    ///
    /// Relative candidates are never permitted. Relative permitted directories
    /// are interpreted relative to the workspace and ignored if they leave it.
    /// This check never fails: paths that cannot be resolved simply do not match.
    #[instrument(skip_all, fields(candidate = %candidate))]
    pub fn is_permitted<W, I>(&self, candidate: &str, workspace: &W, permitted_directories: I) -> bool
    where
        W: Workspace + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        if !paths::is_absolute(candidate) {
            debug!("Relative path '{}' is never permitted", candidate);
            return false;
        }
        let source_file = paths::absolute_path(candidate);

        let prefixes = self.permitted_prefixes(workspace, permitted_directories);
        let permitted = prefixes
            .iter()
            .any(|prefix| paths::is_within(&source_file, prefix, self.case));

        debug!(
            "'{}' is {} by {} prefixes",
            source_file,
            if permitted { "permitted" } else { "not permitted" },
            prefixes.len()
        );
        permitted
    }

    fn permitted_prefixes<W, I>(&self, workspace: &W, permitted_directories: I) -> BTreeSet<String>
    where
        W: Workspace + ?Sized,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let remote = workspace.remote_path();
        let workspace_root = paths::absolute_path(remote);

        let mut prefixes = BTreeSet::new();
        for directory in permitted_directories {
            let directory = directory.as_ref();
            if directory.trim().is_empty() {
                continue;
            }
            if paths::is_absolute(directory) {
                prefixes.insert(paths::absolute_path(directory));
                continue;
            }

            let resolved = paths::absolute_path(&paths::create_absolute_path(&workspace_root, directory));
            if paths::is_within(&resolved, &workspace_root, self.case) {
                prefixes.insert(resolved);
            } else {
                debug!("Ignoring relative directory '{}' outside of the workspace", directory);
            }
        }

        if paths::is_absolute(remote) {
            prefixes.insert(paths::normalize(remote));
        }
        prefixes.insert(workspace_root);
        prefixes.insert(paths::absolute_path(&resolve_workspace(workspace)));
        prefixes
    }
}

/// Returns the link target of the workspace, or its raw path if it is no link.
pub fn resolve_workspace<W: Workspace + ?Sized>(workspace: &W) -> String {
    workspace
        .try_resolve_symlink()
        .unwrap_or_else(|| workspace.remote_path().to_string())
}
