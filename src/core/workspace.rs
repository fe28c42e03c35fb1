//! Workspace handle of a build.
//!
//! The workspace is the containment boundary for every file a viewer may show.
//! It may itself be a symbolic link; the permission checks consult both the raw
//! path and the link target.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::security::paths;

/// A build workspace on the agent that executed the build.
pub trait Workspace {
    /// The path of the workspace as reported by the agent.
    fn remote_path(&self) -> &str;

    /// Returns the target if the workspace is a symbolic link.
    ///
    /// Any I/O failure is reported as `None`.
    fn try_resolve_symlink(&self) -> Option<String>;
}

/// A workspace that lives on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalWorkspace {
    remote: String,
}

impl LocalWorkspace {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            remote: paths::path_to_string(path.as_ref()),
        }
    }
}

impl Workspace for LocalWorkspace {
    fn remote_path(&self) -> &str {
        &self.remote
    }

    fn try_resolve_symlink(&self) -> Option<String> {
        let path = Path::new(&self.remote);
        let target = match fs::read_link(path) {
            Ok(target) => target,
            Err(e) => {
                debug!("Workspace '{}' is not a readable symlink: {}", self.remote, e);
                return None;
            }
        };

        // Relative targets are relative to the directory holding the link
        let target = match path.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target,
        };
        Some(paths::normalize(&paths::path_to_string(&target)))
    }
}

impl<W: Workspace + ?Sized> Workspace for &W {
    fn remote_path(&self) -> &str {
        (**self).remote_path()
    }

    fn try_resolve_symlink(&self) -> Option<String> {
        (**self).try_resolve_symlink()
    }
}
