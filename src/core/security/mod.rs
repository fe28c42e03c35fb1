// Security module for source file access control
//
// This module decides which files a build result viewer may show. Files inside
// the build workspace are always visible; everything else must live in a
// directory an administrator approved. Both checks work on canonical paths so
// that `..` segments, symlinks and mixed case cannot be used to escape.

pub mod enforcer;
pub mod filter;
pub mod paths;

pub use enforcer::{PathPermissionEnforcer, resolve_workspace};
pub use filter::{
    DirectoryMatcher, PatternError, RequestedDirectory, SourceDirectoryFilter, resolve_permitted,
};
pub use paths::CaseSensitivity;
