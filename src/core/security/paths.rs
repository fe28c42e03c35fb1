//! Path normalization shared by the permission enforcer and the directory filter.
//!
//! All paths handled here are plain strings using `/` as separator, regardless
//! of the platform. Windows style input (`C:\ws\file.c`) is accepted and
//! converted, so drive-letter paths can be reasoned about on any host.
//!
//! Containment checks never compare raw strings: both sides are normalized
//! first and compared segment by segment, optionally ignoring case.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Separator used by every path this module returns.
pub const SEPARATOR: char = '/';

/// Whether path comparisons distinguish upper and lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    /// Default case convention of the filesystem this process runs on.
    ///
    /// Windows and macOS volumes are case-insensitive unless formatted
    /// otherwise; every other platform is treated as case-sensitive.
    pub fn platform() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    pub fn is_insensitive(self) -> bool {
        self == Self::Insensitive
    }
}

impl Default for CaseSensitivity {
    fn default() -> Self {
        Self::platform()
    }
}

/// Replaces every backslash with a forward slash.
pub fn to_unix_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Converts a [`Path`] into a unix style string.
pub fn path_to_string(path: &Path) -> String {
    to_unix_separators(&path.to_string_lossy())
}

/// Splits a unix style path into its root (`/`, `C:/`, `//` or empty) and the rest.
fn split_root(path: &str) -> (String, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.len() >= 3 && bytes[2] == b'/' {
            return (format!("{}/", &path[..2]), &path[3..]);
        }
        // drive relative ("C:foo") has no absolute root
        return (String::new(), path);
    }
    if path.starts_with("//") && !path.starts_with("///") {
        return ("//".to_string(), &path[2..]);
    }
    if let Some(rest) = path.strip_prefix('/') {
        return ("/".to_string(), rest.trim_start_matches('/'));
    }
    (String::new(), path)
}

/// Splits a path into root and normalized segments.
fn segments(path: &str) -> (String, Vec<&str>) {
    let (root, rest) = split_root(path);
    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if root.is_empty() {
                    parts.push("..");
                }
                // ".." at an absolute root stays at the root
            }
            other => parts.push(other),
        }
    }
    (root, parts)
}

fn join_segments(root: &str, parts: &[&str]) -> String {
    let joined = parts.join("/");
    if root.is_empty() {
        if joined.is_empty() { ".".to_string() } else { joined }
    } else {
        format!("{root}{joined}")
    }
}

/// Returns `true` if the path has a POSIX root, a drive letter root or a UNC prefix.
pub fn is_absolute(path: &str) -> bool {
    let unix = to_unix_separators(path);
    !split_root(&unix).0.is_empty()
}

/// Lexically normalizes a path: unifies separators, resolves `.` and `..`,
/// collapses duplicate separators and strips trailing ones.
///
/// The filesystem is not consulted.
pub fn normalize(path: &str) -> String {
    let unix = to_unix_separators(path);
    let (root, parts) = segments(&unix);
    join_segments(&root, &parts)
}

/// Resolves `relative` against `base`. Absolute input is only normalized.
pub fn create_absolute_path(base: &str, relative: &str) -> String {
    if is_absolute(relative) {
        normalize(relative)
    } else {
        normalize(&format!("{}/{}", to_unix_separators(base), to_unix_separators(relative)))
    }
}

/// Returns the canonical absolute form of a path.
///
/// Relative paths are resolved against the current directory. Symbolic links
/// are resolved segment by segment, so `..` after a link leaves the link
/// target, not the directory holding the link. Segments below the first
/// missing one are folded lexically, so paths that do not exist yet still get
/// a stable form. Paths the host cannot address (a drive letter path on a
/// POSIX host, for example) are normalized lexically only.
pub fn absolute_path(path: &str) -> String {
    let unix = to_unix_separators(path);
    let absolute = if is_absolute(&unix) {
        unix
    } else {
        match env::current_dir() {
            Ok(cwd) => format!("{}/{}", path_to_string(&cwd), unix),
            Err(_) => return normalize(&unix),
        }
    };

    if Path::new(&absolute).is_absolute() {
        resolve_links(&absolute)
    } else {
        normalize(&absolute)
    }
}

fn resolve_links(absolute: &str) -> String {
    let (root, rest) = split_root(absolute);
    let mut resolved = root;
    for segment in rest.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => resolved = parent(&resolved),
            name => {
                let next = child(&resolved, name);
                // only an existing prefix can be a link; a missing one stays lexical
                resolved = match dunce::canonicalize(&next) {
                    Ok(real) => normalize(&path_to_string(&real)),
                    Err(_) => next,
                };
            }
        }
    }
    normalize(&resolved)
}

fn parent(path: &str) -> String {
    let (root, mut parts) = segments(path);
    parts.pop();
    join_segments(&root, &parts)
}

fn child(path: &str, name: &str) -> String {
    if path.ends_with(SEPARATOR) {
        format!("{path}{name}")
    } else {
        format!("{path}{SEPARATOR}{name}")
    }
}

/// Key used to compare two normalized paths under the given case convention.
pub fn comparison_key(path: &str, case: CaseSensitivity) -> String {
    if case.is_insensitive() {
        path.to_lowercase()
    } else {
        path.to_string()
    }
}

fn same_segment(left: &str, right: &str, case: CaseSensitivity) -> bool {
    if case.is_insensitive() {
        left.to_lowercase() == right.to_lowercase()
    } else {
        left == right
    }
}

/// Segment aware prefix check: `/a/b/c` is within `/a/b`, `/a/bc` is not.
///
/// Both arguments are expected to be normalized already.
pub fn is_within(path: &str, prefix: &str, case: CaseSensitivity) -> bool {
    let (path_root, path_parts) = segments(path);
    let (prefix_root, prefix_parts) = segments(prefix);

    same_segment(&path_root, &prefix_root, case)
        && prefix_parts.len() <= path_parts.len()
        && prefix_parts
            .iter()
            .zip(&path_parts)
            .all(|(expected, actual)| same_segment(expected, actual, case))
}

/// Returns `true` if both normalized paths name the same location.
pub fn is_same_path(left: &str, right: &str, case: CaseSensitivity) -> bool {
    is_within(left, right, case) && is_within(right, left, case)
}

/// Expresses `child` relative to `base`, or `None` if it is not inside `base`.
///
/// Returns `"."` when both paths are the same.
pub fn relative_path(base: &str, child: &str, case: CaseSensitivity) -> Option<String> {
    if !is_within(child, base, case) {
        return None;
    }
    let (_, base_parts) = segments(base);
    let (_, child_parts) = segments(child);
    Some(join_segments("", &child_parts[base_parts.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_unifies_separators() {
        assert_eq!(normalize("C:\\a\\b.c"), "C:/a/b.c");
        assert_eq!(normalize("/a//b/./c/"), "/a/b/c");
        assert_eq!(normalize("/a/b/../c"), "/a/c");
    }

    #[test]
    fn test_normalize_does_not_climb_above_root() {
        assert_eq!(normalize("/../../etc"), "/etc");
        assert_eq!(normalize("C:/../x"), "C:/x");
        assert_eq!(normalize("../x"), "../x");
        assert_eq!(normalize("a/.."), ".");
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("/workspace"));
        assert!(is_absolute("C:\\workspace"));
        assert!(is_absolute("c:/workspace"));
        assert!(is_absolute("//server/share"));

        assert!(!is_absolute("b.c"));
        assert!(!is_absolute("src/main"));
        assert!(!is_absolute("C:relative"));
        assert!(!is_absolute(""));
    }

    #[test]
    fn test_create_absolute_path() {
        assert_eq!(create_absolute_path("/ws", "src/main"), "/ws/src/main");
        assert_eq!(create_absolute_path("/ws/", "./src"), "/ws/src");
        assert_eq!(create_absolute_path("/ws", "../other"), "/other");
        assert_eq!(create_absolute_path("/ws", "/abs"), "/abs");
        assert_eq!(create_absolute_path("C:\\ws", "src\\x"), "C:/ws/src/x");
    }

    #[test]
    fn test_is_within_is_segment_aware() {
        let case = CaseSensitivity::Sensitive;
        assert!(is_within("/a/b.c", "/a", case));
        assert!(is_within("/a/b.c", "/", case));
        assert!(is_within("/a", "/a", case));

        assert!(!is_within("/a/bc", "/a/b", case));
        assert!(!is_within("/a/b.c", "/a/b", case));
        assert!(!is_within("/b/a/b.c", "/a", case));
        assert!(!is_within("a/b.c", "/a", case));
    }

    #[test]
    fn test_is_within_respects_case_sensitivity() {
        assert!(!is_within("C:/A/b.c", "C:/a", CaseSensitivity::Sensitive));
        assert!(is_within("C:/A/b.c", "C:/a", CaseSensitivity::Insensitive));
        assert!(is_within("c:/a/b.c", "C:/A", CaseSensitivity::Insensitive));
        assert!(!is_within("c:/a/b.c", "C:/b", CaseSensitivity::Insensitive));
    }

    #[test]
    fn test_relative_path() {
        let case = CaseSensitivity::Sensitive;
        assert_eq!(relative_path("/ws", "/ws/sub-folder", case).as_deref(), Some("sub-folder"));
        assert_eq!(relative_path("/ws", "/ws/a/b", case).as_deref(), Some("a/b"));
        assert_eq!(relative_path("/ws", "/ws", case).as_deref(), Some("."));
        assert_eq!(relative_path("/ws", "/wsx/a", case), None);
    }

    #[test]
    fn test_platform_case_convention() {
        let expected = if cfg!(any(windows, target_os = "macos")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        };
        assert_eq!(CaseSensitivity::platform(), expected);
        assert_eq!(CaseSensitivity::default(), expected);
    }

    #[test]
    fn test_comparison_key() {
        assert_eq!(comparison_key("C:/Ws", CaseSensitivity::Insensitive), "c:/ws");
        assert_eq!(comparison_key("C:/Ws", CaseSensitivity::Sensitive), "C:/Ws");
    }

    #[test]
    fn test_absolute_path_resolves_relative_against_current_dir() {
        let cwd = absolute_path(&path_to_string(&env::current_dir().unwrap()));
        assert_eq!(absolute_path("some/file.c"), format!("{cwd}/some/file.c"));
    }

    #[test]
    fn test_absolute_path_keeps_missing_tail() {
        let temp_dir = TempDir::new().unwrap();
        let root = absolute_path(&path_to_string(temp_dir.path()));
        let missing = format!("{root}/not/there.c");

        assert_eq!(absolute_path(&missing), missing);
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_resolves_symlinked_ancestor() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::create_dir(&target).unwrap();
        symlink(&target, &link).unwrap();

        let resolved = absolute_path(&format!("{}/file.c", path_to_string(&link)));
        let expected = format!("{}/file.c", absolute_path(&path_to_string(&target)));
        assert_eq!(resolved, expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_applies_parent_after_symlink() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = path_to_string(temp_dir.path());
        fs::create_dir_all(temp_dir.path().join("outside/deep")).unwrap();
        fs::create_dir(temp_dir.path().join("ws")).unwrap();
        symlink(temp_dir.path().join("outside/deep"), temp_dir.path().join("ws/link")).unwrap();

        let resolved = absolute_path(&format!("{root}/ws/link/../secret.txt"));
        let expected = format!("{}/secret.txt", absolute_path(&format!("{root}/outside")));
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_absolute_path_of_foreign_drive_is_lexical() {
        if cfg!(windows) {
            return;
        }
        assert_eq!(absolute_path("C:\\a\\..\\b.c"), "C:/b.c");
    }
}
