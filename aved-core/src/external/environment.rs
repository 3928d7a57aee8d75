//! Child-process environment and tool search directories.
//!
//! Children inherit the parent environment with the configured fallback
//! directories appended to `PATH`, so tools installed under MacPorts or
//! `/usr/local/bin` resolve even when the desktop session's `PATH` is minimal.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Returns `current` with each fallback directory appended.
///
/// Directories already present in `current` are not appended again.
pub fn augmented_path(current: Option<&OsStr>, fallbacks: &[PathBuf]) -> OsString {
    let mut dirs: Vec<PathBuf> = current
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    for dir in fallbacks {
        if !dirs.contains(dir) {
            dirs.push(dir.clone());
        }
    }
    // join_paths only fails on a separator inside a component; keep the
    // original value in that case rather than dropping PATH entirely.
    std::env::join_paths(&dirs).unwrap_or_else(|e| {
        log::warn!("Could not extend PATH with fallback directories: {}", e);
        current.map(OsStr::to_os_string).unwrap_or_default()
    })
}

/// `PATH` value children are launched with.
pub fn child_path(fallbacks: &[PathBuf]) -> OsString {
    augmented_path(std::env::var_os("PATH").as_deref(), fallbacks)
}

/// Ordered, de-duplicated directories to search for a tool: `PATH` entries
/// first, then the fallbacks. Empty `PATH` segments are skipped.
pub fn search_dirs(path_var: Option<&OsStr>, fallbacks: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let from_path = path_var
        .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
        .unwrap_or_default();

    from_path
        .into_iter()
        .chain(fallbacks.iter().cloned())
        .filter(|dir| !dir.as_os_str().is_empty())
        .filter(|dir| seen.insert(dir.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallbacks() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/opt/local/bin"),
            PathBuf::from("/usr/bin"),
            PathBuf::from("/usr/local/bin"),
        ]
    }

    #[test]
    fn test_augmented_path_appends_missing_dirs() {
        let path = augmented_path(Some(OsStr::new("/bin:/usr/bin")), &fallbacks());
        assert_eq!(path, OsString::from("/bin:/usr/bin:/opt/local/bin:/usr/local/bin"));
    }

    #[test]
    fn test_augmented_path_without_current() {
        let path = augmented_path(None, &fallbacks());
        assert_eq!(path, OsString::from("/opt/local/bin:/usr/bin:/usr/local/bin"));
    }

    #[test]
    fn test_search_dirs_order_and_dedup() {
        let dirs = search_dirs(Some(OsStr::new("/a::/usr/bin:/a")), &fallbacks());
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/opt/local/bin"),
                PathBuf::from("/usr/local/bin"),
            ]
        );
    }
}
