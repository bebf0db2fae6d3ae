//! Shared path validation utilities for tool implementations

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::tools::registry::ToolError;

/// Resolve `path` to a location inside `root`.
///
/// Relative paths are joined to the root. An absolute path that already
/// lies under the root is used as is; any other absolute path is taken
/// relative to the root, so `/` is the root itself and `/src` is
/// `<root>/src`. Any `..` component is rejected outright.
///
/// The path may not exist yet. The nearest ancestor that exists (symlinks
/// included, dangling or not) is canonicalized so links cannot lead outside
/// the root, and the remaining components are appended as-is. A dangling
/// symlink is rejected since its target cannot be checked.
pub fn resolve_in_workspace(root: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let requested = Path::new(path);

    if requested
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ToolError::OutsideWorkspace(path.to_string()));
    }

    let canonical_root = root.canonicalize()?;
    let relative: PathBuf = if requested.is_absolute() {
        match requested
            .strip_prefix(&canonical_root)
            .or_else(|_| requested.strip_prefix(root))
        {
            Ok(rest) => rest.to_path_buf(),
            Err(_) => requested
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect(),
        }
    } else {
        requested.to_path_buf()
    };

    let mut base = canonical_root.join(relative);
    let mut suffix: Vec<OsString> = Vec::new();
    while fs::symlink_metadata(&base).is_err() {
        match base.file_name() {
            Some(name) => suffix.push(name.to_owned()),
            None => return Err(ToolError::OutsideWorkspace(path.to_string())),
        }
        if !base.pop() {
            return Err(ToolError::OutsideWorkspace(path.to_string()));
        }
    }

    let canonical_base = match base.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) if is_symlink(&base) => {
            return Err(ToolError::OutsideWorkspace(path.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if !canonical_base.starts_with(&canonical_root) {
        return Err(ToolError::OutsideWorkspace(path.to_string()));
    }

    let mut final_path = canonical_base;
    for component in suffix.into_iter().rev() {
        final_path.push(component);
    }
    Ok(final_path)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn relative_paths_resolve_under_root() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_in_workspace(dir.path(), "src/new/file.rs").unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
        assert!(resolved.ends_with("src/new/file.rs"));
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        for bad in ["../escape.txt", "a/../../b", "./.."] {
            assert!(matches!(
                resolve_in_workspace(dir.path(), bad),
                Err(ToolError::OutsideWorkspace(_))
            ));
        }
    }

    #[test]
    fn leading_slash_is_relative_to_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolve_in_workspace(dir.path(), "/").unwrap(), root);
        assert_eq!(
            resolve_in_workspace(dir.path(), "/src/main.rs").unwrap(),
            root.join("src/main.rs")
        );
    }

    #[test]
    fn foreign_absolute_paths_land_under_root() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let outside = other.path().join("x.txt");
        let resolved = resolve_in_workspace(dir.path(), outside.to_str().unwrap()).unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
        assert!(resolved.ends_with("x.txt"));
    }

    #[test]
    fn absolute_paths_inside_root_are_allowed() {
        let dir = TempDir::new().unwrap();
        let inside = dir.path().join("ok.txt");
        assert!(resolve_in_workspace(dir.path(), inside.to_str().unwrap()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        std::os::unix::fs::symlink(other.path(), dir.path().join("link")).unwrap();
        assert!(matches!(
            resolve_in_workspace(dir.path(), "link/secret.txt"),
            Err(ToolError::OutsideWorkspace(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_rejected() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let target = other.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();
        for path in ["link.txt", "/link.txt"] {
            assert!(matches!(
                resolve_in_workspace(dir.path(), path),
                Err(ToolError::OutsideWorkspace(_))
            ));
        }
        std::os::unix::fs::symlink(other.path().join("gone"), dir.path().join("dirlink")).unwrap();
        assert!(matches!(
            resolve_in_workspace(dir.path(), "dirlink/nested/file.txt"),
            Err(ToolError::OutsideWorkspace(_))
        ));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_inside_root_is_followed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();
        let resolved = resolve_in_workspace(dir.path(), "alias/file.txt").unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap().join("real/file.txt"));
    }
}
