//! Filesystem side of a project: the fixed directory tree and the generic
//! tree operations the manager composes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::ProjectError;

/// Fixed subdirectories every project root carries.
pub const BASIC_SUBDIRECTORIES: [&str; 4] = ["backups", "intermediate", "lci", "processed"];

/// Create a project root and its fixed subdirectories. Idempotent.
pub fn ensure_project_tree(root: &Path) -> Result<(), ProjectError> {
    fs::create_dir_all(root)?;
    for name in BASIC_SUBDIRECTORIES {
        fs::create_dir_all(root.join(name))?;
    }
    Ok(())
}

/// Create a logs directory. Idempotent.
pub fn ensure_logs_dir(path: &Path) -> Result<(), ProjectError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Create and return an arbitrary named subdirectory under `root`.
///
/// Returns `Ok(None)` when the path exists but is not a directory or cannot
/// be created; callers treat these locations as optional.
pub fn ensure_named_subdir(root: &Path, name: &str) -> Result<Option<PathBuf>, ProjectError> {
    let path = root.join(name);
    if let Err(err) = fs::create_dir_all(&path) {
        tracing::warn!("could not create {}: {}", path.display(), err);
        return Ok(None);
    }
    if !path.is_dir() {
        return Ok(None);
    }
    Ok(Some(path))
}

/// Recursively copy `src` to `dst`, skipping any entry whose name is in
/// `exclude` (at every depth). Fails if `dst` already exists.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&str]) -> Result<(), ProjectError> {
    if dst.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dst.display()),
        )
        .into());
    }
    copy_tree_inner(src, dst, exclude)
}

fn copy_tree_inner(src: &Path, dst: &Path, exclude: &[&str]) -> Result<(), ProjectError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if exclude.iter().any(|skip| name.as_os_str() == std::ffi::OsStr::new(skip)) {
            continue;
        }
        let target = dst.join(&name);
        if entry.file_type()?.is_dir() {
            copy_tree_inner(&entry.path(), &target, exclude)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Recursively delete `path`. Fails with `NotADirectory` when the target is
/// not a directory; that means something outside this crate replaced it.
pub fn remove_tree(path: &Path) -> Result<(), ProjectError> {
    if !path.is_dir() {
        return Err(ProjectError::NotADirectory(path.to_path_buf()));
    }
    fs::remove_dir_all(path)?;
    Ok(())
}

/// Names of the immediate child directories of `path`.
pub fn list_subdirectories(path: &Path) -> Result<Vec<String>, ProjectError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_project_tree_creates_fixed_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        ensure_project_tree(&root).unwrap();
        for name in BASIC_SUBDIRECTORIES {
            assert!(root.join(name).is_dir());
        }
        // Safe to call again.
        ensure_project_tree(&root).unwrap();
    }

    #[test]
    fn test_ensure_named_subdir_rejects_non_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("taken"), b"file").unwrap();
        let result = ensure_named_subdir(dir.path(), "taken").unwrap();
        assert!(result.is_none());
        let result = ensure_named_subdir(dir.path(), "free").unwrap();
        assert_eq!(result, Some(dir.path().join("free")));
    }

    #[test]
    fn test_copy_tree_skips_excluded_names() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("data.txt"), b"data").unwrap();
        fs::write(src.join("write-lock"), b"").unwrap();
        fs::write(src.join("nested").join("write-lock"), b"").unwrap();

        let dst = dir.path().join("dst");
        copy_tree(&src, &dst, &["write-lock"]).unwrap();

        assert!(dst.join("data.txt").is_file());
        assert!(dst.join("nested").is_dir());
        assert!(!dst.join("write-lock").exists());
        assert!(!dst.join("nested").join("write-lock").exists());
    }

    #[test]
    fn test_copy_tree_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        assert!(copy_tree(&src, &dst, &[]).is_err());
    }

    #[test]
    fn test_remove_tree_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        match remove_tree(&file) {
            Err(crate::errors::ProjectError::NotADirectory(path)) => assert_eq!(path, file),
            other => panic!("expected NotADirectory, got {other:?}"),
        }
    }

    #[test]
    fn test_list_subdirectories_ignores_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("c.txt"), b"x").unwrap();
        let mut names = list_subdirectories(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
