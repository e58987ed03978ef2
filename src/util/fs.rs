//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

/// Files below `dir` with the given extension, sorted.
///
/// A missing directory has no files.
pub fn files_with_extension(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_files_with_extension() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("com/acme")).unwrap();
        fs::write(src.join("com/acme/B.java"), "class B {}").unwrap();
        fs::write(src.join("com/acme/A.java"), "class A {}").unwrap();
        fs::write(src.join("readme.txt"), "readme").unwrap();

        let files = files_with_extension(&src, "java").unwrap();
        assert_eq!(
            files,
            vec![src.join("com/acme/A.java"), src.join("com/acme/B.java")]
        );
        assert!(files_with_extension(&tmp.path().join("nope"), "java")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        write_string(&dir.join("a/b.txt"), "x").unwrap();
        remove_dir_all_if_exists(&dir).unwrap();
        assert!(!dir.exists());
        remove_dir_all_if_exists(&dir).unwrap();
    }

    #[test]
    fn test_relative_path() {
        let base = Path::new("/project");
        assert_eq!(
            relative_path(base, Path::new("/project/com.greetings/module-info.java")),
            PathBuf::from("com.greetings/module-info.java")
        );
    }
}
