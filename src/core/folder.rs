//! Source and resource folders of a declared module.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static RELEASE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?\D(\d+)$").expect("release suffix pattern"));

/// Name of the module declaration compilation unit.
pub const MODULE_INFO_JAVA: &str = "module-info.java";

/// Parse the platform release a folder targets from its name.
///
/// Trailing digits after a non-digit make the release (`java-17` is 17,
/// `resources11` is 11); anything else is untargeted (0).
pub fn parse_release_number(name: &str) -> u32 {
    RELEASE_SUFFIX
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// A directory of sources or resources, optionally targeting a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFolder {
    pub path: PathBuf,
    pub release: u32,
}

impl SourceFolder {
    pub fn new(path: impl Into<PathBuf>, release: u32) -> Self {
        SourceFolder {
            path: path.into(),
            release,
        }
    }

    /// Create a folder, deriving the release from the directory name.
    pub fn of(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let release = path
            .file_name()
            .map(|n| parse_release_number(&n.to_string_lossy()))
            .unwrap_or(0);
        SourceFolder { path, release }
    }

    pub fn is_targeted(&self) -> bool {
        self.release != 0
    }

    pub fn is_module_info_java_present(&self) -> bool {
        self.path.join(MODULE_INFO_JAVA).is_file()
    }
}

impl PartialOrd for SourceFolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceFolder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// Folders ordered by release ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceFolders {
    list: Vec<SourceFolder>,
}

impl SourceFolders {
    pub fn new(mut list: Vec<SourceFolder>) -> Self {
        list.sort();
        list.dedup_by(|a, b| a.path == b.path);
        SourceFolders { list }
    }

    pub fn list(&self) -> &[SourceFolder] {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// The lowest-release folder.
    pub fn first(&self) -> Option<&SourceFolder> {
        self.list.first()
    }

    /// Untargeted folders.
    pub fn base(&self) -> impl Iterator<Item = &SourceFolder> {
        self.list.iter().filter(|f| !f.is_targeted())
    }

    /// Folders targeted at a specific release.
    pub fn targeted(&self) -> impl Iterator<Item = &SourceFolder> {
        self.list.iter().filter(|f| f.is_targeted())
    }

    /// The folder targeting exactly `release`, if any.
    pub fn targets(&self, release: u32) -> Option<&SourceFolder> {
        self.list.iter().find(|f| f.release == release)
    }

    /// Distinct targeted releases, ascending.
    pub fn releases(&self) -> Vec<u32> {
        let mut releases: Vec<u32> = self.targeted().map(|f| f.release).collect();
        releases.dedup();
        releases
    }

    pub fn is_multi_release(&self) -> bool {
        self.targeted().next().is_some()
    }

    /// Paths passed as this module's entry in a module source path.
    ///
    /// That is the first folder when it holds `module-info.java`, otherwise the
    /// first folder plus the first folder that does. `None` when no folder
    /// holds the declaration.
    pub fn module_specific_paths(&self) -> Option<Vec<PathBuf>> {
        let first = self.first()?;
        if first.is_module_info_java_present() {
            return Some(vec![first.path.clone()]);
        }
        self.list
            .iter()
            .find(|f| f.is_module_info_java_present())
            .map(|f| vec![first.path.clone(), f.path.clone()])
    }
}

/// List direct subdirectories of `dir` whose names start with `prefix`.
pub fn list_prefixed_dirs(dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    if !dir.is_dir() {
        return Ok(dirs);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
