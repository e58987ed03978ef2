//! The workspace output tree.
//!
//! ```text
//! <workspace>/
//!   classes/main/base/<module>      untargeted and --release base classes
//!   classes/main/<N>/<module>       classes of sources targeted at release N
//!   classes/test/base/<module>
//!   modules/<module>@<version>.jar
//!   modules-test/<module>@<version>+test.jar
//!   documentation/api, documentation/<project>-api.jar
//!   image/
//!   reports/junit/<module>
//! ```

use std::path::{Path, PathBuf};

use crate::core::space::SpaceKind;

#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkspaceLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output directory of one compilation; per-module subdirectories below.
    ///
    /// Release 0 denotes untargeted sources.
    pub fn classes(&self, space: SpaceKind, release: Option<u32>) -> PathBuf {
        let space = self.root.join("classes").join(space.as_str());
        match release.filter(|r| *r > 0) {
            Some(release) => space.join(release.to_string()),
            None => space.join("base"),
        }
    }

    pub fn module_classes(&self, space: SpaceKind, release: Option<u32>, module: &str) -> PathBuf {
        self.classes(space, release).join(module)
    }

    /// Directory holding the archives of a space.
    pub fn modules(&self, space: SpaceKind) -> PathBuf {
        match space {
            SpaceKind::Main => self.root.join("modules"),
            SpaceKind::Test => self.root.join("modules-test"),
        }
    }

    /// Archive of `module`, named after module and version.
    pub fn jar(&self, space: SpaceKind, module: &str, version: &str) -> PathBuf {
        let file = match space {
            SpaceKind::Main => format!("{}@{}.jar", module, version),
            SpaceKind::Test => format!("{}@{}+test.jar", module, version),
        };
        self.modules(space).join(file)
    }

    pub fn api_documentation(&self) -> PathBuf {
        self.root.join("documentation").join("api")
    }

    pub fn api_jar(&self, project: &str) -> PathBuf {
        self.root
            .join("documentation")
            .join(format!("{}-api.jar", project))
    }

    pub fn image(&self) -> PathBuf {
        self.root.join("image")
    }

    pub fn test_reports(&self, module: &str) -> PathBuf {
        self.root.join("reports").join("junit").join(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_tiers_do_not_collide() {
        let layout = WorkspaceLayout::new("/w");
        assert_eq!(
            layout.classes(SpaceKind::Main, None),
            PathBuf::from("/w/classes/main/base")
        );
        assert_eq!(
            layout.classes(SpaceKind::Main, Some(0)),
            PathBuf::from("/w/classes/main/base")
        );
        assert_eq!(
            layout.module_classes(SpaceKind::Main, Some(17), "m"),
            PathBuf::from("/w/classes/main/17/m")
        );
        assert_eq!(
            layout.module_classes(SpaceKind::Test, None, "m"),
            PathBuf::from("/w/classes/test/base/m")
        );
    }

    #[test]
    fn test_archive_names() {
        let layout = WorkspaceLayout::new("/w");
        assert_eq!(
            layout.jar(SpaceKind::Main, "com.greetings", "1.0"),
            PathBuf::from("/w/modules/com.greetings@1.0.jar")
        );
        assert_eq!(
            layout.jar(SpaceKind::Test, "com.greetings", "1.0"),
            PathBuf::from("/w/modules-test/com.greetings@1.0+test.jar")
        );
    }
}
