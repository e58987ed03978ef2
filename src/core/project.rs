//! The scanned project: identity plus its code spaces.

use std::path::{Path, PathBuf};

use crate::core::finder::DeclaredModuleFinder;
use crate::core::space::{CodeSpace, SpaceKind};

/// Version used for archives when neither project nor module declares one.
pub const DEFAULT_VERSION: &str = "0-ea";

#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    version: Option<String>,
    root: PathBuf,
    main: CodeSpace,
    test: CodeSpace,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Project {
            name: name.into(),
            version: None,
            root: root.into(),
            main: CodeSpace::new(SpaceKind::Main, DeclaredModuleFinder::default()),
            test: CodeSpace::new(SpaceKind::Test, DeclaredModuleFinder::default()),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_main(mut self, main: CodeSpace) -> Self {
        self.main = main;
        self
    }

    pub fn with_test(mut self, test: CodeSpace) -> Self {
        self.test = test;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main(&self) -> &CodeSpace {
        &self.main
    }

    pub fn test(&self) -> &CodeSpace {
        &self.test
    }

    pub fn space(&self, kind: SpaceKind) -> &CodeSpace {
        match kind {
            SpaceKind::Main => &self.main,
            SpaceKind::Test => &self.test,
        }
    }

    /// Finders of every code space, main first.
    pub fn finders(&self) -> [&DeclaredModuleFinder; 2] {
        [&self.main.modules, &self.test.modules]
    }

    /// Version stamped into a module's archive: the declared module version,
    /// else the project version, else [`DEFAULT_VERSION`].
    pub fn module_version(&self, module: &str) -> String {
        self.finders()
            .iter()
            .find_map(|f| f.find(module))
            .and_then(|m| m.descriptor().version())
            .or(self.version.as_deref())
            .unwrap_or(DEFAULT_VERSION)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declared::DeclaredModule;
    use crate::core::descriptor::ModuleDescriptor;
    use crate::core::folder::{SourceFolder, SourceFolders};

    fn finder(name: &str, version: Option<&str>) -> DeclaredModuleFinder {
        let mut descriptor = ModuleDescriptor::new(name);
        if let Some(v) = version {
            descriptor = descriptor.with_version(v);
        }
        let module = DeclaredModule::new(
            name,
            format!("{}/module-info.java", name),
            descriptor,
            SourceFolders::new(vec![SourceFolder::new(name, 0)]),
            SourceFolders::default(),
        )
        .unwrap();
        DeclaredModuleFinder::new(vec![module]).unwrap()
    }

    #[test]
    fn test_module_version_precedence() {
        let project = Project::new("demo", ".")
            .with_main(CodeSpace::new(SpaceKind::Main, finder("a", Some("2.1"))))
            .with_test(CodeSpace::new(SpaceKind::Test, finder("b", None)));
        assert_eq!(project.module_version("a"), "2.1");
        assert_eq!(project.module_version("b"), DEFAULT_VERSION);

        let project = project.with_version(Some("1.0".to_string()));
        assert_eq!(project.module_version("b"), "1.0");
    }
}
