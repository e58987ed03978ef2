//! A module declaration bound to its place in the file system.

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::core::descriptor::ModuleDescriptor;
use crate::core::errors::ModuleError;
use crate::core::folder::{list_prefixed_dirs, SourceFolder, SourceFolders, MODULE_INFO_JAVA};

/// A module found by scanning project sources.
#[derive(Debug, Clone, Serialize)]
pub struct DeclaredModule {
    /// Content root of the whole module.
    content: PathBuf,
    /// Path to `module-info.java`.
    info: PathBuf,
    descriptor: ModuleDescriptor,
    sources: SourceFolders,
    resources: SourceFolders,
}

impl DeclaredModule {
    /// Bind a descriptor to explicit folders.
    pub fn new(
        content: impl Into<PathBuf>,
        info: impl Into<PathBuf>,
        descriptor: ModuleDescriptor,
        sources: SourceFolders,
        resources: SourceFolders,
    ) -> Result<Self, ModuleError> {
        let info = info.into();
        if sources.base().count() > 1 {
            return Err(ModuleError::InvalidLayout {
                path: info,
                reason: format!(
                    "module `{}` has more than one untargeted source folder",
                    descriptor.name()
                ),
            });
        }
        Ok(DeclaredModule {
            content: content.into(),
            info,
            descriptor,
            sources,
            resources,
        })
    }

    /// Read the declaration at `info` and detect its folder layout.
    ///
    /// Supported layouts, relative to `root`:
    /// - `module-info.java` directly in `root`
    /// - `java/module-info.java` with `java-N` and `resources[-N]` siblings
    /// - `<module>/module-info.java`
    /// - `src/<space>/{java,java-module}/module-info.java`
    /// - any path with an element equal to the module name
    pub fn of(root: &Path, info: &Path, infer_main_class: bool) -> Result<Self, ModuleError> {
        let info = if info.ends_with(MODULE_INFO_JAVA) {
            info.to_path_buf()
        } else {
            info.join(MODULE_INFO_JAVA)
        };
        let relative = info
            .strip_prefix(root)
            .map(normalize)
            .map_err(|_| ModuleError::InvalidLayout {
                path: info.clone(),
                reason: format!("declaration is not below {}", root.display()),
            })?;
        let descriptor = ModuleDescriptor::read(&info, infer_main_class)?;
        let name = descriptor.name().to_string();
        let elements: Vec<String> = relative
            .iter()
            .map(|e| e.to_string_lossy().into_owned())
            .collect();
        let elements: Vec<&str> = elements.iter().map(String::as_str).collect();

        match elements.as_slice() {
            [MODULE_INFO_JAVA] => {
                let sources = SourceFolders::new(vec![SourceFolder::new(root, 0)]);
                Self::new(root, info, descriptor, sources, SourceFolders::default())
            }
            ["java", MODULE_INFO_JAVA] => {
                let (sources, resources) = folders_with_siblings(&root.join("java"), root)?;
                Self::new(root, info, descriptor, sources, resources)
            }
            [dir, MODULE_INFO_JAVA] if *dir == name => {
                let content = root.join(dir);
                let (sources, resources) = folders_with_siblings(&content, &content)?;
                Self::new(content, info, descriptor, sources, resources)
            }
            ["src", _, java, MODULE_INFO_JAVA] if *java == "java" || *java == "java-module" => {
                let base = parent_of(&info)?;
                let container = parent_of(&base)?;
                let (sources, resources) = folders_with_siblings(&base, &container)?;
                Self::new(root, info, descriptor, sources, resources)
            }
            _ => {
                let content = info
                    .ancestors()
                    .skip(1)
                    .take_while(|p| *p != root)
                    .find(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == name))
                    .map(Path::to_path_buf)
                    .ok_or_else(|| ModuleError::InvalidLayout {
                        path: info.clone(),
                        reason: format!("module name `{}` is not an element of the path", name),
                    })?;
                let base = parent_of(&info)?;
                let container = parent_of(&base)?;
                let (sources, resources) = folders_with_siblings(&base, &container)?;
                Self::new(content, info, descriptor, sources, resources)
            }
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn content(&self) -> &Path {
        &self.content
    }

    pub fn info(&self) -> &Path {
        &self.info
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub fn sources(&self) -> &SourceFolders {
        &self.sources
    }

    pub fn resources(&self) -> &SourceFolders {
        &self.resources
    }

    /// The folder compiled as the base tier.
    pub fn base_folder(&self) -> Option<&SourceFolder> {
        self.sources.first()
    }

    /// Paths forming this module's module source path entry.
    pub fn module_specific_paths(&self) -> Result<Vec<PathBuf>, ModuleError> {
        self.sources
            .module_specific_paths()
            .ok_or_else(|| ModuleError::InvalidLayout {
                path: self.info.clone(),
                reason: format!(
                    "no source folder of module `{}` contains {}",
                    self.name(),
                    MODULE_INFO_JAVA
                ),
            })
    }
}

/// `base` as untargeted folder plus targeted `java-N` and all `resources*`
/// directories found in `container`.
fn folders_with_siblings(
    base: &Path,
    container: &Path,
) -> Result<(SourceFolders, SourceFolders), ModuleError> {
    let io = |source| ModuleError::Io {
        path: container.to_path_buf(),
        source,
    };
    let mut sources = vec![SourceFolder::new(base, 0)];
    for dir in list_prefixed_dirs(container, "java").map_err(io)? {
        let folder = SourceFolder::of(dir);
        if folder.is_targeted() {
            sources.push(folder);
        }
    }
    let resources = list_prefixed_dirs(container, "resources")
        .map_err(io)?
        .into_iter()
        .map(SourceFolder::of)
        .collect();
    Ok((SourceFolders::new(sources), SourceFolders::new(resources)))
}

fn parent_of(path: &Path) -> Result<PathBuf, ModuleError> {
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ModuleError::InvalidLayout {
            path: path.to_path_buf(),
            reason: "no parent directory".to_string(),
        })
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
