//! The external-modules directory: one fetched archive per module.
//!
//! The directory is always read fresh from disk. Only files ending in `.jar`
//! count, so partial downloads (written as `.part` files) are never seen.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::core::class_file::read_module_info;
use crate::core::descriptor::ModuleDescriptor;
use crate::resolver::errors::ResolveError;

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d.*$").expect("version suffix pattern"));
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("separator pattern"));

/// A module archive found in the directory.
#[derive(Debug, Clone, Serialize)]
pub struct ExternalModule {
    pub name: String,
    pub path: PathBuf,
    /// Absent for automatic modules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<ModuleDescriptor>,
}

/// Snapshot of the directory contents.
#[derive(Debug, Clone, Default)]
pub struct ExternalModules {
    modules: BTreeMap<String, ExternalModule>,
}

impl ExternalModules {
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&ExternalModule> {
        self.modules.get(name)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ExternalModule> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Names required by the explicit modules in the directory.
    pub fn required_names(&self) -> BTreeSet<String> {
        self.modules
            .values()
            .filter_map(|m| m.descriptor.as_ref())
            .flat_map(|d| d.required_names())
            .map(str::to_string)
            .collect()
    }
}

/// Directory holding fetched module archives.
#[derive(Debug, Clone)]
pub struct ExternalModulesDirectory {
    path: PathBuf,
}

impl ExternalModulesDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ExternalModulesDirectory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the archive of `module` is stored.
    pub fn jar(&self, module: &str) -> PathBuf {
        self.path.join(format!("{}.jar", module))
    }

    /// Read every archive currently in the directory.
    ///
    /// Archives that cannot be read are skipped with a warning.
    pub fn scan(&self) -> Result<ExternalModules, ResolveError> {
        let mut modules: BTreeMap<String, ExternalModule> = BTreeMap::new();
        if !self.path.exists() {
            return Ok(ExternalModules { modules });
        }
        let entries = std::fs::read_dir(&self.path).map_err(|e| ResolveError::Directory {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let mut jars: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jar"))
            .collect();
        jars.sort();

        for jar in jars {
            match read_archive(&jar) {
                Ok(module) => {
                    if let Some(previous) = modules.get(&module.name) {
                        tracing::warn!(
                            "module `{}` found in {} and {}, using the former",
                            module.name,
                            previous.path.display(),
                            jar.display()
                        );
                        continue;
                    }
                    modules.insert(module.name.clone(), module);
                }
                Err(e) => tracing::warn!("skipping unreadable archive {}: {}", jar.display(), e),
            }
        }
        Ok(ExternalModules { modules })
    }
}

/// Read the module name and, when present, the descriptor of a jar file.
pub fn read_archive(jar: &Path) -> anyhow::Result<ExternalModule> {
    let file = File::open(jar)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let entry = ["module-info.class"]
        .into_iter()
        .map(str::to_string)
        .chain(versioned_module_infos(&archive))
        .find(|name| archive.index_for_name(name).is_some());
    if let Some(entry) = entry {
        let mut bytes = Vec::new();
        archive.by_name(&entry)?.read_to_end(&mut bytes)?;
        let descriptor = read_module_info(&bytes)?;
        return Ok(ExternalModule {
            name: descriptor.name().to_string(),
            path: jar.to_path_buf(),
            descriptor: Some(descriptor),
        });
    }

    let name = match manifest_module_name(&mut archive)? {
        Some(name) => name,
        None => automatic_module_name(jar),
    };
    Ok(ExternalModule {
        name,
        path: jar.to_path_buf(),
        descriptor: None,
    })
}

/// `META-INF/versions/N/module-info.class` entries, highest release first.
fn versioned_module_infos(archive: &zip::ZipArchive<File>) -> Vec<String> {
    let mut versioned: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let release = name
                .strip_prefix("META-INF/versions/")?
                .strip_suffix("/module-info.class")?
                .parse()
                .ok()?;
            Some((release, name.to_string()))
        })
        .collect();
    versioned.sort_by(|a, b| b.0.cmp(&a.0));
    versioned.into_iter().map(|(_, name)| name).collect()
}

fn manifest_module_name(archive: &mut zip::ZipArchive<File>) -> anyhow::Result<Option<String>> {
    let mut manifest = String::new();
    match archive.by_name("META-INF/MANIFEST.MF") {
        Ok(mut entry) => {
            entry.read_to_string(&mut manifest)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    Ok(manifest.lines().find_map(|line| {
        line.strip_prefix("Automatic-Module-Name:")
            .map(|name| name.trim().to_string())
    }))
}

/// Derive an automatic module name from a jar file name.
///
/// `foo-bar-1.2.3.jar` becomes `foo.bar`.
pub fn automatic_module_name(jar: &Path) -> String {
    let stem = jar
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = VERSION_SUFFIX.replace(&stem, "");
    NON_ALPHANUMERIC
        .replace_all(&stem, ".")
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;

    /// Write a jar holding the given entries.
    pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Write an explicit module jar requiring `requires`.
    pub fn write_module_jar(path: &Path, name: &str, requires: &[&str]) {
        let edges: Vec<(&str, u16)> = requires.iter().map(|r| (*r, 0)).collect();
        let class = crate::core::class_file::encode_module_info(name, &edges);
        write_jar(path, &[("module-info.class", class.as_slice())]);
    }
}
