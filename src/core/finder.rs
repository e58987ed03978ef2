//! Name to declaration mapping built from one scan.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use walkdir::WalkDir;

use crate::core::declared::DeclaredModule;
use crate::core::errors::ModuleError;
use crate::core::folder::MODULE_INFO_JAVA;
use crate::core::source_path::{self, join_paths};

/// Output directories of common build tools, skipped directly below the root.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "build", "out"];

/// Find every `module-info.java` below `root`, sorted.
///
/// Hidden directories (such as `.modweave` and `.git`) are skipped at any
/// depth. Build output directories like `target` are skipped only directly
/// below `root`, so a nested folder or package named `build` is still searched.
pub fn find_declarations(root: &Path) -> Result<Vec<PathBuf>, ModuleError> {
    let mut infos = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_skipped(e)) {
        let entry = entry.map_err(|e| ModuleError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;
        if entry.file_type().is_file() && entry.file_name() == MODULE_INFO_JAVA {
            infos.push(entry.into_path());
        }
    }
    infos.sort();
    Ok(infos)
}

fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.depth() == 1 && SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Declared modules of one code space, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct DeclaredModuleFinder {
    modules: BTreeMap<String, DeclaredModule>,
}

impl DeclaredModuleFinder {
    /// Collect modules, rejecting duplicate names.
    pub fn new(modules: impl IntoIterator<Item = DeclaredModule>) -> Result<Self, ModuleError> {
        let mut map: BTreeMap<String, DeclaredModule> = BTreeMap::new();
        for module in modules {
            if let Some(existing) = map.get(module.name()) {
                return Err(ModuleError::DuplicateModuleName {
                    name: module.name().to_string(),
                    first: existing.info().to_path_buf(),
                    second: module.info().to_path_buf(),
                });
            }
            map.insert(module.name().to_string(), module);
        }
        Ok(DeclaredModuleFinder { modules: map })
    }

    /// Read the given declarations found below `root`.
    ///
    /// Malformed declarations are collected so that all of them are reported
    /// together. A duplicate name aborts at once.
    pub fn scan(
        root: &Path,
        infos: &[PathBuf],
        infer_main_class: bool,
    ) -> Result<Self, ModuleError> {
        let mut modules = Vec::with_capacity(infos.len());
        let mut problems = Vec::new();
        for info in infos {
            match DeclaredModule::of(root, info, infer_main_class) {
                Ok(module) => modules.push(module),
                Err(err @ ModuleError::MalformedDeclaration { .. })
                | Err(err @ ModuleError::InvalidLayout { .. }) => {
                    tracing::debug!("skipping {}: {}", info.display(), err);
                    problems.push(err)
                }
                Err(err) => return Err(err),
            }
        }
        let finder = Self::new(modules)?;
        match problems.len() {
            0 => Ok(finder),
            1 => Err(problems.remove(0)),
            _ => Err(ModuleError::Declarations(problems)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn find(&self, name: &str) -> Option<&DeclaredModule> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Modules sorted by name.
    pub fn modules(&self) -> impl Iterator<Item = &DeclaredModule> {
        self.modules.values()
    }

    /// Module names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Names of modules required by any declaration, excluding edges that do
    /// not materialize as dependencies.
    pub fn required_names(&self) -> BTreeSet<String> {
        self.modules
            .values()
            .flat_map(|m| m.descriptor().required_names())
            .map(str::to_string)
            .collect()
    }

    /// Distinct targeted releases across all modules, ascending.
    pub fn releases(&self) -> Vec<u32> {
        let releases: BTreeSet<u32> = self
            .modules
            .values()
            .flat_map(|m| m.sources().releases())
            .collect();
        releases.into_iter().collect()
    }

    /// `--module-source-path` values covering every module.
    pub fn to_module_source_paths(&self, force_specific: bool) -> Result<Vec<String>, ModuleError> {
        let mut map = BTreeMap::new();
        for module in self.modules.values() {
            map.insert(module.name().to_string(), module.module_specific_paths()?);
        }
        Ok(source_path::compute(&map, force_specific))
    }

    /// Patch each module also present in `upstream` with the upstream sources.
    pub fn to_module_patches(
        &self,
        upstream: &DeclaredModuleFinder,
    ) -> Result<BTreeMap<String, String>, ModuleError> {
        let mut patches = BTreeMap::new();
        for module in self.modules.values() {
            if let Some(up) = upstream.find(module.name()) {
                patches.insert(module.name().to_string(), join_paths(&up.module_specific_paths()?));
            }
        }
        Ok(patches)
    }

    /// Module names with local dependencies before their dependents.
    ///
    /// Only edges between modules of this finder count. On a cycle, the names
    /// of every strongly connected component larger than one module (or
    /// requiring itself) are returned as the error.
    pub fn requires_order(&self) -> Result<Vec<String>, Vec<Vec<String>>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for name in self.modules.keys() {
            nodes.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for module in self.modules.values() {
            let from = nodes[module.name()];
            for required in module.descriptor().required_names() {
                if let Some(&to) = nodes.get(required) {
                    graph.update_edge(from, to, ());
                }
            }
        }
        match toposort(&graph, None) {
            Ok(order) => {
                // An edge a -> b means a requires b, so b must come first.
                Ok(order.into_iter().rev().map(|n| graph[n].to_string()).collect())
            }
            Err(_) => Err(tarjan_scc(&graph)
                .into_iter()
                .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
                .map(|scc| {
                    let mut names: Vec<String> =
                        scc.iter().map(|n| graph[*n].to_string()).collect();
                    names.sort();
                    names
                })
                .collect()),
        }
    }
}
