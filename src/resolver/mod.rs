//! External module resolution.
//!
//! Declared modules name their requirements; everything that is neither
//! declared by the project nor provided by the platform must be located and
//! fetched into the external-modules directory. Fetched archives may require
//! further modules, so resolution repeats until nothing is missing.

pub mod directory;
pub mod errors;
pub mod externals;
pub mod fetch;
pub mod locator;
pub mod locators;
pub mod maven;

pub use directory::{ExternalModule, ExternalModules, ExternalModulesDirectory};
pub use errors::{FetchError, ResolveError};
pub use externals::Externals;
pub use fetch::{Fetcher, HttpFetcher};
pub use locator::{ExternalModuleLocator, Location, LocatorChain, Stability};
pub use locators::Platform;

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::core::finder::DeclaredModuleFinder;
use crate::util::process::CancelToken;

/// Outcome of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Number of fetch rounds that were needed.
    pub iterations: usize,
    /// Modules fetched during this run, sorted.
    pub fetched: Vec<String>,
    /// Directory contents after the last scan.
    pub modules: ExternalModules,
}

/// Closes the set of required modules by fetching what is missing.
pub struct MissingModuleResolver<'a> {
    directory: &'a ExternalModulesDirectory,
    externals: &'a Externals,
    fetcher: &'a dyn Fetcher,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl<'a> MissingModuleResolver<'a> {
    pub fn new(
        directory: &'a ExternalModulesDirectory,
        externals: &'a Externals,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        MissingModuleResolver {
            directory,
            externals,
            fetcher,
            parallel: true,
            cancel: None,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Fetch missing modules until every requirement is satisfied.
    ///
    /// Fails when a name stays missing across two consecutive rounds or when
    /// no locator knows a missing name.
    pub fn resolve_missing(
        &self,
        finders: &[&DeclaredModuleFinder],
    ) -> Result<Resolution, ResolveError> {
        let mut previous: BTreeSet<String> = BTreeSet::new();
        let mut failures: BTreeMap<String, String> = BTreeMap::new();
        let mut fetched: Vec<String> = Vec::new();
        let mut iterations = 0;

        loop {
            if self.is_cancelled() {
                fetched.sort();
                return Err(ResolveError::Cancelled { fetched });
            }

            // Always re-read from disk, never trust what the last round wrote.
            let modules = self.directory.scan()?;
            let missing = self.compute_missing(finders, &modules);
            if missing.is_empty() {
                fetched.sort();
                tracing::debug!(
                    "resolved external modules after {} round(s), {} fetched",
                    iterations,
                    fetched.len()
                );
                return Ok(Resolution {
                    iterations,
                    fetched,
                    modules,
                });
            }

            if missing.iter().any(|name| previous.contains(name)) {
                return Err(ResolveError::Unresolvable {
                    missing: missing.into_iter().collect(),
                    failures,
                });
            }

            let mut located = Vec::new();
            let mut unknown = Vec::new();
            for name in &missing {
                match self.externals.locators().locate(name) {
                    Some(location) => located.push((name.clone(), location)),
                    None => unknown.push(name.clone()),
                }
            }
            if !unknown.is_empty() {
                return Err(ResolveError::NotLocatable { names: unknown });
            }

            iterations += 1;
            tracing::info!(
                "fetching {} external module(s): {}",
                missing.len(),
                missing.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            failures = BTreeMap::new();
            for (name, outcome) in self.fetch_all(&located) {
                match outcome {
                    Ok(()) => fetched.push(name),
                    Err(message) => {
                        tracing::warn!("failed to fetch `{}`: {}", name, message);
                        failures.insert(name, message);
                    }
                }
            }
            previous = missing;
        }
    }

    /// Required names not satisfied by declared, system or fetched modules.
    pub fn compute_missing(
        &self,
        finders: &[&DeclaredModuleFinder],
        modules: &ExternalModules,
    ) -> BTreeSet<String> {
        let mut required: BTreeSet<String> = finders
            .iter()
            .flat_map(|finder| finder.required_names())
            .collect();
        required.extend(self.externals.requires().iter().cloned());
        required.extend(modules.required_names());
        let implied = self.externals.implied(&required);
        required.extend(implied);

        required
            .into_iter()
            .filter(|name| {
                !finders.iter().any(|finder| finder.contains(name))
                    && !self.externals.system().contains(name)
                    && !modules.contains(name)
            })
            .collect()
    }

    /// Locate and fetch a single module, replacing any archive already present.
    pub fn resolve_module(&self, name: &str) -> Result<Location, ResolveError> {
        let location = self
            .externals
            .locators()
            .locate(name)
            .ok_or_else(|| ResolveError::NotLocatable {
                names: vec![name.to_string()],
            })?;
        self.fetcher
            .fetch(&location, &self.directory.jar(name))
            .map_err(|e| {
                let mut failures = BTreeMap::new();
                failures.insert(name.to_string(), e.to_string());
                ResolveError::Unresolvable {
                    missing: vec![name.to_string()],
                    failures,
                }
            })?;
        Ok(location)
    }

    /// Fetch all located modules; returns once every fetch has finished.
    fn fetch_all(&self, located: &[(String, Location)]) -> Vec<(String, Result<(), String>)> {
        let fetch_one = |(name, location): &(String, Location)| {
            let outcome = if self.is_cancelled() {
                Err("cancelled".to_string())
            } else {
                tracing::debug!("fetching `{}` from {}", name, location);
                self.fetcher
                    .fetch(location, &self.directory.jar(name))
                    .map_err(|e| e.to_string())
            };
            (name.clone(), outcome)
        };
        if self.parallel {
            located.par_iter().map(fetch_one).collect()
        } else {
            located.iter().map(fetch_one).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::directory::fixtures::write_module_jar;
    use super::*;
    use crate::core::declared::DeclaredModule;
    use crate::core::descriptor::{ModuleDescriptor, Requires};
    use crate::core::folder::{SourceFolder, SourceFolders};
    use crate::resolver::locators::{JUnitLocator, LinkTable};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes a module jar named after the destination, declaring the
    /// configured requires. Names in `wrong` produce a jar for another module.
    #[derive(Default)]
    struct FakeFetcher {
        requires: BTreeMap<String, Vec<&'static str>>,
        wrong: BTreeSet<String>,
        broken: BTreeSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn requiring(mut self, name: &str, requires: &[&'static str]) -> Self {
            self.requires.insert(name.to_string(), requires.to_vec());
            self
        }

        fn calls(&self) -> Vec<String> {
            let mut calls = self.calls.lock().unwrap().clone();
            calls.sort();
            calls
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, location: &Location, destination: &Path) -> Result<(), FetchError> {
            let name = destination.file_stem().unwrap().to_string_lossy().into_owned();
            self.calls.lock().unwrap().push(name.clone());
            if self.broken.contains(&name) {
                return Err(FetchError::Transfer {
                    uri: location.uri.clone(),
                    message: "404 Not Found".to_string(),
                });
            }
            std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
            let requires = self.requires.get(&name).cloned().unwrap_or_default();
            let declared = if self.wrong.contains(&name) {
                format!("{}.wrong", name)
            } else {
                name.clone()
            };
            write_module_jar(destination, &declared, &requires);
            Ok(())
        }
    }

    fn module(name: &str, requires: &[&str]) -> DeclaredModule {
        let mut descriptor = ModuleDescriptor::new(name);
        for r in requires {
            descriptor = descriptor.with_requires(Requires::new(*r));
        }
        DeclaredModule::new(
            name,
            format!("{}/module-info.java", name),
            descriptor,
            SourceFolders::new(vec![SourceFolder::new(name, 0)]),
            SourceFolders::default(),
        )
        .unwrap()
    }

    fn finder(modules: Vec<DeclaredModule>) -> DeclaredModuleFinder {
        DeclaredModuleFinder::new(modules).unwrap()
    }

    fn links(entries: &[&str]) -> LocatorChain {
        let links = entries
            .iter()
            .map(|name| (name.to_string(), format!("https://host/{}.jar", name)))
            .collect();
        LocatorChain::new().with(LinkTable::new(links, Platform::host()))
    }

    #[test]
    fn test_sibling_modules_need_no_fetch() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(LocatorChain::new());
        let fetcher = FakeFetcher::default();
        let main = finder(vec![
            module("com.greetings", &["org.astro", "java.logging"]),
            module("org.astro", &[]),
        ]);

        let resolution = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[&main])
            .unwrap();
        assert_eq!(resolution.iterations, 0);
        assert!(resolution.fetched.is_empty());
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_junit_api_fetched_in_one_round() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(LocatorChain::new().with(JUnitLocator::new("5.10.2")));
        let fetcher = FakeFetcher::default();
        let main = finder(vec![module("com.greetings", &[])]);
        let test = finder(vec![module(
            "test.greetings",
            &["com.greetings", "org.junit.jupiter.api"],
        )]);

        let resolution = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[&main, &test])
            .unwrap();
        assert_eq!(resolution.iterations, 1);
        assert_eq!(resolution.fetched, vec!["org.junit.jupiter.api"]);
        assert!(directory.jar("org.junit.jupiter.api").is_file());
    }

    #[test]
    fn test_fetched_archives_contribute_requires() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a", "b", "c"]));
        let fetcher = FakeFetcher::default()
            .requiring("a", &["b"])
            .requiring("b", &["c", "java.base"]);
        let main = finder(vec![module("app", &["a"])]);

        let resolution = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .with_parallel(false)
            .resolve_missing(&[&main])
            .unwrap();
        assert_eq!(resolution.iterations, 3);
        assert_eq!(resolution.fetched, vec!["a", "b", "c"]);
        assert_eq!(resolution.modules.len(), 3);
    }

    #[test]
    fn test_explicit_and_implied_requires() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(LocatorChain::new().with(JUnitLocator::new("5.10.2")))
            .with_requires(["org.junit.jupiter.api"])
            .with_implied_requires(true);
        let fetcher = FakeFetcher::default();

        let resolution = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[])
            .unwrap();
        assert_eq!(
            resolution.fetched,
            vec![
                "org.junit.jupiter.api",
                "org.junit.jupiter.engine",
                "org.junit.platform.console"
            ]
        );
        assert_eq!(resolution.iterations, 1);
    }

    #[test]
    fn test_wrong_archive_is_detected_as_stuck() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a", "b"]));
        let mut fetcher = FakeFetcher::default();
        fetcher.wrong.insert("a".to_string());
        let main = finder(vec![module("app", &["a", "b"])]);

        let err = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[&main])
            .unwrap_err();
        match err {
            ResolveError::Unresolvable { missing, failures } => {
                assert_eq!(missing, vec!["a"]);
                assert!(failures.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        // One round only; the second round detects the repeat.
        assert_eq!(fetcher.calls(), vec!["a", "b"]);
    }

    #[test]
    fn test_fetch_failure_reported_with_full_missing_set() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a", "b"]));
        let mut fetcher = FakeFetcher::default();
        fetcher.broken.insert("a".to_string());
        fetcher.broken.insert("b".to_string());
        let main = finder(vec![module("app", &["a", "b"])]);

        let err = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[&main])
            .unwrap_err();
        match err {
            ResolveError::Unresolvable { missing, failures } => {
                assert_eq!(missing, vec!["a", "b"]);
                assert_eq!(failures.len(), 2);
                assert!(failures["a"].contains("404"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_names_listed_together() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a"]));
        let fetcher = FakeFetcher::default();
        let main = finder(vec![module("app", &["a", "x", "y"])]);

        let err = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .resolve_missing(&[&main])
            .unwrap_err();
        match err {
            ResolveError::NotLocatable { names } => assert_eq!(names, vec!["x", "y"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a"]));
        let fetcher = FakeFetcher::default();
        let main = finder(vec![module("app", &["a"])]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = MissingModuleResolver::new(&directory, &externals, &fetcher)
            .with_cancel(cancel)
            .resolve_missing(&[&main])
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled { .. }));
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_resolve_module() {
        let tmp = TempDir::new().unwrap();
        let directory = ExternalModulesDirectory::new(tmp.path().join("external"));
        let externals = Externals::new(links(&["a"]));
        let fetcher = FakeFetcher::default();
        let resolver = MissingModuleResolver::new(&directory, &externals, &fetcher);

        let location = resolver.resolve_module("a").unwrap();
        assert_eq!(location.uri, "https://host/a.jar");
        assert!(directory.jar("a").is_file());
        assert!(matches!(
            resolver.resolve_module("zzz"),
            Err(ResolveError::NotLocatable { .. })
        ));
    }
}
