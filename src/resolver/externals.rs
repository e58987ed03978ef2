//! Explicitly required external modules and the locators that find them.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::system::SystemModules;
use crate::resolver::errors::ResolveError;
use crate::resolver::locator::LocatorChain;
use crate::resolver::locators::{
    ConventionLocator, JUnitLocator, JavaFxLocator, LinkTable, LwjglLocator, MavenLocator,
    Platform,
};
use crate::resolver::maven::Coordinates;
use crate::util::config::{ExternalsConfig, LocatorConfig, DEFAULT_JUNIT_VERSION};

/// External module settings of one build.
#[derive(Debug, Default)]
pub struct Externals {
    requires: BTreeSet<String>,
    implied_requires: bool,
    system: SystemModules,
    locators: LocatorChain,
}

impl Externals {
    pub fn new(locators: LocatorChain) -> Self {
        Externals {
            locators,
            ..Default::default()
        }
    }

    pub fn with_requires(mut self, requires: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.requires.extend(requires.into_iter().map(Into::into));
        self
    }

    pub fn with_implied_requires(mut self, implied: bool) -> Self {
        self.implied_requires = implied;
        self
    }

    pub fn with_system(mut self, system: SystemModules) -> Self {
        self.system = system;
        self
    }

    /// Build from configuration for the given platform.
    ///
    /// Platform-specific locators fix their classifiers from `platform`.
    /// Resolution always passes [`Platform::host`]; other platforms are for
    /// tests.
    pub fn from_config(config: &ExternalsConfig, platform: Platform) -> Result<Self, ResolveError> {
        let mut chain = LocatorChain::new();
        for locator in &config.locators {
            match locator {
                LocatorConfig::Links { links } => {
                    chain.push(LinkTable::new(links.clone(), platform))
                }
                LocatorConfig::Junit { version } => chain.push(JUnitLocator::new(version.as_str())),
                LocatorConfig::Javafx { version } => {
                    chain.push(JavaFxLocator::new(version.as_str(), platform))
                }
                LocatorConfig::Lwjgl { version } => {
                    chain.push(LwjglLocator::new(version.as_str(), platform))
                }
                LocatorConfig::Maven {
                    repository,
                    coordinates,
                } => {
                    let coordinates = coordinates
                        .iter()
                        .map(|(module, gav)| Ok((module.clone(), gav.parse::<Coordinates>()?)))
                        .collect::<Result<BTreeMap<_, _>, ResolveError>>()?;
                    chain.push(MavenLocator::new(repository.as_str(), coordinates));
                }
                LocatorConfig::Convention {
                    prefix,
                    group,
                    artifact,
                    version,
                    classifier,
                    repository,
                } => chain.push(
                    ConventionLocator::new(
                        prefix.as_str(),
                        group.as_str(),
                        artifact.as_str(),
                        version.as_str(),
                        platform,
                    )
                    .with_classifier(classifier.clone())
                    .with_repository(repository.as_str()),
                ),
            }
        }
        if chain.is_empty() {
            chain.push(JUnitLocator::new(DEFAULT_JUNIT_VERSION));
        }
        Ok(Externals::new(chain)
            .with_requires(config.requires.iter().cloned())
            .with_implied_requires(config.implied_requires)
            .with_system(SystemModules::new(config.system_modules.iter().cloned())))
    }

    /// Explicitly required module names.
    pub fn requires(&self) -> &BTreeSet<String> {
        &self.requires
    }

    pub fn system(&self) -> &SystemModules {
        &self.system
    }

    pub fn locators(&self) -> &LocatorChain {
        &self.locators
    }

    /// Modules implied by `required`, if implied requires are enabled.
    ///
    /// Jupiter API modules imply the Jupiter engine, and any JUnit engine
    /// implies the platform console launcher.
    pub fn implied(&self, required: &BTreeSet<String>) -> BTreeSet<String> {
        let mut implied = BTreeSet::new();
        if !self.implied_requires {
            return implied;
        }
        if required.contains("org.junit.jupiter") || required.contains("org.junit.jupiter.api") {
            implied.insert("org.junit.jupiter.engine".to_string());
        }
        let engine = |name: &String| {
            name == "org.junit.jupiter.engine" || name == "org.junit.vintage.engine"
        };
        if required.iter().any(engine) || implied.iter().any(engine) {
            implied.insert("org.junit.platform.console".to_string());
        }
        implied.retain(|name| !required.contains(name));
        implied
    }
}
