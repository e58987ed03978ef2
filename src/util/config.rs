//! Project configuration read from `modweave.toml`.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults documented on each field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the project configuration.
pub const MANIFEST_NAME: &str = "modweave.toml";

/// JUnit Jupiter version used by the default locator chain.
pub const DEFAULT_JUNIT_VERSION: &str = "5.10.2";

/// Modweave configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub project: ProjectConfig,
    pub paths: PathsConfig,
    pub main: MainConfig,
    pub test: TestConfig,
    pub externals: ExternalsConfig,
    pub build: BuildConfig,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Defaults to the name of the project directory.
    pub name: Option<String>,
    /// Fallback `--module-version` for modules without a declared version.
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PathsConfig {
    /// Output tree, relative to the project root.
    pub workspace: PathBuf,
    /// Directory holding one fetched archive per external module.
    pub external_modules: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            workspace: PathBuf::from(".modweave/workspace"),
            external_modules: PathBuf::from(".modweave/external-modules"),
        }
    }
}

/// Settings of the main code space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MainConfig {
    /// `--release` for untargeted sources.
    pub release: Option<u32>,
    /// Glob patterns selecting main declarations.
    pub patterns: Vec<String>,
    /// Generate API documentation and an `-api.jar`.
    pub document: bool,
    /// Create a custom runtime image when a main module is known.
    pub link: bool,
    pub infer_main_class: bool,
    /// Extra tool arguments keyed `tool`, `tool(module)`, `tool(release)`
    /// or `tool(module@release)`.
    pub tweaks: BTreeMap<String, Vec<String>>,
}

impl Default for MainConfig {
    fn default() -> Self {
        MainConfig {
            release: None,
            patterns: Vec::new(),
            document: false,
            link: false,
            infer_main_class: true,
            tweaks: BTreeMap::new(),
        }
    }
}

/// Settings of the test code space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TestConfig {
    pub patterns: Vec<String>,
    pub tweaks: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExternalsConfig {
    /// Modules to resolve even if no declaration requires them.
    pub requires: Vec<String>,
    /// Add JUnit engines and the console launcher implied by API modules.
    pub implied_requires: bool,
    /// Names treated as provided by the runtime, besides `java.*` and `jdk.*`.
    pub system_modules: Vec<String>,
    /// Locators in lookup order. Empty means a JUnit convention locator.
    pub locators: Vec<LocatorConfig>,
}

/// One entry of `[[externals.locators]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LocatorConfig {
    Links {
        links: BTreeMap<String, String>,
    },
    Junit {
        #[serde(default = "default_junit_version")]
        version: String,
    },
    Javafx {
        version: String,
    },
    Lwjgl {
        version: String,
    },
    Maven {
        #[serde(default = "default_repository")]
        repository: String,
        /// Module name to `group:artifact:version[:classifier]`.
        coordinates: BTreeMap<String, String>,
    },
    Convention {
        prefix: String,
        group: String,
        artifact: String,
        version: String,
        #[serde(default)]
        classifier: Option<String>,
        #[serde(default = "default_repository")]
        repository: String,
    },
}

fn default_junit_version() -> String {
    DEFAULT_JUNIT_VERSION.to_string()
}

fn default_repository() -> String {
    crate::resolver::maven::CENTRAL.to_string()
}

/// Execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Run independent tool calls of a phase concurrently.
    pub parallel: bool,
    /// Worker threads (None = number of CPUs).
    pub jobs: Option<usize>,
    /// Per tool call timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Registered plan builder to use instead of the default one.
    pub builder: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            parallel: true,
            jobs: None,
            timeout_secs: None,
            builder: None,
        }
    }
}
