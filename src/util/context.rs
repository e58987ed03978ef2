//! Global context for modweave operations.
//!
//! Locates the project root and resolves the paths configured relative to it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::{Config, MANIFEST_NAME};

/// Name of the project-local state directory.
pub const STATE_DIR: &str = ".modweave";

/// Global context containing the working directory and output preferences.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        GlobalContext {
            cwd,
            verbose: false,
            color: true,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Find `modweave.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Option<PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(MANIFEST_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Directory holding the manifest, or cwd for projects without one.
    pub fn project_root(&self) -> PathBuf {
        self.find_manifest()
            .and_then(|manifest| manifest.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.cwd.clone())
    }

    /// Load the project configuration; defaults apply without a manifest.
    pub fn load_config(&self) -> Result<Config> {
        match self.find_manifest() {
            Some(manifest) => Config::load(&manifest),
            None => {
                tracing::debug!(
                    "no {} found above {}, using defaults",
                    MANIFEST_NAME,
                    self.cwd.display()
                );
                Ok(Config::default())
            }
        }
    }

    /// Get the project-local state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.project_root().join(STATE_DIR)
    }

    /// Get the output tree of a build.
    pub fn workspace_dir(&self, config: &Config) -> PathBuf {
        self.project_root().join(&config.paths.workspace)
    }

    /// Get the directory of fetched external modules.
    pub fn external_modules_dir(&self, config: &Config) -> PathBuf {
        self.project_root().join(&config.paths.external_modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest, "[project]\nname = \"greetings\"\n").unwrap();
        let nested = tmp.path().join("com.greetings/com/greetings");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_manifest(), Some(manifest));
        assert_eq!(ctx.project_root(), tmp.path());
        assert_eq!(
            ctx.load_config().unwrap().project.name.as_deref(),
            Some("greetings")
        );
    }

    #[test]
    fn test_paths_without_manifest() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let config = ctx.load_config().unwrap();
        assert_eq!(ctx.project_root(), tmp.path());
        assert_eq!(ctx.state_dir(), tmp.path().join(".modweave"));
        assert_eq!(
            ctx.external_modules_dir(&config),
            tmp.path().join(".modweave/external-modules")
        );
        assert_eq!(
            ctx.workspace_dir(&config),
            tmp.path().join(".modweave/workspace")
        );
    }
}
