//! Resolving the external modules of a project.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::project::Project;
use crate::resolver::{
    Externals, ExternalModulesDirectory, Fetcher, HttpFetcher, MissingModuleResolver, Platform,
    Resolution,
};
use crate::util::config::Config;
use crate::util::process::CancelToken;

/// Options for resolving external modules.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Fetch the modules of one round concurrently.
    pub parallel: bool,
    /// Worker threads (None = number of CPUs).
    pub jobs: Option<usize>,
    pub cancel: CancelToken,
}

impl ResolveOptions {
    pub fn from_config(config: &Config) -> Self {
        ResolveOptions {
            parallel: config.build.parallel,
            jobs: config.build.jobs,
            cancel: CancelToken::new(),
        }
    }
}

/// Configure the global worker pool once per process.
pub fn configure_jobs(jobs: Option<usize>) {
    if let Some(j) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(j)
            .build_global()
            .ok(); // Ignore if already set
    }
}

/// Fetch every module the project requires into `external_modules`.
pub fn resolve_externals(
    project: &Project,
    config: &Config,
    external_modules: &Path,
    opts: &ResolveOptions,
) -> Result<Resolution> {
    let timeout = config.build.timeout_secs.map(Duration::from_secs);
    let fetcher = HttpFetcher::new(timeout)?;
    resolve_with(project, config, external_modules, &fetcher, opts)
}

/// Like [`resolve_externals`], with a caller-supplied fetcher.
pub fn resolve_with(
    project: &Project,
    config: &Config,
    external_modules: &Path,
    fetcher: &dyn Fetcher,
    opts: &ResolveOptions,
) -> Result<Resolution> {
    configure_jobs(opts.jobs);
    std::fs::create_dir_all(external_modules).with_context(|| {
        format!(
            "failed to create external modules directory {}",
            external_modules.display()
        )
    })?;

    let externals = Externals::from_config(&config.externals, Platform::host())?;
    let directory = ExternalModulesDirectory::new(external_modules);
    let resolution = MissingModuleResolver::new(&directory, &externals, fetcher)
        .with_parallel(opts.parallel)
        .with_cancel(opts.cancel.clone())
        .resolve_missing(&project.finders())?;

    if resolution.fetched.is_empty() {
        tracing::debug!("all required modules are present");
    } else {
        tracing::info!(
            "fetched {} module(s) in {} round(s): {}",
            resolution.fetched.len(),
            resolution.iterations,
            resolution.fetched.join(", ")
        );
    }
    Ok(resolution)
}
