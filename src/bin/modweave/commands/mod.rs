//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod modules;
pub mod plan;
pub mod resolve;

use anyhow::Result;

use crate::cli::ExecutionArgs;
use modweave::core::Project;
use modweave::ops::{scan_project, BuildPaths};
use modweave::util::{Config, GlobalContext};

/// Configuration, scanned project and output paths of the current project.
pub struct Loaded {
    pub config: Config,
    pub project: Project,
    pub paths: BuildPaths,
}

pub fn load(ctx: &GlobalContext) -> Result<Loaded> {
    let config = ctx.load_config()?;
    let project = scan_project(&ctx.project_root(), &config)?;
    let paths = BuildPaths {
        workspace: ctx.workspace_dir(&config),
        external_modules: ctx.external_modules_dir(&config),
    };
    Ok(Loaded {
        config,
        project,
        paths,
    })
}

/// CLI flags override the `[build]` section.
pub fn apply_execution(config: &mut Config, args: ExecutionArgs) {
    if args.jobs.is_some() {
        config.build.jobs = args.jobs;
    }
    if args.sequential {
        config.build.parallel = false;
    }
}
