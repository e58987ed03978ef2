//! Planning and running a build.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::builder::events::{Event, EventSink, Level};
use crate::builder::executor::{CallResults, Executor};
use crate::builder::layout::WorkspaceLayout;
use crate::builder::plan::{BuildPlan, PhaseKind, PlanContext, PlanOptions, JUNIT_CONSOLE_MODULE};
use crate::builder::registry::BuilderRegistry;
use crate::builder::runner::ToolRunner;
use crate::builder::tweaks::Tweaks;
use crate::core::project::Project;
use crate::core::space::SpaceKind;
use crate::resolver::ExternalModulesDirectory;
use crate::util::config::Config;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::CancelToken;

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Run independent calls of a phase concurrently
    pub parallel: bool,

    /// Show a progress bar
    pub progress: bool,

    /// Generate API documentation even if not configured
    pub document: bool,

    /// Link a runtime image even if not configured
    pub link: bool,

    /// Run tests of the test space
    pub run_tests: bool,

    pub cancel: CancelToken,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            parallel: true,
            progress: false,
            document: false,
            link: false,
            run_tests: true,
            cancel: CancelToken::new(),
        }
    }
}

/// Where a build reads and writes.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    pub workspace: PathBuf,
    pub external_modules: PathBuf,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildSummary {
    pub plan: BuildPlan,
    pub results: CallResults,
    pub duration: Duration,
    /// Main archives, in module order.
    pub archives: Vec<PathBuf>,
    pub image: Option<PathBuf>,
    pub tests_run: bool,
}

/// Compute the build plan without running anything.
pub fn plan_build(
    project: &Project,
    config: &Config,
    paths: &BuildPaths,
    registry: &BuilderRegistry,
    opts: &BuildOptions,
) -> Result<BuildPlan> {
    let options = plan_options(project, config, paths, opts)?;
    let layout = WorkspaceLayout::new(&paths.workspace);
    let builder = registry.get(config.build.builder.as_deref())?;
    tracing::debug!("planning with the `{}` plan builder", builder.name());
    let plan = builder.plan(PlanContext {
        project,
        layout: &layout,
        external_modules: &paths.external_modules,
        options: &options,
    })?;
    Ok(plan)
}

/// Plan and run a build of `project`.
///
/// External modules must have been resolved before.
pub fn build(
    project: &Project,
    config: &Config,
    paths: &BuildPaths,
    registry: &BuilderRegistry,
    runner: &dyn ToolRunner,
    sink: &dyn EventSink,
    opts: &BuildOptions,
) -> Result<BuildSummary> {
    let start = Instant::now();
    if project.main().is_empty() && project.test().is_empty() {
        sink.accept(&Event::message(Level::Warning, "no module declarations found"));
    }
    if opts.run_tests && !project.test().is_empty() && !console_present(&paths.external_modules)? {
        sink.accept(&Event::message(
            Level::Warning,
            format!("{} is not resolved, tests will not run", JUNIT_CONSOLE_MODULE),
        ));
    }

    let plan = plan_build(project, config, paths, registry, opts)?;
    let layout = WorkspaceLayout::new(&paths.workspace);
    // jar does not create parent directories of its archive.
    for dir in [
        layout.modules(SpaceKind::Main),
        layout.modules(SpaceKind::Test),
        layout.api_documentation(),
    ] {
        ensure_dir(&dir)?;
    }
    if plan.phase(SpaceKind::Main, PhaseKind::Link).is_some() {
        // jlink refuses to write into an existing directory.
        remove_dir_all_if_exists(&layout.image())?;
    }

    let executor = Executor::new(runner, sink)
        .with_parallel(opts.parallel && config.build.parallel)
        .with_progress(opts.progress)
        .with_cancel(opts.cancel.clone());
    let outcome = executor.run_plan(&plan);
    let duration = start.elapsed();
    sink.accept(&Event::finished(outcome.is_ok(), duration, plan.call_count()));
    let results = outcome?;

    let archives = project
        .main()
        .modules
        .names()
        .iter()
        .map(|m| layout.jar(SpaceKind::Main, m, &project.module_version(m)))
        .collect();
    let image = plan
        .phase(SpaceKind::Main, PhaseKind::Link)
        .map(|_| layout.image());
    let tests_run = plan.phase(SpaceKind::Test, PhaseKind::Test).is_some();
    Ok(BuildSummary {
        plan,
        results,
        duration,
        archives,
        image,
        tests_run,
    })
}

fn plan_options(
    project: &Project,
    config: &Config,
    paths: &BuildPaths,
    opts: &BuildOptions,
) -> Result<PlanOptions> {
    let run_tests =
        opts.run_tests && !project.test().is_empty() && console_present(&paths.external_modules)?;
    Ok(PlanOptions {
        document: opts.document || config.main.document,
        link: opts.link || config.main.link,
        run_tests,
        main_tweaks: Tweaks::new(config.main.tweaks.clone()),
        test_tweaks: Tweaks::new(config.test.tweaks.clone()),
    })
}

fn console_present(external_modules: &Path) -> Result<bool> {
    if !external_modules.is_dir() {
        return Ok(false);
    }
    let modules = ExternalModulesDirectory::new(external_modules)
        .scan()
        .with_context(|| format!("failed to scan {}", external_modules.display()))?;
    Ok(modules.contains(JUNIT_CONSOLE_MODULE))
}
