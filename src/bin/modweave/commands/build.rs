//! `modweave build` command

use std::time::Duration;

use anyhow::Result;

use crate::cli::{BuildArgs, MessageFormat};
use crate::commands::{apply_execution, load};
use modweave::builder::{BuilderRegistry, EventSink, JsonSink, ProcessToolRunner, TracingSink};
use modweave::ops::{build, resolve_externals, BuildOptions, ResolveOptions};
use modweave::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: BuildArgs) -> Result<()> {
    let mut loaded = load(ctx)?;
    apply_execution(&mut loaded.config, args.execution);
    let config = &loaded.config;

    if args.offline {
        tracing::debug!("offline, skipping resolution");
    } else {
        resolve_externals(
            &loaded.project,
            config,
            &loaded.paths.external_modules,
            &ResolveOptions::from_config(config),
        )?;
    }

    let runner = ProcessToolRunner::from_env()
        .with_timeout(config.build.timeout_secs.map(Duration::from_secs));
    let json = args.message_format == MessageFormat::Json;
    let sink: Box<dyn EventSink> = if json {
        Box::new(JsonSink::new(std::io::stdout()))
    } else {
        Box::new(TracingSink)
    };
    let opts = BuildOptions {
        parallel: config.build.parallel,
        progress: !json && !ctx.is_verbose(),
        document: args.document,
        link: args.link,
        run_tests: !args.no_tests,
        ..Default::default()
    };

    let summary = build(
        &loaded.project,
        config,
        &loaded.paths,
        &BuilderRegistry::new(),
        &runner,
        sink.as_ref(),
        &opts,
    )?;

    if !json {
        for archive in &summary.archives {
            eprintln!("    Archived {}", archive.display());
        }
        if let Some(image) = &summary.image {
            eprintln!("      Linked {}", image.display());
        }
        eprintln!(
            "    Finished {} call(s) in {:.2}s",
            summary.results.len(),
            summary.duration.as_secs_f64()
        );
    }
    Ok(())
}
