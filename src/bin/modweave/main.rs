//! modweave CLI - build modular Java projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use modweave::builder::ExecutionError;
use modweave::core::ModuleError;
use modweave::resolver::ResolveError;
use modweave::util::diagnostic::{emit, Diagnostic};
use modweave::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;
    if let Err(e) = run(cli) {
        match diagnose(&e) {
            Some(diagnostic) => emit(&diagnostic, color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("modweave=debug")
    } else {
        EnvFilter::new("modweave=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);
    ctx.set_color(!cli.no_color);

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(&ctx, args),
        Commands::Resolve(args) => commands::resolve::execute(&ctx, args),
        Commands::Plan(args) => commands::plan::execute(&ctx, args),
        Commands::Modules(args) => commands::modules::execute(&ctx, args),
        Commands::Clean(args) => commands::clean::execute(&ctx, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Render errors of the core seams with their context and suggestions.
fn diagnose(error: &anyhow::Error) -> Option<Diagnostic> {
    let (diagnostic, cause) = if let Some(e) = error.downcast_ref::<ResolveError>() {
        (e.to_diagnostic(), e.to_string())
    } else if let Some(e) = error.downcast_ref::<ModuleError>() {
        (e.to_diagnostic(), e.to_string())
    } else if let Some(e) = error.downcast_ref::<ExecutionError>() {
        (e.to_diagnostic(), e.to_string())
    } else {
        return None;
    };
    let outer = error.to_string();
    Some(if outer == cause {
        diagnostic
    } else {
        diagnostic.with_context(outer)
    })
}
