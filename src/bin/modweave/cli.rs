//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// modweave - A module-aware build orchestrator for modular Java
#[derive(Parser)]
#[command(name = "modweave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve external modules, then compile, archive and test all modules
    Build(BuildArgs),

    /// Fetch missing external modules
    Resolve(ResolveArgs),

    /// Print the build plan without running it
    Plan(PlanArgs),

    /// List declared modules and their requires order
    Modules(ModulesArgs),

    /// Remove build output
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format of build reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

/// Execution flags shared by commands that run work.
#[derive(Args, Clone, Copy)]
pub struct ExecutionArgs {
    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Run one tool call at a time
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub execution: ExecutionArgs,

    /// Report format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Generate API documentation
    #[arg(long)]
    pub document: bool,

    /// Link a custom runtime image
    #[arg(long)]
    pub link: bool,

    /// Compile and archive tests without running them
    #[arg(long)]
    pub no_tests: bool,

    /// Use the modules already present instead of fetching missing ones
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Include the documentation phase
    #[arg(long)]
    pub document: bool,

    /// Include the link phase
    #[arg(long)]
    pub link: bool,
}

#[derive(Args)]
pub struct ModulesArgs {
    /// Show source folders of each module
    #[arg(long)]
    pub paths: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Also remove fetched external modules
    #[arg(long)]
    pub externals: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
