//! `modweave resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::commands::{apply_execution, load};
use modweave::ops::{resolve_externals, ResolveOptions};
use modweave::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: ResolveArgs) -> Result<()> {
    let mut loaded = load(ctx)?;
    apply_execution(&mut loaded.config, args.execution);

    let resolution = resolve_externals(
        &loaded.project,
        &loaded.config,
        &loaded.paths.external_modules,
        &ResolveOptions::from_config(&loaded.config),
    )?;

    for name in &resolution.fetched {
        eprintln!("     Fetched {}", name);
    }
    eprintln!(
        "    Resolved {} external module(s) in {}",
        resolution.modules.len(),
        loaded.paths.external_modules.display()
    );
    Ok(())
}
