//! `modweave clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use modweave::util::fs::remove_dir_all_if_exists;
use modweave::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: CleanArgs) -> Result<()> {
    let config = ctx.load_config()?;

    let workspace = ctx.workspace_dir(&config);
    remove_dir_all_if_exists(&workspace)?;
    eprintln!("     Removed {}", workspace.display());

    if args.externals {
        let externals = ctx.external_modules_dir(&config);
        remove_dir_all_if_exists(&externals)?;
        eprintln!("     Removed {}", externals.display());
    }

    Ok(())
}
