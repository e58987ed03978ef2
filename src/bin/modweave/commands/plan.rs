//! `modweave plan` command

use anyhow::Result;

use crate::cli::PlanArgs;
use crate::commands::load;
use modweave::builder::BuilderRegistry;
use modweave::ops::{plan_build, BuildOptions};
use modweave::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: PlanArgs) -> Result<()> {
    let loaded = load(ctx)?;
    let opts = BuildOptions {
        document: args.document,
        link: args.link,
        ..Default::default()
    };
    let plan = plan_build(
        &loaded.project,
        &loaded.config,
        &loaded.paths,
        &BuilderRegistry::new(),
        &opts,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }
    for phase in &plan.phases {
        println!("{}", phase.caption());
        for call in &phase.calls {
            println!("  {}", call);
        }
    }
    if plan.is_empty() {
        eprintln!("nothing to build");
    }
    Ok(())
}
