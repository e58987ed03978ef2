//! `modweave modules` command

use anyhow::Result;

use crate::cli::ModulesArgs;
use crate::commands::load;
use modweave::core::CodeSpace;
use modweave::util::diagnostic::{emit, Diagnostic};
use modweave::util::fs::relative_path;
use modweave::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: ModulesArgs) -> Result<()> {
    let loaded = load(ctx)?;
    let root = loaded.project.root().to_path_buf();

    let spaces = [loaded.project.main(), loaded.project.test()];
    if spaces.iter().all(|s| s.is_empty()) {
        eprintln!("no module declarations found in {}", root.display());
        return Ok(());
    }
    for space in spaces.into_iter().filter(|s| !s.is_empty()) {
        println!("{} ({} module(s))", space.kind, space.modules.len());
        for module in space.modules.modules() {
            let mut line = format!(
                "  {}@{}",
                module.name(),
                loaded.project.module_version(module.name())
            );
            if let Some(main_class) = module.descriptor().main_class() {
                line.push_str(&format!(" [main: {}]", main_class));
            }
            println!("{}", line);
            if args.paths {
                for folder in module.sources().list() {
                    let release = if folder.is_targeted() {
                        format!(" (release {})", folder.release)
                    } else {
                        String::new()
                    };
                    println!(
                        "    {}{}",
                        relative_path(&root, &folder.path).display(),
                        release
                    );
                }
            }
        }
        print_order(space, ctx.color());
    }
    Ok(())
}

fn print_order(space: &CodeSpace, color: bool) {
    match space.modules.requires_order() {
        Ok(order) => println!("  order: {}", order.join(", ")),
        Err(cycles) => {
            let mut diagnostic =
                Diagnostic::warning(format!("requires cycle among {} modules", space.kind));
            for cycle in cycles {
                diagnostic = diagnostic.with_context(cycle.join(" -> "));
            }
            emit(&diagnostic, color);
        }
    }
}
