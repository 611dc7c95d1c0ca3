use anyhow::Result;
use colored::Colorize;

use crate::adapters::builtin_registry;
use crate::{Context, ui};

/// List the adapters a spec can name
pub fn run(ctx: &Context) -> Result<()> {
    let registry = builtin_registry()?;

    if ctx.quiet {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    ui::header("Adapters");
    for name in registry.names() {
        let status = if registry.get(&name).is_ok() {
            "available".green()
        } else {
            "unavailable (run with -vv for the reason)".yellow()
        };
        ui::kv(&name, &status.to_string());
    }
    Ok(())
}
