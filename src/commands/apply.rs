use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{Error, ExecuteOptions, RollbackMode};

use super::load_states;
use crate::cli::ApplyArgs;
use crate::{Context, report, ui};

/// Bring the system in sync with a spec
pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let states = load_states(args.spec.as_deref())?;
    let plan = states.plan()?;

    if !ctx.quiet || !args.yes {
        report::display_plan(&plan);
    }

    if plan.is_empty() {
        return Ok(());
    }

    if !args.yes && !args.dry_run && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    if args.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    let rollback = if args.restore_previous {
        RollbackMode::Previous
    } else {
        RollbackMode::Desired
    };
    let options = ExecuteOptions::default().with_rollback(rollback);

    if !ctx.quiet {
        println!();
        ui::info(&format!("Applying {} changes", plan.len()));
    }

    // the confirmed plan is written as shown, keys are not read again
    match states.execute_plan(&plan, &options) {
        Ok(changes) => {
            if !ctx.quiet {
                report::display_changes(&changes);
            }
            Ok(())
        }
        Err(Error::Write(err)) => {
            report::display_write_error(&err);
            if err.fully_rolled_back() {
                bail!("Apply failed, earlier writes were rolled back");
            }
            bail!("Apply failed and rollback was incomplete, the system may be partially changed");
        }
        Err(e) => Err(e.into()),
    }
}

fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
