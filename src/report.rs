//! Plan and change display

use colored::{ColoredString, Colorize};
use declarative::{Changes, Plan, StateDiff, WriteError};

use crate::ui;

/// Group diffs by adapter, keeping the order adapters first appear in
fn by_adapter(diffs: &[StateDiff]) -> Vec<(&str, Vec<&StateDiff>)> {
    let mut groups: Vec<(&str, Vec<&StateDiff>)> = Vec::new();
    for diff in diffs {
        match groups.iter_mut().find(|(name, _)| *name == diff.adapter) {
            Some((_, group)) => group.push(diff),
            None => groups.push((diff.adapter.as_str(), vec![diff])),
        }
    }
    groups
}

fn symbol(diff: &StateDiff) -> ColoredString {
    if diff.is_addition() {
        "+".green()
    } else if diff.is_removal() {
        "-".red()
    } else {
        "~".yellow()
    }
}

/// One-line description of what a diff writes
pub fn describe(diff: &StateDiff) -> String {
    if diff.is_removal() {
        format!("{} → (will remove)", ui::format_value(&diff.current))
    } else {
        format!(
            "{} → {}",
            ui::format_value(&diff.current),
            ui::format_value(&diff.new_value)
        )
    }
}

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &Plan) {
    if plan.is_empty() {
        println!();
        println!(
            "  {} No changes needed ({} states in sync)",
            "✓".green(),
            plan.in_sync
        );
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "State Diff".bold()
    );
    println!("│");

    for (adapter, diffs) in by_adapter(&plan.diffs) {
        println!("│ {}", adapter.bold());
        for diff in diffs {
            let key = ui::format_key(&diff.key);
            if ui::is_structured(&diff.current, &diff.new_value) {
                println!("│   {} {} {}", symbol(diff), key, diff.directive.to_string().dimmed());
                ui::print_value_diff("│       ", &diff.current, &diff.new_value);
            } else {
                println!(
                    "│   {} {:<30} {}",
                    symbol(diff),
                    key,
                    describe(diff).dimmed()
                );
            }
        }
        println!("│");
    }

    let summary = plan.summary();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} added, {} modified, {} removed), {} in sync",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red(),
        plan.in_sync
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display the keys an execute call changed
pub fn display_changes(changes: &Changes) {
    println!();
    ui::success(&format!("Applied {} changes", changes.len()));
    for change in changes {
        ui::kv(
            &format!("{} {}", change.adapter, ui::format_key(&change.key)),
            &format!(
                "{} → {}",
                ui::format_value(&change.old),
                ui::format_value(&change.new)
            ),
        );
    }
}

/// Display a failed write and how its rollback went
pub fn display_write_error(err: &WriteError) {
    println!();
    ui::error(&format!(
        "Writing {} {} failed: {:#}",
        err.adapter,
        ui::format_key(&err.key),
        err.source
    ));

    if err.rollbacks.is_empty() {
        ui::dim("Nothing was written before the failure, no rollback needed");
        return;
    }

    if err.fully_rolled_back() {
        ui::warn(&format!("Rolled back {} earlier writes", err.rollbacks.len()));
    } else {
        ui::warn("Some earlier writes could not be rolled back:");
    }

    for rollback in &err.rollbacks {
        let key = format!("{} {}", rollback.adapter, ui::format_key(&rollback.key));
        match &rollback.error {
            None => println!("  {} {}", "✓".green(), key),
            Some(e) => println!("  {} {}: {:#}", "✗".red(), key, e),
        }
    }
}
