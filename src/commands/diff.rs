use anyhow::Result;

use super::load_states;
use crate::cli::DiffArgs;
use crate::{Context, report};

/// Show what `apply` would change, without writing anything
pub fn run(_ctx: &Context, args: DiffArgs) -> Result<()> {
    let plan = load_states(args.spec.as_deref())?.plan()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        report::display_plan(&plan);
    }
    Ok(())
}
