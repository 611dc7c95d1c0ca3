//! Execution engine - writes planned values with rollback
//!
//! Writes run strictly in state order, one at a time. The first failed
//! write stops the batch and every write that already succeeded is rolled
//! back, most recent first. Rollback never fails on its own: each outcome
//! is recorded on the returned [`WriteError`].

use crate::diff::{Plan, StateDiff, compute_plan};
use crate::error::{Error, Result, RollbackOutcome, WriteError};
use crate::registry::Registry;
use crate::state::{State, StateSet};
use crate::types::{Change, Changes, ExecuteOptions, RollbackMode};
use serde_json::Value;

/// Parse a spec and bring every state in it in sync
///
/// # Arguments
/// * `spec` - Adapter names mapped to a state or a list of states
/// * `registry` - Adapters to resolve names against
/// * `options` - Execution options
///
/// # Returns
/// The keys that were changed, empty if everything was in sync
pub fn execute(spec: &Value, registry: &Registry, options: &ExecuteOptions) -> Result<Changes> {
    StateSet::from_spec(spec, registry)?.execute(options)
}

pub(crate) fn execute_states(states: &[State], options: &ExecuteOptions) -> Result<Changes> {
    let plan = compute_plan(states)?;
    write_plan(states, &plan, options)
}

/// Write the values of an already computed plan without reading again
pub(crate) fn write_plan(
    states: &[State],
    plan: &Plan,
    options: &ExecuteOptions,
) -> Result<Changes> {
    check_plan(states, plan)?;

    if plan.is_empty() {
        log::debug!("All {} states in sync, nothing to write", states.len());
        return Ok(Changes::new());
    }

    let mut written: Vec<&StateDiff> = Vec::with_capacity(plan.len());

    for diff in &plan.diffs {
        let state = &states[diff.index];
        log::debug!("Writing {} => {}", state.describe(), diff.new_value);

        if let Err(source) = state
            .adapter
            .write(&state.key, &diff.new_value, &state.options)
        {
            log::debug!(
                "Write of {} {} failed, rolling back {} earlier writes",
                state.adapter_name,
                state.key,
                written.len()
            );
            let rollbacks = rollback(states, &written, options.rollback);
            return Err(WriteError {
                adapter: state.adapter_name.clone(),
                key: state.key.clone(),
                source,
                rollbacks,
            }
            .into());
        }

        written.push(diff);
    }

    Ok(written
        .into_iter()
        .map(|diff| Change {
            adapter: diff.adapter.clone(),
            key: diff.key.clone(),
            old: diff.current.clone(),
            new: diff.new_value.clone(),
        })
        .collect())
}

/// A plan must come from the same states it is written through
fn check_plan(states: &[State], plan: &Plan) -> Result<()> {
    for diff in &plan.diffs {
        match states.get(diff.index) {
            Some(state) if state.adapter_name == diff.adapter && state.key == diff.key => {}
            _ => {
                return Err(Error::Parse(format!(
                    "plan entry {} {} does not belong to this state set",
                    diff.adapter, diff.key
                )));
            }
        }
    }
    Ok(())
}

/// Undo successful writes, most recent first
fn rollback(states: &[State], written: &[&StateDiff], mode: RollbackMode) -> Vec<RollbackOutcome> {
    written
        .iter()
        .rev()
        .map(|diff| {
            let state = &states[diff.index];
            let value = match mode {
                RollbackMode::Desired => &state.value,
                RollbackMode::Previous => &diff.current,
            };

            let error = state.adapter.write(&state.key, value, &state.options).err();
            match &error {
                None => log::debug!("Rolled back {}", state.describe()),
                Some(e) => log::warn!(
                    "Failed to roll back {} {}: {:#}",
                    state.adapter_name,
                    state.key,
                    e
                ),
            }

            RollbackOutcome {
                adapter: state.adapter_name.clone(),
                key: state.key.clone(),
                error,
            }
        })
        .collect()
}
