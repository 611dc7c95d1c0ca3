//! Read and compute phases
//!
//! A plan reads every state's key, tests it against its directive, and
//! computes the new value for each state that is out of sync. Nothing is
//! written: every new value is known before the first write happens, so a
//! directive that cannot be satisfied never leaves the system half
//! changed.

use crate::directive::Directive;
use crate::error::{Error, Result};
use crate::state::State;
use serde::Serialize;
use serde_json::Value;

/// An out-of-sync state and the value that brings it in sync
#[derive(Debug, Clone, Serialize)]
pub struct StateDiff {
    /// Position of the state in its state set
    pub index: usize,
    /// Adapter name
    pub adapter: String,
    /// Adapter-specific key
    pub key: Value,
    /// Directive that found the key out of sync
    pub directive: Directive,
    /// Value read from the adapter
    pub current: Value,
    /// Value that will be written
    pub new_value: Value,
}

impl StateDiff {
    /// Check if this diff creates a key that is currently absent
    pub fn is_addition(&self) -> bool {
        self.current.is_null() && !self.new_value.is_null()
    }

    /// Check if this diff removes a key
    pub fn is_removal(&self) -> bool {
        !self.current.is_null() && self.new_value.is_null()
    }
}

/// Result of the read and compute phases
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    /// Out-of-sync states, in state order
    pub diffs: Vec<StateDiff>,
    /// Number of states already in sync
    pub in_sync: usize,
}

impl Plan {
    /// Check if there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(&self.diffs)
    }
}

/// Read every state and compute new values for the out-of-sync ones
pub fn compute_plan(states: &[State]) -> Result<Plan> {
    let mut read_values = Vec::with_capacity(states.len());
    let mut to_change = Vec::new();

    for (index, state) in states.iter().enumerate() {
        let current = state
            .adapter
            .read(&state.key, &state.options)
            .map_err(|source| Error::Read {
                adapter: state.adapter_name.clone(),
                key: state.key.to_string(),
                source,
            })?;

        let in_sync = state.directive.test(
            &state.key,
            &current,
            &state.value,
            state.adapter.as_ref(),
            &state.options,
        );
        log::debug!(
            "Read {} {} = {} ({})",
            state.adapter_name,
            state.key,
            current,
            if in_sync { "in sync" } else { "out of sync" }
        );

        if !in_sync {
            to_change.push(index);
        }
        read_values.push(current);
    }

    let in_sync = states.len() - to_change.len();
    let mut diffs = Vec::with_capacity(to_change.len());

    for index in to_change {
        let state = &states[index];
        let current = std::mem::take(&mut read_values[index]);

        let new_value = state
            .directive
            .apply(
                &state.key,
                &current,
                &state.value,
                state.adapter.as_ref(),
                &state.options,
            )
            .map_err(|source| Error::ValueSync {
                adapter: state.adapter_name.clone(),
                key: state.key.to_string(),
                source: Box::new(source),
            })?;

        diffs.push(StateDiff {
            index,
            adapter: state.adapter_name.clone(),
            key: state.key.clone(),
            directive: state.directive,
            current,
            new_value,
        });
    }

    Ok(Plan { diffs, in_sync })
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Keys to create
    pub additions: usize,
    /// Keys to remove
    pub removals: usize,
    /// Keys to change in place
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[StateDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }
}
