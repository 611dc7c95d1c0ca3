//! Error types for state reconciliation.
//!
//! Errors are grouped by the phase that raised them. Parsing errors
//! (`Type`, `Parse`, `Cast`, `AdapterNotFound`) abort before anything is
//! read. Adapter failures are never surfaced raw: they are wrapped as
//! `Read`, `ValueSync` or `Write` so callers only need to branch on the
//! phase, and each message carries enough context to reconstruct what
//! happened.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or executing a state set.
#[derive(Debug, Error)]
pub enum Error {
    /// Spec (or part of it) has the wrong shape
    #[error("{message}, found {found}")]
    Type {
        /// What shape was expected
        message: String,
        /// The offending value, rendered as JSON
        found: String,
    },

    /// Assertion is malformed (missing key, directive count, option collision)
    #[error("{0}")]
    Parse(String),

    /// Type name is not one the caster knows
    #[error("bad type name: {0:?}")]
    UnknownCastType(String),

    /// Value could not be coerced to the requested type
    #[error("can't cast {value} to {type_name:?}")]
    Cast {
        /// Requested type name
        type_name: String,
        /// The value that failed to cast, rendered as JSON
        value: String,
    },

    /// Adapter name is neither registered nor loadable
    #[error("adapter {name:?} was not found, known adapters: [{}]", known.join(", "))]
    AdapterNotFound {
        /// Name that was looked up
        name: String,
        /// Every name the registry knows about
        known: Vec<String>,
    },

    /// An array directive cannot reconcile the current structure
    #[error("{message}")]
    StructureConflict {
        /// Names the key, the current value and the missing option
        message: String,
    },

    /// `unset` was declared with a non-null value
    #[error("value must be null to unset {key}, found {value}")]
    UnsetWithValue {
        /// Key being unset
        key: String,
        /// The offending payload
        value: String,
    },

    /// Adapter read failed during the diff phase
    #[error("failed to read {key} with adapter {adapter:?}: {source:#}")]
    Read {
        /// Adapter name
        adapter: String,
        /// Key being read
        key: String,
        /// Underlying adapter error
        source: anyhow::Error,
    },

    /// Computing a new value failed; nothing has been written
    #[error(
        "an error occurred computing a new value for {key} with adapter {adapter:?}: {source}\n\n\
         no changes were attempted to the system, so there is no rollback necessary."
    )]
    ValueSync {
        /// Adapter name
        adapter: String,
        /// Key whose value could not be computed
        key: String,
        /// Underlying directive error
        source: Box<Error>,
    },

    /// Writing a new value failed; previous writes were rolled back
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl Error {
    /// Build a type error for an unexpected value
    pub fn type_error(message: impl Into<String>, found: &Value) -> Self {
        Self::Type {
            message: message.into(),
            found: found.to_string(),
        }
    }

    /// Build a cast error
    pub fn cast(type_name: &str, value: &Value) -> Self {
        Self::Cast {
            type_name: type_name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Outcome of rolling back one previously written state
#[derive(Debug)]
pub struct RollbackOutcome {
    /// Adapter name
    pub adapter: String,
    /// Key that was rolled back
    pub key: Value,
    /// Error raised by the rollback write, if any
    pub error: Option<anyhow::Error>,
}

impl RollbackOutcome {
    /// Whether the rollback write succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A write failed part way through a batch.
///
/// `rollbacks` holds one entry per state written before the failure, in
/// the order the rollback visited them (most recent write first).
#[derive(Debug)]
pub struct WriteError {
    /// Adapter whose write failed
    pub adapter: String,
    /// Key whose write failed
    pub key: Value,
    /// Error raised by the failing write
    pub source: anyhow::Error,
    /// Rollback result for every earlier write
    pub rollbacks: Vec<RollbackOutcome>,
}

impl WriteError {
    /// Whether every earlier write was rolled back successfully
    pub fn fully_rolled_back(&self) -> bool {
        self.rollbacks.iter().all(RollbackOutcome::is_success)
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "an error occurred writing {} with adapter {:?}: {:#}",
            self.key, self.adapter, self.source
        )?;
        writeln!(f)?;

        if self.rollbacks.is_empty() {
            return write!(
                f,
                "the error occurred on the first write, so no rollback was necessary."
            );
        }

        if self.fully_rolled_back() {
            writeln!(f, "all values were successfully rolled back:")?;
        } else {
            writeln!(f, "some values failed to roll back:")?;
        }

        for outcome in &self.rollbacks {
            writeln!(f)?;
            match &outcome.error {
                None => write!(f, "    {} {}: rolled back.", outcome.adapter, outcome.key)?,
                Some(e) => write!(
                    f,
                    "    {} {}: rollback failed: {:#}",
                    outcome.adapter, outcome.key, e
                )?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}
