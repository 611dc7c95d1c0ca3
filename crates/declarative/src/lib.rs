//! # Declarative
//!
//! A declarative state reconciliation engine.
//!
//! Given a spec that maps backend adapters to key/value assertions, this
//! crate works out which keys are out of sync with the live system,
//! computes their new values, writes them through the adapters, and rolls
//! back earlier writes if a later one fails.
//!
//! ## Core Concepts
//!
//! - **Adapter**: A backend that can read and write keys (a plist domain,
//!   a JSON file, git config)
//! - **Directive**: How a key's desired state is tested and achieved
//!   (`set`, `unset`, `array_contains`, `array_missing`, `init`)
//! - **State**: One normalized (adapter, key, directive, value, options)
//!   assertion
//! - **StateSet**: The states of one spec, reconciled together
//!
//! ## Execution
//!
//! Execution runs in strictly ordered phases:
//!
//! 1. **Parse**: the spec is normalized into states, resolving adapters
//! 2. **Read**: every key is read and tested against its directive
//! 3. **Compute**: new values are computed for out-of-sync keys, in memory
//! 4. **Write**: new values are written in order; the first failure rolls
//!    back every earlier write
//! 5. **Report**: the changed keys are returned with old and new values
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, Registry, execute};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Registry::new();
//! registry.register("memory", Arc::new(MemoryAdapter::default()))?;
//!
//! let changes = execute(
//!     &json!({ "memory": { "key": "x", "set": "ex" } }),
//!     &registry,
//!     &ExecuteOptions::default(),
//! )?;
//!
//! for change in &changes {
//!     println!("{} {}: {} -> {}", change.adapter, change.key, change.old, change.new);
//! }
//! ```

pub mod adapter;
pub mod cast;
pub mod diff;
pub mod directive;
pub mod error;
pub mod executor;
pub mod registry;
pub mod state;
pub mod types;
pub mod value;

#[cfg(test)]
mod mock;

// Re-export main types at crate root
pub use adapter::{Adapter, AdapterRef};
pub use cast::{CastType, cast};
pub use diff::{DiffSummary, Plan, StateDiff, compute_plan};
pub use directive::{Directive, values_equal};
pub use error::{Error, Result, RollbackOutcome, WriteError};
pub use executor::execute;
pub use registry::{Loader, Registry};
pub use state::{State, StateSet};
pub use types::{Change, Changes, ExecuteOptions, RollbackMode};
pub use value::{Options, is_truthy};
