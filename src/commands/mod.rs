pub mod adapters;
pub mod apply;
pub mod cast;
pub mod diff;

use anyhow::Result;
use declarative::StateSet;

use crate::{adapters as builtin, config};

/// Load the spec at `path` (or the default spec) and parse it into states
fn load_states(path: Option<&str>) -> Result<StateSet> {
    let path = config::resolve_spec_path(path)?;
    let spec = config::load_spec(&path)?;
    let registry = builtin::builtin_registry()?;
    let states = StateSet::from_spec(&spec, &registry)?;
    log::info!("Loaded {} states from {}", states.len(), path.display());
    Ok(states)
}
