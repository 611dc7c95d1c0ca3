//! Built-in backend adapters
//!
//! Every adapter is registered through a loader so nothing runs, and no
//! external tool is looked up, until a spec names it.

pub mod defaults;
pub mod file;
pub mod git_config;
pub mod key;

use anyhow::{Result, bail};
use declarative::{AdapterRef, Registry};
use std::sync::Arc;

use crate::runner;
use defaults::DefaultsAdapter;
use file::{FileAdapter, FileFormat};
use git_config::GitConfigAdapter;

pub const JSON: &str = "json";
pub const TOML: &str = "toml";
pub const DEFAULTS: &str = "defaults";
pub const GIT_CONFIG: &str = "git_config";

/// Registry with every built-in adapter available by name
pub fn builtin_registry() -> Result<Registry> {
    let registry = Registry::new();

    registry.register_loader(JSON, || {
        Ok(Arc::new(FileAdapter::new(FileFormat::Json)) as AdapterRef)
    })?;
    registry.register_loader(TOML, || {
        Ok(Arc::new(FileAdapter::new(FileFormat::Toml)) as AdapterRef)
    })?;
    registry.register_loader(DEFAULTS, || {
        require_command("defaults", DEFAULTS)?;
        Ok(Arc::new(DefaultsAdapter::new()) as AdapterRef)
    })?;
    registry.register_loader(GIT_CONFIG, || {
        require_command("git", GIT_CONFIG)?;
        Ok(Arc::new(GitConfigAdapter::new()) as AdapterRef)
    })?;

    Ok(registry)
}

fn require_command(command: &str, adapter: &str) -> Result<()> {
    if !runner::command_exists(command) {
        bail!("the {} adapter needs `{}` on PATH", adapter, command);
    }
    Ok(())
}
