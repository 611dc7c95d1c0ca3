//! Global git config adapter
//!
//! Keys are git config names (`user.name`). Reads go through
//! `git config --global --get`, which exits 1 with no output for a missing
//! key; any other failure is an error.

use anyhow::{Context, Result, bail};
use declarative::{Adapter, Options};
use serde_json::Value;

use crate::runner;

const GIT: &str = "git";

/// `git config` exit status for "section or key is invalid / not set"
const EXIT_UNSET: i32 = 5;

#[derive(Debug, Clone, Default)]
pub struct GitConfigAdapter;

impl GitConfigAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn config_key(key: &Value) -> Result<&str> {
    match key.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => bail!("git config key must be a non-empty string, found {}", key),
    }
}

/// Render a value the way git config stores it
pub fn config_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        _ => None,
    }
}

impl Adapter for GitConfigAdapter {
    fn read(&self, key: &Value, _options: &Options) -> Result<Value> {
        let name = config_key(key)?;
        let output = runner::output(GIT, &["config", "--global", "--get", name])?;

        if output.status.success() {
            let out = String::from_utf8_lossy(&output.stdout);
            let value = out.strip_suffix('\n').unwrap_or(&*out);
            return Ok(Value::String(value.to_string()));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.trim().is_empty() {
            return Ok(Value::Null);
        }
        bail!(
            "git config --global --get {} failed ({}): {}",
            name,
            output.status,
            stderr.trim()
        )
    }

    fn write(&self, key: &Value, value: &Value, _options: &Options) -> Result<()> {
        let name = config_key(key)?;

        if value.is_null() {
            let output = runner::output(GIT, &["config", "--global", "--unset-all", name])?;
            if output.status.success() || output.status.code() == Some(EXIT_UNSET) {
                return Ok(());
            }
            bail!(
                "git config --global --unset-all {} failed ({}): {}",
                name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let rendered = config_value(value)
            .with_context(|| format!("git config cannot store {} for {}", value, name))?;
        runner::run_capture(GIT, &["config", "--global", "--replace-all", name, &rendered])?;
        Ok(())
    }

    /// Everything reads back as a string
    fn values_equal(&self, current: &Value, desired: &Value) -> bool {
        match (current, config_value(desired)) {
            (Value::String(current), Some(desired)) => *current == desired,
            _ => current == desired,
        }
    }
}
