//! Spec file loading
//!
//! Specs are JSON or TOML documents mapping adapter names to states. Both
//! formats load into a `serde_json::Value` so the engine sees one shape.
//!
//! TOML has no null, so a TOML state writes `unset = true` where a JSON
//! state writes `"unset": null`. Loading turns the former into the latter.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Directive whose argument must be null
const UNSET: &str = "unset";

/// File names tried, in order, when no spec path is given
pub const DEFAULT_SPEC_FILES: &[&str] = &["spec.toml", "spec.json"];

/// Spec file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Toml,
}

impl SpecFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(ext) => bail!(
                "Unsupported spec format .{} for {} (expected .json or .toml)",
                ext,
                path.display()
            ),
            None => bail!(
                "Cannot tell the format of {} (expected .json or .toml)",
                path.display()
            ),
        }
    }

    /// Parse spec content in this format
    pub fn parse(self, content: &str) -> Result<Value> {
        match self {
            Self::Json => serde_json::from_str(content).context("Invalid JSON spec"),
            Self::Toml => {
                let mut spec = toml::from_str(content).context("Invalid TOML spec")?;
                null_toml_unsets(&mut spec);
                Ok(spec)
            }
        }
    }
}

/// Turn `unset = true` in every TOML state into `unset = null`
///
/// Any other `unset` value is left alone so the engine reports it.
fn null_toml_unsets(spec: &mut Value) {
    let Value::Object(adapters) = spec else {
        return;
    };

    let states = adapters.values_mut().flat_map(|entries| match entries {
        Value::Array(items) => items.iter_mut().collect::<Vec<_>>(),
        entry => vec![entry],
    });

    for state in states {
        if let Some(unset) = state.get_mut(UNSET).filter(|v| v.as_bool() == Some(true)) {
            *unset = Value::Null;
        }
    }
}

/// Resolve the spec path: an explicit path, or the first default spec
/// file found in the config directory
pub fn resolve_spec_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(paths::expand(path));
    }

    let dir = paths::config_dir()?;
    find_default_spec(&dir).with_context(|| {
        format!(
            "No spec given and none of {} found in {}",
            DEFAULT_SPEC_FILES.join(", "),
            dir.display()
        )
    })
}

fn find_default_spec(dir: &Path) -> Option<PathBuf> {
    DEFAULT_SPEC_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load a spec file into a value
pub fn load_spec(path: &Path) -> Result<Value> {
    let format = SpecFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    let spec = format
        .parse(&content)
        .with_context(|| format!("Could not parse {}", path.display()))?;

    if !spec.is_object() {
        bail!(
            "Spec {} must map adapter names to states, found {}",
            path.display(),
            spec
        );
    }

    log::debug!("Loaded spec from {}", path.display());
    Ok(spec)
}
