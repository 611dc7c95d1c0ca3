//! JSON and TOML file adapters
//!
//! Keys address a value inside a document (see [`super::key`]). A missing
//! file or a missing segment reads as null. Writes load the document,
//! assign into it and write the whole file back; writing null removes the
//! entry, or the file itself when the key names no path.

use anyhow::{Context, Result, bail};
use declarative::{Adapter, Options, is_truthy};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::key::{self, Key};
use crate::paths;

/// Option controlling indented JSON output
pub const PRETTY: &str = "pretty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }

    fn parse(self, content: &str) -> Result<Value> {
        match self {
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Toml => Ok(toml::from_str(content)?),
        }
    }

    fn render(self, doc: &Value, options: &Options) -> Result<String> {
        match self {
            Self::Json => {
                let pretty = options.get(PRETTY).is_none_or(is_truthy);
                let mut out = if pretty {
                    serde_json::to_string_pretty(doc)?
                } else {
                    serde_json::to_string(doc)?
                };
                out.push('\n');
                Ok(out)
            }
            Self::Toml => {
                if !doc.is_object() {
                    bail!("a TOML document must be a table, found {}", doc);
                }
                Ok(toml::to_string_pretty(doc)?)
            }
        }
    }
}

/// Adapter over JSON or TOML documents on disk
#[derive(Debug, Clone)]
pub struct FileAdapter {
    format: FileFormat,
}

impl FileAdapter {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    fn load(&self, path: &Path) -> Result<Option<Value>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Could not read {}", path.display()));
            }
        };

        if content.trim().is_empty() {
            return Ok(Some(Value::Object(Map::new())));
        }

        self.format
            .parse(&content)
            .with_context(|| format!("Could not parse {} as {}", path.display(), self.format.name()))
            .map(Some)
    }

    fn save(&self, path: &Path, doc: &Value, options: &Options) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = self.format.render(doc, options)?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
    }
}

fn resolve(key: &Value) -> Result<(PathBuf, Key)> {
    let key = Key::parse(key)?;
    Ok((paths::expand(&key.root), key))
}

impl Adapter for FileAdapter {
    fn read(&self, key: &Value, _options: &Options) -> Result<Value> {
        let (path, key) = resolve(key)?;
        let Some(doc) = self.load(&path)? else {
            log::trace!("{} does not exist", path.display());
            return Ok(Value::Null);
        };
        Ok(key::dig(&doc, &key.path).cloned().unwrap_or(Value::Null))
    }

    fn write(&self, key: &Value, value: &Value, options: &Options) -> Result<()> {
        let (path, key) = resolve(key)?;

        if key.path.is_empty() && value.is_null() {
            return match fs::remove_file(&path) {
                Err(e) if e.kind() != ErrorKind::NotFound => {
                    Err(e).with_context(|| format!("Could not remove {}", path.display()))
                }
                _ => Ok(()),
            };
        }

        let mut doc = self
            .load(&path)?
            .unwrap_or_else(|| Value::Object(Map::new()));
        key::deep_write(&mut doc, &key.path, value.clone());
        self.save(&path, &doc, options)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}
