//! Path resolution for statemate
//!
//! # Environment Variables
//!
//! - `STATEMATE_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/statemate`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `STATEMATE_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/statemate` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\statemate`
//!    - macOS/Linux: `~/.config/statemate`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "STATEMATE_CONFIG_DIR";

const APP_NAME: &str = "statemate";

/// Get the statemate config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join(APP_NAME);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_NAME);
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_NAME);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand `~` and environment variables in a path
///
/// Falls back to the unexpanded path when a variable is undefined.
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::debug!("Could not expand {}: {}", path, e);
            PathBuf::from(shellexpand::tilde(path).as_ref())
        }
    }
}
