// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "erasex.json";

/// How newly issued certificate ids are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStyle {
    /// First 8 characters of a random UUID.
    #[default]
    Short,
    /// Full hyphenated random UUID.
    Uuid,
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// PEM private key used to sign new certificates.
    pub private_key_path: Option<PathBuf>,
    /// PEM public key used to verify certificates.
    pub public_key_path: Option<PathBuf>,
    /// Directory that receives rendered certificate artifacts.
    pub certificate_dir: PathBuf,
    /// SQLite registry file. `None` keeps the registry in memory.
    pub registry_path: Option<PathBuf>,
    /// Spelling of generated certificate ids.
    pub id_style: IdStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            private_key_path: None,
            public_key_path: None,
            certificate_dir: PathBuf::from("certificates"),
            registry_path: None,
            id_style: IdStyle::Short,
        }
    }
}

impl AppConfig {
    /// Load settings from `path`.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Write settings to `path` as pretty JSON.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Return the application data directory, creating it if needed.
///
/// Uses `$XDG_DATA_HOME/erasex`, falling back to `$HOME/.local/share/erasex`.
pub fn data_dir() -> Result<PathBuf> {
    let dir = data_home().join("erasex");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn data_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from("/tmp")
}
