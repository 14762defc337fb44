// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CLI subcommands.

pub mod hash;
pub mod issue;
pub mod lookup;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use erasex_core::config::AppConfig;
use erasex_core::error::{ErasexError, Result};
use erasex_registry::{MemoryRegistry, Registry, SqliteRegistry};
use tracing::warn;

/// Open the registry named on the command line, else the configured one.
///
/// With neither, entries live only for this process.
fn open_registry(flag: Option<PathBuf>, config: &AppConfig) -> Result<Arc<dyn Registry>> {
    match flag.or_else(|| config.registry_path.clone()) {
        Some(path) => Ok(Arc::new(SqliteRegistry::open(path)?)),
        None => {
            warn!("no registry configured; entries will not outlive this process");
            Ok(Arc::new(MemoryRegistry::new()))
        }
    }
}

/// Open a registry that must already be configured.
///
/// Reading from a fresh in-memory registry would report every id as
/// missing, so an unconfigured registry is an error here.
fn open_existing_registry(flag: Option<PathBuf>, config: &AppConfig) -> Result<Arc<dyn Registry>> {
    match flag.or_else(|| config.registry_path.clone()) {
        Some(path) => Ok(Arc::new(SqliteRegistry::open(path)?)),
        None => Err(ErasexError::Config(
            "no registry configured; pass --registry or set registry_path".to_owned(),
        )),
    }
}
