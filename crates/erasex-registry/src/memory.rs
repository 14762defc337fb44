// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory registry for process-lifetime storage.
//
// Backed by a sharded `DashMap`: writers to different ids usually land on
// different shard locks, a write to one id holds that shard's lock for the
// whole check-and-insert, and readers clone entries out whole.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{CertificateId, RegistryEntry};
use tracing::{debug, instrument};

use crate::registry::Registry;

/// Registry that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: DashMap<CertificateId, RegistryEntry>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Registry for MemoryRegistry {
    #[instrument(skip_all, fields(id = %entry.id()))]
    fn put(&self, entry: RegistryEntry) -> Result<()> {
        match self.entries.entry(entry.id().clone()) {
            Entry::Occupied(occupied) => Err(ErasexError::DuplicateId(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                debug!("entry stored");
                Ok(())
            }
        }
    }

    fn get(&self, id: &CertificateId) -> Result<Option<RegistryEntry>> {
        Ok(self.entries.get(id).map(|entry| entry.value().clone()))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}
