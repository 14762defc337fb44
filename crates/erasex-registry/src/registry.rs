// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Registry contract: id → (certificate, signature, artifact location).

use erasex_core::error::Result;
use erasex_core::types::{CertificateId, RegistryEntry};

/// Write-once lookup store for issued certificates.
///
/// Implementations must make a `put` visible all at once: a concurrent `get`
/// either sees the whole entry or nothing. Entries are never updated or
/// deleted.
pub trait Registry: Send + Sync {
    /// Store `entry` under its certificate id.
    ///
    /// Fails with `DuplicateId` if the id is already present; the existing
    /// entry is left untouched.
    fn put(&self, entry: RegistryEntry) -> Result<()>;

    /// Fetch the entry for `id`. A miss is `Ok(None)`.
    fn get(&self, id: &CertificateId) -> Result<Option<RegistryEntry>>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
