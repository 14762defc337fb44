// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! erasex-security: the cryptographic core of EraseX.
//!
//! Turns evidence digests into a canonical certificate encoding, signs it
//! with the operator's RSA key, and verifies signatures offline with only
//! the public key. Nothing in this crate holds shared mutable state.

pub mod canonical;
pub mod integrity;
pub mod keys;
pub mod signer;
pub mod verifier;

// PUBLIC API: Re-export core security primitives
pub use canonical::{canonical_bytes, canonical_bytes_of, fingerprint};
pub use integrity::{HashEvidence, hash_bytes, hash_file, hash_reader};
pub use keys::PublicKey;
pub use signer::CertificateSigner;
pub use verifier::{Verifier, verify};
