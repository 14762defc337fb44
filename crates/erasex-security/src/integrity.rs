// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hash evidence capture: SHA-256 fingerprints of the pre- and post-action
// state snapshots supplied by the evidence producer.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use erasex_core::error::Result;
use erasex_core::types::Digest;
use sha2::{Digest as _, Sha256};
use tracing::{debug, instrument};

/// Compute the SHA-256 digest of `data`.
pub fn hash_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&hasher.finalize());
    Digest::from_raw(raw)
}

/// Stream `reader` through SHA-256 without buffering it whole.
///
/// Returns the digest and the number of bytes read.
pub fn hash_reader(reader: &mut impl Read) -> Result<(Digest, u64)> {
    let mut hasher = Sha256::new();
    let len = io::copy(reader, &mut hasher)?;
    let mut raw = [0u8; 32];
    raw.copy_from_slice(&hasher.finalize());
    Ok((Digest::from_raw(raw), len))
}

/// Digest a file or device image, reading it in chunks.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn hash_file(path: impl AsRef<Path>) -> Result<Digest> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let (digest, len) = hash_reader(&mut reader)?;
    debug!(len, digest = %digest, "evidence file hashed");
    Ok(digest)
}

/// The pair of digests a certificate attests to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashEvidence {
    pub pre_hash: Digest,
    pub post_hash: Digest,
}

impl HashEvidence {
    /// Digest two raw state snapshots.
    #[instrument(skip_all, fields(pre_len = pre.len(), post_len = post.len()))]
    pub fn capture(pre: &[u8], post: &[u8]) -> Self {
        let evidence = Self {
            pre_hash: hash_bytes(pre),
            post_hash: hash_bytes(post),
        };
        debug!(pre_hash = %evidence.pre_hash, post_hash = %evidence.post_hash, "evidence captured");
        evidence
    }

    /// Accept digests computed upstream.
    ///
    /// Both must be 64 lowercase hex characters, otherwise this fails with
    /// `MalformedDigest` and nothing downstream gets signed.
    pub fn from_digests(pre_hash: &str, post_hash: &str) -> Result<Self> {
        Ok(Self {
            pre_hash: Digest::from_hex(pre_hash)?,
            post_hash: Digest::from_hex(post_hash)?,
        })
    }
}
