// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for EraseX.

use thiserror::Error;

use crate::types::CertificateId;

/// Top-level error type for all EraseX operations.
///
/// A failed verification is not an error: the verifier reports it as
/// `Verdict::Invalid`. A registry miss is `None`, not an error.
#[derive(Debug, Error)]
pub enum ErasexError {
    // -- Record construction --
    #[error("incomplete record: required field `{field}` is not set")]
    IncompleteRecord { field: &'static str },

    #[error("field `{field}` exceeds {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("malformed digest {value:?}: {reason}")]
    MalformedDigest { value: String, reason: &'static str },

    #[error("malformed timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("malformed signature encoding: {0}")]
    MalformedSignature(String),

    // -- Keys and signing --
    #[error("signing unavailable: {0}")]
    SigningUnavailable(String),

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),

    // -- Registry --
    #[error("certificate id {0} is already registered")]
    DuplicateId(CertificateId),

    #[error("database error: {0}")]
    Database(String),

    #[error("artifact rendering failed: {0}")]
    Artifact(String),

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ErasexError>;
