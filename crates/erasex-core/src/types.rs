// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for EraseX certificates.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErasexError, Result};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Upper bound, in bytes, on the free-text fields `id` and `subject`.
pub const MAX_FIELD_LEN: usize = 4096;

// ---------------------------------------------------------------------------
// Identifiers and evidence
// ---------------------------------------------------------------------------

/// Opaque certificate identifier, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CertificateId(String);

impl CertificateId {
    /// Wrap an identifier string. An empty string counts as an unset id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ErasexError::IncompleteRecord { field: "id" });
        }
        if id.len() > MAX_FIELD_LEN {
            return Err(ErasexError::FieldTooLong {
                field: "id",
                max: MAX_FIELD_LEN,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CertificateId {
    type Error = ErasexError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CertificateId> for String {
    fn from(id: CertificateId) -> Self {
        id.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A SHA-256 digest in its canonical form: 64 lowercase hex characters.
///
/// Construction validates the text, so holding a `Digest` means the evidence
/// is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Validate a pre-computed digest string.
    ///
    /// Uppercase hex is rejected rather than folded, so a digest has exactly
    /// one accepted spelling.
    pub fn from_hex(value: &str) -> Result<Self> {
        if value.len() != DIGEST_HEX_LEN {
            return Err(ErasexError::MalformedDigest {
                value: value.to_owned(),
                reason: "expected exactly 64 hex characters",
            });
        }
        if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ErasexError::MalformedDigest {
                value: value.to_owned(),
                reason: "expected lowercase hex characters only",
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Wrap the raw 32-byte output of SHA-256.
    pub fn from_raw(raw: [u8; 32]) -> Self {
        Self(hex::encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = ErasexError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issuance time, normalised to UTC with whole-second precision.
///
/// The textual form is always `YYYY-MM-DDTHH:MM:SSZ`, which is what the
/// canonical encoding and the registry store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssuedAt(DateTime<Utc>);

impl IssuedAt {
    /// Truncate `at` to whole seconds.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(0))
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Parse an RFC 3339 timestamp in any offset and normalise it to UTC.
    ///
    /// Fractional seconds are rejected: truncating them here would let two
    /// different texts decode to the same record.
    pub fn parse(value: &str) -> Result<Self> {
        let parsed =
            DateTime::parse_from_rfc3339(value).map_err(|e| ErasexError::MalformedTimestamp {
                value: value.to_owned(),
                reason: e.to_string(),
            })?;
        if parsed.nanosecond() != 0 {
            return Err(ErasexError::MalformedTimestamp {
                value: value.to_owned(),
                reason: "fractional seconds are not allowed".to_owned(),
            });
        }
        Ok(Self(parsed.with_timezone(&Utc)))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// The fixed textual encoding, e.g. `2024-01-01T00:00:00Z`.
    pub fn to_canonical_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl TryFrom<String> for IssuedAt {
    type Error = ErasexError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IssuedAt> for String {
    fn from(at: IssuedAt) -> Self {
        at.to_canonical_string()
    }
}

impl fmt::Display for IssuedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

// ---------------------------------------------------------------------------
// Certificate record
// ---------------------------------------------------------------------------

/// A sanitisation certificate: the record that gets canonicalised and signed.
///
/// Immutable once built. Changing any field means building a new record with
/// a new id, see [`Certificate::to_builder`].
///
/// The JSON form lists the fields in a fixed order. Deserialisation runs
/// through [`CertificateBuilder`], so a record with a missing field is
/// rejected instead of defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CertificateBuilder")]
pub struct Certificate {
    id: CertificateId,
    subject: String,
    issued_at: IssuedAt,
    pre_hash: Digest,
    post_hash: Digest,
}

impl Certificate {
    pub fn builder() -> CertificateBuilder {
        CertificateBuilder::default()
    }

    /// Parse a JSON record, reporting missing fields as `IncompleteRecord`.
    pub fn from_json(json: &str) -> Result<Self> {
        let builder: CertificateBuilder = serde_json::from_str(json)?;
        builder.build()
    }

    pub fn id(&self) -> &CertificateId {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issued_at(&self) -> IssuedAt {
        self.issued_at
    }

    pub fn pre_hash(&self) -> &Digest {
        &self.pre_hash
    }

    pub fn post_hash(&self) -> &Digest {
        &self.post_hash
    }

    /// A builder pre-filled with this record's fields.
    pub fn to_builder(&self) -> CertificateBuilder {
        CertificateBuilder {
            id: Some(self.id.clone()),
            subject: Some(self.subject.clone()),
            issued_at: Some(self.issued_at),
            pre_hash: Some(self.pre_hash.clone()),
            post_hash: Some(self.post_hash.clone()),
        }
    }
}

/// Field-by-field construction of a [`Certificate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificateBuilder {
    #[serde(default)]
    id: Option<CertificateId>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    issued_at: Option<IssuedAt>,
    #[serde(default)]
    pre_hash: Option<Digest>,
    #[serde(default)]
    post_hash: Option<Digest>,
}

impl CertificateBuilder {
    pub fn id(mut self, id: CertificateId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn issued_at(mut self, issued_at: IssuedAt) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn pre_hash(mut self, digest: Digest) -> Self {
        self.pre_hash = Some(digest);
        self
    }

    pub fn post_hash(mut self, digest: Digest) -> Self {
        self.post_hash = Some(digest);
        self
    }

    /// Finish the record. Every field is required; an empty subject counts as
    /// unset.
    pub fn build(self) -> Result<Certificate> {
        let id = self.id.ok_or(ErasexError::IncompleteRecord { field: "id" })?;
        let subject = self
            .subject
            .filter(|s| !s.is_empty())
            .ok_or(ErasexError::IncompleteRecord { field: "subject" })?;
        if subject.len() > MAX_FIELD_LEN {
            return Err(ErasexError::FieldTooLong {
                field: "subject",
                max: MAX_FIELD_LEN,
            });
        }
        let issued_at = self
            .issued_at
            .ok_or(ErasexError::IncompleteRecord { field: "issued_at" })?;
        let pre_hash = self
            .pre_hash
            .ok_or(ErasexError::IncompleteRecord { field: "pre_hash" })?;
        let post_hash = self
            .post_hash
            .ok_or(ErasexError::IncompleteRecord { field: "post_hash" })?;

        Ok(Certificate {
            id,
            subject,
            issued_at,
            pre_hash,
            post_hash,
        })
    }
}

impl TryFrom<CertificateBuilder> for Certificate {
    type Error = ErasexError;

    fn try_from(builder: CertificateBuilder) -> Result<Self> {
        builder.build()
    }
}

// ---------------------------------------------------------------------------
// Signatures and verification outcomes
// ---------------------------------------------------------------------------

/// Signature bytes over a certificate's canonical encoding.
///
/// JSON carries it as lowercase hex; detached `.sig` files hold the raw bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        hex::decode(value)
            .map(Self)
            .map_err(|e| ErasexError::MalformedSignature(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

impl TryFrom<String> for Signature {
    type Error = ErasexError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Signature> for String {
    fn from(signature: Signature) -> Self {
        signature.to_hex()
    }
}

/// Why a verification did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The public key could not be parsed as an RSA key.
    MalformedPublicKey,
    /// The signature bytes are empty or the wrong length for the key.
    MalformedSignature,
    /// The signature does not match the record under this key.
    SignatureMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPublicKey => f.write_str("malformed public key"),
            Self::MalformedSignature => f.write_str("malformed signature"),
            Self::SignatureMismatch => f.write_str("signature does not match record"),
        }
    }
}

/// Outcome of checking a signature. Never an error: hostile input is an
/// expected case for a verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid(Rejection),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

/// What the registry holds per issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub certificate: Certificate,
    pub signature: Signature,
    /// Where the rendered artifact was written, if one was rendered.
    pub artifact: Option<PathBuf>,
}

impl RegistryEntry {
    pub fn id(&self) -> &CertificateId {
        self.certificate.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_DIGEST: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn sample() -> Certificate {
        Certificate::builder()
            .id(CertificateId::new("a1b2c3d4").expect("id"))
            .subject("Drive D:")
            .issued_at(IssuedAt::parse("2024-01-01T00:00:00Z").expect("timestamp"))
            .pre_hash(Digest::from_hex(ZERO_DIGEST).expect("digest"))
            .post_hash(Digest::from_hex(ZERO_DIGEST).expect("digest"))
            .build()
            .expect("complete record")
    }

    #[test]
    fn digest_rejects_short_input() {
        let short = &ZERO_DIGEST[..63];
        match Digest::from_hex(short).unwrap_err() {
            ErasexError::MalformedDigest { value, .. } => assert_eq!(value, short),
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn digest_rejects_uppercase() {
        let upper = format!("A{}", &ZERO_DIGEST[1..]);
        assert!(matches!(
            Digest::from_hex(&upper),
            Err(ErasexError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn digest_rejects_non_hex() {
        let bad = format!("g{}", &ZERO_DIGEST[1..]);
        assert!(Digest::from_hex(&bad).is_err());
    }

    #[test]
    fn empty_id_is_incomplete() {
        assert!(matches!(
            CertificateId::new(""),
            Err(ErasexError::IncompleteRecord { field: "id" })
        ));
    }

    #[test]
    fn oversized_subject_is_rejected() {
        let result = sample().to_builder().subject("x".repeat(MAX_FIELD_LEN + 1)).build();
        assert!(matches!(
            result,
            Err(ErasexError::FieldTooLong { field: "subject", .. })
        ));
    }

    #[test]
    fn issued_at_normalises_offset_to_utc() {
        let at = IssuedAt::parse("2024-01-01T02:00:00+02:00").expect("parse");
        assert_eq!(at.to_canonical_string(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn issued_at_rejects_fractional_seconds() {
        assert!(matches!(
            IssuedAt::parse("2024-01-01T00:00:00.5Z"),
            Err(ErasexError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn issued_at_truncates_subseconds() {
        let at = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.987654Z")
            .expect("parse")
            .with_timezone(&Utc);
        assert_eq!(
            IssuedAt::from_datetime(at).to_canonical_string(),
            "2024-05-06T07:08:09Z"
        );
    }

    #[test]
    fn builder_reports_first_missing_field() {
        let result = Certificate::builder()
            .id(CertificateId::new("x").expect("id"))
            .subject("Drive C:")
            .build();
        assert!(matches!(
            result,
            Err(ErasexError::IncompleteRecord { field: "issued_at" })
        ));
    }

    #[test]
    fn empty_subject_is_incomplete() {
        let result = sample().to_builder().subject("").build();
        assert!(matches!(
            result,
            Err(ErasexError::IncompleteRecord { field: "subject" })
        ));
    }

    #[test]
    fn json_field_order_is_fixed() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        let id = json.find("\"id\"").expect("id");
        let subject = json.find("\"subject\"").expect("subject");
        let issued = json.find("\"issued_at\"").expect("issued_at");
        let pre = json.find("\"pre_hash\"").expect("pre_hash");
        let post = json.find("\"post_hash\"").expect("post_hash");
        assert!(id < subject && subject < issued && issued < pre && pre < post);
    }

    #[test]
    fn json_round_trip_preserves_record() {
        let cert = sample();
        let json = serde_json::to_string_pretty(&cert).expect("serialize");
        let back = Certificate::from_json(&json).expect("deserialize");
        assert_eq!(back, cert);
    }

    #[test]
    fn json_missing_field_is_incomplete() {
        let json = format!(
            r#"{{"id":"a1","issued_at":"2024-01-01T00:00:00Z","pre_hash":"{ZERO_DIGEST}","post_hash":"{ZERO_DIGEST}"}}"#
        );
        assert!(matches!(
            Certificate::from_json(&json),
            Err(ErasexError::IncompleteRecord { field: "subject" })
        ));
        // The derived path rejects it too, as a serde error.
        assert!(serde_json::from_str::<Certificate>(&json).is_err());
    }

    #[test]
    fn json_malformed_digest_is_rejected() {
        let json = r#"{"id":"a1","subject":"D:","issued_at":"2024-01-01T00:00:00Z","pre_hash":"abc","post_hash":"abc"}"#;
        assert!(Certificate::from_json(json).is_err());
    }

    #[test]
    fn signature_hex_round_trip() {
        let sig = Signature::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&sig).expect("serialize");
        assert_eq!(json, "\"deadbeef\"");
        let back: Signature = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sig);
        assert!(Signature::from_hex("xyz").is_err());
    }

    #[test]
    fn verdict_serializes_with_reason() {
        let json = serde_json::to_string(&Verdict::Invalid(Rejection::SignatureMismatch))
            .expect("serialize");
        assert_eq!(json, r#"{"status":"invalid","reason":"signature_mismatch"}"#);
        assert!(Verdict::Valid.is_valid());
    }
}
