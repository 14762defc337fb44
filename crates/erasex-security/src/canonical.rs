// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical encoding: the exact bytes that get signed and verified.
//
// Layout (version 1):
//
//   "ERASEX-CERT"                 11 ASCII bytes
//   0x01                          format version
//   id         u32 BE len | UTF-8
//   subject    u32 BE len | UTF-8
//   issued_at  u32 BE len | UTF-8  (YYYY-MM-DDTHH:MM:SSZ)
//   pre_hash   u32 BE len | UTF-8  (64 lowercase hex)
//   post_hash  u32 BE len | UTF-8  (64 lowercase hex)
//
// Any implementation that wants to verify EraseX certificates must produce
// these bytes exactly.

use erasex_core::error::Result;
use erasex_core::types::{Certificate, CertificateBuilder, Digest};

use crate::integrity::hash_bytes;

/// Leading magic of every canonical encoding.
pub const CANONICAL_MAGIC: &[u8; 11] = b"ERASEX-CERT";

/// Current canonical format version.
pub const CANONICAL_VERSION: u8 = 1;

/// Encode `certificate` into its canonical byte sequence.
///
/// Field-equal certificates always produce identical bytes, and the length
/// prefixes make the encoding injective.
pub fn canonical_bytes(certificate: &Certificate) -> Vec<u8> {
    let issued_at = certificate.issued_at().to_canonical_string();
    let fields: [&str; 5] = [
        certificate.id().as_str(),
        certificate.subject(),
        &issued_at,
        certificate.pre_hash().as_str(),
        certificate.post_hash().as_str(),
    ];

    let body_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut out = Vec::with_capacity(CANONICAL_MAGIC.len() + 1 + body_len);
    out.extend_from_slice(CANONICAL_MAGIC);
    out.push(CANONICAL_VERSION);
    for field in fields {
        push_field(&mut out, field);
    }
    out
}

/// Encode a record that may still be missing fields.
///
/// Fails with `IncompleteRecord` naming the first unset field.
pub fn canonical_bytes_of(builder: &CertificateBuilder) -> Result<Vec<u8>> {
    let certificate = builder.clone().build()?;
    Ok(canonical_bytes(&certificate))
}

/// SHA-256 over the canonical bytes; a short handle for logs and listings.
pub fn fingerprint(certificate: &Certificate) -> Digest {
    hash_bytes(&canonical_bytes(certificate))
}

fn push_field(out: &mut Vec<u8>, value: &str) {
    // Fields are bounded by MAX_FIELD_LEN or fixed-width, so the length fits.
    let len = value.len() as u32;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use erasex_core::error::ErasexError;
    use erasex_core::types::{CertificateId, IssuedAt};

    /// Canonical bytes of the demo certificate, produced independently of
    /// this crate.
    const SCENARIO_CANONICAL: &[u8] = include_bytes!("../testdata/scenario_a1b2c3d4.canonical");

    fn scenario() -> Certificate {
        Certificate::builder()
            .id(CertificateId::new("a1b2c3d4").expect("id"))
            .subject("Drive D:")
            .issued_at(IssuedAt::parse("2024-01-01T00:00:00Z").expect("timestamp"))
            .pre_hash(hash_bytes(b"DemoSensitiveDataForHashing"))
            .post_hash(hash_bytes(&[0u8; 28]))
            .build()
            .expect("complete record")
    }

    #[test]
    fn matches_golden_vector() {
        assert_eq!(canonical_bytes(&scenario()), SCENARIO_CANONICAL);
    }

    #[test]
    fn header_and_first_field() {
        let bytes = canonical_bytes(&scenario());
        assert_eq!(&bytes[..11], b"ERASEX-CERT");
        assert_eq!(bytes[11], CANONICAL_VERSION);
        assert_eq!(&bytes[12..16], &8u32.to_be_bytes());
        assert_eq!(&bytes[16..24], b"a1b2c3d4");
    }

    #[test]
    fn independently_built_records_encode_identically() {
        let a = scenario();
        let json = serde_json::to_string(&a).expect("serialize");
        let b = Certificate::from_json(&json).expect("deserialize");
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn offset_timestamps_encode_as_utc() {
        let a = scenario();
        let b = a
            .to_builder()
            .issued_at(IssuedAt::parse("2024-01-01T05:30:00+05:30").expect("timestamp"))
            .build()
            .expect("record");
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn moving_bytes_between_fields_changes_encoding() {
        // Without length prefixes "ab"+"c" and "a"+"bc" would collide.
        let base = scenario();
        let a = base
            .to_builder()
            .id(CertificateId::new("ab").expect("id"))
            .subject("c")
            .build()
            .expect("record");
        let b = base
            .to_builder()
            .id(CertificateId::new("a").expect("id"))
            .subject("bc")
            .build()
            .expect("record");
        assert_ne!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn incomplete_builder_is_rejected() {
        let builder = Certificate::builder().subject("Drive D:");
        assert!(matches!(
            canonical_bytes_of(&builder),
            Err(ErasexError::IncompleteRecord { field: "id" })
        ));
    }

    #[test]
    fn builder_and_record_agree() {
        let cert = scenario();
        let via_builder = canonical_bytes_of(&cert.to_builder()).expect("complete");
        assert_eq!(via_builder, canonical_bytes(&cert));
    }

    #[test]
    fn fingerprint_is_hash_of_canonical_bytes() {
        assert_eq!(fingerprint(&scenario()), hash_bytes(SCENARIO_CANONICAL));
    }
}
