// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key material loading: PEM in, DER out.
//
// `ring` verifies RSA signatures against a bare PKCS#1 `RSAPublicKey`, while
// operators distribute public keys as SubjectPublicKeyInfo PEM (`PUBLIC KEY`).
// The SPKI wrapper is peeled off here with a small bounded DER walk; nothing
// beyond the two structures involved is parsed.

use std::io::BufRead;
use std::path::Path;

use erasex_core::error::{ErasexError, Result};
use rustls_pemfile::Item;
use tracing::{debug, instrument};

/// Smallest modulus the verifier accepts (matches `RSA_PKCS1_2048_8192_SHA256`).
pub const MIN_MODULUS_BITS: usize = 2048;

/// Largest modulus the verifier accepts.
pub const MAX_MODULUS_BITS: usize = 8192;

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// OID 1.2.840.113549.1.1.1 (rsaEncryption).
const RSA_ENCRYPTION_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

// ---------------------------------------------------------------------------
// Public keys
// ---------------------------------------------------------------------------

/// An RSA public key, held as PKCS#1 `RSAPublicKey` DER.
///
/// Freely shareable; cloning copies a few hundred bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    rsa_der: Vec<u8>,
    modulus_len: usize,
}

impl PublicKey {
    /// Parse the first `PUBLIC KEY` block in `pem`.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let mut reader: &[u8] = pem;
        loop {
            match read_item(&mut reader)? {
                Some(Item::SubjectPublicKeyInfo(spki)) => {
                    let rsa_der = spki_rsa_public_key(spki.as_ref()).ok_or_else(|| {
                        ErasexError::MalformedPublicKey(
                            "not an rsaEncryption SubjectPublicKeyInfo".to_owned(),
                        )
                    })?;
                    return Self::from_rsa_der(rsa_der.to_vec());
                }
                Some(_) => continue,
                None => {
                    return Err(ErasexError::MalformedPublicKey(
                        "no PUBLIC KEY block found".to_owned(),
                    ));
                }
            }
        }
    }

    /// Read and parse a PEM public key file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let pem = std::fs::read(path.as_ref())?;
        let key = Self::from_pem(&pem)?;
        debug!(modulus_len = key.modulus_len, "public key loaded");
        Ok(key)
    }

    /// Wrap PKCS#1 `RSAPublicKey` DER after checking its shape and size.
    pub fn from_rsa_der(rsa_der: Vec<u8>) -> Result<Self> {
        let (modulus_len, bits) = rsa_modulus_size(&rsa_der).ok_or_else(|| {
            ErasexError::MalformedPublicKey("not a DER RSAPublicKey".to_owned())
        })?;
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
            return Err(ErasexError::MalformedPublicKey(format!(
                "modulus of {bits} bits is outside {MIN_MODULUS_BITS}..={MAX_MODULUS_BITS}"
            )));
        }
        Ok(Self {
            rsa_der,
            modulus_len,
        })
    }

    /// PKCS#1 `RSAPublicKey` DER, as `ring` expects it.
    pub fn as_rsa_der(&self) -> &[u8] {
        &self.rsa_der
    }

    /// Modulus length in bytes, which is also the signature length.
    pub fn modulus_len(&self) -> usize {
        self.modulus_len
    }
}

// ---------------------------------------------------------------------------
// Private keys
// ---------------------------------------------------------------------------

/// DER private key material lifted out of PEM.
///
/// Deliberately has no `Debug`, `Clone`, or `Serialize`.
pub(crate) enum PrivateKeyDer {
    /// `RSA PRIVATE KEY` (PKCS#1), what OpenSSL-traditional tooling writes.
    Pkcs1(Vec<u8>),
    /// `PRIVATE KEY` (PKCS#8).
    Pkcs8(Vec<u8>),
}

/// Extract the first private key from `pem`.
///
/// Every failure maps to `SigningUnavailable`; messages never include key
/// bytes.
pub(crate) fn private_key_from_pem(pem: &[u8]) -> Result<PrivateKeyDer> {
    let mut reader: &[u8] = pem;
    loop {
        let item = read_item(&mut reader)
            .map_err(|_| ErasexError::SigningUnavailable("private key PEM is unreadable".to_owned()))?;
        match item {
            Some(Item::Pkcs1Key(key)) => {
                return Ok(PrivateKeyDer::Pkcs1(key.secret_pkcs1_der().to_vec()));
            }
            Some(Item::Pkcs8Key(key)) => {
                return Ok(PrivateKeyDer::Pkcs8(key.secret_pkcs8_der().to_vec()));
            }
            Some(Item::Sec1Key(_)) => {
                return Err(ErasexError::SigningUnavailable(
                    "EC private keys are not supported; an RSA key is required".to_owned(),
                ));
            }
            Some(_) => continue,
            None => {
                return Err(ErasexError::SigningUnavailable(
                    "no private key block found".to_owned(),
                ));
            }
        }
    }
}

fn read_item(reader: &mut dyn BufRead) -> Result<Option<Item>> {
    rustls_pemfile::read_one(reader)
        .map_err(|e| ErasexError::MalformedPublicKey(format!("PEM decoding failed: {e}")))
}

// ---------------------------------------------------------------------------
// DER helpers
// ---------------------------------------------------------------------------

/// Return the `RSAPublicKey` inside an rsaEncryption SubjectPublicKeyInfo.
fn spki_rsa_public_key(spki: &[u8]) -> Option<&[u8]> {
    let (body, trailing) = read_tlv(spki, TAG_SEQUENCE)?;
    if !trailing.is_empty() {
        return None;
    }
    let (algorithm, rest) = read_tlv(body, TAG_SEQUENCE)?;
    let (oid, _parameters) = read_tlv(algorithm, TAG_OID)?;
    if oid != RSA_ENCRYPTION_OID {
        return None;
    }
    let (bits, trailing) = read_tlv(rest, TAG_BIT_STRING)?;
    if !trailing.is_empty() {
        return None;
    }
    // First content byte of a BIT STRING counts unused bits; must be zero.
    match bits.split_first() {
        Some((0, key)) => Some(key),
        _ => None,
    }
}

/// Size of the modulus of an `RSAPublicKey ::= SEQUENCE { n, e }`, as
/// `(bytes, bits)`.
fn rsa_modulus_size(rsa_der: &[u8]) -> Option<(usize, usize)> {
    let (body, trailing) = read_tlv(rsa_der, TAG_SEQUENCE)?;
    if !trailing.is_empty() {
        return None;
    }
    let (modulus, rest) = read_tlv(body, TAG_INTEGER)?;
    let (exponent, trailing) = read_tlv(rest, TAG_INTEGER)?;
    if exponent.is_empty() || !trailing.is_empty() {
        return None;
    }
    // Skip the sign-padding zero of a positive INTEGER.
    let significant = match modulus.split_first() {
        Some((0, tail)) => tail,
        _ => modulus,
    };
    // A second leading zero is not minimal DER.
    let (&leading, _) = significant.split_first()?;
    if leading == 0 {
        return None;
    }
    let bits = significant.len() * 8 - leading.leading_zeros() as usize;
    Some((significant.len(), bits))
}

/// Split one definite-length TLV with the expected `tag` off the front of
/// `input`, returning `(contents, rest)`.
fn read_tlv(input: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    let (&actual, rest) = input.split_first()?;
    if actual != tag {
        return None;
    }
    let (&first, rest) = rest.split_first()?;
    let (len, rest) = if first < 0x80 {
        (first as usize, rest)
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || rest.len() < count {
            return None;
        }
        let (len_bytes, rest) = rest.split_at(count);
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, rest)
    };
    if rest.len() < len {
        return None;
    }
    Some(rest.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATOR_PUBLIC: &[u8] = include_bytes!("../testdata/operator_public.pem");
    const OPERATOR_PRIVATE: &[u8] = include_bytes!("../testdata/operator_private.pem");
    const UNRELATED_PRIVATE: &[u8] = include_bytes!("../testdata/unrelated_private.pem");

    #[test]
    fn parses_spki_public_key() {
        let key = PublicKey::from_pem(OPERATOR_PUBLIC).expect("public key");
        assert_eq!(key.modulus_len(), 256, "2048-bit modulus");
        assert_eq!(key.as_rsa_der()[0], TAG_SEQUENCE);
    }

    #[test]
    fn rejects_garbage_public_key() {
        assert!(matches!(
            PublicKey::from_pem(b"not a key"),
            Err(ErasexError::MalformedPublicKey(_))
        ));
    }

    #[test]
    fn rejects_private_key_where_public_expected() {
        assert!(matches!(
            PublicKey::from_pem(OPERATOR_PRIVATE),
            Err(ErasexError::MalformedPublicKey(_))
        ));
    }

    #[test]
    fn rejects_truncated_rsa_der() {
        let key = PublicKey::from_pem(OPERATOR_PUBLIC).expect("public key");
        let truncated = key.as_rsa_der()[..100].to_vec();
        assert!(PublicKey::from_rsa_der(truncated).is_err());
    }

    #[test]
    fn loads_pkcs1_and_pkcs8_private_keys() {
        assert!(matches!(
            private_key_from_pem(OPERATOR_PRIVATE),
            Ok(PrivateKeyDer::Pkcs1(_))
        ));
        assert!(matches!(
            private_key_from_pem(UNRELATED_PRIVATE),
            Ok(PrivateKeyDer::Pkcs8(_))
        ));
    }

    #[test]
    fn public_pem_is_not_a_private_key() {
        assert!(matches!(
            private_key_from_pem(OPERATOR_PUBLIC),
            Err(ErasexError::SigningUnavailable(_))
        ));
    }

    #[test]
    fn read_tlv_long_form_length() {
        let mut der = vec![TAG_SEQUENCE, 0x82, 0x01, 0x00];
        der.extend(std::iter::repeat_n(0xaa, 256));
        let (body, rest) = read_tlv(&der, TAG_SEQUENCE).expect("tlv");
        assert_eq!(body.len(), 256);
        assert!(rest.is_empty());
        assert!(read_tlv(&der[..100], TAG_SEQUENCE).is_none());
    }

    /// DER TLV with a definite length, long form when needed.
    fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        match body.len() {
            len @ 0..=0x7f => out.push(len as u8),
            len @ 0x80..=0xff => out.extend([0x81, len as u8]),
            len => out.extend([0x82, (len >> 8) as u8, len as u8]),
        }
        out.extend_from_slice(body);
        out
    }

    fn rsa_public_key(modulus: &[u8]) -> Vec<u8> {
        let mut body = tlv(TAG_INTEGER, modulus);
        body.extend(tlv(TAG_INTEGER, &[0x01, 0x00, 0x01]));
        tlv(TAG_SEQUENCE, &body)
    }

    #[test]
    fn modulus_one_bit_short_is_rejected() {
        // 256 bytes, top bit clear: 2047 bits.
        let mut modulus = vec![0x7f];
        modulus.extend(std::iter::repeat_n(0xff, 255));
        match PublicKey::from_rsa_der(rsa_public_key(&modulus)) {
            Err(ErasexError::MalformedPublicKey(msg)) => assert!(msg.contains("2047"), "{msg}"),
            other => panic!("expected MalformedPublicKey, got {other:?}"),
        }

        // Top byte 0x01: 2041 bits.
        modulus[0] = 0x01;
        assert!(matches!(
            PublicKey::from_rsa_der(rsa_public_key(&modulus)),
            Err(ErasexError::MalformedPublicKey(_))
        ));
    }

    #[test]
    fn padded_2048_bit_modulus_is_accepted() {
        let mut modulus = vec![0x00, 0x80];
        modulus.extend(std::iter::repeat_n(0x01, 255));
        let key = PublicKey::from_rsa_der(rsa_public_key(&modulus)).expect("2048-bit modulus");
        assert_eq!(key.modulus_len(), 256);
    }

    #[test]
    fn non_minimal_modulus_is_rejected() {
        let mut modulus = vec![0x00, 0x00, 0x80];
        modulus.extend(std::iter::repeat_n(0x01, 255));
        assert!(PublicKey::from_rsa_der(rsa_public_key(&modulus)).is_err());
    }
}
