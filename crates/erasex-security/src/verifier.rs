// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate verification, done offline.
//
// Everything needed is the record, the signature, and the operator's public
// key. No registry lookup happens here, so a certificate can be checked by a
// third party who only holds the distributed files. Bad input of any kind
// yields `Verdict::Invalid`; nothing in this module returns an error for a
// cryptographic failure.

use std::path::Path;

use erasex_core::error::Result;
use erasex_core::types::{Certificate, Rejection, Signature, Verdict};
use ring::signature::{RSA_PKCS1_2048_8192_SHA256, UnparsedPublicKey};
use tracing::{debug, instrument};

use crate::canonical::canonical_bytes;
use crate::keys::PublicKey;

/// Verify `signature` over `certificate` with a PEM-encoded public key.
///
/// A key that does not parse is reported as `Invalid(MalformedPublicKey)`.
pub fn verify(certificate: &Certificate, signature: &Signature, public_key_pem: &[u8]) -> Verdict {
    match PublicKey::from_pem(public_key_pem) {
        Ok(key) => Verifier::new(key).verify(certificate, signature),
        Err(e) => {
            debug!(error = %e, id = %certificate.id(), "public key rejected");
            Verdict::Invalid(Rejection::MalformedPublicKey)
        }
    }
}

/// A verifier bound to one public key, for checking many certificates.
#[derive(Debug, Clone)]
pub struct Verifier {
    public_key: PublicKey,
}

impl Verifier {
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    /// Load the public key from a PEM file.
    ///
    /// Unlike [`verify`], an unreadable key file here is an error: it is a
    /// deployment problem, not attacker input.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(PublicKey::from_pem_file(path)?))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Check `signature` against the canonical bytes of `certificate`.
    #[instrument(skip_all, fields(id = %certificate.id()))]
    pub fn verify(&self, certificate: &Certificate, signature: &Signature) -> Verdict {
        if signature.len() != self.public_key.modulus_len() {
            debug!(
                signature_len = signature.len(),
                expected = self.public_key.modulus_len(),
                "signature has the wrong length"
            );
            return Verdict::Invalid(Rejection::MalformedSignature);
        }

        let message = canonical_bytes(certificate);
        let key = UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, self.public_key.as_rsa_der());

        match key.verify(&message, signature.as_bytes()) {
            Ok(()) => {
                debug!("signature valid");
                Verdict::Valid
            }
            Err(_) => {
                debug!("signature mismatch");
                Verdict::Invalid(Rejection::SignatureMismatch)
            }
        }
    }
}
