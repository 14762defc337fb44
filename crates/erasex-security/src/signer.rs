// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate signing: RSASSA-PKCS1-v1_5 with SHA-256 over the canonical
// encoding.
//
// The operator key is loaded once and held for the life of the signer. It is
// never logged, returned, or written anywhere: `Debug` shows only the modulus
// size, and the only thing that leaves this module is the public half.

use std::fmt;
use std::path::Path;

use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{Certificate, Signature};
use ring::rand::SystemRandom;
use ring::signature::{KeyPair, RSA_PKCS1_SHA256, RsaKeyPair};
use tracing::{debug, instrument};

use crate::canonical::canonical_bytes;
use crate::keys::{PrivateKeyDer, PublicKey, private_key_from_pem};

/// Holds the operator's private key and signs certificates with it.
pub struct CertificateSigner {
    key_pair: RsaKeyPair,
    public_key: PublicKey,
    rng: SystemRandom,
}

impl CertificateSigner {
    /// Load an RSA private key from PEM (PKCS#1 `RSA PRIVATE KEY` or PKCS#8
    /// `PRIVATE KEY`).
    ///
    /// Fails with `SigningUnavailable` for anything that is not an RSA key of
    /// at least 2048 bits.
    #[instrument(skip_all)]
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let key_pair = match private_key_from_pem(pem)? {
            PrivateKeyDer::Pkcs1(der) => RsaKeyPair::from_der(&der),
            PrivateKeyDer::Pkcs8(der) => RsaKeyPair::from_pkcs8(&der),
        }
        .map_err(|e| ErasexError::SigningUnavailable(format!("RSA key rejected: {e}")))?;

        let public_key = PublicKey::from_rsa_der(key_pair.public_key().as_ref().to_vec())
            .map_err(|e| ErasexError::SigningUnavailable(format!("unusable public half: {e}")))?;

        debug!(
            modulus_bits = public_key.modulus_len() * 8,
            "signing key loaded"
        );

        Ok(Self {
            key_pair,
            public_key,
            rng: SystemRandom::new(),
        })
    }

    /// Read and load a PEM private key file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let pem = std::fs::read(path.as_ref()).map_err(|e| {
            ErasexError::SigningUnavailable(format!(
                "cannot read private key {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_pem(&pem)
    }

    /// Sign the canonical encoding of `certificate`.
    ///
    /// The id is part of the canonical bytes, so the signature cannot be
    /// re-attached to a different identifier. Nothing is stored; the caller
    /// decides where the signature goes.
    #[instrument(skip_all, fields(id = %certificate.id()))]
    pub fn issue(&self, certificate: &Certificate) -> Result<Signature> {
        let message = canonical_bytes(certificate);
        let mut signature = vec![0u8; self.public_key.modulus_len()];

        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &self.rng, &message, &mut signature)
            .map_err(|_| ErasexError::SigningUnavailable("RSA signing failed".to_owned()))?;

        debug!(
            canonical_len = message.len(),
            signature_len = signature.len(),
            "certificate signed"
        );
        Ok(Signature::from_bytes(signature))
    }

    /// The public half, for handing to verifiers.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl fmt::Debug for CertificateSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateSigner")
            .field("modulus_bits", &(self.public_key.modulus_len() * 8))
            .finish_non_exhaustive()
    }
}
