// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Issuance service. Ties evidence, signing, rendering and the registry
// together.
//
// Order of operations for one certificate:
//
//   id (IdSource) → time (Clock) → build → sign → render → Registry::put
//
// An id already in the registry is refused before anything is signed or
// written. Nothing is stored unless signing and rendering succeed. When
// `put` still fails (another writer won the id in between) the rendered
// artifact is removed again, so a failed issuance leaves no files behind.

use std::sync::Arc;

use erasex_core::config::IdStyle;
use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{
    Certificate, CertificateId, Digest, IssuedAt, RegistryEntry, Verdict,
};
use erasex_security::{CertificateSigner, HashEvidence, PublicKey, Verifier, fingerprint};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::artifact::ArtifactRenderer;
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// Ids and time
// ---------------------------------------------------------------------------

/// Supplies identifiers for new certificates.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> Result<CertificateId>;
}

/// Random ids from UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource {
    style: IdStyle,
}

impl UuidIdSource {
    pub fn new(style: IdStyle) -> Self {
        Self { style }
    }
}

impl IdSource for UuidIdSource {
    fn next_id(&self) -> Result<CertificateId> {
        let uuid = Uuid::new_v4().to_string();
        let id = match self.style {
            // The first group of a hyphenated UUID is 8 hex digits.
            IdStyle::Short => uuid.chars().take(8).collect(),
            IdStyle::Uuid => uuid,
        };
        CertificateId::new(id)
    }
}

/// Supplies issuance timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> IssuedAt;
}

/// Wall-clock time, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> IssuedAt {
        IssuedAt::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub IssuedAt);

impl Clock for FixedClock {
    fn now(&self) -> IssuedAt {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Issuer
// ---------------------------------------------------------------------------

/// Issues signed certificates and records them.
///
/// Safe to share across threads; all state is behind the registry.
pub struct Issuer {
    signer: CertificateSigner,
    verifier: Verifier,
    registry: Arc<dyn Registry>,
    ids: Box<dyn IdSource>,
    clock: Box<dyn Clock>,
    renderer: Option<Box<dyn ArtifactRenderer>>,
}

impl Issuer {
    /// Issuer with short random ids, system time, and no artifact output.
    pub fn new(signer: CertificateSigner, registry: Arc<dyn Registry>) -> Self {
        let verifier = Verifier::new(signer.public_key().clone());
        Self {
            signer,
            verifier,
            registry,
            ids: Box::new(UuidIdSource::default()),
            clock: Box::new(SystemClock),
            renderer: None,
        }
    }

    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_renderer(mut self, renderer: impl ArtifactRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Issue a certificate for already computed digests.
    #[instrument(skip_all, fields(subject = %subject))]
    pub fn issue(&self, subject: &str, pre_hash: Digest, post_hash: Digest) -> Result<RegistryEntry> {
        let certificate = Certificate::builder()
            .id(self.ids.next_id()?)
            .subject(subject)
            .issued_at(self.clock.now())
            .pre_hash(pre_hash)
            .post_hash(post_hash)
            .build()?;

        // An id that is already registered must surface as `DuplicateId`,
        // not as a clash with the artifact files it left behind.
        if self.registry.get(certificate.id())?.is_some() {
            return Err(ErasexError::DuplicateId(certificate.id().clone()));
        }

        let signature = self.signer.issue(&certificate)?;

        let artifact = match &self.renderer {
            Some(renderer) => Some(renderer.render(&certificate, &signature)?),
            None => None,
        };

        let entry = RegistryEntry {
            certificate,
            signature,
            artifact,
        };

        if let Err(e) = self.registry.put(entry.clone()) {
            if let (Some(renderer), Some(path)) = (&self.renderer, &entry.artifact) {
                if let Err(cleanup) = renderer.discard(path) {
                    warn!(path = %path.display(), error = %cleanup, "could not discard artifact");
                }
            }
            return Err(e);
        }

        info!(
            id = %entry.id(),
            fingerprint = %fingerprint(&entry.certificate),
            "certificate issued"
        );
        Ok(entry)
    }

    /// Issue from hex digests supplied by an external hashing step.
    pub fn issue_from_digests(
        &self,
        subject: &str,
        pre_hash: &str,
        post_hash: &str,
    ) -> Result<RegistryEntry> {
        let evidence = HashEvidence::from_digests(pre_hash, post_hash)?;
        self.issue(subject, evidence.pre_hash, evidence.post_hash)
    }

    /// Hash the before and after images, then issue.
    pub fn issue_from_evidence(&self, subject: &str, pre: &[u8], post: &[u8]) -> Result<RegistryEntry> {
        let evidence = HashEvidence::capture(pre, post);
        self.issue(subject, evidence.pre_hash, evidence.post_hash)
    }

    pub fn lookup(&self, id: &CertificateId) -> Result<Option<RegistryEntry>> {
        self.registry.get(id)
    }

    /// Check a stored entry against this issuer's public key.
    ///
    /// `Ok(None)` when the id is unknown.
    pub fn verify_stored(&self, id: &CertificateId) -> Result<Option<Verdict>> {
        Ok(self
            .registry
            .get(id)?
            .map(|entry| self.verifier.verify(&entry.certificate, &entry.signature)))
    }

    /// The key third parties verify against.
    pub fn public_key(&self) -> &PublicKey {
        self.signer.public_key()
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }
}
