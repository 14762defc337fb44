// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output artifacts handed to the data owner.
//
// The detached renderer writes the record as pretty JSON next to a raw
// signature file. A third party checks the pair offline with the operator's
// public key; no registry access is needed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{Certificate, CertificateId, Signature};
use tracing::{debug, instrument, warn};

/// Produces the file a certificate is delivered as.
pub trait ArtifactRenderer: Send + Sync {
    /// Write the artifact for a signed certificate and return its path.
    fn render(&self, certificate: &Certificate, signature: &Signature) -> Result<PathBuf>;

    /// Remove an artifact produced by `render` whose registration failed.
    fn discard(&self, artifact: &Path) -> Result<()>;
}

/// Writes `erasex_cert_<id>.json` and `erasex_cert_<id>.sig` into one
/// directory.
#[derive(Debug, Clone)]
pub struct DetachedFileRenderer {
    dir: PathBuf,
}

impl DetachedFileRenderer {
    /// Use `dir` for artifacts, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON record for `id`.
    pub fn json_path(&self, id: &CertificateId) -> PathBuf {
        self.dir.join(format!("erasex_cert_{id}.json"))
    }

    /// Path of the detached signature for `id`.
    pub fn sig_path(&self, id: &CertificateId) -> PathBuf {
        self.dir.join(format!("erasex_cert_{id}.sig"))
    }
}

impl ArtifactRenderer for DetachedFileRenderer {
    #[instrument(skip_all, fields(id = %certificate.id()))]
    fn render(&self, certificate: &Certificate, signature: &Signature) -> Result<PathBuf> {
        let id = certificate.id();
        check_file_safe(id)?;

        let json_path = self.json_path(id);
        let sig_path = self.sig_path(id);
        let json = serde_json::to_vec_pretty(certificate)?;

        write_new(&json_path, &json)?;
        if let Err(e) = write_new(&sig_path, signature.as_bytes()) {
            if let Err(cleanup) = fs::remove_file(&json_path) {
                warn!(path = %json_path.display(), error = %cleanup, "could not remove partial artifact");
            }
            return Err(e);
        }

        debug!(path = %json_path.display(), "artifact written");
        Ok(json_path)
    }

    #[instrument(skip_all, fields(path = %artifact.display()))]
    fn discard(&self, artifact: &Path) -> Result<()> {
        fs::remove_file(artifact)?;
        let sig = artifact.with_extension("sig");
        match fs::remove_file(&sig) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!("artifact discarded");
        Ok(())
    }
}

/// Load a detached certificate pair written by [`DetachedFileRenderer`] or
/// by any tool producing the same JSON layout.
pub fn read_detached(
    json_path: impl AsRef<Path>,
    sig_path: impl AsRef<Path>,
) -> Result<(Certificate, Signature)> {
    let json = fs::read_to_string(json_path.as_ref())?;
    let certificate = Certificate::from_json(&json)?;
    let signature = Signature::from_bytes(fs::read(sig_path.as_ref())?);
    Ok((certificate, signature))
}

/// Ids become file names; anything beyond `[A-Za-z0-9_-]` could escape the
/// artifact directory.
fn check_file_safe(id: &CertificateId) -> Result<()> {
    let safe = id
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if safe {
        Ok(())
    } else {
        Err(ErasexError::Artifact(format!(
            "certificate id {id:?} cannot be used as a file name"
        )))
    }
}

/// Write `bytes` to a file that must not exist yet.
fn write_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| ErasexError::Artifact(format!("cannot create {}: {e}", path.display())))?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
