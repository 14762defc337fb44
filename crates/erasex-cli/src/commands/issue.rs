// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `erasex issue` subcommand.
//
// Signs a certificate for one wiped subject, writes the detached artifact
// pair, and records the entry.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Args};
use erasex_core::config::AppConfig;
use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{Digest, RegistryEntry};
use erasex_registry::{DetachedFileRenderer, Issuer, UuidIdSource};
use erasex_security::CertificateSigner;

use super::hash::digest_file;
use super::open_registry;

/// Arguments for `erasex issue`.
#[derive(Args)]
#[command(group(ArgGroup::new("pre").required(true).args(["pre_hash", "pre_file"])))]
#[command(group(ArgGroup::new("post").required(true).args(["post_hash", "post_file"])))]
pub struct IssueArgs {
    /// Device or volume the certificate is about (e.g. "Drive D:").
    #[arg(long)]
    pub subject: String,

    /// SHA-256 of the data before wiping, as 64 lowercase hex digits.
    #[arg(long, value_name = "HEX")]
    pub pre_hash: Option<String>,

    /// Image of the data before wiping; hashed locally.
    #[arg(long, value_name = "PATH")]
    pub pre_file: Option<PathBuf>,

    /// SHA-256 of the data after wiping.
    #[arg(long, value_name = "HEX")]
    pub post_hash: Option<String>,

    /// Image of the data after wiping; hashed locally.
    #[arg(long, value_name = "PATH")]
    pub post_file: Option<PathBuf>,

    /// Operator private key (PEM). Overrides the configured key.
    #[arg(long, value_name = "PATH")]
    pub private_key: Option<PathBuf>,

    /// SQLite registry file. Overrides the configured registry.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Directory for the certificate artifacts.
    #[arg(long, value_name = "PATH")]
    pub cert_dir: Option<PathBuf>,
}

pub fn execute(args: IssueArgs, config: &AppConfig) -> Result<ExitCode> {
    let entry = run(args, config)?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(ExitCode::SUCCESS)
}

pub fn run(args: IssueArgs, config: &AppConfig) -> Result<RegistryEntry> {
    let pre_hash = resolve_digest(args.pre_hash.as_deref(), args.pre_file)?;
    let post_hash = resolve_digest(args.post_hash.as_deref(), args.post_file)?;

    let key_path = args
        .private_key
        .or_else(|| config.private_key_path.clone())
        .ok_or_else(|| {
            ErasexError::SigningUnavailable(
                "no private key configured; pass --private-key".to_owned(),
            )
        })?;
    let signer = CertificateSigner::from_pem_file(&key_path)?;

    let registry = open_registry(args.registry, config)?;
    let cert_dir = args.cert_dir.unwrap_or_else(|| config.certificate_dir.clone());

    let issuer = Issuer::new(signer, registry)
        .with_id_source(UuidIdSource::new(config.id_style))
        .with_renderer(DetachedFileRenderer::new(cert_dir)?);

    issuer.issue(&args.subject, pre_hash, post_hash)
}

/// Exactly one of `hex` and `file` is set; clap's arg groups ensure it.
fn resolve_digest(hex: Option<&str>, file: Option<PathBuf>) -> Result<Digest> {
    match (hex, file) {
        (Some(hex), _) => Digest::from_hex(hex),
        (None, Some(path)) => digest_file(&path),
        (None, None) => Err(ErasexError::IncompleteRecord { field: "digest" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erasex_registry::{Registry, SqliteRegistry, read_detached};

    const OPERATOR_PRIVATE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../erasex-security/testdata/operator_private.pem"
    );
    const OPERATOR_PUBLIC: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../erasex-security/testdata/operator_public.pem"
    );
    const ZERO_DIGEST: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn args(dir: &std::path::Path) -> IssueArgs {
        IssueArgs {
            subject: "Drive D:".to_owned(),
            pre_hash: None,
            pre_file: None,
            post_hash: Some(ZERO_DIGEST.to_owned()),
            post_file: None,
            private_key: Some(PathBuf::from(OPERATOR_PRIVATE)),
            registry: Some(dir.join("registry.db")),
            cert_dir: Some(dir.join("certificates")),
        }
    }

    #[test]
    fn issue_from_file_records_and_renders() {
        let dir = tempfile::tempdir().expect("tempdir");
        let before = dir.path().join("before.img");
        std::fs::write(&before, b"DemoSensitiveDataForHashing").expect("write");

        let mut args = args(dir.path());
        args.pre_file = Some(before);
        let entry = run(args, &AppConfig::default()).expect("issue");

        assert_eq!(entry.id().as_str().len(), 8);
        assert_eq!(
            entry.certificate.pre_hash().as_str(),
            "d64e4261d26543f3fd3caf28edadafaf9a65bea1e3078c4c4e6cb46c4817769a"
        );

        let registry = SqliteRegistry::open(dir.path().join("registry.db")).expect("open");
        assert_eq!(registry.get(entry.id()).expect("get"), Some(entry.clone()));

        let json_path = entry.artifact.clone().expect("artifact");
        let sig_path = json_path.with_extension("sig");
        let (certificate, signature) = read_detached(&json_path, &sig_path).expect("read back");
        let public = std::fs::read(OPERATOR_PUBLIC).expect("public key");
        assert!(erasex_security::verify(&certificate, &signature, &public).is_valid());
    }

    #[test]
    fn missing_private_key_is_signing_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut args = args(dir.path());
        args.pre_hash = Some(ZERO_DIGEST.to_owned());
        args.private_key = None;
        assert!(matches!(
            run(args, &AppConfig::default()),
            Err(ErasexError::SigningUnavailable(_))
        ));
    }

    #[test]
    fn malformed_digest_is_rejected_before_signing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut args = args(dir.path());
        args.pre_hash = Some("ABC".to_owned());
        assert!(matches!(
            run(args, &AppConfig::default()),
            Err(ErasexError::MalformedDigest { .. })
        ));
        assert!(!dir.path().join("certificates").exists());
    }
}
