// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `erasex verify` subcommand.
//
// Offline check of a certificate file and detached signature against the
// operator's public key. The registry is never consulted.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{CertificateId, Verdict};
use erasex_registry::read_detached;
use serde::Serialize;

/// Arguments for `erasex verify`.
#[derive(Args)]
pub struct VerifyArgs {
    /// Certificate record (JSON).
    pub certificate: PathBuf,

    /// Detached signature (raw bytes).
    pub signature: PathBuf,

    /// Operator public key (PEM).
    pub public_key: PathBuf,

    /// Output the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// What `verify` found.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CertificateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    pub message: String,
}

pub fn execute(args: &VerifyArgs) -> Result<ExitCode> {
    let report = run(args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.passed {
        println!("[PASS] {}", report.message);
    } else {
        println!("[FAIL] {}", report.message);
    }

    Ok(if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Missing files are errors; files that exist but do not hold a valid
/// certificate are a failed verification.
pub fn run(args: &VerifyArgs) -> Result<VerifyReport> {
    let public_key = std::fs::read(&args.public_key)?;

    let (certificate, signature) = match read_detached(&args.certificate, &args.signature) {
        Ok(pair) => pair,
        Err(ErasexError::Io(e)) => return Err(ErasexError::Io(e)),
        Err(e) => {
            return Ok(VerifyReport {
                passed: false,
                id: None,
                verdict: None,
                message: format!("certificate rejected: {e}"),
            });
        }
    };

    let verdict = erasex_security::verify(&certificate, &signature, &public_key);
    let message = match verdict {
        Verdict::Valid => format!("certificate {} is authentic", certificate.id()),
        Verdict::Invalid(reason) => format!("certificate {}: {reason}", certificate.id()),
    };

    Ok(VerifyReport {
        passed: verdict.is_valid(),
        id: Some(certificate.id().clone()),
        verdict: Some(verdict),
        message,
    })
}
