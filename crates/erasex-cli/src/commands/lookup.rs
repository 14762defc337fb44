// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `erasex lookup` subcommand.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use erasex_core::config::AppConfig;
use erasex_core::error::Result;
use erasex_core::types::{CertificateId, RegistryEntry, Verdict};
use erasex_registry::Registry;
use erasex_security::Verifier;
use serde::Serialize;

use super::open_existing_registry;

/// Arguments for `erasex lookup`.
#[derive(Args)]
pub struct LookupArgs {
    /// Certificate id.
    pub id: String,

    /// SQLite registry file. Overrides the configured registry.
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Also verify the stored entry against this public key (PEM).
    #[arg(long, value_name = "PATH")]
    pub public_key: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct LookupReport {
    #[serde(flatten)]
    pub entry: RegistryEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

pub fn execute(args: LookupArgs, config: &AppConfig) -> Result<ExitCode> {
    let id = args.id.clone();
    match run(args, config)? {
        Some(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("certificate {id} not found");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn run(args: LookupArgs, config: &AppConfig) -> Result<Option<LookupReport>> {
    let id = CertificateId::new(args.id)?;
    let registry = open_existing_registry(args.registry, config)?;

    let Some(entry) = registry.get(&id)? else {
        return Ok(None);
    };

    let verdict = match args.public_key.or_else(|| config.public_key_path.clone()) {
        Some(path) => {
            let verifier = Verifier::from_pem_file(path)?;
            Some(verifier.verify(&entry.certificate, &entry.signature))
        }
        None => None,
    };

    Ok(Some(LookupReport { entry, verdict }))
}
