// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EraseX command-line interface.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use erasex_core::config::{self, AppConfig, CONFIG_FILE};
use erasex_core::error::Result;
use tracing_subscriber::EnvFilter;

/// EraseX: signed certificates of data sanitisation.
///
/// Captures before/after hash evidence, signs it with the operator key, and
/// checks certificates offline with the matching public key.
#[derive(Parser)]
#[command(name = "erasex", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (defaults to erasex.json in the data directory).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign a certificate for a wiped subject and record it.
    Issue(commands::issue::IssueArgs),
    /// Check a certificate and detached signature against a public key.
    Verify(commands::verify::VerifyArgs),
    /// Show a recorded certificate.
    Lookup(commands::lookup::LookupArgs),
    /// Print the SHA-256 evidence digest of a file.
    Hash(commands::hash::HashArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config)?;
    match cli.command {
        Commands::Issue(args) => commands::issue::execute(args, &config),
        Commands::Verify(args) => commands::verify::execute(&args),
        Commands::Lookup(args) => commands::lookup::execute(args, &config),
        Commands::Hash(args) => commands::hash::execute(&args),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let path = match path {
        Some(path) => path,
        None => config::data_dir()?.join(CONFIG_FILE),
    };
    AppConfig::load(&path)
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_tracing(verbose: u8, json_logs: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_verify_with_global_flags() {
        let cli = Cli::try_parse_from([
            "erasex", "-vv", "--json-logs", "verify", "cert.json", "cert.sig", "public.pem",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Verify(_)));
    }

    #[test]
    fn issue_requires_exactly_one_source_per_digest() {
        let both = Cli::try_parse_from([
            "erasex", "issue", "--subject", "Drive D:", "--pre-hash", "aa", "--pre-file", "x",
            "--post-hash", "bb",
        ]);
        assert!(both.is_err());

        let neither = Cli::try_parse_from(["erasex", "issue", "--subject", "Drive D:", "--post-hash", "bb"]);
        assert!(neither.is_err());

        let ok = Cli::try_parse_from([
            "erasex", "issue", "--subject", "Drive D:", "--pre-file", "before.img", "--post-hash", "bb",
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(Some(dir.path().join("absent.json"))).expect("load");
        assert_eq!(config, AppConfig::default());
    }
}
