// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `erasex hash` subcommand.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use erasex_core::error::Result;
use erasex_core::types::Digest;
use erasex_security::hash_file;

/// Arguments for `erasex hash`.
#[derive(Args)]
pub struct HashArgs {
    /// File or device image to hash.
    pub file: PathBuf,
}

pub fn execute(args: &HashArgs) -> Result<ExitCode> {
    println!("{}", digest_file(&args.file)?);
    Ok(ExitCode::SUCCESS)
}

/// SHA-256 of the whole file, as evidence digest. Streams, so device
/// images larger than memory are fine.
pub fn digest_file(path: &Path) -> Result<Digest> {
    hash_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_demo_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("before.img");
        std::fs::write(&path, b"DemoSensitiveDataForHashing").expect("write");
        assert_eq!(
            digest_file(&path).expect("hash").as_str(),
            "d64e4261d26543f3fd3caf28edadafaf9a65bea1e3078c4c4e6cb46c4817769a"
        );
    }

    #[test]
    fn large_image_is_hashed_in_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("disk.img");
        let data = vec![0x5au8; 1024 * 1024 + 3];
        std::fs::write(&path, &data).expect("write");
        assert_eq!(
            digest_file(&path).expect("hash"),
            erasex_security::hash_bytes(&data)
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(digest_file(Path::new("/nonexistent/image.bin")).is_err());
    }
}
