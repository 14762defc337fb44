// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent certificate registry backed by SQLite.
//
// Schema:
//   certificates(
//     id             TEXT    PRIMARY KEY,
//     subject        TEXT    NOT NULL,
//     issued_at      TEXT    NOT NULL,   -- YYYY-MM-DDTHH:MM:SSZ
//     pre_hash       TEXT    NOT NULL,   -- 64 lowercase hex
//     post_hash      TEXT    NOT NULL,   -- 64 lowercase hex
//     signature      BLOB    NOT NULL,   -- raw signature bytes
//     artifact       TEXT,               -- rendered artifact path
//     format_version INTEGER NOT NULL    -- canonical encoding version
//   )
//
// Each `put` is a single INSERT, so an entry is either fully present or
// absent. Rows are rebuilt through the validating builder on the way out.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use erasex_core::error::{ErasexError, Result};
use erasex_core::types::{
    Certificate, CertificateId, Digest, IssuedAt, RegistryEntry, Signature,
};
use erasex_security::canonical::CANONICAL_VERSION;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use crate::registry::Registry;

/// SQLite schema for the certificates table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS certificates (
        id             TEXT    PRIMARY KEY,
        subject        TEXT    NOT NULL,
        issued_at      TEXT    NOT NULL,
        pre_hash       TEXT    NOT NULL,
        post_hash      TEXT    NOT NULL,
        signature      BLOB    NOT NULL,
        artifact       TEXT,
        format_version INTEGER NOT NULL
    )
"#;

/// Convert a `rusqlite::Error` into an `ErasexError::Database`.
fn db_err(context: &str) -> impl FnOnce(rusqlite::Error) -> ErasexError + '_ {
    move |e| ErasexError::Database(format!("{context}: {e}"))
}

/// Registry persisted in a SQLite database.
///
/// `rusqlite::Connection` is `Send` but not `Sync`, so it sits behind a
/// mutex. Every operation is one short statement.
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

/// Column values as stored, before validation.
struct StoredRow {
    id: String,
    subject: String,
    issued_at: String,
    pre_hash: String,
    post_hash: String,
    signature: Vec<u8>,
    artifact: Option<String>,
    format_version: i64,
}

impl SqliteRegistry {
    /// Open (or create) the registry database at `path`.
    ///
    /// WAL mode is enabled so readers in other processes do not block the
    /// writer.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        info!("certificate registry opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        debug!("in-memory certificate registry opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErasexError::Database("registry connection lock poisoned".to_owned()))
    }
}

impl Registry for SqliteRegistry {
    #[instrument(skip_all, fields(id = %entry.id()))]
    fn put(&self, entry: RegistryEntry) -> Result<()> {
        let cert = &entry.certificate;
        let artifact = entry
            .artifact
            .as_deref()
            .map(|path| {
                path.to_str().map(str::to_owned).ok_or_else(|| {
                    ErasexError::Database(format!(
                        "artifact path {} is not valid UTF-8",
                        path.display()
                    ))
                })
            })
            .transpose()?;

        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO certificates
                 (id, subject, issued_at, pre_hash, post_hash, signature, artifact, format_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                cert.id().as_str(),
                cert.subject(),
                cert.issued_at().to_canonical_string(),
                cert.pre_hash().as_str(),
                cert.post_hash().as_str(),
                entry.signature.as_bytes(),
                artifact,
                i64::from(CANONICAL_VERSION),
            ],
        );

        match result {
            Ok(_) => {
                debug!("entry stored");
                Ok(())
            }
            // Only the id key means "already registered"; other constraint
            // failures are storage errors.
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(ErasexError::DuplicateId(cert.id().clone()))
            }
            Err(e) => Err(ErasexError::Database(format!("insert certificate: {e}"))),
        }
    }

    #[instrument(skip_all, fields(id = %id))]
    fn get(&self, id: &CertificateId) -> Result<Option<RegistryEntry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, subject, issued_at, pre_hash, post_hash, signature, artifact,
                        format_version
                 FROM certificates WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(StoredRow {
                        id: row.get(0)?,
                        subject: row.get(1)?,
                        issued_at: row.get(2)?,
                        pre_hash: row.get(3)?,
                        post_hash: row.get(4)?,
                        signature: row.get(5)?,
                        artifact: row.get(6)?,
                        format_version: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(db_err("query certificate"))?;
        drop(conn);

        row.map(row_to_entry).transpose()
    }

    fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM certificates", [], |row| row.get(0))
            .map_err(db_err("count certificates"))?;
        Ok(count as usize)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Rebuild a registry entry from stored columns.
///
/// Runs every field through the same validation as a fresh record, so a
/// row edited outside EraseX surfaces as an error here.
fn row_to_entry(row: StoredRow) -> Result<RegistryEntry> {
    if row.format_version != i64::from(CANONICAL_VERSION) {
        return Err(ErasexError::Database(format!(
            "certificate {} uses unsupported format version {}",
            row.id, row.format_version
        )));
    }

    let certificate = Certificate::builder()
        .id(CertificateId::new(row.id)?)
        .subject(row.subject)
        .issued_at(IssuedAt::parse(&row.issued_at)?)
        .pre_hash(Digest::from_hex(&row.pre_hash)?)
        .post_hash(Digest::from_hex(&row.post_hash)?)
        .build()?;

    Ok(RegistryEntry {
        certificate,
        signature: Signature::from_bytes(row.signature),
        artifact: row.artifact.map(PathBuf::from),
    })
}
