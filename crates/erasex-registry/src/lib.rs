// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EraseX registry: storage backends, artifact rendering and the issuance
// service.

pub mod artifact;
pub mod issuer;
pub mod memory;
pub mod registry;
pub mod sqlite;

pub use artifact::{ArtifactRenderer, DetachedFileRenderer, read_detached};
pub use issuer::{Clock, FixedClock, IdSource, Issuer, SystemClock, UuidIdSource};
pub use memory::MemoryRegistry;
pub use registry::Registry;
pub use sqlite::SqliteRegistry;
