// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EraseX core: certificate types, errors and configuration shared by every
// crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, IdStyle};
pub use error::{ErasexError, Result};
pub use types::*;
