//! Per-project developer session log.
//!
//! `start`/`stop` events go to an append-only JSON Lines file in the global
//! directory; the active session for a project is recovered by replaying it.
//! Settings live in a global and a per-project JSON document.

pub mod commands;
pub mod duration;
pub mod error;
pub mod fs_ops;
pub mod ledger;
pub mod models;
pub mod paths;
pub mod settings;

pub use commands::Commands;
pub use error::{DevlogError, Result};
pub use fs_ops::{FileOps, MemoryFs, RealFs};
pub use models::{EntryKind, LogEntry, SessionState};
pub use paths::Paths;
