//! Haven-Core: the local persistence layer behind the Haven companion app.
//!
//! - `backend` : raw key/value backends (memory, directory of files, SQLite).
//! - `services`: the versioned store plus the mood, journal and chat ledgers.
//! - `commands`: the `Haven` facade that wires preferences and auto-save together.

pub mod backend;
pub mod commands;
pub mod config;
pub mod error;
pub mod services;
pub mod utils;

pub use commands::Haven;
pub use error::{Result, StoreError};
