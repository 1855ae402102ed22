// src/commands/mod.rs
pub mod init;
mod api;

pub use api::Haven;

pub use init::{InitReport, ensure_initialized, haven_root};
