//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `artifacts`: fitted artifacts on disk, with sha256 manifest and Ed25519 signature
//! - `fitted`: label encoders and the standard scaler
//! - `linear`: the exported softmax linear classifier
//! - `sqlite`: SQLite report store
//! - `sanitize`: identity filtering for logs

pub mod artifacts;
pub mod fitted;
pub mod linear;
pub mod sanitize;
pub mod sqlite;

pub use artifacts::FsArtifactSource;
// Re-export storage error for lib.rs
pub use sqlite::{SqliteReportStore, StorageError};
