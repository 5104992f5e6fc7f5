#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kofin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Local filing sources.
//!
//! This crate provides implementations of the [`FilingSource`] trait from `kofin-core`:
//!
//! - [`SqliteSource`] - SQLite mirror of the hosted tables (default, requires `sqlite` feature)
//! - [`InMemorySource`] - Plain collections for tests and fixtures

/// In-memory filing source.
pub mod memory;

/// SQLite-based filing source.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use kofin_core::FilingSource;

pub use memory::InMemorySource;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSource;
