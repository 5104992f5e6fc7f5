#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kofin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Supabase filing source.
//!
//! Reads the hosted `companies`, `filings`, `line_items` and `facts` tables
//! through PostgREST:
//!
//! - Company lookup by stock code
//! - Annual business-report filings (`reprt_code = 11011`) per consolidation mode
//! - Statement facts with their line items embedded via an inner join
//!
//! # Example
//!
//! ```no_run
//! use kofin_core::{FilingSource, StockCode};
//! use kofin_supabase::SupabaseSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SupabaseSource::from_env()?;
//!
//!     if let Some(company) = source.company(&StockCode::new("005930")).await? {
//!         println!("{} ({})", company.name_kr, company.corp_code);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// PostgREST client implementing `FilingSource`.
pub mod client;
/// Connection settings.
pub mod config;
mod rows;

pub use client::SupabaseSource;
pub use config::{DEFAULT_TIMEOUT, SupabaseConfig};
