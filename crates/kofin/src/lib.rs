#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kofin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Korean financial statement metrics.
//!
//! This crate re-exports the core types and filing sources, and provides a
//! [`FinancialsService`] that turns annual DART filings into revenue,
//! operating income, net income, equity and ROE per year, a [`Dashboard`]
//! view-model, and polars frames for charting.
//!
//! # Features
//!
//! - `supabase` - Hosted PostgREST source
//! - `sqlite` - Local SQLite source
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kofin::{FinancialsService, FsDiv, StockCode, SupabaseSource, chart_frame};
//!
//! #[tokio::main]
//! async fn main() -> kofin::Result<()> {
//!     let service = FinancialsService::new(Arc::new(SupabaseSource::from_env()?));
//!
//!     let series = service
//!         .recent_series(&StockCode::new("005930"), FsDiv::Consolidated, 5)
//!         .await?;
//!     println!("{}", chart_frame(&series.rows)?);
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use kofin_core::*;

// Sources
pub use kofin_store::InMemorySource;
#[cfg(feature = "sqlite")]
pub use kofin_store::SqliteSource;
#[cfg(feature = "supabase")]
pub use kofin_supabase::{SupabaseConfig, SupabaseSource};

mod dashboard;
mod frame;
mod service;

#[cfg(test)]
mod fixtures;

pub use dashboard::{Dashboard, LatestRequest, LoadOutcome, Selection, ViewState};
pub use frame::{chart_frame, comparison_frame, points_frame};
pub use service::{
    CompanyOutcome, CompanySeries, DEFAULT_RECENT_YEARS, FinancialsService, parse_stock_list,
};
