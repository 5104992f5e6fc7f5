#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kofin/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for Korean financial statement data.
//!
//! This crate provides the foundational abstractions:
//!
//! - [`FilingSource`](source::FilingSource) - Injected handle to the backing store
//! - [`MetricLabels`](labels::MetricLabels) - Account-name candidates per metric
//! - [`build_series`](series::build_series) - Metric extraction and ROE derivation
//! - [`YearRecord`](record::YearRecord) - Derived metrics for one fiscal year

/// Error types for data operations.
pub mod error;
/// Canonical metrics and account-name matching.
pub mod labels;
/// Per-year records and presentation units.
pub mod record;
/// Metric extraction and ROE derivation.
pub mod series;
/// Source traits for reading filings.
pub mod source;
/// Consolidation mode and statement category definitions.
pub mod statement;
/// Core data types (StockCode, Company, Filing, Fact, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{KofinError, Result};
pub use labels::{Metric, MetricLabels, find_fact, label_matches, pick_amount};
pub use record::{ChartPoint, WON_PER_TRILLION, YearRecord, to_percent, to_trillions};
pub use series::{
    YearStatements, apply_roe, average_equity, build_series, extract_year, return_on_equity,
};
pub use source::{DEFAULT_FACT_LIMIT, DataSource, FilingSource};
pub use statement::{ANNUAL_REPORT_CODE, FsDiv, StatementKind};
pub use types::{Company, CorpCode, Fact, Filing, LineItem, StockCode};
