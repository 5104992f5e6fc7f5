//! Error types for financial statement operations.
//!
//! This module defines [`KofinError`] which covers all error cases that can occur
//! when looking up companies, fetching filings and facts, or reading a local store.
//!
//! Missing metrics and undefined ratios are not errors: they surface as absent
//! fields on [`YearRecord`](crate::record::YearRecord).

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum KofinError {
    /// Network-related errors (connection failures, timeouts, non-success status).
    #[error("Network error: {0}")]
    Network(String),

    /// No company is listed under the requested stock code.
    #[error("Company not found for stock code {0}")]
    CompanyNotFound(String),

    /// The company has no annual filing for the requested year and mode.
    #[error("No {fs_div} filing for {corp_code} in {year}")]
    FilingNotFound {
        /// DART corporation code.
        corp_code: String,
        /// Consolidation mode code (`CFS` or `OFS`).
        fs_div: String,
        /// Requested business year.
        year: i32,
    },

    /// Error parsing data returned by a source.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading from or writing to a local store.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The backend rejected our credentials.
    #[error("Authentication failed for source {0}")]
    AuthenticationFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl KofinError {
    /// Returns true if this error means the requested entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CompanyNotFound(_) | Self::FilingNotFound { .. })
    }
}

/// Result type alias using [`KofinError`].
pub type Result<T> = std::result::Result<T, KofinError>;
