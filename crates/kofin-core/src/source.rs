//! Source traits for reading filings.
//!
//! This module defines the traits a backend implements:
//!
//! - [`DataSource`] - Base trait with descriptive metadata
//! - [`FilingSource`] - Company lookup, annual filings and statement facts
//!
//! A source is constructed once at startup and passed to callers as an
//! `Arc<dyn FilingSource>`; nothing reaches for a global client.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    statement::{FsDiv, StatementKind},
    types::{Company, CorpCode, Fact, Filing, StockCode},
};

/// Default maximum number of fact rows requested per statement.
pub const DEFAULT_FACT_LIMIT: usize = 1500;

/// Base trait for all filing sources.
pub trait DataSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "Supabase").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;
}

/// Read-only access to companies, annual filings and their facts.
///
/// Implementations filter by equality only and must return facts in the
/// backend's own order, since metric extraction is first-match-wins.
#[async_trait]
pub trait FilingSource: DataSource {
    /// Looks up a company by its listing code.
    ///
    /// Returns `Ok(None)` when no company is listed under the code.
    async fn company(&self, stock_code: &StockCode) -> Result<Option<Company>>;

    /// Fetches the annual business-report filings of a company for one
    /// consolidation mode, ordered by ascending business year.
    async fn filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>>;

    /// Fetches the facts of one statement within a filing.
    ///
    /// # Arguments
    ///
    /// * `filing_id` - Backend id of the filing
    /// * `statement` - Statement category to restrict to
    /// * `limit` - Maximum number of rows to return
    async fn facts(
        &self,
        filing_id: i64,
        statement: StatementKind,
        limit: usize,
    ) -> Result<Vec<Fact>>;

    /// Finds the annual filing for one business year.
    ///
    /// Default implementation scans [`filings`](Self::filings) and returns the
    /// first filing of that year.
    async fn filing_for_year(
        &self,
        corp_code: &CorpCode,
        fs_div: FsDiv,
        year: i32,
    ) -> Result<Option<Filing>> {
        let filings = self.filings(corp_code, fs_div).await?;
        Ok(filings.into_iter().find(|f| f.bsns_year == year))
    }
}
