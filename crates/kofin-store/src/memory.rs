//! In-memory filing source.

use async_trait::async_trait;
use kofin_core::{
    ANNUAL_REPORT_CODE, Company, CorpCode, DataSource, Fact, Filing, FilingSource, FsDiv, Result,
    StatementKind, StockCode,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Filing source backed by plain collections.
///
/// Facts keep their insertion order, which is the order extraction sees.
/// Useful for tests, fixtures and offline demos. Built with the `with_*`
/// methods; the `insert_*` methods allow adding data once it is shared.
#[derive(Debug, Default)]
pub struct InMemorySource {
    companies: RwLock<Vec<Company>>,
    filings: RwLock<Vec<Filing>>,
    facts: RwLock<HashMap<i64, Vec<Fact>>>,
    next_filing_id: RwLock<i64>,
}

impl InMemorySource {
    /// Create a new empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a company.
    #[must_use]
    pub fn with_company(mut self, company: Company) -> Self {
        self.companies.get_mut().push(company);
        self
    }

    /// Adds a filing as-is, keeping its id.
    #[must_use]
    pub fn with_filing(mut self, filing: Filing) -> Self {
        let next = self.next_filing_id.get_mut();
        *next = (*next).max(filing.id);
        self.filings.get_mut().push(filing);
        self
    }

    /// Appends facts to a filing.
    #[must_use]
    pub fn with_facts(mut self, filing_id: i64, facts: impl IntoIterator<Item = Fact>) -> Self {
        self.facts
            .get_mut()
            .entry(filing_id)
            .or_default()
            .extend(facts);
        self
    }

    /// Adds an annual filing for `year` together with its facts.
    ///
    /// The filing gets the next free id.
    #[must_use]
    pub fn with_annual(
        mut self,
        corp_code: impl Into<CorpCode>,
        fs_div: FsDiv,
        year: i32,
        facts: impl IntoIterator<Item = Fact>,
    ) -> Self {
        let id = {
            let next = self.next_filing_id.get_mut();
            *next += 1;
            *next
        };
        self.filings.get_mut().push(Filing {
            id,
            corp_code: corp_code.into(),
            bsns_year: year,
            fs_div,
            reprt_code: ANNUAL_REPORT_CODE.to_string(),
        });
        self.with_facts(id, facts)
    }

    /// Adds a company after construction.
    pub async fn insert_company(&self, company: Company) {
        self.companies.write().await.push(company);
    }

    /// Appends facts to a filing after construction.
    pub async fn insert_facts(&self, filing_id: i64, facts: impl IntoIterator<Item = Fact>) {
        self.facts
            .write()
            .await
            .entry(filing_id)
            .or_default()
            .extend(facts);
    }

    /// Removes all data.
    pub async fn clear(&self) {
        self.companies.write().await.clear();
        self.filings.write().await.clear();
        self.facts.write().await.clear();
        *self.next_filing_id.write().await = 0;
        debug!("Cleared in-memory source");
    }
}

impl DataSource for InMemorySource {
    fn name(&self) -> &str {
        "In-memory"
    }

    fn description(&self) -> &str {
        "Filing source backed by in-process collections"
    }
}

#[async_trait]
impl FilingSource for InMemorySource {
    #[instrument(skip(self), fields(stock = %stock_code))]
    async fn company(&self, stock_code: &StockCode) -> Result<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies
            .iter()
            .find(|c| &c.stock_code == stock_code)
            .cloned())
    }

    #[instrument(skip(self), fields(corp = %corp_code, fs_div = %fs_div))]
    async fn filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>> {
        let filings = self.filings.read().await;
        let mut matched: Vec<Filing> = filings
            .iter()
            .filter(|f| {
                &f.corp_code == corp_code
                    && f.fs_div == fs_div
                    && f.reprt_code == ANNUAL_REPORT_CODE
            })
            .cloned()
            .collect();
        matched.sort_by_key(|f| f.bsns_year);
        debug!("Found {} filings", matched.len());
        Ok(matched)
    }

    #[instrument(skip(self))]
    async fn facts(
        &self,
        filing_id: i64,
        statement: StatementKind,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        let facts = self.facts.read().await;
        Ok(facts
            .get(&filing_id)
            .map(|all| {
                all.iter()
                    .filter(|f| f.line_item.sj_div == statement)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
