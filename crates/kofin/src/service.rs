//! Financial statement service over an injected filing source.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use kofin_core::{
    Company, DEFAULT_FACT_LIMIT, DataSource, Fact, Filing, FilingSource, FsDiv, KofinError,
    MetricLabels, Result, StatementKind, StockCode, YearRecord, YearStatements, build_series,
};

/// Number of recent years the dashboard shows by default.
pub const DEFAULT_RECENT_YEARS: usize = 5;

/// A company's metric series for one consolidation mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompanySeries {
    /// The company.
    pub company: Company,
    /// Consolidation mode the filings were read in.
    pub fs_div: FsDiv,
    /// One record per filed year, ascending.
    pub rows: Vec<YearRecord>,
}

/// Result of loading one company in a comparison.
#[derive(Debug)]
pub enum CompanyOutcome {
    /// Series loaded.
    Loaded(CompanySeries),
    /// No company is listed under the code.
    NotFound(StockCode),
    /// Loading failed for another reason.
    Failed {
        /// Requested code.
        stock_code: StockCode,
        /// Underlying error.
        error: KofinError,
    },
}

impl CompanyOutcome {
    /// The stock code this outcome belongs to.
    #[must_use]
    pub fn stock_code(&self) -> &StockCode {
        match self {
            Self::Loaded(series) => &series.company.stock_code,
            Self::NotFound(code) => code,
            Self::Failed { stock_code, .. } => stock_code,
        }
    }

    /// The loaded series, if any.
    #[must_use]
    pub const fn series(&self) -> Option<&CompanySeries> {
        match self {
            Self::Loaded(series) => Some(series),
            _ => None,
        }
    }
}

/// Splits a comma-separated list of stock codes, dropping empty entries.
///
/// ```
/// let codes = kofin::parse_stock_list("005930, 000660,,003550");
/// assert_eq!(codes.len(), 3);
/// assert_eq!(codes[1].as_str(), "000660");
/// ```
#[must_use]
pub fn parse_stock_list(input: &str) -> Vec<StockCode> {
    input
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(StockCode::new)
        .collect()
}

/// Reads companies, filings and facts from a [`FilingSource`] and derives
/// per-year metrics.
///
/// The source is injected; clone the `Arc` to share one client between
/// services.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use kofin::{FinancialsService, FsDiv, StockCode, SupabaseSource};
///
/// let service = FinancialsService::new(Arc::new(SupabaseSource::from_env()?));
/// let series = service
///     .series_by_stock(&StockCode::new("005930"), FsDiv::Consolidated)
///     .await?;
/// for row in &series.rows {
///     println!("{} {:?}", row.year, row.roe);
/// }
/// ```
#[derive(Clone)]
pub struct FinancialsService {
    source: Arc<dyn FilingSource>,
    labels: MetricLabels,
    fact_limit: usize,
}

impl std::fmt::Debug for FinancialsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinancialsService")
            .field("source", &self.source.name())
            .field("labels", &self.labels)
            .field("fact_limit", &self.fact_limit)
            .finish()
    }
}

impl FinancialsService {
    /// Create a service with the default labels and row limit.
    #[must_use]
    pub fn new(source: Arc<dyn FilingSource>) -> Self {
        Self {
            source,
            labels: MetricLabels::default(),
            fact_limit: DEFAULT_FACT_LIMIT,
        }
    }

    /// Replace the account-name candidates.
    #[must_use]
    pub fn with_labels(mut self, labels: MetricLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Set the maximum number of fact rows requested per statement.
    #[must_use]
    pub const fn with_fact_limit(mut self, limit: usize) -> Self {
        self.fact_limit = limit;
        self
    }

    /// The injected source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn FilingSource> {
        &self.source
    }

    /// Look up a company by stock code.
    ///
    /// # Errors
    /// [`KofinError::CompanyNotFound`] if nothing is listed under the code.
    pub async fn company(&self, stock_code: &StockCode) -> Result<Company> {
        self.source
            .company(stock_code)
            .await?
            .ok_or_else(|| KofinError::CompanyNotFound(stock_code.to_string()))
    }

    /// Annual filings, one per year (the first one the source returns), ascending.
    async fn annual_filings(&self, company: &Company, fs_div: FsDiv) -> Result<Vec<Filing>> {
        let mut filings = self.source.filings(&company.corp_code, fs_div).await?;
        filings.sort_by_key(|f| f.bsns_year);
        filings.dedup_by_key(|f| f.bsns_year);
        Ok(filings)
    }

    /// Distinct filed years of a company, ascending.
    ///
    /// # Errors
    /// Propagates source errors.
    pub async fn years_for(&self, company: &Company, fs_div: FsDiv) -> Result<Vec<i32>> {
        let filings = self.annual_filings(company, fs_div).await?;
        Ok(filings.iter().map(|f| f.bsns_year).collect())
    }

    /// Distinct filed years for a stock code, ascending.
    ///
    /// # Errors
    /// [`KofinError::CompanyNotFound`] or source errors.
    pub async fn available_years(&self, stock_code: &StockCode, fs_div: FsDiv) -> Result<Vec<i32>> {
        let company = self.company(stock_code).await?;
        self.years_for(&company, fs_div).await
    }

    /// At most `n` filed years, most recent first.
    ///
    /// # Errors
    /// [`KofinError::CompanyNotFound`] or source errors.
    pub async fn recent_years(
        &self,
        stock_code: &StockCode,
        fs_div: FsDiv,
        n: usize,
    ) -> Result<Vec<i32>> {
        let mut years = self.available_years(stock_code, fs_div).await?;
        years.reverse();
        years.truncate(n);
        Ok(years)
    }

    /// Facts of one statement for one year, in source order.
    ///
    /// # Errors
    /// [`KofinError::FilingNotFound`] if the company has no annual filing that year.
    #[instrument(skip(self, company), fields(corp = %company.corp_code))]
    pub async fn statement(
        &self,
        company: &Company,
        fs_div: FsDiv,
        year: i32,
        statement: StatementKind,
    ) -> Result<Vec<Fact>> {
        let filing = self
            .source
            .filing_for_year(&company.corp_code, fs_div, year)
            .await?
            .ok_or_else(|| KofinError::FilingNotFound {
                corp_code: company.corp_code.to_string(),
                fs_div: fs_div.code().to_string(),
                year,
            })?;
        self.source
            .facts(filing.id, statement, self.fact_limit)
            .await
    }

    /// Income statement and balance sheet of one filing, fetched concurrently.
    async fn year_statements(&self, filing: &Filing) -> Result<YearStatements> {
        let (income, balance) = futures::try_join!(
            self.source
                .facts(filing.id, StatementKind::Income, self.fact_limit),
            self.source
                .facts(filing.id, StatementKind::Balance, self.fact_limit),
        )?;
        debug!(
            year = filing.bsns_year,
            income = income.len(),
            balance = balance.len(),
            "Loaded statements"
        );
        Ok(YearStatements::new(filing.bsns_year, income, balance))
    }

    /// Metric series for a company, optionally limited to the `recent` most
    /// recent years. Rows are ascending.
    ///
    /// Years are fetched one after another. ROE for the first row of a
    /// window uses that year's equity alone.
    ///
    /// # Errors
    /// Propagates source errors.
    #[instrument(skip(self, company), fields(corp = %company.corp_code))]
    pub async fn series_for(
        &self,
        company: &Company,
        fs_div: FsDiv,
        recent: Option<usize>,
    ) -> Result<Vec<YearRecord>> {
        let mut filings = self.annual_filings(company, fs_div).await?;
        if let Some(n) = recent {
            let skip = filings.len().saturating_sub(n);
            filings.drain(..skip);
        }

        let mut years = Vec::with_capacity(filings.len());
        for filing in &filings {
            years.push(self.year_statements(filing).await?);
        }
        Ok(build_series(years, &self.labels))
    }

    /// Full metric series for a stock code.
    ///
    /// # Errors
    /// [`KofinError::CompanyNotFound`] or source errors.
    pub async fn series_by_stock(
        &self,
        stock_code: &StockCode,
        fs_div: FsDiv,
    ) -> Result<CompanySeries> {
        let company = self.company(stock_code).await?;
        let rows = self.series_for(&company, fs_div, None).await?;
        Ok(CompanySeries {
            company,
            fs_div,
            rows,
        })
    }

    /// Metric series for the `n` most recent filed years, ascending.
    ///
    /// # Errors
    /// [`KofinError::CompanyNotFound`] or source errors.
    pub async fn recent_series(
        &self,
        stock_code: &StockCode,
        fs_div: FsDiv,
        n: usize,
    ) -> Result<CompanySeries> {
        let company = self.company(stock_code).await?;
        let rows = self.series_for(&company, fs_div, Some(n)).await?;
        Ok(CompanySeries {
            company,
            fs_div,
            rows,
        })
    }

    /// Load several companies concurrently.
    ///
    /// Outcomes are returned in input order. A failure for one company does
    /// not affect the others.
    pub async fn compare(&self, stock_codes: &[StockCode], fs_div: FsDiv) -> Vec<CompanyOutcome> {
        join_all(
            stock_codes
                .iter()
                .map(|code| self.compare_one(code, fs_div)),
        )
        .await
    }

    async fn compare_one(&self, stock_code: &StockCode, fs_div: FsDiv) -> CompanyOutcome {
        match self.series_by_stock(stock_code, fs_div).await {
            Ok(series) => CompanyOutcome::Loaded(series),
            Err(KofinError::CompanyNotFound(_)) => {
                debug!(stock = %stock_code, "Company not found");
                CompanyOutcome::NotFound(stock_code.clone())
            }
            Err(error) => {
                warn!(stock = %stock_code, error = %error, "Failed to load company");
                CompanyOutcome::Failed {
                    stock_code: stock_code.clone(),
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use crate::fixtures::samsung;
    use kofin_core::CorpCode;
    use kofin_store::InMemorySource;

    fn service(source: InMemorySource) -> FinancialsService {
        FinancialsService::new(Arc::new(source))
    }

    #[derive(Debug)]
    struct BrokenSource;

    impl DataSource for BrokenSource {
        fn name(&self) -> &str {
            "Broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }
    }

    #[async_trait]
    impl FilingSource for BrokenSource {
        async fn company(&self, _stock_code: &StockCode) -> Result<Option<Company>> {
            Err(KofinError::Network("connection reset".to_string()))
        }

        async fn filings(&self, _corp_code: &CorpCode, _fs_div: FsDiv) -> Result<Vec<Filing>> {
            Ok(Vec::new())
        }

        async fn facts(
            &self,
            _filing_id: i64,
            _statement: StatementKind,
            _limit: usize,
        ) -> Result<Vec<Fact>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_series_by_stock_roe() {
        let series = service(samsung())
            .series_by_stock(&StockCode::new("005930"), FsDiv::Consolidated)
            .await
            .unwrap();

        assert_eq!(series.company.name_kr, "삼성전자");
        let years: Vec<i32> = series.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2022, 2023]);
        assert_relative_eq!(series.rows[0].roe.unwrap(), 0.10);
        assert_relative_eq!(series.rows[1].roe.unwrap(), 150.0 / 1100.0);
        assert_relative_eq!(series.rows[2].roe.unwrap(), 200.0 / 1350.0);
    }

    #[tokio::test]
    async fn test_recent_series_window() {
        let series = service(samsung())
            .recent_series(&StockCode::new("005930"), FsDiv::Consolidated, 2)
            .await
            .unwrap();

        let years: Vec<i32> = series.rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2022, 2023]);
        // 2022 has no prior year inside the window.
        assert_relative_eq!(series.rows[0].roe.unwrap(), 150.0 / 1200.0);
    }

    #[tokio::test]
    async fn test_years() {
        let service = service(samsung());
        let stock = StockCode::new("005930");
        assert_eq!(
            service
                .available_years(&stock, FsDiv::Consolidated)
                .await
                .unwrap(),
            vec![2021, 2022, 2023]
        );
        assert_eq!(
            service
                .recent_years(&stock, FsDiv::Consolidated, 2)
                .await
                .unwrap(),
            vec![2023, 2022]
        );
        assert_eq!(
            service
                .available_years(&stock, FsDiv::Separate)
                .await
                .unwrap(),
            vec![2023]
        );
    }

    #[tokio::test]
    async fn test_duplicate_year_keeps_first_filing() {
        let source = samsung().with_annual(
            "00126380",
            FsDiv::Consolidated,
            2023,
            vec![Fact::new("당기순이익", StatementKind::Income, 9999.0)],
        );
        let series = service(source)
            .series_by_stock(&StockCode::new("005930"), FsDiv::Consolidated)
            .await
            .unwrap();
        assert_eq!(series.rows.len(), 3);
        assert_eq!(series.rows[2].net_income, Some(200.0));
    }

    #[tokio::test]
    async fn test_missing_company() {
        let err = service(samsung())
            .series_by_stock(&StockCode::new("999999"), FsDiv::Consolidated)
            .await
            .unwrap_err();
        assert!(matches!(err, KofinError::CompanyNotFound(ref code) if code == "999999"));
    }

    #[tokio::test]
    async fn test_statement_table() {
        let service = service(samsung());
        let company = service.company(&StockCode::new("005930")).await.unwrap();

        let income = service
            .statement(&company, FsDiv::Consolidated, 2022, StatementKind::Income)
            .await
            .unwrap();
        let labels: Vec<&str> = income.iter().map(Fact::label).collect();
        assert_eq!(labels, vec!["매출액", "영업이익", "당기순이익"]);

        let err = service
            .statement(&company, FsDiv::Consolidated, 2010, StatementKind::Income)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, KofinError::FilingNotFound { year: 2010, .. }));
    }

    #[tokio::test]
    async fn test_fact_limit_applies() {
        let service = service(samsung()).with_fact_limit(1);
        let company = service.company(&StockCode::new("005930")).await.unwrap();
        let income = service
            .statement(&company, FsDiv::Consolidated, 2022, StatementKind::Income)
            .await
            .unwrap();
        assert_eq!(income.len(), 1);
    }

    #[tokio::test]
    async fn test_compare_outcomes_in_order() {
        let source = samsung().with_company(Company::new("00164779", "000660", "SK하이닉스"));
        let codes = parse_stock_list("999999, 005930 ,000660");
        let outcomes = service(source)
            .compare(&codes, FsDiv::Consolidated)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            &outcomes[0],
            CompanyOutcome::NotFound(code) if code.as_str() == "999999"
        ));
        assert_eq!(outcomes[1].series().unwrap().rows.len(), 3);
        // Listed but never filed: loads with no rows.
        assert!(outcomes[2].series().unwrap().rows.is_empty());
        let order: Vec<&str> = outcomes.iter().map(|o| o.stock_code().as_str()).collect();
        assert_eq!(order, vec!["999999", "005930", "000660"]);
    }

    #[tokio::test]
    async fn test_compare_reports_failures() {
        let service = FinancialsService::new(Arc::new(BrokenSource));
        let outcomes = service
            .compare(&[StockCode::new("005930")], FsDiv::Consolidated)
            .await;
        assert!(matches!(
            &outcomes[0],
            CompanyOutcome::Failed { error: KofinError::Network(_), .. }
        ));
    }

    #[test]
    fn test_parse_stock_list() {
        let codes = parse_stock_list(" 005930, 000660,,003550 ,");
        let codes: Vec<&str> = codes.iter().map(StockCode::as_str).collect();
        assert_eq!(codes, vec!["005930", "000660", "003550"]);
        assert!(parse_stock_list(" , ").is_empty());
    }
}
