//! PostgREST-backed [`FilingSource`].

use crate::config::SupabaseConfig;
use crate::rows::{CompanyRow, FactRow, FilingRow};
use async_trait::async_trait;
use kofin_core::{
    ANNUAL_REPORT_CODE, Company, CorpCode, DataSource, Fact, Filing, FilingSource, FsDiv,
    KofinError, Result, StatementKind, StockCode,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

type Query = Vec<(&'static str, String)>;

/// Filing source reading the hosted `companies`, `filings` and `facts` tables.
///
/// Built once and shared as an `Arc<dyn FilingSource>`; the underlying
/// `reqwest::Client` pools connections across requests.
#[derive(Debug, Clone)]
pub struct SupabaseSource {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseSource {
    /// Create a source with its own HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| KofinError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a source from `SUPABASE_URL` / `SUPABASE_ANON_KEY`.
    ///
    /// # Errors
    /// Returns an error if configuration is missing or the client cannot be built.
    pub fn from_env() -> Result<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    /// Create a source with a pre-configured HTTP client.
    ///
    /// The client's own timeout applies; `config.timeout` is ignored.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, config: SupabaseConfig) -> Self {
        Self { client, config }
    }

    /// Connection settings in use.
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// GET a table with PostgREST query parameters and decode the row array.
    async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> Result<Vec<T>> {
        let url = self.config.table_url(table);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .query(query)
            .send()
            .await
            .map_err(|e| KofinError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(KofinError::AuthenticationFailed(format!(
                "Supabase ({table}): HTTP {status}"
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KofinError::Network(format!(
                "Failed to query {table}: HTTP {status}: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KofinError::Parse(format!("Failed to parse {table} rows: {e}")))
    }
}

fn company_query(stock_code: &StockCode) -> Query {
    vec![
        ("select", "corp_code,stock_code,name_kr".to_string()),
        ("stock_code", format!("eq.{stock_code}")),
        ("limit", "1".to_string()),
    ]
}

fn filings_query(corp_code: &CorpCode, fs_div: FsDiv) -> Query {
    vec![
        ("select", "id,corp_code,bsns_year,fs_div,reprt_code".to_string()),
        ("corp_code", format!("eq.{corp_code}")),
        ("fs_div", format!("eq.{}", fs_div.code())),
        ("reprt_code", format!("eq.{ANNUAL_REPORT_CODE}")),
        ("order", "bsns_year.asc,id.asc".to_string()),
    ]
}

fn facts_query(filing_id: i64, statement: StatementKind, limit: usize) -> Query {
    vec![
        (
            "select",
            "thstrm_amount,line_items!inner(account_nm,sj_div)".to_string(),
        ),
        ("filing_id", format!("eq.{filing_id}")),
        ("line_items.sj_div", format!("eq.{}", statement.code())),
        ("order", "id.asc".to_string()),
        ("limit", limit.to_string()),
    ]
}

impl DataSource for SupabaseSource {
    fn name(&self) -> &str {
        "Supabase"
    }

    fn description(&self) -> &str {
        "Hosted PostgREST tables of DART companies, filings and statement facts"
    }
}

#[async_trait]
impl FilingSource for SupabaseSource {
    #[instrument(skip(self), fields(stock = %stock_code))]
    async fn company(&self, stock_code: &StockCode) -> Result<Option<Company>> {
        let rows: Vec<CompanyRow> = self.select("companies", &company_query(stock_code)).await?;
        Ok(rows.into_iter().next().map(Company::from))
    }

    #[instrument(skip(self), fields(corp = %corp_code, fs_div = %fs_div))]
    async fn filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>> {
        let rows: Vec<FilingRow> = self
            .select("filings", &filings_query(corp_code, fs_div))
            .await?;
        let filings = rows
            .into_iter()
            .map(Filing::try_from)
            .collect::<Result<Vec<_>>>()?;
        debug!("Found {} filings", filings.len());
        Ok(filings)
    }

    #[instrument(skip(self))]
    async fn facts(
        &self,
        filing_id: i64,
        statement: StatementKind,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        let rows: Vec<FactRow> = self
            .select("facts", &facts_query(filing_id, statement, limit))
            .await?;
        let total = rows.len();
        let facts: Vec<Fact> = rows
            .into_iter()
            .filter_map(|row| row.into_fact(statement))
            .collect();
        if facts.len() < total {
            warn!(
                "Dropped {} fact rows outside {} for filing {}",
                total - facts.len(),
                statement,
                filing_id
            );
        }
        if total == limit {
            debug!("Fact query for filing {} hit the row limit {}", filing_id, limit);
        }
        Ok(facts)
    }
}
