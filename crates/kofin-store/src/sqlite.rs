//! SQLite-backed filing source.

use async_trait::async_trait;
use kofin_core::{
    ANNUAL_REPORT_CODE, Company, CorpCode, DataSource, Fact, Filing, FilingSource, FsDiv,
    KofinError, LineItem, Result, StatementKind, StockCode,
};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Filing source reading a local SQLite mirror of the hosted tables.
///
/// The schema mirrors the backend: `companies`, `filings`, `line_items` and
/// `facts`. Facts are returned in insertion (rowid) order.
#[derive(Debug)]
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

fn store_err(e: impl std::fmt::Display) -> KofinError {
    KofinError::Store(e.to_string())
}

fn write_filing(
    conn: &Connection,
    corp_code: &CorpCode,
    fs_div: FsDiv,
    bsns_year: i32,
    reprt_code: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO filings (corp_code, bsns_year, fs_div, reprt_code)
         VALUES (?1, ?2, ?3, ?4)",
        params![corp_code.as_str(), bsns_year, fs_div.code(), reprt_code],
    )
    .map_err(store_err)?;
    Ok(conn.last_insert_rowid())
}

fn write_facts(tx: &Transaction<'_>, filing_id: i64, facts: &[Fact]) -> Result<()> {
    for fact in facts {
        tx.execute(
            "INSERT OR IGNORE INTO line_items (account_nm, sj_div) VALUES (?1, ?2)",
            params![fact.line_item.account_nm, fact.line_item.sj_div.code()],
        )
        .map_err(store_err)?;
        let line_item_id: i64 = tx
            .query_row(
                "SELECT id FROM line_items WHERE account_nm = ?1 AND sj_div = ?2",
                params![fact.line_item.account_nm, fact.line_item.sj_div.code()],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        tx.execute(
            "INSERT INTO facts (filing_id, line_item_id, thstrm_amount) VALUES (?1, ?2, ?3)",
            params![filing_id, line_item_id, fact.amount],
        )
        .map_err(store_err)?;
    }
    Ok(())
}

impl SqliteSource {
    /// Open (or create) a SQLite database at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        let source = Self {
            conn: Mutex::new(conn),
        };
        source.initialize_schema()?;
        Ok(source)
    }

    /// Create an in-memory database.
    ///
    /// Useful for testing; data is lost when the source is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let source = Self {
            conn: Mutex::new(conn),
        };
        source.initialize_schema()?;
        Ok(source)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS companies (
                corp_code TEXT PRIMARY KEY,
                stock_code TEXT NOT NULL,
                name_kr TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_companies_stock_code
             ON companies(stock_code);

            CREATE TABLE IF NOT EXISTS filings (
                id INTEGER PRIMARY KEY,
                corp_code TEXT NOT NULL,
                bsns_year INTEGER NOT NULL,
                fs_div TEXT NOT NULL,
                reprt_code TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_filings_corp_fs_year
             ON filings(corp_code, fs_div, reprt_code, bsns_year);

            CREATE TABLE IF NOT EXISTS line_items (
                id INTEGER PRIMARY KEY,
                account_nm TEXT NOT NULL,
                sj_div TEXT NOT NULL,
                UNIQUE (account_nm, sj_div)
            );

            CREATE TABLE IF NOT EXISTS facts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filing_id INTEGER NOT NULL REFERENCES filings(id),
                line_item_id INTEGER NOT NULL REFERENCES line_items(id),
                thstrm_amount REAL
            );
            CREATE INDEX IF NOT EXISTS idx_facts_filing
             ON facts(filing_id);",
        )
        .map_err(store_err)?;

        debug!("SQLite source schema initialized");
        Ok(())
    }

    /// Insert or replace a company.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_company(&self, company: &Company) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO companies (corp_code, stock_code, name_kr)
             VALUES (?1, ?2, ?3)",
            params![
                company.corp_code.as_str(),
                company.stock_code.as_str(),
                company.name_kr
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Insert a filing and return its id.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn insert_filing(
        &self,
        corp_code: &CorpCode,
        fs_div: FsDiv,
        bsns_year: i32,
        reprt_code: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock().map_err(store_err)?;
        write_filing(&conn, corp_code, fs_div, bsns_year, reprt_code)
    }

    /// Insert an annual filing together with its facts, in one transaction.
    ///
    /// Nothing is written if any fact fails.
    ///
    /// # Errors
    /// Returns an error if any write fails.
    pub fn insert_annual(
        &self,
        corp_code: &CorpCode,
        fs_div: FsDiv,
        bsns_year: i32,
        facts: &[Fact],
    ) -> Result<i64> {
        let conn = self.conn.lock().map_err(store_err)?;
        let tx = conn.unchecked_transaction().map_err(store_err)?;

        let filing_id = write_filing(&tx, corp_code, fs_div, bsns_year, ANNUAL_REPORT_CODE)?;
        write_facts(&tx, filing_id, facts)?;

        tx.commit().map_err(store_err)?;
        debug!(
            "Stored {} filing {} with {} facts",
            bsns_year,
            filing_id,
            facts.len()
        );
        Ok(filing_id)
    }

    /// Append facts to a filing, creating line items as needed.
    ///
    /// # Errors
    /// Returns an error if any write fails.
    pub fn insert_facts(&self, filing_id: i64, facts: &[Fact]) -> Result<()> {
        let conn = self.conn.lock().map_err(store_err)?;
        let tx = conn.unchecked_transaction().map_err(store_err)?;
        write_facts(&tx, filing_id, facts)?;
        tx.commit().map_err(store_err)?;
        debug!("Stored {} facts for filing {}", facts.len(), filing_id);
        Ok(())
    }

    fn query_company(&self, stock_code: &StockCode) -> Result<Option<Company>> {
        let conn = self.conn.lock().map_err(store_err)?;
        conn.query_row(
            "SELECT corp_code, stock_code, name_kr FROM companies
             WHERE stock_code = ?1
             ORDER BY corp_code
             LIMIT 1",
            params![stock_code.as_str()],
            |row| {
                Ok(Company::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(store_err)
    }

    fn query_filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>> {
        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, corp_code, bsns_year, fs_div, reprt_code FROM filings
                 WHERE corp_code = ?1 AND fs_div = ?2 AND reprt_code = ?3
                 ORDER BY bsns_year ASC, id ASC",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(
                params![corp_code.as_str(), fs_div.code(), ANNUAL_REPORT_CODE],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i32>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(store_err)?;

        let mut filings = Vec::new();
        for row in rows {
            let (id, corp, year, fs, reprt_code) = row.map_err(store_err)?;
            filings.push(Filing {
                id,
                corp_code: CorpCode::new(corp),
                bsns_year: year,
                fs_div: fs.parse()?,
                reprt_code,
            });
        }
        Ok(filings)
    }

    fn query_facts(
        &self,
        filing_id: i64,
        statement: StatementKind,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        let conn = self.conn.lock().map_err(store_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT f.thstrm_amount, li.account_nm FROM facts f
                 JOIN line_items li ON li.id = f.line_item_id
                 WHERE f.filing_id = ?1 AND li.sj_div = ?2
                 ORDER BY f.id ASC
                 LIMIT ?3",
            )
            .map_err(store_err)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![filing_id, statement.code(), limit], |row| {
                Ok(Fact {
                    amount: row.get::<_, Option<f64>>(0)?,
                    line_item: LineItem::new(row.get::<_, String>(1)?, statement),
                })
            })
            .map_err(store_err)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }
}

impl DataSource for SqliteSource {
    fn name(&self) -> &str {
        "SQLite"
    }

    fn description(&self) -> &str {
        "Local SQLite mirror of the companies, filings, line_items and facts tables"
    }
}

#[async_trait]
impl FilingSource for SqliteSource {
    #[instrument(skip(self), fields(stock = %stock_code))]
    async fn company(&self, stock_code: &StockCode) -> Result<Option<Company>> {
        let company = self.query_company(stock_code)?;
        debug!(found = company.is_some(), "Company lookup");
        Ok(company)
    }

    #[instrument(skip(self), fields(corp = %corp_code, fs_div = %fs_div))]
    async fn filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>> {
        let filings = self.query_filings(corp_code, fs_div)?;
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
        let facts = self.query_facts(filing_id, statement, limit)?;
        debug!("Found {} facts", facts.len());
        Ok(facts)
    }
}
