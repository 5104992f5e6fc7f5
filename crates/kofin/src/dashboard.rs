//! Single-company dashboard state with latest-request-wins loading.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use kofin_core::{
    ChartPoint, Company, Fact, FsDiv, KofinError, Result, StatementKind, StockCode,
};

use crate::service::{DEFAULT_RECENT_YEARS, FinancialsService};

/// What the user picked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Listing code.
    pub stock: StockCode,
    /// Consolidation mode.
    pub fs_div: FsDiv,
    /// Statement shown in the table.
    pub statement: StatementKind,
    /// Table year; `None` picks the most recent filed year.
    pub year: Option<i32>,
}

impl Selection {
    /// Consolidated income statement for the most recent year.
    #[must_use]
    pub fn new(stock: impl Into<StockCode>) -> Self {
        Self {
            stock: stock.into(),
            fs_div: FsDiv::default(),
            statement: StatementKind::Income,
            year: None,
        }
    }

    /// Set the consolidation mode.
    #[must_use]
    pub const fn with_fs_div(mut self, fs_div: FsDiv) -> Self {
        self.fs_div = fs_div;
        self
    }

    /// Set the table statement.
    #[must_use]
    pub const fn with_statement(mut self, statement: StatementKind) -> Self {
        self.statement = statement;
        self
    }

    /// Set the table year.
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Everything the dashboard renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    /// Requested listing code.
    pub stock: Option<StockCode>,
    /// Resolved company; `None` when nothing is listed under the code.
    pub company: Option<Company>,
    /// Consolidation mode.
    pub fs_div: FsDiv,
    /// Table statement.
    pub statement: Option<StatementKind>,
    /// Recent filed years, most recent first.
    pub years: Vec<i32>,
    /// Table year.
    pub year: Option<i32>,
    /// Table rows in source order.
    pub table: Vec<Fact>,
    /// Chart points for `years`, ascending.
    pub chart: Vec<ChartPoint>,
}

impl ViewState {
    fn cleared(selection: &Selection) -> Self {
        Self {
            stock: Some(selection.stock.clone()),
            fs_div: selection.fs_div,
            statement: Some(selection.statement),
            ..Self::default()
        }
    }

    /// Heading such as `삼성전자 · CFS · 손익계산서 · 2023`.
    ///
    /// Falls back to the stock code when no company is loaded and to `-`
    /// for unknown parts.
    #[must_use]
    pub fn title(&self) -> String {
        let name = self
            .company
            .as_ref()
            .map(|c| c.name_kr.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| self.stock.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "-".to_string());
        let statement = self.statement.map_or("-", |s| s.korean_title());
        let year = self
            .year
            .map_or_else(|| "-".to_string(), |y| y.to_string());
        format!("{name} · {} · {statement} · {year}", self.fs_div)
    }
}

/// How a load ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The view now shows the selection.
    Loaded,
    /// No company under the code; the view was cleared.
    CompanyNotFound,
    /// A newer load started first; nothing was written.
    Superseded,
    /// The load failed; the previous view is kept.
    Failed(KofinError),
}

/// Generation counter plus the abort handle of the newest in-flight load.
#[derive(Debug, Default)]
pub struct LatestRequest {
    generation: AtomicU64,
    in_flight: Mutex<Option<(u64, AbortHandle)>>,
}

impl LatestRequest {
    /// Start a new generation, making every earlier one stale.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `generation` is still the newest.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Track the task started for `generation`.
    ///
    /// Whichever of the tracked and the new task belongs to the older
    /// generation is aborted, so a late registration never cancels a newer
    /// load.
    pub fn replace(&self, generation: u64, handle: AbortHandle) {
        let mut slot = match self.in_flight.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stale = match slot.take() {
            Some((tracked, previous)) if tracked > generation => {
                *slot = Some((tracked, previous));
                handle
            }
            Some((_, previous)) => {
                *slot = Some((generation, handle));
                previous
            }
            None => {
                *slot = Some((generation, handle));
                return;
            }
        };
        drop(slot);
        stale.abort();
    }
}

/// Dashboard for one company at a time.
///
/// Each [`load`](Self::load) supersedes the previous one: the older task is
/// aborted, and if it still reaches the commit point its result is dropped.
#[derive(Debug, Clone)]
pub struct Dashboard {
    service: Arc<FinancialsService>,
    state: Arc<RwLock<ViewState>>,
    latest: Arc<LatestRequest>,
    recent: usize,
}

impl Dashboard {
    /// Create a dashboard showing the default number of recent years.
    #[must_use]
    pub fn new(service: Arc<FinancialsService>) -> Self {
        Self {
            service,
            state: Arc::new(RwLock::new(ViewState::default())),
            latest: Arc::new(LatestRequest::default()),
            recent: DEFAULT_RECENT_YEARS,
        }
    }

    /// Show `n` recent years instead.
    #[must_use]
    pub const fn with_recent_years(mut self, n: usize) -> Self {
        self.recent = n;
        self
    }

    /// Snapshot of the current view.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Title of the current view.
    pub async fn title(&self) -> String {
        self.state.read().await.title()
    }

    /// Start loading `selection` in the background.
    ///
    /// Must be called within a tokio runtime. The returned handle yields a
    /// cancellation error if a later load aborts this one.
    pub fn load(&self, selection: Selection) -> JoinHandle<LoadOutcome> {
        let generation = self.latest.begin();
        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.latest);
        let recent = self.recent;

        let handle = tokio::spawn(async move {
            let result = fetch_view(&service, &selection, recent).await;

            let mut state = state.write().await;
            if !latest.is_current(generation) {
                debug!(generation, stock = %selection.stock, "Dropping stale load");
                return LoadOutcome::Superseded;
            }
            match result {
                Ok(view) => {
                    *state = view;
                    LoadOutcome::Loaded
                }
                Err(KofinError::CompanyNotFound(_)) => {
                    *state = ViewState::cleared(&selection);
                    LoadOutcome::CompanyNotFound
                }
                Err(error) => {
                    warn!(stock = %selection.stock, error = %error, "Dashboard load failed");
                    LoadOutcome::Failed(error)
                }
            }
        });

        self.latest.replace(generation, handle.abort_handle());
        handle
    }

    /// Load `selection` and wait for it.
    ///
    /// An aborted load reports [`LoadOutcome::Superseded`].
    pub async fn load_and_wait(&self, selection: Selection) -> LoadOutcome {
        match self.load(selection).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => LoadOutcome::Superseded,
            Err(e) => LoadOutcome::Failed(KofinError::Other(e.to_string())),
        }
    }
}

async fn fetch_view(
    service: &FinancialsService,
    selection: &Selection,
    recent: usize,
) -> Result<ViewState> {
    let company = service.company(&selection.stock).await?;

    let mut years = service.years_for(&company, selection.fs_div).await?;
    years.reverse();
    years.truncate(recent);

    let year = selection
        .year
        .filter(|y| years.contains(y))
        .or_else(|| years.first().copied());

    let table = async {
        match year {
            Some(y) => {
                service
                    .statement(&company, selection.fs_div, y, selection.statement)
                    .await
            }
            None => Ok(Vec::new()),
        }
    };
    let chart = service.series_for(&company, selection.fs_div, Some(recent));
    let (table, rows) = futures::try_join!(table, chart)?;

    Ok(ViewState {
        stock: Some(selection.stock.clone()),
        company: Some(company),
        fs_div: selection.fs_div,
        statement: Some(selection.statement),
        years,
        year,
        table,
        chart: rows.iter().map(|r| r.chart_point()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{hynix, samsung};
    use async_trait::async_trait;
    use kofin_core::{CorpCode, DataSource, Filing, FilingSource};
    use kofin_store::InMemorySource;
    use tokio::sync::Notify;

    fn dashboard(source: impl FilingSource + 'static) -> Dashboard {
        Dashboard::new(Arc::new(FinancialsService::new(Arc::new(source))))
    }

    /// Holds company lookups for one stock until released.
    #[derive(Debug)]
    struct GatedSource {
        inner: InMemorySource,
        gated: StockCode,
        gate: Arc<Notify>,
    }

    impl DataSource for GatedSource {
        fn name(&self) -> &str {
            "Gated"
        }

        fn description(&self) -> &str {
            "Blocks one stock until released"
        }
    }

    #[async_trait]
    impl FilingSource for GatedSource {
        async fn company(&self, stock_code: &StockCode) -> Result<Option<Company>> {
            if stock_code == &self.gated {
                self.gate.notified().await;
            }
            self.inner.company(stock_code).await
        }

        async fn filings(&self, corp_code: &CorpCode, fs_div: FsDiv) -> Result<Vec<Filing>> {
            self.inner.filings(corp_code, fs_div).await
        }

        async fn facts(
            &self,
            filing_id: i64,
            statement: StatementKind,
            limit: usize,
        ) -> Result<Vec<Fact>> {
            self.inner.facts(filing_id, statement, limit).await
        }
    }

    #[tokio::test]
    async fn test_load_populates_view() {
        let dashboard = dashboard(samsung());
        let outcome = dashboard.load_and_wait(Selection::new("005930")).await;
        assert!(matches!(outcome, LoadOutcome::Loaded));

        let state = dashboard.state().await;
        assert_eq!(state.years, vec![2023, 2022, 2021]);
        assert_eq!(state.year, Some(2023));
        assert_eq!(state.table.len(), 3);
        let chart_years: Vec<i32> = state.chart.iter().map(|p| p.year).collect();
        assert_eq!(chart_years, vec![2021, 2022, 2023]);
        assert_eq!(dashboard.title().await, "삼성전자 · CFS · 손익계산서 · 2023");
    }

    #[tokio::test]
    async fn test_selected_year_and_statement() {
        let dashboard = dashboard(samsung()).with_recent_years(2);
        let selection = Selection::new("005930")
            .with_statement(StatementKind::CashFlow)
            .with_year(2022);
        dashboard.load_and_wait(selection).await;

        let state = dashboard.state().await;
        assert_eq!(state.years, vec![2023, 2022]);
        assert_eq!(state.year, Some(2022));
        assert_eq!(state.table.len(), 1);
        assert_eq!(state.table[0].line_item.sj_div, StatementKind::CashFlow);
        assert_eq!(state.chart.len(), 2);

        // A year outside the window falls back to the latest.
        let selection = Selection::new("005930").with_year(2021);
        dashboard.load_and_wait(selection).await;
        assert_eq!(dashboard.state().await.year, Some(2023));
    }

    #[tokio::test]
    async fn test_missing_company_clears_view() {
        let dashboard = dashboard(samsung());
        dashboard.load_and_wait(Selection::new("005930")).await;

        let outcome = dashboard
            .load_and_wait(Selection::new("999999").with_fs_div(FsDiv::Separate))
            .await;
        assert!(matches!(outcome, LoadOutcome::CompanyNotFound));

        let state = dashboard.state().await;
        assert!(state.company.is_none());
        assert!(state.years.is_empty());
        assert!(state.table.is_empty());
        assert!(state.chart.is_empty());
        assert_eq!(dashboard.title().await, "999999 · OFS · 손익계산서 · -");
    }

    #[tokio::test]
    async fn test_company_without_filings() {
        let source = samsung().with_company(Company::new("00000001", "111111", "신규상장"));
        let dashboard = dashboard(source);
        let outcome = dashboard.load_and_wait(Selection::new("111111")).await;
        assert!(matches!(outcome, LoadOutcome::Loaded));

        let state = dashboard.state().await;
        assert!(state.years.is_empty());
        assert!(state.year.is_none());
        assert!(state.table.is_empty());
    }

    #[tokio::test]
    async fn test_latest_request_wins() {
        let gate = Arc::new(Notify::new());
        let dashboard = dashboard(GatedSource {
            inner: hynix(),
            gated: StockCode::new("005930"),
            gate: Arc::clone(&gate),
        });

        let slow = dashboard.load(Selection::new("005930"));
        tokio::task::yield_now().await;
        let fast = dashboard.load(Selection::new("000660"));

        assert!(matches!(fast.await.unwrap(), LoadOutcome::Loaded));
        gate.notify_one();
        assert!(slow.await.unwrap_err().is_cancelled());

        let state = dashboard.state().await;
        assert_eq!(state.company.unwrap().stock_code.as_str(), "000660");
        assert_eq!(state.years, vec![2024, 2023, 2022]);
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let gate = Arc::new(Notify::new());
        let dashboard = dashboard(GatedSource {
            inner: hynix(),
            gated: StockCode::new("005930"),
            gate: Arc::clone(&gate),
        });
        dashboard.load_and_wait(Selection::new("000660")).await;

        let pending = dashboard.load(Selection::new("005930"));
        tokio::task::yield_now().await;
        // A newer generation starts without aborting the pending task.
        dashboard.latest.begin();
        gate.notify_one();

        assert!(matches!(pending.await.unwrap(), LoadOutcome::Superseded));
        let state = dashboard.state().await;
        assert_eq!(state.company.unwrap().stock_code.as_str(), "000660");
    }

    #[tokio::test]
    async fn test_late_registration_keeps_newer_load() {
        let latest = LatestRequest::default();
        let older = latest.begin();
        let newer = latest.begin();

        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let newer_task = tokio::spawn(async move { rx.await.unwrap_or_default() });
        let older_task = tokio::spawn(std::future::pending::<u32>());

        latest.replace(newer, newer_task.abort_handle());
        latest.replace(older, older_task.abort_handle());

        assert!(older_task.await.unwrap_err().is_cancelled());
        tx.send(7).unwrap();
        assert_eq!(newer_task.await.unwrap(), 7);
    }

    #[test]
    fn test_generations() {
        let latest = LatestRequest::default();
        let first = latest.begin();
        assert!(latest.is_current(first));
        let second = latest.begin();
        assert!(!latest.is_current(first));
        assert!(latest.is_current(second));
    }

    #[test]
    fn test_default_title() {
        assert_eq!(ViewState::default().title(), "- · CFS · - · -");
    }
}
