//! kofin CLI binary.
//!
//! Looks up Korean companies' annual DART filings and prints revenue,
//! operating income, net income and ROE.

mod display;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use kofin::{
    Dashboard, DataSource, FilingSource, FinancialsService, FsDiv, LoadOutcome, Selection,
    SqliteSource, StatementKind, StockCode, SupabaseSource, chart_frame, comparison_frame,
    parse_stock_list, points_frame,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kofin")]
#[command(about = "Financial metrics and ROE from Korean annual reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Read from a local SQLite mirror instead of Supabase
    #[arg(long, global = true)]
    sqlite: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Mode {
    /// Consolidation mode (cfs or ofs)
    #[arg(long = "fs", default_value = "cfs")]
    fs_div: FsDiv,
}

#[derive(Subcommand)]
enum Commands {
    /// List filed years
    Years {
        /// Stock code (e.g. 005930)
        stock: StockCode,

        #[command(flatten)]
        mode: Mode,

        /// Only the N most recent years, newest first
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print one statement for one year
    Table {
        /// Stock code
        stock: StockCode,

        #[command(flatten)]
        mode: Mode,

        /// Statement (is, bs or cf)
        #[arg(short, long, default_value = "is")]
        statement: StatementKind,

        /// Business year (defaults to the most recent)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Print the metric series with ROE
    Series {
        /// Stock code
        stock: StockCode,

        #[command(flatten)]
        mode: Mode,

        /// Only the N most recent years
        #[arg(short, long)]
        recent: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare several companies
    Compare {
        /// Comma-separated stock codes
        codes: String,

        #[command(flatten)]
        mode: Mode,
    },

    /// Show the dashboard view: recent years, chart and statement table
    Show {
        /// Stock code
        stock: StockCode,

        #[command(flatten)]
        mode: Mode,

        /// Statement (is, bs or cf)
        #[arg(short, long, default_value = "is")]
        statement: StatementKind,

        /// Table year (defaults to the most recent)
        #[arg(short, long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn open_source(sqlite: Option<PathBuf>) -> Result<Arc<dyn FilingSource>> {
    let source: Arc<dyn FilingSource> = match sqlite {
        Some(path) => Arc::new(SqliteSource::new(path)?),
        None => Arc::new(SupabaseSource::from_env()?),
    };
    debug!(source = source.name(), "Opened filing source");
    Ok(source)
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let service = FinancialsService::new(open_source(cli.sqlite)?);

    match cli.command {
        Commands::Years { stock, mode, limit } => {
            let years = match limit {
                Some(n) => service.recent_years(&stock, mode.fs_div, n).await?,
                None => service.available_years(&stock, mode.fs_div).await?,
            };
            if years.is_empty() {
                println!(
                    "{stock}: no {} ({}) annual reports",
                    mode.fs_div,
                    mode.fs_div.korean_label()
                );
            }
            for year in years {
                println!("{year}");
            }
        }

        Commands::Table {
            stock,
            mode,
            statement,
            year,
        } => {
            let company = service.company(&stock).await?;
            let year = match year {
                Some(y) => y,
                None => match service.years_for(&company, mode.fs_div).await?.last() {
                    Some(y) => *y,
                    None => bail!("{stock}: no {} annual reports", mode.fs_div),
                },
            };
            let facts = service
                .statement(&company, mode.fs_div, year, statement)
                .await?;
            println!(
                "{} · {} ({}) · {} · {year}",
                company.name_kr,
                mode.fs_div,
                mode.fs_div.korean_label(),
                statement.korean_title()
            );
            println!("{}", display::render_facts(&facts));
        }

        Commands::Series {
            stock,
            mode,
            recent,
            json,
        } => {
            let series = match recent {
                Some(n) => service.recent_series(&stock, mode.fs_div, n).await?,
                None => service.series_by_stock(&stock, mode.fs_div).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                println!(
                    "{} ({}) · {} · 단위: 조원",
                    series.company.name_kr, series.company.stock_code, series.fs_div
                );
                println!("{}", display::render_frame(&chart_frame(&series.rows)?)?);
            }
        }

        Commands::Compare { codes, mode } => {
            let codes = parse_stock_list(&codes);
            if codes.is_empty() {
                bail!("no stock codes given");
            }
            let outcomes = service.compare(&codes, mode.fs_div).await;
            let names: Vec<String> = outcomes
                .iter()
                .filter_map(|o| o.series())
                .map(|s| format!("{} {}", s.company.stock_code, s.company.name_kr))
                .collect();
            if !names.is_empty() {
                println!("{} · 단위: 조원", names.join(", "));
                println!("{}", display::render_frame(&comparison_frame(&outcomes)?)?);
            }
            for note in display::outcome_notes(&outcomes) {
                eprintln!("{note}");
            }
        }

        Commands::Show {
            stock,
            mode,
            statement,
            year,
        } => {
            let dashboard = Dashboard::new(Arc::new(service));
            let mut selection = Selection::new(stock.clone())
                .with_fs_div(mode.fs_div)
                .with_statement(statement);
            if let Some(y) = year {
                selection = selection.with_year(y);
            }
            match dashboard.load_and_wait(selection).await {
                LoadOutcome::Loaded => {}
                LoadOutcome::CompanyNotFound => bail!("{stock}: company not found"),
                LoadOutcome::Superseded => bail!("{stock}: load was superseded"),
                LoadOutcome::Failed(e) => return Err(e.into()),
            }
            let view = dashboard.state().await;
            println!("{}", display::render_view(&view, &points_frame(&view.chart)?)?);
        }
    }

    Ok(())
}
