//! Terminal formatting for amounts, ratios and tables.

use anyhow::Result;
use kofin::{CompanyOutcome, Fact, Metric, ViewState};
use polars::prelude::*;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns},
};

const ABSENT: &str = "-";

/// Group the integer part of a won amount with commas.
pub(crate) fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let grouped: String = rounded
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if value < 0.0 && rounded != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub(crate) fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| ABSENT.to_string(), group_thousands)
}

pub(crate) fn trillions(value: Option<f64>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| format!("{v:.2}"))
}

pub(crate) fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| format!("{v:.1}%"))
}

/// Korean column heading; comparison columns keep their stock prefix.
fn header(column: &str) -> String {
    const METRICS: [(&str, Metric); 3] = [
        ("revenue", Metric::Revenue),
        ("operating_income", Metric::OperatingIncome),
        ("net_income", Metric::NetIncome),
    ];
    if column == "year" {
        return "연도".to_string();
    }
    let (prefix, suffix) = match column.split_once('_') {
        Some((stock, rest)) if stock.chars().all(|c| c.is_ascii_digit()) => (Some(stock), rest),
        _ => (None, column),
    };
    let label = METRICS
        .iter()
        .find(|(name, _)| *name == suffix)
        .map_or_else(
            || suffix.to_uppercase(),
            |(_, metric)| metric.korean_name().to_string(),
        );
    match prefix {
        Some(stock) => format!("{stock} {label}"),
        None => label,
    }
}

fn styled(builder: Builder) -> String {
    builder
        .build()
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

/// Render a chart or comparison frame.
///
/// `year` prints as an integer, columns ending in `roe` as percent, the rest
/// as trillions of won.
pub(crate) fn render_frame(df: &DataFrame) -> Result<String> {
    let mut builder = Builder::default();
    builder.push_record(df.get_column_names_str().iter().map(|name| header(name)));

    let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(df.width()); df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        if column.name().as_str() == "year" {
            for (row, year) in series.i32()?.into_iter().enumerate() {
                cells[row].push(year.map_or_else(|| ABSENT.to_string(), |y| y.to_string()));
            }
        } else {
            let is_ratio = column.name().as_str().ends_with("roe");
            for (row, value) in series.f64()?.into_iter().enumerate() {
                cells[row].push(if is_ratio {
                    percent(value)
                } else {
                    trillions(value)
                });
            }
        }
    }
    for row in cells {
        builder.push_record(row);
    }

    Ok(styled(builder))
}

/// Render statement facts as label / amount in won.
pub(crate) fn render_facts(facts: &[Fact]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["계정명".to_string(), "당기금액".to_string()]);
    for fact in facts {
        builder.push_record([fact.label().to_string(), amount(fact.amount)]);
    }
    styled(builder)
}

/// Render a dashboard view: heading, year list, chart and table.
pub(crate) fn render_view(view: &ViewState, chart: &DataFrame) -> Result<String> {
    let years: Vec<String> = view.years.iter().map(ToString::to_string).collect();
    let mut out = format!("{}\n", view.title());
    out.push_str(&format!(
        "최근 연도: {}\n\n",
        if years.is_empty() {
            ABSENT.to_string()
        } else {
            years.join(", ")
        }
    ));
    out.push_str(&render_frame(chart)?);
    out.push_str("\n\n");
    if view.table.is_empty() {
        out.push_str("데이터가 없습니다.");
    } else {
        out.push_str(&render_facts(&view.table));
    }
    Ok(out)
}

/// Lines for companies that could not be loaded.
pub(crate) fn outcome_notes(outcomes: &[CompanyOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            CompanyOutcome::Loaded(_) => None,
            CompanyOutcome::NotFound(code) => Some(format!("{code}: 회사 없음")),
            CompanyOutcome::Failed { stock_code, error } => {
                Some(format!("{stock_code}: 불러오기 실패 ({error})"))
            }
        })
        .collect()
}
