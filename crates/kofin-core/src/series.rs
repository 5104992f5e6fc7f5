//! Metric extraction and ROE derivation over a run of fiscal years.
//!
//! This is the one place [`YearRecord`]s are produced. Callers hand over the
//! income statement and balance sheet facts of each year; the builder orders
//! the years, extracts each metric by label matching, and then chains ROE
//! across consecutive years on averaged equity.

use tracing::trace;

use crate::labels::{Metric, MetricLabels, pick_amount};
use crate::record::YearRecord;
use crate::statement::StatementKind;
use crate::types::Fact;

/// Raw facts of one fiscal year, split by statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct YearStatements {
    /// Fiscal year.
    pub year: i32,
    /// Income statement facts in source order.
    pub income: Vec<Fact>,
    /// Balance sheet facts in source order.
    pub balance: Vec<Fact>,
}

impl YearStatements {
    /// Creates a bundle for one year.
    #[must_use]
    pub const fn new(year: i32, income: Vec<Fact>, balance: Vec<Fact>) -> Self {
        Self {
            year,
            income,
            balance,
        }
    }

    /// Returns the facts of the statement a metric is read from.
    #[must_use]
    pub fn facts_for(&self, metric: Metric) -> &[Fact] {
        match metric.statement() {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &[],
        }
    }
}

/// Extracts the metrics of one year. `roe` is left absent.
#[must_use]
pub fn extract_year(statements: &YearStatements, labels: &MetricLabels) -> YearRecord {
    let mut record = YearRecord::new(statements.year);
    for metric in Metric::ALL {
        let value = pick_amount(statements.facts_for(metric), labels.candidates(metric));
        if value.is_none() {
            trace!(year = statements.year, ?metric, "No matching line item");
        }
        record.set_metric(metric, value);
    }
    record
}

/// Averages current and prior equity.
///
/// Falls back to current equity when the prior year is unknown; absent when
/// current equity is unknown.
#[must_use]
pub fn average_equity(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(now), Some(prev)) => Some((now + prev) / 2.0),
        (Some(now), None) => Some(now),
        (None, _) => None,
    }
}

/// Return on equity, absent when either side is unknown or equity averages to zero.
#[must_use]
pub fn return_on_equity(net_income: Option<f64>, avg_equity: Option<f64>) -> Option<f64> {
    match (net_income, avg_equity) {
        (Some(ni), Some(eq)) if eq != 0.0 => Some(ni / eq),
        _ => None,
    }
}

/// Fills in `roe` for records ordered by ascending year.
///
/// Single left-to-right pass. The first record has no prior year in the
/// window and uses its own equity. Only `roe` is written.
pub fn apply_roe(records: &mut [YearRecord]) {
    debug_assert!(
        records.windows(2).all(|w| w[0].year < w[1].year),
        "records must be in strictly increasing year order"
    );

    let mut previous_equity = None;
    for record in records.iter_mut() {
        let avg = average_equity(record.equity, previous_equity);
        record.roe = return_on_equity(record.net_income, avg);
        previous_equity = record.equity;
    }
}

/// Builds the year series: sorts by year, extracts every year, then applies ROE.
///
/// When the same year appears twice, the first bundle is kept.
#[must_use]
pub fn build_series<I>(years: I, labels: &MetricLabels) -> Vec<YearRecord>
where
    I: IntoIterator<Item = YearStatements>,
{
    let mut bundles: Vec<YearStatements> = years.into_iter().collect();
    bundles.sort_by_key(|b| b.year);
    bundles.dedup_by_key(|b| b.year);

    let mut records: Vec<YearRecord> = bundles.iter().map(|b| extract_year(b, labels)).collect();
    apply_roe(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn year(y: i32, net_income: Option<f64>, equity: Option<f64>) -> YearStatements {
        let income = net_income
            .map(|ni| vec![Fact::new("당기순이익", StatementKind::Income, ni)])
            .unwrap_or_default();
        let balance = equity
            .map(|eq| vec![Fact::new("자본총계", StatementKind::Balance, eq)])
            .unwrap_or_default();
        YearStatements::new(y, income, balance)
    }

    #[test]
    fn test_roe_uses_average_equity() {
        let series = build_series(
            vec![
                year(2021, Some(100.0), Some(1000.0)),
                year(2022, Some(150.0), Some(1200.0)),
                year(2023, Some(200.0), Some(1500.0)),
            ],
            &MetricLabels::default(),
        );

        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[0].roe.unwrap(), 0.10);
        assert_relative_eq!(series[1].roe.unwrap(), 150.0 / 1100.0);
        assert_relative_eq!(series[1].roe.unwrap(), 0.1364, epsilon = 1e-4);
        assert_relative_eq!(series[2].roe.unwrap(), 200.0 / 1350.0);
        assert_relative_eq!(series[2].roe.unwrap(), 0.1481, epsilon = 1e-4);
    }

    #[test]
    fn test_years_are_sorted_before_roe() {
        let series = build_series(
            vec![
                year(2023, Some(200.0), Some(1500.0)),
                year(2021, Some(100.0), Some(1000.0)),
                year(2022, Some(150.0), Some(1200.0)),
            ],
            &MetricLabels::default(),
        );
        let years: Vec<i32> = series.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2021, 2022, 2023]);
        assert_relative_eq!(series[0].roe.unwrap(), 0.10);
    }

    #[test]
    fn test_missing_net_income_gives_absent_roe() {
        let series = build_series(
            vec![year(2021, Some(100.0), Some(1000.0)), year(2022, None, Some(1200.0))],
            &MetricLabels::default(),
        );
        assert!(series[1].roe.is_none());
        assert_eq!(series[1].equity, Some(1200.0));
    }

    #[test]
    fn test_single_year_uses_own_equity() {
        let series = build_series(
            vec![year(2023, Some(50.0), Some(500.0))],
            &MetricLabels::default(),
        );
        assert_relative_eq!(series[0].roe.unwrap(), 0.10);
    }

    #[test]
    fn test_missing_current_equity_gives_absent_roe() {
        let series = build_series(
            vec![year(2021, Some(100.0), Some(1000.0)), year(2022, Some(150.0), None)],
            &MetricLabels::default(),
        );
        assert!(series[1].roe.is_none());
    }

    #[test]
    fn test_gap_in_prior_equity_falls_back_to_current() {
        let series = build_series(
            vec![
                year(2021, Some(100.0), None),
                year(2022, Some(120.0), Some(1200.0)),
            ],
            &MetricLabels::default(),
        );
        assert!(series[0].roe.is_none());
        assert_relative_eq!(series[1].roe.unwrap(), 0.10);
    }

    #[test]
    fn test_zero_equity_is_absent_not_nan() {
        assert_eq!(return_on_equity(Some(10.0), Some(0.0)), None);
        assert_eq!(average_equity(Some(100.0), Some(-100.0)), Some(0.0));

        let mut records = vec![YearRecord {
            year: 2023,
            net_income: Some(10.0),
            equity: Some(0.0),
            ..Default::default()
        }];
        apply_roe(&mut records);
        assert!(records[0].roe.is_none());
    }

    #[test]
    fn test_zero_net_income_gives_zero_roe() {
        assert_eq!(return_on_equity(Some(0.0), Some(500.0)), Some(0.0));
    }

    #[test]
    fn test_apply_roe_only_writes_roe() {
        let mut records = vec![
            YearRecord {
                year: 2022,
                revenue: Some(1.0),
                operating_income: Some(2.0),
                net_income: Some(3.0),
                equity: Some(30.0),
                roe: None,
            },
            YearRecord {
                year: 2023,
                revenue: None,
                operating_income: Some(-4.0),
                net_income: Some(6.0),
                equity: Some(30.0),
                roe: Some(99.0),
            },
        ];
        apply_roe(&mut records);
        assert_eq!(records[0].revenue, Some(1.0));
        assert_eq!(records[1].operating_income, Some(-4.0));
        assert_relative_eq!(records[0].roe.unwrap(), 0.1);
        assert_relative_eq!(records[1].roe.unwrap(), 0.2);
    }

    #[test]
    fn test_empty_income_statement_keeps_equity() {
        let statements = YearStatements::new(
            2023,
            Vec::new(),
            vec![Fact::new("자본총계", StatementKind::Balance, 800.0)],
        );
        let record = extract_year(&statements, &MetricLabels::default());
        assert!(record.revenue.is_none());
        assert!(record.operating_income.is_none());
        assert!(record.net_income.is_none());
        assert_eq!(record.equity, Some(800.0));
    }

    #[test]
    fn test_metrics_read_from_their_own_statement() {
        // An equity-looking label on the income statement must not feed equity.
        let statements = YearStatements::new(
            2023,
            vec![
                Fact::new("매출액", StatementKind::Income, 10.0),
                Fact::new("영업이익", StatementKind::Income, 4.0),
                Fact::new("당기순이익", StatementKind::Income, 3.0),
                Fact::new("자본총계", StatementKind::Income, 1.0),
            ],
            vec![Fact::new("자본총계", StatementKind::Balance, 30.0)],
        );
        let record = extract_year(&statements, &MetricLabels::default());
        assert_eq!(record.revenue, Some(10.0));
        assert_eq!(record.operating_income, Some(4.0));
        assert_eq!(record.net_income, Some(3.0));
        assert_eq!(record.equity, Some(30.0));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let input = vec![
            year(2021, Some(100.0), Some(1000.0)),
            year(2022, Some(150.0), Some(1200.0)),
        ];
        let labels = MetricLabels::default();
        let first = build_series(input.clone(), &labels);
        let second = build_series(input.clone(), &labels);
        assert_eq!(first, second);
        assert_eq!(input[0].income.len(), 1);
    }
}
