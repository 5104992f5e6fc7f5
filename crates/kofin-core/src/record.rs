//! Per-year metric records and their presentation units.

use serde::{Deserialize, Serialize};

use crate::labels::Metric;

/// Won per trillion (1조 원).
pub const WON_PER_TRILLION: f64 = 1_000_000_000_000.0;

/// Converts an amount in won to trillions of won.
#[must_use]
pub fn to_trillions(amount: f64) -> f64 {
    amount / WON_PER_TRILLION
}

/// Converts a ratio to a percentage.
#[must_use]
pub fn to_percent(ratio: f64) -> f64 {
    ratio * 100.0
}

/// Derived metrics for one fiscal year.
///
/// Every field except `year` is absent when no matching line item was found.
/// `roe` is never sourced; it is filled in by [`apply_roe`](crate::series::apply_roe).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Fiscal (business) year.
    pub year: i32,
    /// Revenue in won.
    pub revenue: Option<f64>,
    /// Operating income in won.
    pub operating_income: Option<f64>,
    /// Net income in won.
    pub net_income: Option<f64>,
    /// Total equity in won.
    pub equity: Option<f64>,
    /// Return on average equity, as a ratio.
    pub roe: Option<f64>,
}

impl YearRecord {
    /// Creates an empty record for a year.
    #[must_use]
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    /// Returns the value of an extracted metric.
    #[must_use]
    pub const fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::OperatingIncome => self.operating_income,
            Metric::NetIncome => self.net_income,
            Metric::Equity => self.equity,
        }
    }

    /// Sets the value of an extracted metric.
    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Revenue => self.revenue = value,
            Metric::OperatingIncome => self.operating_income = value,
            Metric::NetIncome => self.net_income = value,
            Metric::Equity => self.equity = value,
        }
    }

    /// Scales the record for charting.
    #[must_use]
    pub fn chart_point(&self) -> ChartPoint {
        ChartPoint {
            year: self.year,
            revenue: self.revenue.map(to_trillions),
            operating_income: self.operating_income.map(to_trillions),
            net_income: self.net_income.map(to_trillions),
            roe: self.roe.map(to_percent),
        }
    }
}

/// A [`YearRecord`] scaled for display: amounts in trillions of won, ROE in percent.
///
/// Absent values stay absent so charts render gaps rather than zeros.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Fiscal year.
    pub year: i32,
    /// Revenue in trillions of won.
    pub revenue: Option<f64>,
    /// Operating income in trillions of won.
    pub operating_income: Option<f64>,
    /// Net income in trillions of won.
    pub net_income: Option<f64>,
    /// Return on equity in percent.
    pub roe: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trillion_divisor() {
        assert_relative_eq!(to_trillions(302_231_400_000_000.0), 302.2314);
        assert_eq!(to_trillions(WON_PER_TRILLION), 1.0);
        assert_eq!(to_trillions(0.0), 0.0);
    }

    #[test]
    fn test_scaling_round_trip() {
        for amount in [1.0e12, 258_935_500_000_000.0, -7_340_000_000.0, 123_456_789.0] {
            assert_relative_eq!(
                to_trillions(amount) * WON_PER_TRILLION,
                amount,
                max_relative = 1e-15
            );
        }
        for ratio in [0.1, 0.136_363_6, -0.042] {
            assert_relative_eq!(to_percent(ratio) / 100.0, ratio, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_chart_point_keeps_gaps() {
        let record = YearRecord {
            year: 2023,
            revenue: Some(2.5e14),
            operating_income: None,
            net_income: Some(1.5e13),
            equity: Some(3.0e14),
            roe: Some(0.05),
        };
        let point = record.chart_point();
        assert_eq!(point.year, 2023);
        assert_relative_eq!(point.revenue.unwrap(), 250.0);
        assert!(point.operating_income.is_none());
        assert_relative_eq!(point.net_income.unwrap(), 15.0);
        assert_relative_eq!(point.roe.unwrap(), 5.0);
    }

    #[test]
    fn test_metric_accessors() {
        let mut record = YearRecord::new(2022);
        record.set_metric(Metric::Equity, Some(10.0));
        assert_eq!(record.metric(Metric::Equity), Some(10.0));
        assert_eq!(record.metric(Metric::Revenue), None);
        assert!(record.roe.is_none());
    }
}
