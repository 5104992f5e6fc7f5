//! Chart-ready DataFrames.
//!
//! Amounts are in trillions of won and ROE in percent. Missing values are
//! nulls, never zeros.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use polars::prelude::*;

use kofin_core::{ChartPoint, KofinError, Result, YearRecord, to_percent, to_trillions};

use crate::service::CompanyOutcome;

fn frame_err(e: PolarsError) -> KofinError {
    KofinError::Other(e.to_string())
}

/// One company's metric series as columns `year, revenue, operating_income,
/// net_income, roe`.
///
/// # Errors
/// Returns an error if the frame cannot be assembled.
pub fn chart_frame(rows: &[YearRecord]) -> Result<DataFrame> {
    let points: Vec<ChartPoint> = rows.iter().map(YearRecord::chart_point).collect();
    points_frame(&points)
}

/// Same columns as [`chart_frame`], from points that are already scaled.
///
/// # Errors
/// Returns an error if the frame cannot be assembled.
pub fn points_frame(points: &[ChartPoint]) -> Result<DataFrame> {
    DataFrame::new(vec![
        Column::new("year".into(), points.iter().map(|p| p.year).collect::<Vec<i32>>()),
        Column::new(
            "revenue".into(),
            points.iter().map(|p| p.revenue).collect::<Vec<_>>(),
        ),
        Column::new(
            "operating_income".into(),
            points.iter().map(|p| p.operating_income).collect::<Vec<_>>(),
        ),
        Column::new(
            "net_income".into(),
            points.iter().map(|p| p.net_income).collect::<Vec<_>>(),
        ),
        Column::new("roe".into(), points.iter().map(|p| p.roe).collect::<Vec<_>>()),
    ])
    .map_err(frame_err)
}

/// Loaded companies side by side on the sorted union of their years.
///
/// For each loaded company, in input order, adds `<stock>_revenue`,
/// `<stock>_operating_income` and `<stock>_roe`. Companies that were not
/// loaded are skipped, as are repeated stock codes.
///
/// # Errors
/// Returns an error if the frame cannot be assembled.
pub fn comparison_frame(outcomes: &[CompanyOutcome]) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let loaded: Vec<_> = outcomes
        .iter()
        .filter_map(CompanyOutcome::series)
        .filter(|series| seen.insert(series.company.stock_code.clone()))
        .collect();

    let years: BTreeSet<i32> = loaded
        .iter()
        .flat_map(|series| series.rows.iter().map(|r| r.year))
        .collect();

    let mut columns = vec![Column::new(
        "year".into(),
        years.iter().copied().collect::<Vec<i32>>(),
    )];

    for series in loaded {
        let by_year: BTreeMap<i32, &YearRecord> =
            series.rows.iter().map(|r| (r.year, r)).collect();
        let column = |suffix: &str, value: fn(&YearRecord) -> Option<f64>| {
            let values: Vec<Option<f64>> = years
                .iter()
                .map(|y| by_year.get(y).and_then(|r| value(r)))
                .collect();
            Column::new(
                format!("{}_{suffix}", series.company.stock_code).into(),
                values,
            )
        };
        columns.push(column("revenue", |r| r.revenue.map(to_trillions)));
        columns.push(column("operating_income", |r| {
            r.operating_income.map(to_trillions)
        }));
        columns.push(column("roe", |r| r.roe.map(to_percent)));
    }

    DataFrame::new(columns).map_err(frame_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::hynix;
    use crate::service::{FinancialsService, parse_stock_list};
    use approx::assert_relative_eq;
    use kofin_core::FsDiv;
    use std::sync::Arc;

    fn f64_at(df: &DataFrame, name: &str, idx: usize) -> Option<f64> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(idx)
    }

    #[test]
    fn test_chart_frame_units() {
        let mut first = YearRecord::new(2022);
        first.revenue = Some(302.2314e12);
        first.roe = Some(0.085);
        let second = YearRecord::new(2023);

        let df = chart_frame(&[first, second]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec!["year", "revenue", "operating_income", "net_income", "roe"]
        );
        assert_relative_eq!(f64_at(&df, "revenue", 0).unwrap(), 302.2314);
        assert_relative_eq!(f64_at(&df, "roe", 0).unwrap(), 8.5);
        assert!(f64_at(&df, "revenue", 1).is_none());
        assert!(f64_at(&df, "net_income", 0).is_none());
    }

    #[test]
    fn test_chart_frame_empty() {
        let df = chart_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 5);
    }

    #[tokio::test]
    async fn test_comparison_frame_merges_years() {
        let service = FinancialsService::new(Arc::new(hynix()));
        let codes = parse_stock_list("005930,000660,123456,005930");
        let outcomes = service.compare(&codes, FsDiv::Consolidated).await;

        let df = comparison_frame(&outcomes).unwrap();
        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 7);

        let years: Vec<Option<i32>> = df
            .column("year")
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(years, vec![Some(2021), Some(2022), Some(2023), Some(2024)]);

        // 005930 has no 2024 filing, 000660 none for 2021.
        assert!(f64_at(&df, "005930_revenue", 3).is_none());
        assert!(f64_at(&df, "000660_revenue", 0).is_none());
        assert_relative_eq!(f64_at(&df, "000660_revenue", 3).unwrap(), 66.2);
        assert_relative_eq!(f64_at(&df, "000660_operating_income", 2).unwrap(), -7.7);
        assert_relative_eq!(f64_at(&df, "005930_roe", 0).unwrap(), 10.0);
    }

    #[test]
    fn test_comparison_frame_without_loaded_companies() {
        let outcomes = vec![CompanyOutcome::NotFound("123456".into())];
        let df = comparison_frame(&outcomes).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.get_column_names_str(), vec!["year"]);
    }
}
