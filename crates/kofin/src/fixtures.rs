//! Shared test data.

use kofin_core::{Company, Fact, FsDiv, StatementKind};
use kofin_store::InMemorySource;

fn year(revenue: f64, operating_income: f64, net_income: f64, equity: f64) -> Vec<Fact> {
    vec![
        Fact::new("매출액", StatementKind::Income, revenue),
        Fact::new("영업이익", StatementKind::Income, operating_income),
        Fact::new("당기순이익", StatementKind::Income, net_income),
        Fact::new("자본총계", StatementKind::Balance, equity),
        Fact::new("영업활동현금흐름", StatementKind::CashFlow, operating_income),
    ]
}

/// 005930 with consolidated filings for 2021-2023 and a separate filing for 2023.
pub(crate) fn samsung() -> InMemorySource {
    InMemorySource::new()
        .with_company(Company::new("00126380", "005930", "삼성전자"))
        .with_annual("00126380", FsDiv::Consolidated, 2021, year(1.0, 0.1, 100.0, 1000.0))
        .with_annual("00126380", FsDiv::Consolidated, 2022, year(2.0, 0.2, 150.0, 1200.0))
        .with_annual("00126380", FsDiv::Consolidated, 2023, year(3.0, 0.3, 200.0, 1500.0))
        .with_annual(
            "00126380",
            FsDiv::Separate,
            2023,
            vec![Fact::new("자본총계", StatementKind::Balance, 1.0)],
        )
}

/// 000660 with consolidated filings for 2022-2024.
pub(crate) fn hynix() -> InMemorySource {
    let corp = "00164779";
    samsung()
        .with_company(Company::new(corp, "000660", "SK하이닉스"))
        .with_annual(corp, FsDiv::Consolidated, 2022, year(44.6e12, 7.0e12, 2.2e12, 64.0e12))
        .with_annual(corp, FsDiv::Consolidated, 2023, year(32.8e12, -7.7e12, -9.1e12, 55.0e12))
        .with_annual(corp, FsDiv::Consolidated, 2024, year(66.2e12, 23.5e12, 19.8e12, 74.0e12))
}
