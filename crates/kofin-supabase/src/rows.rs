//! Wire rows returned by PostgREST and their conversion to domain types.

use kofin_core::{
    Company, CorpCode, Fact, Filing, FsDiv, KofinError, LineItem, Result, StatementKind,
};
use serde::Deserialize;

/// A JSON value that may be a number or a numeric string.
///
/// `numeric` and `text` columns both show up in the hosted tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Finite numeric value, or `None` for blanks, dashes and garbage.
    pub(crate) fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_amount(s),
        }
        .filter(|n| n.is_finite())
    }
}

/// Parse a reported amount such as `"1,234,567"` or `"-98"`.
///
/// Blank strings and `-` mean "not reported".
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    trimmed.replace(',', "").parse::<f64>().ok()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompanyRow {
    corp_code: String,
    stock_code: String,
    #[serde(default)]
    name_kr: Option<String>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self::new(row.corp_code, row.stock_code, row.name_kr.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilingRow {
    id: i64,
    corp_code: String,
    bsns_year: Numeric,
    fs_div: FsDiv,
    reprt_code: String,
}

impl TryFrom<FilingRow> for Filing {
    type Error = KofinError;

    fn try_from(row: FilingRow) -> Result<Self> {
        let year = row
            .bsns_year
            .value()
            .filter(|y| y.fract() == 0.0)
            .ok_or_else(|| {
                KofinError::Parse(format!(
                    "Filing {} has invalid bsns_year {:?}",
                    row.id, row.bsns_year
                ))
            })?;
        Ok(Self {
            id: row.id,
            corp_code: CorpCode::new(row.corp_code),
            bsns_year: year as i32,
            fs_div: row.fs_div,
            reprt_code: row.reprt_code,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LineItemRow {
    account_nm: String,
    sj_div: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FactRow {
    #[serde(default)]
    thstrm_amount: Option<Numeric>,
    #[serde(default)]
    line_items: Option<LineItemRow>,
}

impl FactRow {
    /// Convert to a [`Fact`] if the embedded line item belongs to `statement`.
    pub(crate) fn into_fact(self, statement: StatementKind) -> Option<Fact> {
        let item = self.line_items?;
        if item.sj_div != statement.code() {
            return None;
        }
        Some(Fact {
            amount: self.thstrm_amount.as_ref().and_then(Numeric::value),
            line_item: LineItem::new(item.account_nm, statement),
        })
    }
}
