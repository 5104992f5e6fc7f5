//! Core data types for Korean financial statement data.
//!
//! This module defines the fundamental data structures:
//!
//! - [`StockCode`] - Exchange listing code (e.g. `005930`)
//! - [`CorpCode`] - DART corporation code
//! - [`Company`] - Company reference information
//! - [`Filing`] - One annual submission of statements
//! - [`LineItem`] - An account name on a statement
//! - [`Fact`] - A reported amount for one line item

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::statement::{FsDiv, StatementKind};

/// An exchange listing code.
///
/// Codes are trimmed and uppercased on creation; KRX codes are usually six
/// digits but newer listings may contain letters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockCode(String);

impl StockCode {
    /// Creates a new stock code, trimming whitespace and converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StockCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for StockCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StockCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A DART corporation code (eight digits, zero-padded).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpCode(String);

impl CorpCode {
    /// Creates a corporation code.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorpCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CorpCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Company reference information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// DART corporation code.
    pub corp_code: CorpCode,
    /// Exchange listing code.
    pub stock_code: StockCode,
    /// Korean company name.
    pub name_kr: String,
}

impl Company {
    /// Creates company info.
    #[must_use]
    pub fn new(
        corp_code: impl Into<CorpCode>,
        stock_code: impl Into<StockCode>,
        name_kr: impl Into<String>,
    ) -> Self {
        Self {
            corp_code: corp_code.into(),
            stock_code: stock_code.into(),
            name_kr: name_kr.into(),
        }
    }
}

/// One submission of financial statements for a company.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Backend row id, used to fetch the filing's facts.
    pub id: i64,
    /// Filing company.
    pub corp_code: CorpCode,
    /// Business (fiscal) year.
    pub bsns_year: i32,
    /// Consolidation mode.
    pub fs_div: FsDiv,
    /// DART report code (`11011` for annual reports).
    pub reprt_code: String,
}

/// An account name on a specific statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItem {
    /// Free-text account name, e.g. "매출액".
    pub account_nm: String,
    /// Statement the account belongs to.
    pub sj_div: StatementKind,
}

impl LineItem {
    /// Creates a line item.
    #[must_use]
    pub fn new(account_nm: impl Into<String>, sj_div: StatementKind) -> Self {
        Self {
            account_nm: account_nm.into(),
            sj_div,
        }
    }
}

/// A reported current-term amount for one line item within one filing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Current-term amount in won; `None` when the filing left it blank.
    pub amount: Option<f64>,
    /// The line item this amount is reported against.
    pub line_item: LineItem,
}

impl Fact {
    /// Creates a fact with an amount.
    #[must_use]
    pub fn new(account_nm: impl Into<String>, sj_div: StatementKind, amount: f64) -> Self {
        Self {
            amount: Some(amount),
            line_item: LineItem::new(account_nm, sj_div),
        }
    }

    /// Creates a fact whose amount was left blank.
    #[must_use]
    pub fn blank(account_nm: impl Into<String>, sj_div: StatementKind) -> Self {
        Self {
            amount: None,
            line_item: LineItem::new(account_nm, sj_div),
        }
    }

    /// Returns the account name of the line item.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.line_item.account_nm
    }
}
