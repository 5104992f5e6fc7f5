//! Consolidation mode and statement category definitions.
//!
//! This module defines [`FsDiv`] for choosing consolidated or separate statements
//! and [`StatementKind`] for the statement a line item belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KofinError;

/// DART report code of the annual business report.
pub const ANNUAL_REPORT_CODE: &str = "11011";

/// Consolidation mode of a filing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsDiv {
    /// Consolidated financial statements (`CFS`).
    #[default]
    #[serde(rename = "CFS")]
    Consolidated,
    /// Separate, non-consolidated financial statements (`OFS`).
    #[serde(rename = "OFS")]
    Separate,
}

impl FsDiv {
    /// Returns the DART code for this mode.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Consolidated => "CFS",
            Self::Separate => "OFS",
        }
    }

    /// Returns the Korean label shown next to the code (연결 / 개별).
    #[must_use]
    pub const fn korean_label(&self) -> &'static str {
        match self {
            Self::Consolidated => "연결",
            Self::Separate => "개별",
        }
    }
}

impl fmt::Display for FsDiv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FsDiv {
    type Err = KofinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CFS" => Ok(Self::Consolidated),
            "OFS" => Ok(Self::Separate),
            other => Err(KofinError::InvalidParameter(format!(
                "Unknown consolidation mode: {other}"
            ))),
        }
    }
}

/// Financial statement a line item is reported on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Income statement (`IS`).
    #[serde(rename = "IS")]
    Income,
    /// Balance sheet (`BS`).
    #[serde(rename = "BS")]
    Balance,
    /// Cash flow statement (`CF`).
    #[serde(rename = "CF")]
    CashFlow,
}

impl StatementKind {
    /// All statement kinds in display order.
    pub const ALL: [Self; 3] = [Self::Income, Self::Balance, Self::CashFlow];

    /// Returns the DART `sj_div` code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Income => "IS",
            Self::Balance => "BS",
            Self::CashFlow => "CF",
        }
    }

    /// Returns the Korean statement title.
    #[must_use]
    pub const fn korean_title(&self) -> &'static str {
        match self {
            Self::Income => "손익계산서",
            Self::Balance => "재무상태표",
            Self::CashFlow => "현금흐름표",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StatementKind {
    type Err = KofinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IS" => Ok(Self::Income),
            "BS" => Ok(Self::Balance),
            "CF" => Ok(Self::CashFlow),
            other => Err(KofinError::InvalidParameter(format!(
                "Unknown statement kind: {other}"
            ))),
        }
    }
}
