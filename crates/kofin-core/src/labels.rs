//! Canonical metrics and account-name matching.
//!
//! Companies report the same concept under different Korean account names, so
//! each [`Metric`] carries a list of candidate substrings. Matching is by
//! containment and the first fact in source order that contains *any*
//! candidate wins; the order of the candidates does not act as a priority.

use serde::{Deserialize, Serialize};

use crate::statement::StatementKind;
use crate::types::Fact;

/// A canonical metric extracted from reported line items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Revenue (매출액).
    Revenue,
    /// Operating income (영업이익).
    OperatingIncome,
    /// Net income (당기순이익).
    NetIncome,
    /// Total equity (자본총계).
    Equity,
}

impl Metric {
    /// All metrics in extraction order.
    pub const ALL: [Self; 4] = [
        Self::Revenue,
        Self::OperatingIncome,
        Self::NetIncome,
        Self::Equity,
    ];

    /// Returns the statement the metric is read from.
    #[must_use]
    pub const fn statement(&self) -> StatementKind {
        match self {
            Self::Revenue | Self::OperatingIncome | Self::NetIncome => StatementKind::Income,
            Self::Equity => StatementKind::Balance,
        }
    }

    /// Returns the Korean display name.
    #[must_use]
    pub const fn korean_name(&self) -> &'static str {
        match self {
            Self::Revenue => "매출",
            Self::OperatingIncome => "영업이익",
            Self::NetIncome => "당기순이익",
            Self::Equity => "자본총계",
        }
    }
}

/// Candidate account-name substrings for every metric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricLabels {
    revenue: Vec<String>,
    operating_income: Vec<String>,
    net_income: Vec<String>,
    equity: Vec<String>,
}

impl Default for MetricLabels {
    fn default() -> Self {
        Self {
            revenue: strings(&["매출액", "수익(매출액)", "영업수익"]),
            operating_income: strings(&["영업이익", "영업손실"]),
            net_income: strings(&["당기순이익", "분기순이익", "연결당기순이익", "당기순손실"]),
            equity: strings(&["자본총계", "자본", "지배기업 소유주지분"]),
        }
    }
}

impl MetricLabels {
    /// Creates the default candidate lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the candidates for a metric.
    #[must_use]
    pub fn candidates(&self, metric: Metric) -> &[String] {
        match metric {
            Metric::Revenue => &self.revenue,
            Metric::OperatingIncome => &self.operating_income,
            Metric::NetIncome => &self.net_income,
            Metric::Equity => &self.equity,
        }
    }

    /// Replaces the candidates for a metric.
    #[must_use]
    pub fn with_candidates<I, S>(mut self, metric: Metric, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = candidates.into_iter().map(Into::into).collect();
        match metric {
            Metric::Revenue => self.revenue = list,
            Metric::OperatingIncome => self.operating_income = list,
            Metric::NetIncome => self.net_income = list,
            Metric::Equity => self.equity = list,
        }
        self
    }

    /// Returns true if `label` contains any candidate of `metric`.
    #[must_use]
    pub fn matches(&self, metric: Metric, label: &str) -> bool {
        label_matches(label, self.candidates(metric))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Returns true if `label` contains any of `candidates` as a substring.
#[must_use]
pub fn label_matches<S: AsRef<str>>(label: &str, candidates: &[S]) -> bool {
    candidates.iter().any(|c| label.contains(c.as_ref()))
}

/// Returns the first fact (in iteration order) whose label matches any candidate.
pub fn find_fact<'a, I, S>(facts: I, candidates: &[S]) -> Option<&'a Fact>
where
    I: IntoIterator<Item = &'a Fact>,
    S: AsRef<str>,
{
    facts
        .into_iter()
        .find(|fact| label_matches(fact.label(), candidates))
}

/// Returns the amount of the first matching fact.
///
/// A matching fact with a blank amount yields `None`; the search does not
/// continue past it.
pub fn pick_amount<'a, I, S>(facts: I, candidates: &[S]) -> Option<f64>
where
    I: IntoIterator<Item = &'a Fact>,
    S: AsRef<str>,
{
    find_fact(facts, candidates)
        .and_then(|fact| fact.amount)
        .filter(|amount| amount.is_finite())
}
