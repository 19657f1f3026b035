use serde::{Deserialize, Serialize};

use super::instrument::Instrument;

/// A holding entry exactly as a fund-data provider reports it, before
/// classification. `symbol` may be bare or exchange-prefixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingEntry {
    pub symbol: String,
    pub weight_percent: f64,
}

impl HoldingEntry {
    pub fn new(symbol: impl Into<String>, weight_percent: f64) -> Self {
        Self {
            symbol: symbol.into(),
            weight_percent,
        }
    }
}

/// A directly tradable equity and its share of the fund, in percent (0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedHolding {
    pub instrument: Instrument,
    pub weight_percent: f64,
}

impl WeightedHolding {
    pub fn new(instrument: Instrument, weight_percent: f64) -> Self {
        Self {
            instrument,
            weight_percent,
        }
    }
}

/// Outcome of a look-through resolution.
///
/// An empty `holdings` list is a valid terminal state (e.g. a bond fund):
/// no look-through is available for that fund.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHoldings {
    /// The fund the resolution started from.
    pub fund_id: String,

    /// The identifier whose holdings were finally used, if any.
    pub source_id: Option<String>,

    /// Identifiers walked, in order, starting with `fund_id`.
    pub path: Vec<String>,

    pub holdings: Vec<WeightedHolding>,
}

impl ResolvedHoldings {
    pub fn empty(fund_id: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            fund_id: fund_id.into(),
            source_id: None,
            path,
            holdings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Sum of the disclosed weights actually resolved.
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight_percent).sum()
    }
}
