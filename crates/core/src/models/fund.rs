use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What the fund-data provider knows about a fund's last official NAV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMetadata {
    pub display_name: String,

    /// Official NAV change of the last settled day, in percent.
    pub official_return_percent: f64,

    /// The trading day `official_return_percent` belongs to.
    pub official_settlement_date: NaiveDate,
}

/// Whether a live estimate is backed by resolved holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateStatus {
    /// Computed from at least one resolved holding.
    Estimated,
    /// No look-through holdings were available; the `0.0` is not a real move.
    NoDataAvailable,
}

/// Holdings-weighted intraday return estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEstimate {
    /// Final estimate after the tracking adjustment, in percent.
    pub return_percent: f64,

    /// Weighted average before the tracking adjustment.
    pub raw_return_percent: f64,

    /// Tracking-adjustment factor applied.
    pub factor: f64,

    pub status: EstimateStatus,

    /// Distinct instruments with a live quote.
    pub quoted: usize,

    /// Distinct instruments that fell back to a zero-change quote.
    pub fallbacks: usize,
}

impl LiveEstimate {
    pub fn no_data() -> Self {
        Self {
            return_percent: 0.0,
            raw_return_percent: 0.0,
            factor: 1.0,
            status: EstimateStatus::NoDataAvailable,
            quoted: 0,
            fallbacks: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == EstimateStatus::Estimated
    }
}

/// Per-cycle snapshot of one fund: official data plus the live estimate.
/// Rebuilt on every evaluation, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    pub fund_id: String,
    pub display_name: String,
    pub official_return_percent: f64,
    pub official_settlement_date: NaiveDate,
    pub live_estimate: LiveEstimate,
}

impl FundRecord {
    pub fn new(fund_id: impl Into<String>, metadata: FundMetadata, live_estimate: LiveEstimate) -> Self {
        Self {
            fund_id: fund_id.into(),
            display_name: metadata.display_name,
            official_return_percent: metadata.official_return_percent,
            official_settlement_date: metadata.official_settlement_date,
            live_estimate,
        }
    }

    pub fn live_estimate_return_percent(&self) -> f64 {
        self.live_estimate.return_percent
    }
}
