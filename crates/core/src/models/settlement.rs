use serde::{Deserialize, Serialize};

/// Where the market stands relative to the trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketPhase {
    PreOpen,
    InSession,
    LunchBreak,
    AfterClose,
    /// Weekend or market holiday: the last official NAV stands.
    WeekendSettled,
}

impl std::fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketPhase::PreOpen => write!(f, "PRE_OPEN"),
            MarketPhase::InSession => write!(f, "IN_SESSION"),
            MarketPhase::LunchBreak => write!(f, "LUNCH_BREAK"),
            MarketPhase::AfterClose => write!(f, "AFTER_CLOSE"),
            MarketPhase::WeekendSettled => write!(f, "WEEKEND_SETTLED"),
        }
    }
}

/// Which return figure is authoritative for profit/loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnSource {
    Official,
    Estimate,
}

impl std::fmt::Display for ReturnSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnSource::Official => write!(f, "OFFICIAL"),
            ReturnSource::Estimate => write!(f, "ESTIMATE"),
        }
    }
}

/// Derived per request; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementDecision {
    pub authoritative_return_percent: f64,
    pub source_used: ReturnSource,
    pub phase: MarketPhase,
    pub status_label: String,
}
