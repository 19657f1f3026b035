use serde::{Deserialize, Serialize};

use super::fund::FundRecord;
use super::holding::ResolvedHoldings;
use super::portfolio::Position;
use super::settlement::SettlementDecision;

/// Everything computed for one fund in one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundValuation {
    pub record: FundRecord,
    pub holdings: ResolvedHoldings,
    pub decision: SettlementDecision,
}

impl FundValuation {
    /// The return that feeds profit/loss, in percent.
    pub fn authoritative_return_percent(&self) -> f64 {
        self.decision.authoritative_return_percent
    }
}

/// Result for a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionOutcome {
    Valued {
        valuation: Box<FundValuation>,
        /// held_amount × authoritative return / 100
        profit_loss: f64,
    },
    /// No metadata could be found for the fund; nothing is fabricated.
    Unresolvable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub position: Position,
    pub outcome: PositionOutcome,
}

impl PositionValuation {
    pub fn profit_loss(&self) -> Option<f64> {
        match &self.outcome {
            PositionOutcome::Valued { profit_loss, .. } => Some(*profit_loss),
            PositionOutcome::Unresolvable => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, PositionOutcome::Valued { .. })
    }
}

/// Summary of the whole portfolio for one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Sum of held amounts of resolved positions
    pub total_principal: f64,

    /// Sum of per-position profit/loss
    pub total_profit_loss: f64,

    /// total_profit_loss / total_principal × 100, or 0 with no principal
    pub blended_return_percent: f64,

    /// Held amounts of positions whose fund could not be resolved
    pub unresolved_principal: f64,

    /// Per-position breakdown, in input order
    pub positions: Vec<PositionValuation>,
}
