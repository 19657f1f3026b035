use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::analytics::{FundValuation, PortfolioSummary, PositionOutcome, PositionValuation};
use crate::models::fund::{FundMetadata, FundRecord};
use crate::models::portfolio::Position;
use crate::providers::traits::FundDataProvider;

use super::holdings_resolver::HoldingsResolver;
use super::settlement_service::SettlementService;
use super::valuation_service::ValuationService;

/// Values funds and whole portfolios.
///
/// Per fund: metadata first (an unknown fund stops there, before any
/// look-through traffic), then look-through, the live estimate and the
/// settlement decision. Positions are evaluated with
/// bounded parallelism; results are merged by a single reducer.
pub struct PortfolioService {
    fund_data: Arc<dyn FundDataProvider>,
    resolver: HoldingsResolver,
    valuation: ValuationService,
    settlement: SettlementService,
    concurrency: usize,
    metadata_timeout: Duration,
}

impl PortfolioService {
    pub fn new(
        fund_data: Arc<dyn FundDataProvider>,
        resolver: HoldingsResolver,
        valuation: ValuationService,
        settlement: SettlementService,
        concurrency: usize,
        metadata_timeout: Duration,
    ) -> Self {
        Self {
            fund_data,
            resolver,
            valuation,
            settlement,
            concurrency: concurrency.max(1),
            metadata_timeout,
        }
    }

    pub fn resolver(&self) -> &HoldingsResolver {
        &self.resolver
    }

    pub fn valuation(&self) -> &ValuationService {
        &self.valuation
    }

    pub fn settlement(&self) -> &SettlementService {
        &self.settlement
    }

    async fn metadata(&self, fund_id: &str) -> Result<FundMetadata, CoreError> {
        let fetched = tokio::time::timeout(self.metadata_timeout, self.fund_data.fund_metadata(fund_id))
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::unavailable(
                    self.fund_data.name(),
                    format!("metadata for {fund_id} timed out"),
                ))
            });

        match fetched {
            Ok(Some(metadata)) => Ok(metadata),
            Ok(None) => Err(CoreError::UnresolvableFund(fund_id.to_string())),
            Err(e) => {
                warn!("metadata for {fund_id} unavailable: {e}");
                Err(CoreError::UnresolvableFund(fund_id.to_string()))
            }
        }
    }

    /// Value a single fund at exchange-local time `now`.
    ///
    /// Fails only with `CoreError::UnresolvableFund`; every other provider
    /// failure degrades to a neutral value inside the valuation.
    pub async fn value_fund_at(&self, fund_id: &str, now: NaiveDateTime) -> Result<FundValuation, CoreError> {
        let fund_id = fund_id.trim();
        let metadata = self.metadata(fund_id).await?;
        let holdings = self.resolver.resolve(fund_id).await;

        let estimate = self
            .valuation
            .estimate(&holdings.holdings, &metadata.display_name)
            .await;
        let record = FundRecord::new(fund_id, metadata, estimate);
        let decision = self.settlement.decide(&record, now);

        Ok(FundValuation {
            record,
            holdings,
            decision,
        })
    }

    /// Evaluate every position at exchange-local time `now`.
    pub async fn evaluate_at(&self, positions: &[Position], now: NaiveDateTime) -> PortfolioSummary {
        let valuations: Vec<PositionValuation> = stream::iter(positions.iter().cloned())
            .map(|position| async move {
                let outcome = match self.value_fund_at(&position.fund_id, now).await {
                    Ok(valuation) => PositionOutcome::Valued {
                        profit_loss: position_profit_loss(
                            position.held_amount,
                            valuation.authoritative_return_percent(),
                        ),
                        valuation: Box::new(valuation),
                    },
                    Err(e) => {
                        warn!("position {} left unvalued: {e}", position.fund_id);
                        PositionOutcome::Unresolvable
                    }
                };
                PositionValuation { position, outcome }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let summary = summarize(valuations);
        info!(
            "evaluated {} positions: principal {:.2}, P/L {:.2} ({:.2}%), unresolved {:.2}",
            summary.positions.len(),
            summary.total_principal,
            summary.total_profit_loss,
            summary.blended_return_percent,
            summary.unresolved_principal
        );
        summary
    }
}

/// `held_amount × return / 100`. Negative or non-finite amounts count as zero.
pub fn position_profit_loss(held_amount: f64, return_percent: f64) -> f64 {
    principal(held_amount) * return_percent / 100.0
}

fn principal(held_amount: f64) -> f64 {
    if held_amount.is_finite() && held_amount > 0.0 {
        held_amount
    } else {
        0.0
    }
}

/// Fold per-position results into portfolio totals. Unresolvable positions
/// are excluded from the principal and reported separately.
pub fn summarize(positions: Vec<PositionValuation>) -> PortfolioSummary {
    let mut total_principal = 0.0;
    let mut total_profit_loss = 0.0;
    let mut unresolved_principal = 0.0;

    for p in &positions {
        let amount = principal(p.position.held_amount);
        match &p.outcome {
            PositionOutcome::Valued { profit_loss, .. } => {
                total_principal += amount;
                total_profit_loss += profit_loss;
            }
            PositionOutcome::Unresolvable => unresolved_principal += amount,
        }
    }

    let blended_return_percent = if total_principal > 0.0 {
        total_profit_loss / total_principal * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        total_principal,
        total_profit_loss,
        blended_return_percent,
        unresolved_principal,
        positions,
    }
}
