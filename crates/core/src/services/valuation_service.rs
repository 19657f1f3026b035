use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{NetworkConfig, TrackingConfig};
use crate::errors::CoreError;
use crate::models::fund::{EstimateStatus, LiveEstimate};
use crate::models::holding::WeightedHolding;
use crate::models::instrument::Instrument;
use crate::models::quote::Quote;
use crate::providers::traits::QuoteProvider;

/// Turns a fund's resolved holdings into a live return estimate.
///
/// Quotes for distinct instruments are fetched concurrently (bounded), each
/// under a timeout with at most one retry. A failed fetch degrades that one
/// instrument to a zero-change quote; its weight still counts.
///
/// `estimate = Σ(change_i × w_i) / Σ w_i × factor`, where the denominator is
/// the weight actually disclosed, not 100.
pub struct ValuationService {
    quotes: Arc<dyn QuoteProvider>,
    tracking: TrackingConfig,
    concurrency: usize,
    timeout: Duration,
    retries: u8,
}

impl ValuationService {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        tracking: TrackingConfig,
        network: &NetworkConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            quotes,
            tracking,
            concurrency: concurrency.max(1),
            timeout: network.quote_timeout(),
            retries: network.retries.min(1),
        }
    }

    /// Tracking-adjustment factor for a fund's display name.
    pub fn factor_for(&self, display_name: &str) -> f64 {
        self.tracking.factor_for(display_name)
    }

    /// Estimate the intraday return of a fund from its holdings.
    pub async fn estimate(&self, holdings: &[WeightedHolding], display_name: &str) -> LiveEstimate {
        if holdings.is_empty() {
            return LiveEstimate::no_data();
        }

        let mut distinct: Vec<Instrument> = Vec::new();
        for h in holdings {
            if !distinct.contains(&h.instrument) {
                distinct.push(h.instrument.clone());
            }
        }

        let results: Vec<(Instrument, Result<Quote, CoreError>)> = stream::iter(distinct)
            .map(|instrument| async move {
                let result = self.fetch_with_budget(&instrument).await;
                (instrument, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut changes: HashMap<Instrument, f64> = HashMap::new();
        let mut quoted = 0;
        let mut fallbacks = 0;
        for (instrument, result) in results {
            let quote = match result {
                Ok(q) => {
                    quoted += 1;
                    q
                }
                Err(e) => {
                    warn!("quote for {instrument} unavailable, using zero change: {e}");
                    fallbacks += 1;
                    Quote::flat(instrument.clone())
                }
            };
            changes.insert(instrument, quote.change_percent());
        }

        let factor = self.factor_for(display_name);
        let mut estimate = weighted_estimate(holdings, &changes, factor);
        estimate.quoted = quoted;
        estimate.fallbacks = fallbacks;
        debug!(
            "estimate for '{display_name}': raw {:.4}% × {factor} = {:.4}% ({quoted} quoted, {fallbacks} fallbacks)",
            estimate.raw_return_percent, estimate.return_percent
        );
        estimate
    }

    /// One bounded attempt, plus one retry if configured.
    async fn fetch_with_budget(&self, instrument: &Instrument) -> Result<Quote, CoreError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.quotes.fetch_quote(instrument)).await {
                Ok(r) => r,
                Err(_) => Err(CoreError::unavailable(
                    self.quotes.name(),
                    format!("timed out after {:?} for {instrument}", self.timeout),
                )),
            };
            match result {
                Err(e) if attempt < self.retries && e.is_recoverable() => {
                    debug!("retrying {instrument} after: {e}");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Weighted estimate from per-instrument changes. Instruments missing from
/// `changes` count as zero change. Zero total weight is "no data".
pub fn weighted_estimate(
    holdings: &[WeightedHolding],
    changes: &HashMap<Instrument, f64>,
    factor: f64,
) -> LiveEstimate {
    let (weighted_sum, total_weight) = holdings.iter().fold((0.0, 0.0), |(sum, total), h| {
        let change = changes.get(&h.instrument).copied().unwrap_or(0.0);
        (sum + change * h.weight_percent, total + h.weight_percent)
    });

    if total_weight <= 0.0 {
        return LiveEstimate::no_data();
    }

    let raw = weighted_sum / total_weight;
    LiveEstimate {
        return_percent: raw * factor,
        raw_return_percent: raw,
        factor,
        status: EstimateStatus::Estimated,
        quoted: 0,
        fallbacks: 0,
    }
}
