use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use regex::Regex;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::config::ResolutionConfig;
use crate::errors::CoreError;
use crate::models::holding::{HoldingEntry, ResolvedHoldings, WeightedHolding};
use crate::models::instrument::{is_basket_code, Instrument};
use crate::providers::traits::FundDataProvider;

static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern"));

/// Resolves a fund identifier to the directly tradable equities behind it.
///
/// Look-through order at each level:
/// 1. disclosed holdings; if any entry is a basket, follow the first basket;
/// 2. no holdings: follow the feeder's master fund (an already visited master
///    ends the branch);
/// 3. no master: follow the first basket code found in the auxiliary document.
///
/// A `visited` set (passed by value down each branch) and a depth ceiling
/// both bound the recursion. Hitting either yields an empty result; provider
/// failures and calls exceeding `timeout` count as "nothing here". The
/// resolver never returns an error.
pub struct HoldingsResolver {
    provider: Arc<dyn FundDataProvider>,
    max_depth: usize,
    max_holdings: usize,
    timeout: Duration,
}

/// What a single level of the walk produced.
enum Step {
    Equities(Vec<WeightedHolding>),
    Follow(String),
    Dead,
}

impl HoldingsResolver {
    pub fn new(
        provider: Arc<dyn FundDataProvider>,
        config: &ResolutionConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            max_depth: config.max_depth,
            max_holdings: config.max_holdings,
            timeout,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve `fund_id` to a flat list of weighted equity holdings.
    pub async fn resolve(&self, fund_id: &str) -> ResolvedHoldings {
        let fund_id = fund_id.trim();
        let mut path = Vec::new();
        let found = self
            .resolve_level(fund_id.to_string(), HashSet::new(), 0, &mut path)
            .await;

        match found {
            Some((source, holdings)) => {
                debug!(
                    "resolved {fund_id} via {} to {} holdings",
                    path.join(" -> "),
                    holdings.len()
                );
                ResolvedHoldings {
                    fund_id: fund_id.to_string(),
                    source_id: Some(source),
                    path,
                    holdings,
                }
            }
            None => {
                debug!("no look-through available for {fund_id} (walked {})", path.join(" -> "));
                ResolvedHoldings::empty(fund_id, path)
            }
        }
    }

    fn resolve_level<'a>(
        &'a self,
        id: String,
        mut visited: HashSet<String>,
        depth: usize,
        path: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Option<(String, Vec<WeightedHolding>)>> {
        async move {
            if depth >= self.max_depth {
                warn!("look-through depth ceiling {} reached at {id}", self.max_depth);
                return None;
            }
            if !visited.insert(id.clone()) {
                debug!("{id} already visited, stopping this branch");
                return None;
            }
            path.push(id.clone());

            let step = self.step(&id, &visited).await;
            match step {
                Step::Equities(holdings) => Some((id, holdings)),
                Step::Follow(next) => self.resolve_level(next, visited, depth + 1, path).await,
                Step::Dead => None,
            }
        }
        .boxed()
    }

    /// Await one provider call, giving up after `timeout`.
    async fn bounded<T>(
        &self,
        what: &str,
        id: &str,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::unavailable(
                    self.provider.name(),
                    format!("{what} for {id} timed out after {:?}", self.timeout),
                ))
            })
    }

    async fn step(&self, id: &str, visited: &HashSet<String>) -> Step {
        let holdings = self.bounded("holdings", id, self.provider.fund_holdings(id)).await;
        let entries = match holdings {
            Ok(entries) => entries,
            Err(e) => {
                warn!("holdings for {id} unavailable from {}: {e}", self.provider.name());
                Vec::new()
            }
        };

        if !entries.is_empty() {
            if let Some(basket) = first_basket(&entries) {
                debug!("{id} holds basket {basket}, looking through it");
                return Step::Follow(basket);
            }
            let holdings = self.to_weighted(&entries);
            return if holdings.is_empty() {
                Step::Dead
            } else {
                Step::Equities(holdings)
            };
        }

        let master = self.bounded("master lookup", id, self.provider.master_identifier(id)).await;
        match master {
            Ok(Some(master)) => {
                let master = master.trim();
                if visited.contains(master) {
                    debug!("{id} is a feeder of already visited {master}, stopping");
                    return Step::Dead;
                }
                debug!("{id} is a feeder of {master}");
                return Step::Follow(master.to_string());
            }
            Ok(None) => {}
            Err(e) => warn!("master lookup for {id} failed: {e}"),
        }

        let document = self.bounded("auxiliary document", id, self.provider.auxiliary_document(id)).await;
        match document {
            Ok(Some(doc)) => match find_basket_in_document(&doc, visited) {
                Some(basket) => {
                    debug!("{id} document mentions basket {basket}");
                    Step::Follow(basket)
                }
                None => Step::Dead,
            },
            Ok(None) => Step::Dead,
            Err(e) => {
                warn!("auxiliary document for {id} unavailable: {e}");
                Step::Dead
            }
        }
    }

    /// Keep parsable equities with a positive weight, clamp to 100, cap the count.
    fn to_weighted(&self, entries: &[HoldingEntry]) -> Vec<WeightedHolding> {
        entries
            .iter()
            .filter_map(|e| {
                if !e.weight_percent.is_finite() || e.weight_percent <= 0.0 {
                    return None;
                }
                let instrument = Instrument::parse(&e.symbol)?;
                Some(WeightedHolding::new(instrument, e.weight_percent.min(100.0)))
            })
            .take(self.max_holdings)
            .collect()
    }
}

/// Bare code of the first basket entry, in disclosure order.
fn first_basket(entries: &[HoldingEntry]) -> Option<String> {
    entries
        .iter()
        .filter_map(|e| Instrument::parse(&e.symbol))
        .find(|i| i.is_basket)
        .map(|i| i.symbol)
}

/// First basket code embedded in free text that has not been visited yet.
pub fn find_basket_in_document(document: &str, visited: &HashSet<String>) -> Option<String> {
    DIGIT_RUN_RE
        .find_iter(document)
        .map(|m| m.as_str())
        .find(|code| is_basket_code(code) && !visited.contains(*code))
        .map(|code| code.to_string())
}
