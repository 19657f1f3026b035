use async_trait::async_trait;
use log::debug;

use crate::errors::CoreError;
use crate::models::instrument::{Exchange, Instrument};
use crate::models::quote::Quote;

use super::traits::QuoteProvider;

/// Registry of quote providers, routed by exchange.
///
/// Providers are tried in registration order; if the first one supporting an
/// exchange fails, the next one gets a single attempt. The registry is itself
/// a `QuoteProvider`, so services never see the routing.
pub struct QuoteProviderRegistry {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl QuoteProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a new quote provider.
    pub fn register(&mut self, provider: Box<dyn QuoteProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given exchange.
    pub fn get_provider_for(&self, exchange: Exchange) -> Option<&dyn QuoteProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_exchanges().contains(&exchange))
            .map(|p| p.as_ref())
    }

    /// Return ALL providers that support the given exchange, ordered by registration priority.
    pub fn get_providers_for(&self, exchange: Exchange) -> Vec<&dyn QuoteProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_exchanges().contains(&exchange))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for QuoteProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for QuoteProviderRegistry {
    fn name(&self) -> &str {
        "Registry"
    }

    fn supported_exchanges(&self) -> Vec<Exchange> {
        let mut exchanges: Vec<Exchange> = Vec::new();
        for p in &self.providers {
            for ex in p.supported_exchanges() {
                if !exchanges.contains(&ex) {
                    exchanges.push(ex);
                }
            }
        }
        exchanges
    }

    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, CoreError> {
        let providers = self.get_providers_for(instrument.exchange);
        if providers.is_empty() {
            return Err(CoreError::unavailable(
                "Registry",
                format!("no quote provider for exchange {}", instrument.exchange),
            ));
        }

        let mut last_error = None;
        for provider in providers {
            match provider.fetch_quote(instrument).await {
                Ok(quote) => return Ok(quote),
                Err(e) => {
                    debug!("{} failed for {}: {}", provider.name(), instrument, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CoreError::unavailable("Registry", format!("no quote for {instrument}"))
        }))
    }
}
