use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, TtlCache};
use crate::config::CacheConfig;
use crate::errors::CoreError;
use crate::models::fund::FundMetadata;
use crate::models::holding::HoldingEntry;
use crate::models::instrument::{Exchange, Instrument};
use crate::models::quote::Quote;

use super::traits::{FundDataProvider, QuoteProvider};

/// Wraps a `QuoteProvider` with a TTL cache keyed by quote code.
/// Only successful quotes are cached.
pub struct CachedQuoteProvider {
    inner: Arc<dyn QuoteProvider>,
    cache: Arc<dyn Cache<Quote>>,
    ttl: Duration,
}

impl CachedQuoteProvider {
    pub fn new(inner: Arc<dyn QuoteProvider>, cache: Arc<dyn Cache<Quote>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    /// Wrap `inner` with a fresh in-memory cache.
    pub fn in_memory(inner: Arc<dyn QuoteProvider>, ttl: Duration) -> Self {
        Self::new(inner, Arc::new(TtlCache::new()), ttl)
    }
}

#[async_trait]
impl QuoteProvider for CachedQuoteProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supported_exchanges(&self) -> Vec<Exchange> {
        self.inner.supported_exchanges()
    }

    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, CoreError> {
        let key = instrument.quote_code();
        if let Some(quote) = self.cache.get(&key) {
            debug!("quote cache hit for {key}");
            return Ok(quote);
        }
        let quote = self.inner.fetch_quote(instrument).await?;
        self.cache.put(&key, quote.clone(), self.ttl);
        Ok(quote)
    }
}

/// Per-kind caches used by `CachedFundDataProvider`.
pub struct FundDataCaches {
    pub metadata: Arc<dyn Cache<Option<FundMetadata>>>,
    pub holdings: Arc<dyn Cache<Vec<HoldingEntry>>>,
    pub masters: Arc<dyn Cache<Option<String>>>,
    pub documents: Arc<dyn Cache<Option<String>>>,
}

impl FundDataCaches {
    pub fn in_memory() -> Self {
        Self {
            metadata: Arc::new(TtlCache::new()),
            holdings: Arc::new(TtlCache::new()),
            masters: Arc::new(TtlCache::new()),
            documents: Arc::new(TtlCache::new()),
        }
    }
}

impl Default for FundDataCaches {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Wraps a `FundDataProvider` with TTL caches keyed by fund id.
///
/// Valid answers, including "unknown fund" and "no holdings", are cached;
/// errors are not, so the next cycle retries.
pub struct CachedFundDataProvider {
    inner: Arc<dyn FundDataProvider>,
    caches: FundDataCaches,
    metadata_ttl: Duration,
    holdings_ttl: Duration,
}

impl CachedFundDataProvider {
    pub fn new(inner: Arc<dyn FundDataProvider>, caches: FundDataCaches, ttls: &CacheConfig) -> Self {
        Self {
            inner,
            caches,
            metadata_ttl: ttls.metadata_ttl(),
            holdings_ttl: ttls.holdings_ttl(),
        }
    }
}

#[async_trait]
impl FundDataProvider for CachedFundDataProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fund_metadata(&self, fund_id: &str) -> Result<Option<FundMetadata>, CoreError> {
        if let Some(hit) = self.caches.metadata.get(fund_id) {
            return Ok(hit);
        }
        let value = self.inner.fund_metadata(fund_id).await?;
        self.caches.metadata.put(fund_id, value.clone(), self.metadata_ttl);
        Ok(value)
    }

    async fn fund_holdings(&self, fund_id: &str) -> Result<Vec<HoldingEntry>, CoreError> {
        if let Some(hit) = self.caches.holdings.get(fund_id) {
            return Ok(hit);
        }
        let value = self.inner.fund_holdings(fund_id).await?;
        self.caches.holdings.put(fund_id, value.clone(), self.holdings_ttl);
        Ok(value)
    }

    async fn master_identifier(&self, fund_id: &str) -> Result<Option<String>, CoreError> {
        if let Some(hit) = self.caches.masters.get(fund_id) {
            return Ok(hit);
        }
        let value = self.inner.master_identifier(fund_id).await?;
        self.caches.masters.put(fund_id, value.clone(), self.holdings_ttl);
        Ok(value)
    }

    async fn auxiliary_document(&self, fund_id: &str) -> Result<Option<String>, CoreError> {
        if let Some(hit) = self.caches.documents.get(fund_id) {
            return Ok(hit);
        }
        let value = self.inner.auxiliary_document(fund_id).await?;
        self.caches.documents.put(fund_id, value.clone(), self.holdings_ttl);
        Ok(value)
    }
}
