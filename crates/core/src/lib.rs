pub mod cache;
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Asia::Shanghai;
use std::sync::Arc;

use config::EngineConfig;
use errors::CoreError;
use models::{
    analytics::{FundValuation, PortfolioSummary},
    portfolio::Position,
};
use providers::{
    cached::{CachedFundDataProvider, CachedQuoteProvider, FundDataCaches},
    eastmoney::EastmoneyFundProvider,
    registry::QuoteProviderRegistry,
    tencent::TencentQuoteProvider,
    traits::{FundDataProvider, QuoteProvider},
};
use services::{
    holdings_resolver::HoldingsResolver, portfolio_service::PortfolioService,
    settlement_service::SettlementService, valuation_service::ValuationService,
};

/// Main entry point for the fund valuation core library.
/// Holds the configured services; every evaluation is computed fresh.
#[must_use]
pub struct FundValuationEngine {
    config: EngineConfig,
    portfolio_service: PortfolioService,
}

impl std::fmt::Debug for FundValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundValuationEngine")
            .field("max_depth", &self.config.resolution.max_depth)
            .field("quote_concurrency", &self.config.concurrency.quotes)
            .field("position_concurrency", &self.config.concurrency.positions)
            .finish()
    }
}

impl FundValuationEngine {
    /// Build an engine over the given providers. Callers wanting caching wrap
    /// the providers in `CachedQuoteProvider` / `CachedFundDataProvider` first.
    pub fn new(
        config: EngineConfig,
        quotes: Arc<dyn QuoteProvider>,
        fund_data: Arc<dyn FundDataProvider>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let resolver = HoldingsResolver::new(
            fund_data.clone(),
            &config.resolution,
            config.network.fund_data_timeout(),
        );
        let valuation = ValuationService::new(
            quotes,
            config.tracking.clone(),
            &config.network,
            config.concurrency.quotes,
        );
        let settlement = SettlementService::new(config.session.clone());
        let portfolio_service = PortfolioService::new(
            fund_data,
            resolver,
            valuation,
            settlement,
            config.concurrency.positions,
            config.network.fund_data_timeout(),
        );

        Ok(Self {
            config,
            portfolio_service,
        })
    }

    /// Build an engine over the built-in HTTP feeds, each behind a TTL cache.
    pub fn with_default_providers(config: EngineConfig) -> Result<Self, CoreError> {
        let mut registry = QuoteProviderRegistry::new();
        registry.register(Box::new(TencentQuoteProvider::new(config.network.quote_timeout())));

        let quotes: Arc<dyn QuoteProvider> = Arc::new(CachedQuoteProvider::in_memory(
            Arc::new(registry),
            config.cache.quote_ttl(),
        ));
        let fund_data: Arc<dyn FundDataProvider> = Arc::new(CachedFundDataProvider::new(
            Arc::new(EastmoneyFundProvider::new(config.network.fund_data_timeout())),
            FundDataCaches::in_memory(),
            &config.cache,
        ));

        Self::new(config, quotes, fund_data)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current exchange-local (Asia/Shanghai) wall-clock time.
    pub fn market_now() -> NaiveDateTime {
        Utc::now().with_timezone(&Shanghai).naive_local()
    }

    // ── Funds ───────────────────────────────────────────────────────

    /// Value one fund now.
    pub async fn value_fund(&self, fund_id: &str) -> Result<FundValuation, CoreError> {
        self.value_fund_at(fund_id, Self::market_now()).await
    }

    /// Value one fund at a given exchange-local time.
    pub async fn value_fund_at(
        &self,
        fund_id: &str,
        now: NaiveDateTime,
    ) -> Result<FundValuation, CoreError> {
        self.portfolio_service.value_fund_at(fund_id, now).await
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Evaluate all positions now.
    pub async fn evaluate_portfolio(&self, positions: &[Position]) -> PortfolioSummary {
        self.evaluate_portfolio_at(positions, Self::market_now()).await
    }

    /// Evaluate all positions at a given exchange-local time.
    pub async fn evaluate_portfolio_at(
        &self,
        positions: &[Position],
        now: NaiveDateTime,
    ) -> PortfolioSummary {
        self.portfolio_service.evaluate_at(positions, now).await
    }
}
