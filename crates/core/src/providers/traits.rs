use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::fund::FundMetadata;
use crate::models::holding::HoldingEntry;
use crate::models::instrument::{Exchange, Instrument};
use crate::models::quote::Quote;

/// Source of live quotes.
///
/// Failures are expected and common; callers substitute a zero-change quote.
/// Implementations make a single bounded attempt per call.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which exchanges this provider can quote. Defaults to all of them.
    fn supported_exchanges(&self) -> Vec<Exchange> {
        vec![Exchange::Sh, Exchange::Sz, Exchange::Hk, Exchange::Beijing]
    }

    /// Current price / previous close for an instrument. The instrument
    /// already carries its exchange routing.
    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, CoreError>;
}

/// Source of fund metadata and holdings disclosures.
#[async_trait]
pub trait FundDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Display name and last official NAV change.
    /// `Ok(None)` means the provider does not know this fund.
    async fn fund_metadata(&self, fund_id: &str) -> Result<Option<FundMetadata>, CoreError>;

    /// Disclosed top holdings, unclassified. Empty is a valid answer
    /// (feeder share classes and bond funds publish none).
    async fn fund_holdings(&self, fund_id: &str) -> Result<Vec<HoldingEntry>, CoreError>;

    /// Same-family master fund whose holdings a feeder shares, if any.
    async fn master_identifier(&self, fund_id: &str) -> Result<Option<String>, CoreError>;

    /// Free-form document about the fund (overview page, prospectus
    /// excerpt) that may mention the basket it tracks.
    async fn auxiliary_document(&self, fund_id: &str) -> Result<Option<String>, CoreError>;
}
