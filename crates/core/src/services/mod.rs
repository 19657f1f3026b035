pub mod holdings_resolver;
pub mod portfolio_service;
pub mod settlement_service;
pub mod valuation_service;
