pub mod analytics;
pub mod fund;
pub mod holding;
pub mod instrument;
pub mod portfolio;
pub mod quote;
pub mod settlement;
