pub mod cached;
pub mod registry;
pub mod traits;

// HTTP data feeds
pub mod eastmoney;
pub mod tencent;
