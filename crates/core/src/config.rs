use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Engine configuration. Every section has sensible defaults, so a JSON file
/// only needs the values it wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tracking: TrackingConfig,
    pub session: SessionConfig,
    pub resolution: ResolutionConfig,
    pub concurrency: ConcurrencyConfig,
    pub network: NetworkConfig,
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracking: TrackingConfig::default(),
            session: SessionConfig::default(),
            resolution: ResolutionConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            network: NetworkConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(CoreError::from)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let valid_factor = |f: f64| f.is_finite() && f > 0.0 && f <= 2.0;

        if !valid_factor(self.tracking.default_factor) {
            return Err(CoreError::InvalidConfig(format!(
                "default tracking factor {} must be in (0, 2]",
                self.tracking.default_factor
            )));
        }
        for rule in &self.tracking.rules {
            if !valid_factor(rule.factor) {
                return Err(CoreError::InvalidConfig(format!(
                    "tracking factor {} for {:?} must be in (0, 2]",
                    rule.factor, rule.keywords
                )));
            }
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(CoreError::InvalidConfig(
                    "tracking rule needs at least one non-empty keyword".into(),
                ));
            }
        }

        let s = &self.session;
        if !(s.open < s.lunch_start && s.lunch_start <= s.lunch_end && s.lunch_end < s.close) {
            return Err(CoreError::InvalidConfig(format!(
                "session boundaries out of order: open {} lunch {}-{} close {}",
                s.open, s.lunch_start, s.lunch_end, s.close
            )));
        }
        if s.overseas_close < s.close {
            return Err(CoreError::InvalidConfig(format!(
                "overseas close {} is earlier than domestic close {}",
                s.overseas_close, s.close
            )));
        }

        if self.resolution.max_depth == 0 {
            return Err(CoreError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.resolution.max_holdings == 0 {
            return Err(CoreError::InvalidConfig("max_holdings must be at least 1".into()));
        }
        if self.concurrency.quotes == 0 || self.concurrency.positions == 0 {
            return Err(CoreError::InvalidConfig("concurrency limits must be at least 1".into()));
        }
        if self.network.retries > 1 {
            return Err(CoreError::InvalidConfig(format!(
                "retries {} exceeds the budget of one retry",
                self.network.retries
            )));
        }
        if self.network.quote_timeout_ms == 0 || self.network.fund_data_timeout_ms == 0 {
            return Err(CoreError::InvalidConfig("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

// ── Tracking adjustment ─────────────────────────────────────────────

/// Keyword rule: a display name containing any keyword uses `factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRule {
    pub keywords: Vec<String>,
    pub factor: f64,
}

impl TrackingRule {
    pub fn new(keywords: &[&str], factor: f64) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            factor,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && name.contains(&k))
    }
}

/// Factor table correcting the top-10 weighted estimate for undisclosed
/// holdings, cash drag and tracking error. Rules are checked in order; the
/// first match wins, otherwise `default_factor` (actively managed funds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub rules: Vec<TrackingRule>,
    pub default_factor: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                TrackingRule::new(&["纳斯达克", "纳指", "标普", "nasdaq", "s&p"], 0.96),
                TrackingRule::new(&["恒生", "港股", "hang seng"], 0.97),
                TrackingRule::new(&["etf", "联接", "指数", "index", "lof"], 0.99),
            ],
            default_factor: 0.92,
        }
    }
}

impl TrackingConfig {
    /// Factor for a fund, keyed by keyword match against its display name.
    pub fn factor_for(&self, display_name: &str) -> f64 {
        let name = display_name.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&name))
            .map(|r| r.factor)
            .unwrap_or(self.default_factor)
    }
}

// ── Trading session ─────────────────────────────────────────────────

/// Exchange-local session boundaries and the market calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub open: NaiveTime,
    pub lunch_start: NaiveTime,
    pub lunch_end: NaiveTime,
    /// Close for funds tracking the domestic market.
    pub close: NaiveTime,
    /// Later close for funds tracking overseas / cross-border markets.
    pub overseas_close: NaiveTime,
    /// Display-name keywords marking an overseas / cross-border fund.
    pub overseas_keywords: Vec<String>,
    /// Weekday market holidays, treated like weekends.
    pub holidays: Vec<NaiveDate>,
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open: hm(9, 30),
            lunch_start: hm(11, 30),
            lunch_end: hm(13, 0),
            close: hm(15, 0),
            overseas_close: hm(16, 0),
            overseas_keywords: ["qdii", "纳斯达克", "纳指", "标普", "恒生", "港股", "海外", "全球", "美国"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            holidays: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_overseas(&self, display_name: &str) -> bool {
        let name = display_name.to_lowercase();
        self.overseas_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && name.contains(&k))
    }

    /// Closing time that applies to a fund, by its display name.
    pub fn close_for(&self, display_name: &str) -> NaiveTime {
        if self.is_overseas(display_name) {
            self.overseas_close
        } else {
            self.close
        }
    }
}

// ── Look-through, concurrency, network, cache ───────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Hard ceiling on look-through recursion.
    pub max_depth: usize,
    /// Holdings kept per fund (source data discloses the top 10).
    pub max_holdings: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_holdings: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Quote fetches in flight per fund.
    pub quotes: usize,
    /// Positions evaluated in parallel.
    pub positions: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            quotes: 8,
            positions: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub quote_timeout_ms: u64,
    pub fund_data_timeout_ms: u64,
    /// Extra attempts after a failed fetch: 0 or 1.
    pub retries: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            quote_timeout_ms: 2000,
            fund_data_timeout_ms: 3000,
            retries: 0,
        }
    }
}

impl NetworkConfig {
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    pub fn fund_data_timeout(&self) -> Duration {
        Duration::from_millis(self.fund_data_timeout_ms)
    }
}

/// Time-to-live per kind of data: live quotes shortest, holdings longest
/// (composition only changes with quarterly reports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub quote_ttl_secs: u64,
    pub metadata_ttl_secs: u64,
    pub holdings_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quote_ttl_secs: 20,
            metadata_ttl_secs: 600,
            holdings_ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_ttl_secs)
    }

    pub fn holdings_ttl(&self) -> Duration {
        Duration::from_secs(self.holdings_ttl_secs)
    }
}
