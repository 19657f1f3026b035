use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::instrument::{Exchange, Instrument};
use crate::models::quote::Quote;

use super::traits::QuoteProvider;

const BASE_URL: &str = "https://qt.gtimg.cn/q=";
const PROVIDER: &str = "Tencent";

/// Tencent real-time quote feed.
///
/// - **Free**: No API key.
/// - **Coverage**: Shanghai, Shenzhen, Beijing and Hong Kong listings.
/// - **Format**: one `v_<code>="f0~f1~f2~..."` line per request, GBK encoded.
///   Field 3 is the last price, field 4 the previous close, field 30 the
///   exchange-local timestamp.
///
/// Hong Kong codes go through the `r_` (real-time) variant of the feed.
pub struct TencentQuoteProvider {
    client: Client,
}

impl TencentQuoteProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Feed code for an instrument: `sh600519`, `r_hk00700`.
    pub fn feed_code(instrument: &Instrument) -> String {
        match instrument.exchange {
            Exchange::Hk => format!("r_{}", instrument.quote_code()),
            _ => instrument.quote_code(),
        }
    }
}

impl Default for TencentQuoteProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

/// Parse one quote line of the feed into a `Quote`.
pub fn parse_quote_payload(instrument: &Instrument, body: &str) -> Result<Quote, CoreError> {
    if body.contains("pv_none_match") {
        return Err(CoreError::malformed(
            PROVIDER,
            format!("unknown instrument {instrument}"),
        ));
    }

    let start = body.find('"');
    let end = body.rfind('"');
    let content = match (start, end) {
        (Some(s), Some(e)) if e > s + 1 => &body[s + 1..e],
        _ => {
            return Err(CoreError::malformed(
                PROVIDER,
                format!("empty quote body for {instrument}"),
            ))
        }
    };

    let fields: Vec<&str> = content.split('~').collect();
    if fields.len() < 5 {
        return Err(CoreError::malformed(
            PROVIDER,
            format!("expected at least 5 fields for {instrument}, got {}", fields.len()),
        ));
    }

    let price = |idx: usize, label: &str| -> Result<f64, CoreError> {
        let raw = fields[idx].trim();
        let value: f64 = raw.parse().map_err(|_| {
            CoreError::malformed(PROVIDER, format!("bad {label} '{raw}' for {instrument}"))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::malformed(
                PROVIDER,
                format!("invalid {label} {value} for {instrument}"),
            ));
        }
        Ok(value)
    };

    let current = price(3, "price")?;
    let previous = price(4, "previous close")?;

    let mut quote = Quote::new(instrument.clone(), current, previous);
    if let Some(ts) = fields.get(30).and_then(|raw| parse_feed_timestamp(raw)) {
        quote = quote.with_as_of(ts);
    }
    Ok(quote)
}

/// Domestic rows use `20240105150002`, Hong Kong rows `2024/01/05 16:08:01`.
fn parse_feed_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S"))
        .ok()
}

#[async_trait]
impl QuoteProvider for TencentQuoteProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_quote(&self, instrument: &Instrument) -> Result<Quote, CoreError> {
        let url = format!("{BASE_URL}{}", Self::feed_code(instrument));
        debug!("Fetching quote for {instrument} from {PROVIDER}");

        let bytes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        // Only ASCII numeric fields are read; the GBK name field may be lossy.
        let body = String::from_utf8_lossy(&bytes);
        parse_quote_payload(instrument, &body)
    }
}
