use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::fund::FundMetadata;
use crate::models::holding::HoldingEntry;

use super::traits::FundDataProvider;

const NAV_HISTORY_URL: &str = "https://api.fund.eastmoney.com/f10/lsjz";
const ESTIMATE_URL: &str = "https://fundgz.1234567.com.cn/js";
const ARCHIVE_URL: &str = "https://fundf10.eastmoney.com/FundArchivesDatas.aspx";
const OVERVIEW_URL: &str = "https://fundf10.eastmoney.com";
const REFERER: &str = "https://fundf10.eastmoney.com/";
const PROVIDER: &str = "Eastmoney";

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("row pattern"));
static CODE_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<td>(?:<a[^>]*>)?([0-9A-Za-z]{5,6})(?:</a>)?</td>").expect("code pattern")
});
static WEIGHT_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<td class='tor'>(\d+(?:\.\d+)?)%</td>").expect("weight cell pattern")
});
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("weight pattern"));
static MASTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:目标基金|目标ETF|主基金)(?:.{0,80}?[^0-9])?(\d{6})(?:[^0-9]|$)")
        .expect("master pattern")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

/// Eastmoney / Tiantian fund data feeds.
///
/// - **Metadata**: NAV history API (latest settled row) + the `jsonpgz` estimate
///   feed for the display name.
/// - **Holdings**: the quarterly top-10 archive table.
/// - **Master / auxiliary document**: the fund's F10 overview page.
///
/// All payload parsing lives in pure functions below so it can be tested offline.
pub struct EastmoneyFundProvider {
    client: Client,
}

impl EastmoneyFundProvider {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, CoreError> {
        let body = self
            .client
            .get(url)
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    async fn overview_page(&self, fund_id: &str) -> Result<Option<String>, CoreError> {
        let body = self
            .get_text(&format!("{OVERVIEW_URL}/jbgk_{fund_id}.html"))
            .await?;
        Ok(if body.trim().is_empty() { None } else { Some(body) })
    }
}

impl Default for EastmoneyFundProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

// ── Eastmoney API response types ────────────────────────────────────

#[derive(Deserialize)]
struct NavHistoryResponse {
    #[serde(rename = "Data")]
    data: Option<NavHistoryData>,
}

#[derive(Deserialize)]
struct NavHistoryData {
    #[serde(rename = "LSJZList", default)]
    rows: Vec<NavHistoryRow>,
}

#[derive(Deserialize)]
struct NavHistoryRow {
    #[serde(rename = "FSRQ")]
    date: String,
    #[serde(rename = "JZZZL", default)]
    change_percent: String,
}

#[derive(Deserialize)]
struct EstimatePayload {
    name: String,
}

// ── Payload parsers ─────────────────────────────────────────────────

/// Latest settled (date, NAV change %) from the NAV-history JSON.
/// `Ok(None)` when the fund has no history at all.
pub fn parse_nav_history(json: &str) -> Result<Option<(NaiveDate, f64)>, CoreError> {
    let resp: NavHistoryResponse = serde_json::from_str(json)
        .map_err(|e| CoreError::malformed(PROVIDER, format!("NAV history: {e}")))?;

    let Some(row) = resp.data.and_then(|d| d.rows.into_iter().next()) else {
        return Ok(None);
    };

    let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
        CoreError::malformed(PROVIDER, format!("bad settlement date '{}': {e}", row.date))
    })?;

    // Money-market funds publish no daily change.
    let raw = row.change_percent.trim();
    let change = if raw.is_empty() || raw == "--" {
        0.0
    } else {
        raw.parse::<f64>().map_err(|_| {
            CoreError::malformed(PROVIDER, format!("bad NAV change '{raw}'"))
        })?
    };

    Ok(Some((date, change)))
}

/// Display name from a `jsonpgz({...});` body. `None` for an empty wrapper.
pub fn parse_estimate_name(body: &str) -> Option<String> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    let payload: EstimatePayload = serde_json::from_str(&body[start..=end]).ok()?;
    let name = payload.name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Holdings from the archive table. Only the first (most recent) table is read.
pub fn parse_holdings_table(body: &str) -> Vec<HoldingEntry> {
    let latest = match body.find("<table") {
        Some(first) => {
            let rest = &body[first + 1..];
            match rest.find("<table") {
                Some(second) => &body[first..first + 1 + second],
                None => &body[first..],
            }
        }
        None => return Vec::new(),
    };

    ROW_RE
        .captures_iter(latest)
        .filter_map(|row| {
            let row = row.get(1)?.as_str();
            let code = CODE_CELL_RE.captures(row)?.get(1)?.as_str();
            let weight: f64 = WEIGHT_CELL_RE
                .captures(row)
                .or_else(|| WEIGHT_RE.captures(row))?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            Some(HoldingEntry::new(code, weight))
        })
        .collect()
}

/// Master fund code named on a feeder fund's overview page.
pub fn find_master_identifier(document: &str, fund_id: &str) -> Option<String> {
    MASTER_RE
        .captures_iter(document)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .find(|code| code != fund_id)
}

/// Overview page reduced to plain text.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

#[async_trait]
impl FundDataProvider for EastmoneyFundProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fund_metadata(&self, fund_id: &str) -> Result<Option<FundMetadata>, CoreError> {
        debug!("Fetching NAV history for {fund_id} from {PROVIDER}");
        let json = self
            .get_text(&format!(
                "{NAV_HISTORY_URL}?fundCode={fund_id}&pageIndex=1&pageSize=1"
            ))
            .await?;
        let Some((date, change)) = parse_nav_history(&json)? else {
            return Ok(None);
        };

        let display_name = match self.get_text(&format!("{ESTIMATE_URL}/{fund_id}.js")).await {
            Ok(body) => parse_estimate_name(&body),
            Err(e) => {
                warn!("{PROVIDER}: no display name for {fund_id}: {e}");
                None
            }
        }
        .unwrap_or_else(|| fund_id.to_string());

        Ok(Some(FundMetadata {
            display_name,
            official_return_percent: change,
            official_settlement_date: date,
        }))
    }

    async fn fund_holdings(&self, fund_id: &str) -> Result<Vec<HoldingEntry>, CoreError> {
        debug!("Fetching top holdings for {fund_id} from {PROVIDER}");
        let body = self
            .get_text(&format!("{ARCHIVE_URL}?type=jjcc&code={fund_id}&topline=10"))
            .await?;
        Ok(parse_holdings_table(&body))
    }

    async fn master_identifier(&self, fund_id: &str) -> Result<Option<String>, CoreError> {
        let page = self.overview_page(fund_id).await?;
        Ok(page.and_then(|p| find_master_identifier(&strip_tags(&p), fund_id)))
    }

    async fn auxiliary_document(&self, fund_id: &str) -> Result<Option<String>, CoreError> {
        Ok(self.overview_page(fund_id).await?.map(|p| strip_tags(&p)))
    }
}
