use serde::{Deserialize, Serialize};

/// Code prefixes of exchange-traded baskets (ETFs / LOFs) on the domestic exchanges.
/// A basket is itself resolvable like a fund.
pub const BASKET_PREFIXES: [&str; 4] = ["159", "51", "56", "58"];

/// The venue a ticker routes to. Determines the quote-feed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Shanghai Stock Exchange
    Sh,
    /// Shenzhen Stock Exchange
    Sz,
    /// Hong Kong Exchange
    Hk,
    /// Beijing Stock Exchange
    Beijing,
}

impl Exchange {
    /// Routing prefix used by real-time quote feeds (`sh600519`, `hk00700`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
            Exchange::Hk => "hk",
            Exchange::Beijing => "bj",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Sh),
            "sz" => Some(Exchange::Sz),
            "hk" => Some(Exchange::Hk),
            "bj" => Some(Exchange::Beijing),
            _ => None,
        }
    }

    /// Derive the venue of a bare ticker from its prefix.
    ///
    /// Six-digit codes: `11`, `6`, `5`, `9` → Shanghai; `92`, `4`, `8` → Beijing;
    /// `0`, `1`, `2`, `3` → Shenzhen. Five-character alphanumeric codes are Hong Kong.
    pub fn infer(code: &str) -> Option<Self> {
        if code.len() == 5 && code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Some(Exchange::Hk);
        }
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if code.starts_with("11") {
            return Some(Exchange::Sh);
        }
        if code.starts_with("92") {
            return Some(Exchange::Beijing);
        }
        match code.as_bytes()[0] {
            b'6' | b'5' | b'9' => Some(Exchange::Sh),
            b'4' | b'8' => Some(Exchange::Beijing),
            b'0' | b'1' | b'2' | b'3' => Some(Exchange::Sz),
            _ => None,
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Sh => write!(f, "SH"),
            Exchange::Sz => write!(f, "SZ"),
            Exchange::Hk => write!(f, "HK"),
            Exchange::Beijing => write!(f, "BJ"),
        }
    }
}

/// A directly quotable instrument.
///
/// `symbol` is the bare ticker (`600519`, `00700`); the exchange is derived
/// from it (or from an explicit `sh`/`sz`/`hk`/`bj` prefix) and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub exchange: Exchange,
    pub is_basket: bool,
}

impl Instrument {
    /// Parse a raw ticker, prefixed (`sh600519`, `HK00700`) or bare (`000858`).
    /// Returns `None` when no routing rule applies.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() > 2 && raw.is_char_boundary(2) {
            let (head, rest) = raw.split_at(2);
            if let Some(exchange) = Exchange::from_prefix(head) {
                if Exchange::infer(rest).is_some() {
                    return Some(Self::build(rest.to_uppercase(), exchange));
                }
            }
        }
        let exchange = Exchange::infer(raw)?;
        Some(Self::build(raw.to_uppercase(), exchange))
    }

    fn build(symbol: String, exchange: Exchange) -> Self {
        let is_basket = matches!(exchange, Exchange::Sh | Exchange::Sz) && is_basket_code(&symbol);
        Self {
            symbol,
            exchange,
            is_basket,
        }
    }

    /// Code sent to the real-time quote feed, e.g. `sh600519`.
    pub fn quote_code(&self) -> String {
        format!("{}{}", self.exchange.prefix(), self.symbol.to_lowercase())
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.quote_code())
    }
}

/// Whether a six-digit code is an exchange-traded basket.
pub fn is_basket_code(code: &str) -> bool {
    code.len() == 6
        && code.chars().all(|c| c.is_ascii_digit())
        && BASKET_PREFIXES.iter().any(|p| code.starts_with(p))
}
