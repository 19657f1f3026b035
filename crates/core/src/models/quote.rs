use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::instrument::Instrument;

/// A live price snapshot for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub instrument: Instrument,

    /// Last traded price. `0` means halted or not yet traded today.
    pub current_price: f64,

    /// Previous session's closing price.
    pub previous_close: f64,

    /// Exchange-local timestamp of the quote, when the feed provides one.
    pub as_of: Option<NaiveDateTime>,
}

impl Quote {
    pub fn new(instrument: Instrument, current_price: f64, previous_close: f64) -> Self {
        Self {
            instrument,
            current_price,
            previous_close,
            as_of: None,
        }
    }

    /// Zero-change stand-in used when a quote cannot be fetched.
    pub fn flat(instrument: Instrument) -> Self {
        Self::new(instrument, 0.0, 0.0)
    }

    pub fn with_as_of(mut self, as_of: NaiveDateTime) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Price used for the change computation: a zero (halted / pre-market)
    /// price falls back to the previous close.
    pub fn effective_price(&self) -> f64 {
        if self.current_price > 0.0 && self.current_price.is_finite() {
            self.current_price
        } else {
            self.previous_close
        }
    }

    /// Percentage change against the previous close.
    /// Exactly `0.0` whenever `previous_close <= 0` or either price is not finite.
    pub fn change_percent(&self) -> f64 {
        if self.previous_close <= 0.0 || !self.previous_close.is_finite() {
            return 0.0;
        }
        let price = self.effective_price();
        if !price.is_finite() {
            return 0.0;
        }
        (price - self.previous_close) / self.previous_close * 100.0
    }
}
