use serde::{Deserialize, Serialize};

/// A user's holding in one fund. Read-only input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Fund code, e.g. "005827"
    pub fund_id: String,

    /// Money currently held in the fund (principal), `>= 0`
    pub held_amount: f64,
}

impl Position {
    pub fn new(fund_id: impl Into<String>, held_amount: f64) -> Self {
        let fund_id: String = fund_id.into();
        Self {
            fund_id: fund_id.trim().to_string(),
            held_amount,
        }
    }
}
