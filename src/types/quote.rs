//! Quote Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A price observation for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    /// Observation time (ms)
    pub timestamp: i64,
}

/// A quote-feed update: symbol plus its price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    pub timestamp: i64,
}

impl Quote {
    /// Quote with bid and ask collapsed onto `last`, stamped now.
    pub fn last(symbol: impl Into<String>, last: f64) -> Self {
        Self {
            symbol: symbol.into(),
            last,
            bid: last,
            ask: last,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn data(&self) -> QuoteData {
        QuoteData {
            last: self.last,
            bid: self.bid,
            ask: self.ask,
            timestamp: self.timestamp,
        }
    }
}

/// Latest quote per symbol.
pub type QuoteBook = HashMap<String, QuoteData>;
