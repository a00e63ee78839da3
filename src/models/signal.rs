use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trading signal generated from the price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Signal direction
    pub side: Side,

    /// Price the signal was generated at
    pub price: f64,

    /// Confidence level (0.0 - 1.0); fixed low value for HOLD
    pub confidence: f64,

    /// Stop-loss level; present only for BUY/SELL
    pub stop_loss: Option<f64>,

    /// Take-profit level; present only for BUY/SELL
    pub take_profit: Option<f64>,

    /// When the signal was generated
    pub generated_at: DateTime<Utc>,
}

/// Signal direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Hold,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
            Side::Hold => "HOLD",
        }
    }

    /// HOLD carries no actionable content and is never broadcast
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Side::Hold)
    }
}
