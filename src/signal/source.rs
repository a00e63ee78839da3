use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::models::{Side, Signal};
use crate::store::PriceHistoryStore;

/// Baseline used when no price history exists yet
const BASELINE_PRICE: f64 = 2000.0;

/// Moving-average windows for the crossover rule
const SMA_SHORT: usize = 5;
const SMA_LONG: usize = 20;

/// Fixed confidence reported for HOLD signals
const HOLD_CONFIDENCE: f64 = 0.15;

/// Strategy capability: produce the next signal. Injectable so the scheduler
/// and gateway stay untouched when a real data feed replaces the synthetic one.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn next_signal(&self) -> Signal;
}

/// Randomness consumed by signal generation, injectable for tests
pub trait PriceNoise: Send + Sync {
    /// Perturbation added to the last price
    fn price_step(&self) -> f64;

    /// Confidence for an actionable signal, in [0.6, 0.9]
    fn confidence(&self) -> f64;
}

/// Production noise source backed by the thread RNG
pub struct MarketNoise;

impl PriceNoise for MarketNoise {
    fn price_step(&self) -> f64 {
        rand::thread_rng().gen_range(-4.0..=4.0)
    }

    fn confidence(&self) -> f64 {
        rand::thread_rng().gen_range(0.6..=0.9)
    }
}

/// SMA-crossover signal source over a synthetic random-walk price feed.
/// Appends one new price per call and persists the updated history.
pub struct SmaSignalSource {
    prices: Arc<PriceHistoryStore>,
    noise: Box<dyn PriceNoise>,
}

impl SmaSignalSource {
    pub fn new(prices: Arc<PriceHistoryStore>, noise: Box<dyn PriceNoise>) -> Self {
        Self { prices, noise }
    }
}

#[async_trait]
impl SignalSource for SmaSignalSource {
    async fn next_signal(&self) -> Signal {
        let step = self.noise.price_step();

        // Read-then-append runs under the store lock; the closure sees the
        // latest price even when a tick races an on-demand request.
        let history = self
            .prices
            .advance(|last| round2(last.unwrap_or(BASELINE_PRICE) + step))
            .await;

        let price = history.last().copied().unwrap_or(BASELINE_PRICE);
        let side = decide(&history);

        debug!(
            "Signal: {} at {} (history: {} entries)",
            side.as_str(),
            price,
            history.len()
        );

        let (confidence, stop_loss, take_profit) = match side {
            Side::Buy => (
                round2(self.noise.confidence()),
                Some(round2(price * 0.995)),
                Some(round2(price * 1.02)),
            ),
            Side::Sell => (
                round2(self.noise.confidence()),
                Some(round2(price * 1.005)),
                Some(round2(price * 0.98)),
            ),
            Side::Hold => (HOLD_CONFIDENCE, None, None),
        };

        Signal {
            side,
            price,
            confidence,
            stop_loss,
            take_profit,
            generated_at: Utc::now(),
        }
    }
}

/// SMA crossover when both windows are defined, momentum over the last two
/// prices otherwise. The momentum fallback is a deliberate policy for short
/// histories, not an error path.
fn decide(history: &[f64]) -> Side {
    match (sma(history, SMA_SHORT), sma(history, SMA_LONG)) {
        (Some(short), Some(long)) => {
            if short > long {
                Side::Buy
            } else if short < long {
                Side::Sell
            } else {
                Side::Hold
            }
        }
        _ => momentum(history),
    }
}

fn momentum(history: &[f64]) -> Side {
    match history {
        [.., previous, latest] => {
            if latest > previous {
                Side::Buy
            } else if latest < previous {
                Side::Sell
            } else {
                Side::Hold
            }
        }
        _ => Side::Hold,
    }
}

/// Mean of the last `period` values, or None if not enough data
fn sma(values: &[f64], period: usize) -> Option<f64> {
    if values.len() < period {
        return None;
    }

    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
