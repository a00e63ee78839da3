use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{info, warn};

/// Maximum number of prices retained; oldest entries are evicted first
const MAX_HISTORY: usize = 500;

/// File-backed chronological price history, capped at the most recent 500
/// entries. All access goes through the store's own lock so a tick and an
/// on-demand signal request cannot lose each other's appends.
pub struct PriceHistoryStore {
    path: PathBuf,
    prices: Mutex<Vec<f64>>,
}

impl PriceHistoryStore {
    /// Load history from disk; missing or corrupt files yield an empty history
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prices: Vec<f64> = super::load_json_or_default(&path).await;

        info!("Price history loaded: {} entries", prices.len());

        Self {
            path,
            prices: Mutex::new(prices),
        }
    }

    /// Append the next price, computed from the latest one by `next`, and
    /// persist the updated history. The read-compute-append-persist sequence
    /// runs under the lock, so concurrent callers serialize cleanly and the
    /// file on disk is never torn. Returns the history including the new
    /// price. Persistence failures are logged and do not fail the caller.
    pub async fn advance<F>(&self, next: F) -> Vec<f64>
    where
        F: FnOnce(Option<f64>) -> f64,
    {
        let mut prices = self.prices.lock().await;

        let price = next(prices.last().copied());
        prices.push(price);

        if prices.len() > MAX_HISTORY {
            let excess = prices.len() - MAX_HISTORY;
            prices.drain(..excess);
        }

        if let Err(e) = super::save_json(&self.path, &*prices).await {
            warn!("Failed to persist price history: {e:#}");
        }

        prices.clone()
    }

    /// Current history, oldest first
    pub async fn snapshot(&self) -> Vec<f64> {
        self.prices.lock().await.clone()
    }
}
