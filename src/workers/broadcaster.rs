use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time;
use tracing::{error, info};

use crate::signal::SignalSource;
use crate::store::SubscriberStore;
use crate::telegram::messages;

/// Bound on a single delivery attempt so one unresponsive recipient cannot
/// stall the rest of the batch
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound delivery capability provided by the transport
#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Why a single delivery attempt failed
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("telegram api: {0}")]
    Api(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// HOLD signal: nothing actionable, delivery suppressed
    Suppressed,

    /// Actionable signal but nobody subscribed
    NoSubscribers,

    /// Fan-out ran to completion (with zero or more per-recipient failures)
    Completed(BroadcastReport),
}

/// Per-recipient delivery results for one broadcast
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub delivered: Vec<i64>,
    pub failed: Vec<(i64, DeliveryError)>,
}

/// Worker that periodically generates a signal and fans it out to every
/// current subscriber
pub struct BroadcastWorker {
    signal_source: Arc<dyn SignalSource>,
    subscribers: Arc<SubscriberStore>,
    transport: Arc<dyn Deliver>,
    symbol: String,
    interval: Duration,
}

impl BroadcastWorker {
    pub fn new(
        signal_source: Arc<dyn SignalSource>,
        subscribers: Arc<SubscriberStore>,
        transport: Arc<dyn Deliver>,
        symbol: String,
        interval: Duration,
    ) -> Self {
        Self {
            signal_source,
            subscribers,
            transport,
            symbol,
            interval,
        }
    }

    /// Run the worker loop. Never returns; every failure inside a tick is
    /// contained within that tick.
    pub async fn run(&self) {
        info!("Broadcaster started (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);
        interval.tick().await; // Skip immediate fire; first broadcast after one full interval

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Perform a single broadcast cycle
    pub async fn tick(&self) -> TickOutcome {
        let signal = self.signal_source.next_signal().await;

        if !signal.side.is_actionable() {
            info!("Generated HOLD, skipping broadcast");
            return TickOutcome::Suppressed;
        }

        let recipients = self.subscribers.snapshot().await;
        if recipients.is_empty() {
            info!("No subscribers to broadcast to");
            return TickOutcome::NoSubscribers;
        }

        info!(
            "Broadcasting {} signal at {} to {} subscribers",
            signal.side.as_str(),
            signal.price,
            recipients.len()
        );

        let text = messages::format_signal(&signal, &self.symbol);
        let mut report = BroadcastReport::default();

        for chat_id in recipients {
            match time::timeout(DELIVERY_TIMEOUT, self.transport.deliver(chat_id, &text)).await {
                Ok(Ok(())) => report.delivered.push(chat_id),
                Ok(Err(e)) => {
                    error!("Failed to deliver to {}: {}", chat_id, e);
                    report.failed.push((chat_id, e));
                }
                Err(_) => {
                    error!("Delivery to {} timed out", chat_id);
                    report
                        .failed
                        .push((chat_id, DeliveryError::Timeout(DELIVERY_TIMEOUT)));
                }
            }
        }

        info!(
            "Broadcast complete: {} delivered, {} failed",
            report.delivered.len(),
            report.failed.len()
        );

        TickOutcome::Completed(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use tokio::sync::Mutex;

    use crate::models::{Side, Signal};

    /// Source returning a canned signal
    struct FixedSource {
        side: Side,
    }

    #[async_trait]
    impl SignalSource for FixedSource {
        async fn next_signal(&self) -> Signal {
            let actionable = self.side.is_actionable();
            Signal {
                side: self.side,
                price: 2002.0,
                confidence: if actionable { 0.75 } else { 0.15 },
                stop_loss: actionable.then_some(1991.99),
                take_profit: actionable.then_some(2042.04),
                generated_at: Utc::now(),
            }
        }
    }

    /// Transport recording attempts and failing for chosen recipients
    #[derive(Default)]
    struct ScriptedTransport {
        attempts: Mutex<Vec<i64>>,
        fail_for: Vec<i64>,
    }

    #[async_trait]
    impl Deliver for ScriptedTransport {
        async fn deliver(&self, chat_id: i64, _text: &str) -> Result<(), DeliveryError> {
            self.attempts.lock().await.push(chat_id);
            if self.fail_for.contains(&chat_id) {
                return Err(DeliveryError::Api("blocked by user".into()));
            }
            Ok(())
        }
    }

    async fn subscribers_with(dir: &tempfile::TempDir, ids: &[i64]) -> Arc<SubscriberStore> {
        let store = SubscriberStore::load(dir.path().join("subscribers.json")).await;
        for &id in ids {
            store.add(id).await;
        }
        Arc::new(store)
    }

    fn worker(
        side: Side,
        subscribers: Arc<SubscriberStore>,
        transport: Arc<ScriptedTransport>,
    ) -> BroadcastWorker {
        BroadcastWorker::new(
            Arc::new(FixedSource { side }),
            subscribers,
            transport,
            "XAUUSD".to_string(),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn hold_tick_makes_no_delivery_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let subscribers = subscribers_with(&dir, &[1, 2, 3]).await;
        let transport = Arc::new(ScriptedTransport::default());

        let outcome = worker(Side::Hold, subscribers, transport.clone())
            .tick()
            .await;

        assert!(matches!(outcome, TickOutcome::Suppressed));
        assert!(transport.attempts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn empty_subscriber_set_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let subscribers = subscribers_with(&dir, &[]).await;
        let transport = Arc::new(ScriptedTransport::default());

        let outcome = worker(Side::Buy, subscribers, transport.clone())
            .tick()
            .await;

        assert!(matches!(outcome, TickOutcome::NoSubscribers));
        assert!(transport.attempts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let subscribers = subscribers_with(&dir, &[1, 2, 3]).await;
        let transport = Arc::new(ScriptedTransport {
            attempts: Mutex::new(Vec::new()),
            fail_for: vec![2],
        });

        let outcome = worker(Side::Buy, subscribers.clone(), transport.clone())
            .tick()
            .await;

        // All three attempted, the failing one isolated, nobody unsubscribed
        assert_eq!(*transport.attempts.lock().await, vec![1, 2, 3]);
        match outcome {
            TickOutcome::Completed(report) => {
                assert_eq!(report.delivered, vec![1, 3]);
                assert_eq!(report.failed.len(), 1);
                assert_eq!(report.failed[0].0, 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(subscribers.snapshot().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn sell_tick_delivers_to_everyone() {
        let dir = tempfile::tempdir().unwrap();
        let subscribers = subscribers_with(&dir, &[10, 20]).await;
        let transport = Arc::new(ScriptedTransport::default());

        let outcome = worker(Side::Sell, subscribers, transport.clone())
            .tick()
            .await;

        match outcome {
            TickOutcome::Completed(report) => {
                assert_eq!(report.delivered, vec![10, 20]);
                assert!(report.failed.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
