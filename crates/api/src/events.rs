//! Order event delivery.
//!
//! Services collect the events returned by order transitions and hand them to
//! an [`EventPublisher`] once the unit of work has committed. The production
//! publisher fans events out over a `tokio::sync::broadcast` channel; a
//! background task logs every event.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bazaar_core::order::OrderEvent;

/// Default channel capacity. Slow subscribers lag rather than block publishers.
pub const DEFAULT_CAPACITY: usize = 256;

/// Outbound channel for committed order events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, events: Vec<OrderEvent>);
}

/// Broadcast-channel publisher.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<OrderEvent>,
}

impl BroadcastPublisher {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a listener. Only events published after this call are seen.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, events: Vec<OrderEvent>) {
        for event in events {
            // No receivers is fine: nobody is listening yet.
            let _ = self.sender.send(event);
        }
    }
}

/// Spawn a task that logs every event until the channel closes.
pub fn spawn_event_logger(mut receiver: broadcast::Receiver<OrderEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(
                    order_id = %event.order_id(),
                    event = ?event,
                    "Order event"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Order event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
