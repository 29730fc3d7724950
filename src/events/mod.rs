use crate::entities::TransactionType;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Domain events published after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ProductionRecorded {
        production_log_id: Uuid,
        actor_id: String,
        ingredient_lines: usize,
        output_lines: usize,
    },
    StockMovementRecorded {
        transaction_id: Uuid,
        product_id: Uuid,
        transaction_type: TransactionType,
        quantity: i64,
        production_log_id: Option<Uuid>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProductionRecorded { .. } => "production_recorded",
            Event::StockMovementRecorded { .. } => "stock_movement_recorded",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Publishes events whose data is already committed without waiting for
    /// channel capacity; dropped events are only logged and counted.
    pub fn send_or_log(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            let name = event.name();
            match self.sender.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    counter!("foodstock_events.dropped", 1, "event" => name);
                    warn!(event = name, "event channel full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    counter!("foodstock_events.publish_failed", 1, "event" => name);
                    error!(event = name, "event channel closed");
                }
            }
        }
    }
}

/// Drains the channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("foodstock_events.processed", 1, "event" => event.name());
        match &event {
            Event::ProductionRecorded {
                production_log_id,
                actor_id,
                ingredient_lines,
                output_lines,
            } => info!(
                %production_log_id,
                %actor_id,
                ingredient_lines,
                output_lines,
                "production recorded"
            ),
            Event::StockMovementRecorded {
                transaction_id,
                product_id,
                transaction_type,
                quantity,
                production_log_id,
            } => info!(
                %transaction_id,
                %product_id,
                transaction_type = %transaction_type,
                quantity,
                production_log_id = ?production_log_id,
                "stock movement recorded"
            ),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let log_id = Uuid::new_v4();

        sender
            .send_or_log(vec![
                Event::ProductionRecorded {
                    production_log_id: log_id,
                    actor_id: "u-1".into(),
                    ingredient_lines: 1,
                    output_lines: 1,
                },
                Event::StockMovementRecorded {
                    transaction_id: Uuid::new_v4(),
                    product_id: Uuid::new_v4(),
                    transaction_type: TransactionType::Export,
                    quantity: 5,
                    production_log_id: Some(log_id),
                },
            ]);

        assert_eq!(rx.recv().await.unwrap().name(), "production_recorded");
        assert_eq!(rx.recv().await.unwrap().name(), "stock_movement_recorded");
    }

    #[tokio::test]
    async fn closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender
            .send(Event::ProductionRecorded {
                production_log_id: Uuid::new_v4(),
                actor_id: "u".into(),
                ingredient_lines: 0,
                output_lines: 1,
            })
            .await
            .is_err());
        sender.send_or_log(Vec::new());
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        let event = |quantity| Event::StockMovementRecorded {
            transaction_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            transaction_type: TransactionType::Import,
            quantity,
            production_log_id: None,
        };

        sender.send_or_log(vec![event(1), event(2), event(3)]);

        assert_matches::assert_matches!(
            rx.recv().await,
            Some(Event::StockMovementRecorded { quantity: 1, .. })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn processing_loop_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(process_events(rx));
        drop(tx);
        handle.await.unwrap();
    }
}
