use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded { user_id: Uuid, product_id: Uuid },
    CartItemUpdated { user_id: Uuid, item_id: Uuid },
    CartItemRemoved { user_id: Uuid, item_id: Uuid },
    CartCleared { user_id: Uuid },

    // Wishlist events
    WishlistItemAdded { user_id: Uuid, product_id: Uuid },
    WishlistItemRemoved { user_id: Uuid, item_id: Uuid },

    // Payment / order events
    PaymentIntentCreated {
        user_id: Uuid,
        amount_minor: i64,
        currency: String,
    },
    OrderPlaced {
        order_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Event delivery is best-effort; it never fails the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Event processing loop; consumes the channel for the process lifetime.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderPlaced {
                order_id,
                user_id,
                total_amount,
            } => {
                info!(
                    %order_id, %user_id, %total_amount,
                    "Order placed"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event loop");
}
