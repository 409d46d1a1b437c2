//! OrderReceived event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, HistoryEntry, Order, OrderEvent, OrderStatus};

/// OrderReceived applier
pub struct OrderReceivedApplier;

impl EventApplier for OrderReceivedApplier {
    fn apply(&self, snapshot: &mut Order, event: &OrderEvent) {
        if let EventPayload::OrderReceived { received_at } = &event.payload {
            snapshot.status = OrderStatus::Received;
            snapshot.received_at = Some(*received_at);

            snapshot.updated_at = event.timestamp;
            snapshot.history.push(HistoryEntry::from_event(event));
        }
    }
}
