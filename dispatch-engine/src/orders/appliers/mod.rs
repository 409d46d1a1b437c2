//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions.

use enum_dispatch::enum_dispatch;

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, Order, OrderEvent};

mod deadline_changed;
mod order_completed;
mod order_reassigned;
mod order_received;

pub use deadline_changed::DeadlineChangedApplier;
pub use order_completed::OrderCompletedApplier;
pub use order_reassigned::OrderReassignedApplier;
pub use order_received::OrderReceivedApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderReceived(OrderReceivedApplier),
    OrderCompleted(OrderCompletedApplier),
    OrderReassigned(OrderReassignedApplier),
    DeadlineChanged(DeadlineChangedApplier),
}

/// Convert OrderEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&OrderEvent> for EventAction {
    fn from(event: &OrderEvent) -> Self {
        match &event.payload {
            EventPayload::OrderReceived { .. } => EventAction::OrderReceived(OrderReceivedApplier),
            EventPayload::OrderCompleted { .. } => {
                EventAction::OrderCompleted(OrderCompletedApplier)
            }
            EventPayload::OrderReassigned { .. } => {
                EventAction::OrderReassigned(OrderReassignedApplier)
            }
            EventPayload::DeadlineChanged { .. } => {
                EventAction::DeadlineChanged(DeadlineChangedApplier)
            }
        }
    }
}

/// Apply events in order
pub fn apply_events(snapshot: &mut Order, events: &[OrderEvent]) {
    for event in events {
        EventAction::from(event).apply(snapshot, event);
    }
}
