//! DeadlineChanged event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, HistoryEntry, Order, OrderEvent};

/// DeadlineChanged applier
pub struct DeadlineChangedApplier;

impl EventApplier for DeadlineChangedApplier {
    fn apply(&self, snapshot: &mut Order, event: &OrderEvent) {
        if let EventPayload::DeadlineChanged { deadline, .. } = &event.payload {
            snapshot.deadline = *deadline;

            snapshot.updated_at = event.timestamp;
            snapshot.history.push(HistoryEntry::from_event(event));
        }
    }
}
