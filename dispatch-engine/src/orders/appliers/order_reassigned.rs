//! OrderReassigned event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, HistoryEntry, Order, OrderEvent};

/// OrderReassigned applier
pub struct OrderReassignedApplier;

impl EventApplier for OrderReassignedApplier {
    fn apply(&self, snapshot: &mut Order, event: &OrderEvent) {
        if let EventPayload::OrderReassigned {
            user_name, team, ..
        } = &event.payload
        {
            snapshot.user_name = user_name.clone();
            snapshot.team = team.clone();

            snapshot.updated_at = event.timestamp;
            snapshot.history.push(HistoryEntry::from_event(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{HistoryAction, OrderStatus, Role};

    #[test]
    fn test_reassign_keeps_status() {
        let mut snapshot = Order::new("o-1".into(), "Meter swap", 0);
        snapshot.status = OrderStatus::Received;
        snapshot.user_name = "Zhang".into();

        let event = OrderEvent::new(
            "o-1".into(),
            "boss".into(),
            Role::Admin,
            "cmd-1".into(),
            50,
            EventPayload::OrderReassigned {
                previous_user: "Zhang".into(),
                previous_team: String::new(),
                user_name: "Li".into(),
                team: "South".into(),
            },
        );
        OrderReassignedApplier.apply(&mut snapshot, &event);

        assert_eq!(snapshot.user_name, "Li");
        assert_eq!(snapshot.team, "South");
        assert_eq!(snapshot.status, OrderStatus::Received);
        let entry = snapshot.history.last().unwrap();
        assert_eq!(entry.action, HistoryAction::Reassigned);
        assert_eq!(entry.role, Role::Admin);
    }
}
