//! ReceiveOrder command handler
//!
//! The assigned worker acknowledges a dispatched order. Blocked once the
//! deadline has passed.

use async_trait::async_trait;

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, ensure_assignee,
    ensure_not_expired,
};
use shared::order::{EventPayload, OrderEvent};

/// ReceiveOrder action
#[derive(Debug, Clone)]
pub struct ReceiveOrderAction {
    pub order_id: String,
}

#[async_trait]
impl CommandHandler for ReceiveOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Load existing snapshot
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        // 2. Only the assignee
        ensure_assignee(&snapshot, &metadata.actor)?;

        // 3. PENDING / DISPATCHED only
        if !snapshot.status.is_receivable() {
            return Err(OrderError::InvalidTransition {
                action: "receive",
                status: snapshot.status.to_string(),
            });
        }

        // 4. Deadline gate
        ensure_not_expired(&snapshot, metadata.timestamp)?;

        let event = OrderEvent::new(
            self.order_id.clone(),
            metadata.actor.name.clone(),
            metadata.actor.role,
            metadata.command_id.clone(),
            metadata.timestamp,
            EventPayload::OrderReceived {
                received_at: metadata.timestamp,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_metadata, assigned_order, worker_metadata};
    use shared::order::{OrderEventType, OrderStatus};

    async fn run(
        order: &shared::order::Order,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        let mut ctx = CommandContext::new(order);
        let action = ReceiveOrderAction {
            order_id: order.id.clone(),
        };
        action.execute(&mut ctx, metadata).await
    }

    #[tokio::test]
    async fn test_assignee_receives_dispatched_order() {
        let order = assigned_order("o-1", "Zhang", "North");
        let events = run(&order, &worker_metadata("Zhang", "North", 5_000))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, OrderEventType::OrderReceived);
        assert_eq!(
            events[0].payload,
            EventPayload::OrderReceived { received_at: 5_000 }
        );
        assert_eq!(events[0].operator_name, "Zhang");
    }

    #[tokio::test]
    async fn test_pending_order_is_receivable() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.status = OrderStatus::Pending;
        assert!(run(&order, &worker_metadata("Zhang", "North", 1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_worker_rejected() {
        let order = assigned_order("o-1", "Zhang", "North");
        let err = run(&order, &worker_metadata("Li", "North", 1))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::NotAssignee("o-1".into()));
    }

    #[tokio::test]
    async fn test_admin_cannot_receive() {
        let order = assigned_order("o-1", "Zhang", "North");
        let err = run(&order, &admin_metadata(1)).await.unwrap_err();
        assert_eq!(err, OrderError::WorkerRequired);
    }

    #[tokio::test]
    async fn test_expired_order_rejected() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.deadline = Some(1_000);
        let err = run(&order, &worker_metadata("Zhang", "North", 1_000))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::DeadlinePassed("o-1".into()));
    }

    #[tokio::test]
    async fn test_future_deadline_allows_receive() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.deadline = Some(1_001);
        assert!(
            run(&order, &worker_metadata("Zhang", "North", 1_000))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_received_order_cannot_be_received_again() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.status = OrderStatus::Received;
        let err = run(&order, &worker_metadata("Zhang", "North", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition { action: "receive", .. }));
    }

    #[tokio::test]
    async fn test_wrong_order_id_not_found() {
        let order = assigned_order("o-1", "Zhang", "North");
        let mut ctx = CommandContext::new(&order);
        let action = ReceiveOrderAction {
            order_id: "o-2".into(),
        };
        let err = action
            .execute(&mut ctx, &worker_metadata("Zhang", "North", 1))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::NotFound("o-2".into()));
    }
}
