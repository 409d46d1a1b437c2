//! SetDeadline command handler
//!
//! Admin sets or clears the deadline. Allowed at any status, including after
//! the current deadline has passed.

use async_trait::async_trait;

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, ensure_admin,
};
use shared::order::{EventPayload, OrderEvent};

/// SetDeadline action
#[derive(Debug, Clone)]
pub struct SetDeadlineAction {
    pub order_id: String,
    /// `None` clears the deadline
    pub deadline: Option<i64>,
}

#[async_trait]
impl CommandHandler for SetDeadlineAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        ensure_admin(&metadata.actor)?;
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        let event = OrderEvent::new(
            self.order_id.clone(),
            metadata.actor.name.clone(),
            metadata.actor.role,
            metadata.command_id.clone(),
            metadata.timestamp,
            EventPayload::DeadlineChanged {
                previous: snapshot.deadline,
                deadline: self.deadline,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_metadata, assigned_order, worker_metadata};

    #[tokio::test]
    async fn test_admin_extends_passed_deadline() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.deadline = Some(100);
        let mut ctx = CommandContext::new(&order);

        let action = SetDeadlineAction {
            order_id: "o-1".into(),
            deadline: Some(5_000),
        };
        let events = action.execute(&mut ctx, &admin_metadata(200)).await.unwrap();
        assert_eq!(
            events[0].payload,
            EventPayload::DeadlineChanged {
                previous: Some(100),
                deadline: Some(5_000),
            }
        );
    }

    #[tokio::test]
    async fn test_admin_clears_deadline() {
        let mut order = assigned_order("o-1", "Zhang", "North");
        order.deadline = Some(100);
        let mut ctx = CommandContext::new(&order);

        let action = SetDeadlineAction {
            order_id: "o-1".into(),
            deadline: None,
        };
        let events = action.execute(&mut ctx, &admin_metadata(200)).await.unwrap();
        assert!(matches!(
            events[0].payload,
            EventPayload::DeadlineChanged { deadline: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_worker_cannot_edit_deadline() {
        let order = assigned_order("o-1", "Zhang", "North");
        let mut ctx = CommandContext::new(&order);
        let action = SetDeadlineAction {
            order_id: "o-1".into(),
            deadline: None,
        };
        let err = action
            .execute(&mut ctx, &worker_metadata("Zhang", "North", 1))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::AdminRequired);
    }
}
