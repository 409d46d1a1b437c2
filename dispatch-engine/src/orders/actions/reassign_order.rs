//! ReassignOrder command handler
//!
//! Admin moves an order to another worker/team. Status is untouched and the
//! deadline does not apply.

use async_trait::async_trait;

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, ensure_admin,
};
use shared::order::{EventPayload, OrderEvent};

/// ReassignOrder action
#[derive(Debug, Clone)]
pub struct ReassignOrderAction {
    pub order_id: String,
    pub user_name: String,
    pub team: String,
}

#[async_trait]
impl CommandHandler for ReassignOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        ensure_admin(&metadata.actor)?;

        let user_name = self.user_name.trim();
        if user_name.is_empty() {
            return Err(OrderError::RequiredField("userName".into()));
        }

        let snapshot = ctx.load_snapshot(&self.order_id)?;

        let event = OrderEvent::new(
            self.order_id.clone(),
            metadata.actor.name.clone(),
            metadata.actor.role,
            metadata.command_id.clone(),
            metadata.timestamp,
            EventPayload::OrderReassigned {
                previous_user: snapshot.user_name.clone(),
                previous_team: snapshot.team.clone(),
                user_name: user_name.to_string(),
                team: self.team.trim().to_string(),
            },
        );

        Ok(vec![event])
    }
}
