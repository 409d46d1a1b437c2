//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use async_trait::async_trait;

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::order::{OrderCommand, OrderCommandPayload, OrderEvent};

mod complete_order;
mod reassign_order;
mod receive_order;
mod set_deadline;

pub use complete_order::CompleteOrderAction;
pub use reassign_order::ReassignOrderAction;
pub use receive_order::ReceiveOrderAction;
pub use set_deadline::SetDeadlineAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug)]
pub enum CommandAction {
    ReceiveOrder(ReceiveOrderAction),
    CompleteOrder(CompleteOrderAction),
    ReassignOrder(ReassignOrderAction),
    SetDeadline(SetDeadlineAction),
}

/// Manual implementation of CommandHandler for CommandAction
#[async_trait]
impl CommandHandler for CommandAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        match self {
            CommandAction::ReceiveOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::CompleteOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::ReassignOrder(action) => action.execute(ctx, metadata).await,
            CommandAction::SetDeadline(action) => action.execute(ctx, metadata).await,
        }
    }
}

/// Convert OrderCommand to CommandAction
///
/// This is the ONLY place with a match on OrderCommandPayload.
impl From<&OrderCommand> for CommandAction {
    fn from(cmd: &OrderCommand) -> Self {
        match &cmd.payload {
            OrderCommandPayload::ReceiveOrder { order_id } => {
                CommandAction::ReceiveOrder(ReceiveOrderAction {
                    order_id: order_id.clone(),
                })
            }
            OrderCommandPayload::CompleteOrder {
                order_id,
                submission,
            } => CommandAction::CompleteOrder(CompleteOrderAction {
                order_id: order_id.clone(),
                submission: submission.clone(),
                verifier: None, // Verifier will be injected by OrdersManager
            }),
            OrderCommandPayload::ReassignOrder {
                order_id,
                user_name,
                team,
            } => CommandAction::ReassignOrder(ReassignOrderAction {
                order_id: order_id.clone(),
                user_name: user_name.clone(),
                team: team.clone(),
            }),
            OrderCommandPayload::SetDeadline { order_id, deadline } => {
                CommandAction::SetDeadline(SetDeadlineAction {
                    order_id: order_id.clone(),
                    deadline: *deadline,
                })
            }
        }
    }
}
