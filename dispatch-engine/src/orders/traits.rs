//! Command handling and event application contracts

use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use shared::error::ErrorCode;
use shared::order::{CommandError, Order, OrderEvent, User};
use thiserror::Error;

/// Guard violation raised by an action
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Only workers can perform this action")]
    WorkerRequired,

    #[error("Order {0} is not assigned to you")]
    NotAssignee(String),

    #[error("Admin role required")]
    AdminRequired,

    #[error("Deadline passed for order {0}")]
    DeadlinePassed(String),

    #[error("Cannot {action} an order in status {status}")]
    InvalidTransition { action: &'static str, status: String },

    #[error("Return reason is required")]
    ReturnReasonRequired,

    #[error("A completion photo or remark image is required")]
    ProofRequired,

    #[error("Required field missing: {0}")]
    RequiredField(String),

    #[error("{message}")]
    SerialMismatch { detected: String, message: String },

    #[error("No serial number detected on the photo")]
    NothingDetected,

    #[error("Verification unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("Vision service quota exhausted")]
    VisionQuotaExceeded,
}

impl From<OrderError> for CommandError {
    fn from(err: OrderError) -> Self {
        let code = match &err {
            OrderError::NotFound(_) => ErrorCode::OrderNotFound,
            OrderError::WorkerRequired => ErrorCode::WorkerRequired,
            OrderError::NotAssignee(_) => ErrorCode::NotAssignee,
            OrderError::AdminRequired => ErrorCode::AdminRequired,
            OrderError::DeadlinePassed(_) => ErrorCode::DeadlinePassed,
            OrderError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            OrderError::ReturnReasonRequired => ErrorCode::ReturnReasonRequired,
            OrderError::ProofRequired => ErrorCode::ProofRequired,
            OrderError::RequiredField(_) => ErrorCode::RequiredField,
            OrderError::SerialMismatch { .. } => ErrorCode::SerialMismatch,
            OrderError::NothingDetected => ErrorCode::NothingDetected,
            OrderError::VerificationUnavailable(_) => ErrorCode::VerificationUnavailable,
            OrderError::VisionQuotaExceeded => ErrorCode::VisionQuotaExceeded,
        };
        let message = err.to_string();
        match err {
            OrderError::SerialMismatch { detected, .. } => {
                CommandError::new(code, message).with_detected(detected)
            }
            _ => CommandError::new(code, message),
        }
    }
}

/// Command metadata (who / when)
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub command_id: String,
    pub actor: User,
    /// Server-side processing time (Unix millis); used for deadline checks and stamping
    pub timestamp: i64,
}

/// Working state handed to an action: the single order it may touch
pub struct CommandContext<'a> {
    order: &'a Order,
}

impl<'a> CommandContext<'a> {
    pub fn new(order: &'a Order) -> Self {
        Self { order }
    }

    /// Snapshot of the order the command targets
    pub fn load_snapshot(&self, order_id: &str) -> Result<Order, OrderError> {
        if self.order.id == order_id {
            Ok(self.order.clone())
        } else {
            Err(OrderError::NotFound(order_id.to_string()))
        }
    }
}

/// Command handler: validates and produces events, never mutates
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError>;
}

/// Event applier: pure function of (snapshot, event)
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut Order, event: &OrderEvent);
}

// ========== Guards ==========

/// Actor must be a worker currently assigned to the order
pub fn ensure_assignee(order: &Order, actor: &User) -> Result<(), OrderError> {
    if actor.is_admin() {
        return Err(OrderError::WorkerRequired);
    }
    if !order.is_assigned_to(&actor.name, actor.team.as_deref()) {
        return Err(OrderError::NotAssignee(order.id.clone()));
    }
    Ok(())
}

/// `now >= deadline` blocks worker transitions
pub fn ensure_not_expired(order: &Order, now: i64) -> Result<(), OrderError> {
    if order.is_expired(now) {
        return Err(OrderError::DeadlinePassed(order.id.clone()));
    }
    Ok(())
}

pub fn ensure_admin(actor: &User) -> Result<(), OrderError> {
    if !actor.is_admin() {
        return Err(OrderError::AdminRequired);
    }
    Ok(())
}
