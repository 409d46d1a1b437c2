//! Order commands - requests to change an order

use super::types::{CompletionSubmission, User};
use serde::{Deserialize, Serialize};

/// Order command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCommand {
    /// Command unique ID (idempotency / audit tracing)
    pub command_id: String,
    /// Session user issuing the command
    pub actor: User,
    /// Client timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: OrderCommandPayload,
}

impl OrderCommand {
    pub fn new(actor: User, payload: OrderCommandPayload) -> Self {
        Self {
            command_id: crate::util::new_event_id(),
            actor,
            timestamp: crate::util::now_millis(),
            payload,
        }
    }

    pub fn order_id(&self) -> &str {
        self.payload.order_id()
    }
}

/// Command payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCommandPayload {
    /// 接单
    #[serde(rename_all = "camelCase")]
    ReceiveOrder { order_id: String },
    /// 回单（首次完成或补交修改）
    #[serde(rename_all = "camelCase")]
    CompleteOrder {
        order_id: String,
        submission: CompletionSubmission,
    },
    /// 改派
    #[serde(rename_all = "camelCase")]
    ReassignOrder {
        order_id: String,
        user_name: String,
        team: String,
    },
    /// 设置/清除截止时间
    #[serde(rename_all = "camelCase")]
    SetDeadline {
        order_id: String,
        #[serde(default)]
        deadline: Option<i64>,
    },
}

impl OrderCommandPayload {
    pub fn order_id(&self) -> &str {
        match self {
            OrderCommandPayload::ReceiveOrder { order_id }
            | OrderCommandPayload::CompleteOrder { order_id, .. }
            | OrderCommandPayload::ReassignOrder { order_id, .. }
            | OrderCommandPayload::SetDeadline { order_id, .. } => order_id,
        }
    }

    /// Same mutation aimed at another order (batch fan-out)
    pub fn retarget(&self, order_id: &str) -> Self {
        let mut payload = self.clone();
        match &mut payload {
            OrderCommandPayload::ReceiveOrder { order_id: id }
            | OrderCommandPayload::CompleteOrder { order_id: id, .. }
            | OrderCommandPayload::ReassignOrder { order_id: id, .. }
            | OrderCommandPayload::SetDeadline { order_id: id, .. } => {
                *id = order_id.to_string();
            }
        }
        payload
    }
}
