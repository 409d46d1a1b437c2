//! Order events - immutable facts recorded after command processing

use super::command::OrderCommand;
use super::snapshot::AuditStatus;
use super::types::{Attachment, ReturnReason, Role, VerificationRecord};
use serde::{Deserialize, Serialize};

/// Order event - immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    /// Event unique ID
    pub event_id: String,
    /// Order this event belongs to
    pub order_id: String,
    /// Processing timestamp (Unix milliseconds), stamped into the order fields
    pub timestamp: i64,
    /// Operator name (snapshot for audit)
    pub operator_name: String,
    pub operator_role: Role,
    /// Command that triggered this event (for audit tracing)
    pub command_id: String,
    pub event_type: OrderEventType,
    pub payload: EventPayload,
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderReceived,
    OrderCompleted,
    OrderReassigned,
    DeadlineChanged,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderReceived => write!(f, "ORDER_RECEIVED"),
            OrderEventType::OrderCompleted => write!(f, "ORDER_COMPLETED"),
            OrderEventType::OrderReassigned => write!(f, "ORDER_REASSIGNED"),
            OrderEventType::DeadlineChanged => write!(f, "DEADLINE_CHANGED"),
        }
    }
}

/// Event payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    #[serde(rename_all = "camelCase")]
    OrderReceived { received_at: i64 },

    #[serde(rename_all = "camelCase")]
    OrderCompleted {
        completed_at: i64,
        /// Resubmission of an already completed order
        amended: bool,
        return_reason: ReturnReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        remark: Option<String>,
        #[serde(default)]
        remark_images: Vec<Attachment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        photo: Option<Attachment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<Attachment>,
        audit_status: AuditStatus,
        /// Present when a photo was verified
        #[serde(skip_serializing_if = "Option::is_none")]
        verification: Option<VerificationRecord>,
        /// Rendered location stamp
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    OrderReassigned {
        previous_user: String,
        previous_team: String,
        user_name: String,
        team: String,
    },

    #[serde(rename_all = "camelCase")]
    DeadlineChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        previous: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline: Option<i64>,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> OrderEventType {
        match self {
            EventPayload::OrderReceived { .. } => OrderEventType::OrderReceived,
            EventPayload::OrderCompleted { .. } => OrderEventType::OrderCompleted,
            EventPayload::OrderReassigned { .. } => OrderEventType::OrderReassigned,
            EventPayload::DeadlineChanged { .. } => OrderEventType::DeadlineChanged,
        }
    }
}

impl OrderEvent {
    pub fn new(
        order_id: String,
        operator_name: String,
        operator_role: Role,
        command_id: String,
        timestamp: i64,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: crate::util::new_event_id(),
            order_id,
            timestamp,
            operator_name,
            operator_role,
            command_id,
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Create event from command (extracts operator metadata)
    pub fn from_command(
        order_id: String,
        command: &OrderCommand,
        timestamp: i64,
        payload: EventPayload,
    ) -> Self {
        Self::new(
            order_id,
            command.actor.name.clone(),
            command.actor.role,
            command.command_id.clone(),
            timestamp,
            payload,
        )
    }
}
