//! 远端推送消息类型定义
//!
//! The remote store pushes one [`RemoteEvent`] per changed row over its
//! realtime channel. Each event carries the full row, so applying it replaces
//! whatever the client knew about that id.

use crate::order::Order;
use serde::{Deserialize, Serialize};

/// Row change notification from the remote store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteEvent {
    Insert { record: Order },
    Update { record: Order },
    Delete { id: String },
}

impl RemoteEvent {
    /// Id of the affected row
    pub fn id(&self) -> &str {
        match self {
            RemoteEvent::Insert { record } | RemoteEvent::Update { record } => &record.id,
            RemoteEvent::Delete { id } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RemoteEvent::Insert { .. } => "insert",
            RemoteEvent::Update { .. } => "update",
            RemoteEvent::Delete { .. } => "delete",
        }
    }

    /// Parse a realtime text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
