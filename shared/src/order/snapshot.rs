//! Order snapshot - the current state of one work order
//!
//! The snapshot is what the sync layer stores, what the remote store returns
//! and what appliers mutate. It is computed by folding [`OrderEvent`]s over
//! the imported order.
//!
//! [`OrderEvent`]: super::OrderEvent

use super::history::History;
use super::types::{Attachment, ReturnReason};
use serde::{Deserialize, Serialize};

/// Order status
///
/// `PENDING → DISPATCHED → RECEIVED → COMPLETED`, with `COMPLETED → COMPLETED`
/// as the amend loop. Status never moves backwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Dispatched,
    Received,
    Completed,
}

impl OrderStatus {
    /// A worker may receive from these
    pub fn is_receivable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Dispatched)
    }

    /// A worker may submit (or resubmit) a completion from these
    pub fn is_completable(&self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Completed)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Dispatched => 1,
            OrderStatus::Received => 2,
            OrderStatus::Completed => 3,
        }
    }

    /// Whether moving from `self` to `next` goes forward (or stays put)
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Dispatched => write!(f, "DISPATCHED"),
            OrderStatus::Received => write!(f, "RECEIVED"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// 审核状态（由照片核验结果决定，用户不可直接编辑）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    /// Photo serial verified
    Passed,
    /// Set by back-office review only
    Failed,
    /// Submitted with attachments only, awaiting manual review
    Pending,
}

/// Work order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID (generated client-side)
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub business_no: String,
    #[serde(default)]
    pub team: String,
    /// Current assignee
    #[serde(default)]
    pub user_name: String,
    /// Serial number the completion photo must show
    #[serde(default)]
    pub serial_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_no: Option<String>,

    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Absolute deadline (Unix millis)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,

    // 回单信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<ReturnReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_remark: Option<String>,
    #[serde(default)]
    pub remark_images: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_photo: Option<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_audio: Option<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_status: Option<AuditStatus>,
    #[serde(default)]
    pub history: History,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a dispatched order with an empty history.
    ///
    /// Callers seed the history (import note) themselves.
    pub fn new(id: String, task_name: impl Into<String>, now: i64) -> Self {
        Self {
            id,
            task_name: task_name.into(),
            business_no: String::new(),
            team: String::new(),
            user_name: String::new(),
            serial_code: String::new(),
            work_order_no: None,
            status: OrderStatus::Dispatched,
            received_at: None,
            completed_at: None,
            deadline: None,
            return_reason: None,
            completion_remark: None,
            remark_images: Vec::new(),
            completion_photo: None,
            completion_audio: None,
            audit_status: None,
            history: History::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Deadline reached (`now >= deadline`). No deadline never expires.
    pub fn is_expired(&self, now: i64) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Whether the given name/team identify the current assignee
    pub fn is_assigned_to(&self, name: &str, team: Option<&str>) -> bool {
        self.user_name.trim() == name.trim() && self.team.trim() == team.unwrap_or("").trim()
    }
}
