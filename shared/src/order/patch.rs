//! Order patch - partial update of an order's mutable fields
//!
//! A patch is what travels to the remote store (`PATCH ?id=eq.<id>`) and what
//! the sync layer applies to its collection. Plain `Option` fields mean
//! "unchanged when `None`"; `Option<Option<_>>` fields can also be cleared
//! (`Some(None)` serializes as `null`).

use super::history::History;
use super::snapshot::{AuditStatus, Order, OrderStatus};
use super::types::{Attachment, ReturnReason};
use serde::{Deserialize, Deserializer, Serialize};

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub received_at: Option<Option<i64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub completed_at: Option<Option<i64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub deadline: Option<Option<i64>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub return_reason: Option<Option<ReturnReason>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub completion_remark: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark_images: Option<Vec<Attachment>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub completion_photo: Option<Option<Attachment>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub completion_audio: Option<Option<Attachment>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub audit_status: Option<Option<AuditStatus>>,
    /// Full history (the remote column is replaced as a whole)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<History>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// `Some(after)` when the field changed
fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    (before != after).then(|| after.clone())
}

impl OrderPatch {
    /// Diff two versions of the same order
    pub fn between(before: &Order, after: &Order) -> Self {
        Self {
            user_name: changed(&before.user_name, &after.user_name),
            team: changed(&before.team, &after.team),
            status: changed(&before.status, &after.status),
            received_at: changed(&before.received_at, &after.received_at),
            completed_at: changed(&before.completed_at, &after.completed_at),
            deadline: changed(&before.deadline, &after.deadline),
            return_reason: changed(&before.return_reason, &after.return_reason),
            completion_remark: changed(&before.completion_remark, &after.completion_remark),
            remark_images: changed(&before.remark_images, &after.remark_images),
            completion_photo: changed(&before.completion_photo, &after.completion_photo),
            completion_audio: changed(&before.completion_audio, &after.completion_audio),
            audit_status: changed(&before.audit_status, &after.audit_status),
            history: changed(&before.history, &after.history),
            updated_at: changed(&before.updated_at, &after.updated_at),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine with a later patch for the same order; fields in `later` win
    pub fn merge(self, later: OrderPatch) -> OrderPatch {
        OrderPatch {
            user_name: later.user_name.or(self.user_name),
            team: later.team.or(self.team),
            status: later.status.or(self.status),
            received_at: later.received_at.or(self.received_at),
            completed_at: later.completed_at.or(self.completed_at),
            deadline: later.deadline.or(self.deadline),
            return_reason: later.return_reason.or(self.return_reason),
            completion_remark: later.completion_remark.or(self.completion_remark),
            remark_images: later.remark_images.or(self.remark_images),
            completion_photo: later.completion_photo.or(self.completion_photo),
            completion_audio: later.completion_audio.or(self.completion_audio),
            audit_status: later.audit_status.or(self.audit_status),
            history: later.history.or(self.history),
            updated_at: later.updated_at.or(self.updated_at),
        }
    }

    /// Apply every present field to `order`
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(v) = &self.user_name {
            order.user_name = v.clone();
        }
        if let Some(v) = &self.team {
            order.team = v.clone();
        }
        if let Some(v) = self.status {
            order.status = v;
        }
        if let Some(v) = self.received_at {
            order.received_at = v;
        }
        if let Some(v) = self.completed_at {
            order.completed_at = v;
        }
        if let Some(v) = self.deadline {
            order.deadline = v;
        }
        if let Some(v) = self.return_reason {
            order.return_reason = v;
        }
        if let Some(v) = &self.completion_remark {
            order.completion_remark = v.clone();
        }
        if let Some(v) = &self.remark_images {
            order.remark_images = v.clone();
        }
        if let Some(v) = &self.completion_photo {
            order.completion_photo = v.clone();
        }
        if let Some(v) = &self.completion_audio {
            order.completion_audio = v.clone();
        }
        if let Some(v) = self.audit_status {
            order.audit_status = v;
        }
        if let Some(v) = &self.history {
            order.history = v.clone();
        }
        if let Some(v) = self.updated_at {
            order.updated_at = v;
        }
    }
}
