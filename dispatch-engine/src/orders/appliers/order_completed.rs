//! OrderCompleted event applier
//!
//! Stores the completion payload (overwriting any previous one on amend),
//! stamps `completedAt` and records the audit status. The remark is annotated
//! with the serial check result and the location stamp.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, HistoryEntry, Order, OrderEvent, OrderStatus};

/// OrderCompleted applier
pub struct OrderCompletedApplier;

impl EventApplier for OrderCompletedApplier {
    fn apply(&self, snapshot: &mut Order, event: &OrderEvent) {
        if let EventPayload::OrderCompleted {
            completed_at,
            return_reason,
            remark,
            remark_images,
            photo,
            audio,
            audit_status,
            verification,
            location,
            ..
        } = &event.payload
        {
            snapshot.status = OrderStatus::Completed;
            snapshot.completed_at = Some(*completed_at);

            let mut lines: Vec<String> = remark.iter().cloned().collect();
            if let Some(v) = verification {
                lines.push(format!("[serial check] {} (detected: {})", v.message, v.detected));
            }
            if let Some(loc) = location {
                lines.push(format!("[location] {}", loc));
            }
            snapshot.return_reason = Some(*return_reason);
            snapshot.completion_remark = if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            };
            snapshot.remark_images = remark_images.clone();
            snapshot.completion_photo = photo.clone();
            snapshot.completion_audio = audio.clone();
            snapshot.audit_status = Some(*audit_status);

            snapshot.updated_at = event.timestamp;
            snapshot.history.push(HistoryEntry::from_event(event));
        }
    }
}
