//! CompleteOrder command handler
//!
//! First completion (`RECEIVED → COMPLETED`) and amend (`COMPLETED → COMPLETED`).
//! A submitted photo must pass serial verification before anything is
//! recorded; verification errors block the completion like a mismatch does.

use async_trait::async_trait;
use std::sync::Arc;

use crate::orders::traits::{
    CommandContext, CommandHandler, CommandMetadata, OrderError, ensure_assignee,
    ensure_not_expired,
};
use crate::verification::{VerificationError, VerificationService, VisionError};
use shared::order::{
    Attachment, AuditStatus, CompletionSubmission, EventPayload, OrderEvent, OrderStatus,
    VerificationRecord,
};

/// CompleteOrder action
#[derive(Clone)]
pub struct CompleteOrderAction {
    pub order_id: String,
    pub submission: CompletionSubmission,
    /// Injected by OrdersManager
    pub verifier: Option<Arc<VerificationService>>,
}

impl std::fmt::Debug for CompleteOrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompleteOrderAction")
            .field("order_id", &self.order_id)
            .field("return_reason", &self.submission.return_reason)
            .field("has_photo", &self.submission.photo.is_some())
            .finish()
    }
}

impl CompleteOrderAction {
    async fn verify_photo(
        &self,
        photo: &Attachment,
        serial_code: &str,
    ) -> Result<VerificationRecord, OrderError> {
        let Some(verifier) = &self.verifier else {
            return Err(OrderError::VerificationUnavailable(
                "vision service not configured".into(),
            ));
        };

        let report = verifier
            .verify(photo, serial_code)
            .await
            .map_err(|e| match e {
                VerificationError::MissingTarget => OrderError::RequiredField("serialCode".into()),
                VerificationError::Vision(VisionError::QuotaExceeded) => {
                    OrderError::VisionQuotaExceeded
                }
                VerificationError::Vision(e) => OrderError::VerificationUnavailable(e.to_string()),
            })?;

        if report.matched {
            return Ok(report.record());
        }
        if report.detected.is_empty() {
            return Err(OrderError::NothingDetected);
        }
        Err(OrderError::SerialMismatch {
            detected: report.detected,
            message: report.message,
        })
    }
}

#[async_trait]
impl CommandHandler for CompleteOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        // 1. Load existing snapshot
        let snapshot = ctx.load_snapshot(&self.order_id)?;

        // 2. Only the assignee
        ensure_assignee(&snapshot, &metadata.actor)?;

        // 3. RECEIVED, or COMPLETED for an amend
        if !snapshot.status.is_completable() {
            return Err(OrderError::InvalidTransition {
                action: "complete",
                status: snapshot.status.to_string(),
            });
        }

        // 4. Deadline gate
        ensure_not_expired(&snapshot, metadata.timestamp)?;

        // 5. Submission content
        let submission = &self.submission;
        let return_reason = submission
            .return_reason
            .ok_or(OrderError::ReturnReasonRequired)?;
        if !submission.has_proof() {
            return Err(OrderError::ProofRequired);
        }

        // 6. Photo ⇒ serial verification (fail-closed)
        let (audit_status, verification) = match &submission.photo {
            Some(photo) => {
                let record = self.verify_photo(photo, &snapshot.serial_code).await?;
                (AuditStatus::Passed, Some(record))
            }
            None => (AuditStatus::Pending, None),
        };

        let remark = submission
            .remark
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);

        let event = OrderEvent::new(
            self.order_id.clone(),
            metadata.actor.name.clone(),
            metadata.actor.role,
            metadata.command_id.clone(),
            metadata.timestamp,
            EventPayload::OrderCompleted {
                completed_at: metadata.timestamp,
                amended: snapshot.status == OrderStatus::Completed,
                return_reason,
                remark,
                remark_images: submission.remark_images.clone(),
                photo: submission.photo.clone(),
                audio: submission.audio.clone(),
                audit_status,
                verification,
                location: submission.location.as_ref().map(|l| l.describe()),
            },
        );

        Ok(vec![event])
    }
}
