//! OrdersManager - Core command processing and event generation
//!
//! This module handles:
//! - Command validation (actions) and serial verification
//! - Event application to a working copy of the order
//! - Handing the resulting patch to the sync layer
//! - Event broadcasting and audit logging
//!
//! # Command Flow
//!
//! ```text
//! execute_command(cmd)
//!     ├─ 0. Take the per-order lock (held until step 6 finishes)
//!     ├─ 1. Look up the order in the sync layer
//!     ├─ 2. Create CommandContext + CommandMetadata (server time)
//!     ├─ 3. Convert command to action, inject verifier, execute
//!     ├─ 4. Apply events to a copy via EventApplier
//!     ├─ 5. OrderPatch::between(before, after)
//!     ├─ 6. OrderSync::apply_mutation (local now, remote on the writer task)
//!     ├─ 7. Broadcast event(s) + audit log
//!     └─ 8. Return response
//! ```

mod error;
mod locks;
pub use error::*;

use locks::OrderLocks;
use super::actions::CommandAction;
use super::appliers::apply_events;
use super::import::{ColumnMapping, ImportReport, ImportRow, drafts_from_rows};
use super::traits::{CommandContext, CommandHandler, CommandMetadata, ensure_admin};
use crate::batch::{BatchReport, settle_all};
use crate::sync::{OrderSync, SyncOutcome};
use crate::verification::{VerificationReport, VerificationService};
use shared::error::ErrorCode;
use shared::order::{
    Attachment, CommandError, CommandResponse, Order, OrderCommand, OrderCommandPayload,
    OrderEvent, OrderPatch, User,
};
use shared::util::{new_order_id, now_millis};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// OrdersManager for command processing
pub struct OrdersManager {
    sync: Arc<OrderSync>,
    verifier: Option<Arc<VerificationService>>,
    event_tx: broadcast::Sender<OrderEvent>,
    locks: Arc<OrderLocks>,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("sync", &"<OrderSync>")
            .field("verifier", &self.verifier.is_some())
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl OrdersManager {
    pub fn new(sync: Arc<OrderSync>, verifier: Option<Arc<VerificationService>>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sync,
            verifier,
            event_tx,
            locks: Arc::new(OrderLocks::default()),
        }
    }

    /// Subscribe to event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn sync(&self) -> &Arc<OrderSync> {
        &self.sync
    }

    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.sync.get(order_id)
    }

    /// Orders the user may see (admins: all, workers: own assignments)
    pub fn orders_for(&self, user: &User) -> Vec<Order> {
        self.sync.visible_to(user)
    }

    /// Execute a command and return the response
    pub async fn execute_command(&self, cmd: OrderCommand) -> CommandResponse {
        self.execute_command_with_events(cmd).await.0
    }

    /// Execute a command and return both the response and generated events
    pub async fn execute_command_with_events(
        &self,
        cmd: OrderCommand,
    ) -> (CommandResponse, Vec<OrderEvent>) {
        match self.process_command(&cmd).await {
            Ok((response, events)) => {
                for event in &events {
                    if self.event_tx.send(event.clone()).is_err() {
                        tracing::debug!("Event broadcast skipped: no active receivers");
                        break;
                    }
                }
                (response, events)
            }
            Err(err) => {
                let error = CommandError::from(err);
                tracing::info!(
                    command_id = %cmd.command_id,
                    error_code = %error.code,
                    category = error.code.category().name(),
                    error = %error.message,
                    "Command rejected"
                );
                (CommandResponse::error(cmd.command_id, error), vec![])
            }
        }
    }

    /// Process command and return response with events
    async fn process_command(
        &self,
        cmd: &OrderCommand,
    ) -> ManagerResult<(CommandResponse, Vec<OrderEvent>)> {
        tracing::debug!(command_id = %cmd.command_id, payload = ?cmd.payload, "Processing command");

        // 0. 同一工单的命令串行执行
        let order_id = cmd.order_id().to_string();
        let _guard = self.locks.lock(&order_id).await;

        // 1. Current state
        let snapshot = self
            .sync
            .get(&order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.clone()))?;

        // 2. Context
        let metadata = CommandMetadata {
            command_id: cmd.command_id.clone(),
            actor: cmd.actor.clone(),
            timestamp: now_millis(),
        };

        // 3. Action
        let mut action = CommandAction::from(cmd);
        if let CommandAction::CompleteOrder(complete) = &mut action {
            complete.verifier = self.verifier.clone();
        }
        let events = {
            let mut ctx = CommandContext::new(&snapshot);
            action.execute(&mut ctx, &metadata).await?
        };

        // 4-5. Apply to a copy, diff
        let mut updated = snapshot.clone();
        apply_events(&mut updated, &events);
        let patch = OrderPatch::between(&snapshot, &updated);

        // 6. Local + remote
        let outcome = self.sync.apply_mutation(&order_id, &patch)?;
        if outcome == SyncOutcome::Queued && !self.sync.is_online() {
            tracing::debug!(order_id = %order_id, "Change kept locally until the remote store is back");
        }

        // 7. Audit
        for event in &events {
            tracing::info!(
                target: "audit",
                order_id = %event.order_id,
                event_type = %event.event_type,
                operator = %event.operator_name,
                role = %event.operator_role,
                command_id = %event.command_id,
                "Order event applied"
            );
        }

        tracing::info!(command_id = %cmd.command_id, order_id = %order_id, event_count = events.len(), "Command processed successfully");
        Ok((CommandResponse::success(cmd.command_id.clone(), Some(order_id)), events))
    }

    // ========== Import ==========

    /// Create dispatched orders from spreadsheet rows (admin only)
    pub async fn import_orders(
        &self,
        actor: &User,
        mapping: &ColumnMapping,
        rows: &[ImportRow],
    ) -> ManagerResult<ImportReport> {
        ensure_admin(actor)?;

        let drafts = drafts_from_rows(mapping, rows);
        let skipped = rows.len() - drafts.len();
        let now = now_millis();
        let orders: Vec<Order> = drafts
            .into_iter()
            .map(|draft| draft.into_order(new_order_id(), actor, now))
            .collect();
        let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();

        let outcome = self.sync.insert_orders(orders).await;

        tracing::info!(
            target: "audit",
            operator = %actor.name,
            created = order_ids.len(),
            skipped,
            "Orders imported"
        );
        tracing::info!(created = order_ids.len(), skipped, ?outcome, "Import finished");

        Ok(ImportReport {
            created: order_ids.len(),
            skipped,
            order_ids,
        })
    }

    // ========== Verification ==========

    /// Manual "verify now" check; same verification the completion gate runs
    pub async fn verify_photo(
        &self,
        order_id: &str,
        image: &Attachment,
    ) -> ManagerResult<VerificationReport> {
        let order = self
            .sync
            .get(order_id)
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        let verifier = self.verifier.as_ref().ok_or(ManagerError::VerifierMissing)?;
        Ok(verifier.verify(image, &order.serial_code).await?)
    }

    // ========== Batch ==========

    /// Run one command payload against every id, all-settle
    pub async fn execute_batch(
        &self,
        actor: &User,
        payload: &OrderCommandPayload,
        order_ids: &[String],
    ) -> BatchReport {
        let report = settle_all(order_ids, |order_id| async move {
            let cmd = OrderCommand::new(actor.clone(), payload.retarget(&order_id));
            let response = self.execute_command(cmd).await;
            if response.success {
                Ok(())
            } else {
                Err(response.error.unwrap_or_else(|| {
                    CommandError::new(ErrorCode::Unknown, "command failed without error")
                }))
            }
        })
        .await;

        tracing::info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Batch finished"
        );
        report
    }

    /// Batch transfer to another worker
    pub async fn reassign_many(
        &self,
        actor: &User,
        order_ids: &[String],
        user_name: &str,
        team: &str,
    ) -> BatchReport {
        let payload = OrderCommandPayload::ReassignOrder {
            order_id: String::new(),
            user_name: user_name.to_string(),
            team: team.to_string(),
        };
        self.execute_batch(actor, &payload, order_ids).await
    }
}

#[cfg(test)]
mod tests;
