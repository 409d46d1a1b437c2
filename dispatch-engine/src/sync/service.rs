//! OrderSync - owner of the order collection
//!
//! Two decoupled effects per mutation:
//!
//! 1. local apply: synchronous, under the collection lock, persisted to redb
//! 2. remote apply: asynchronous, after the lock is released
//!
//! The remote half runs on a background writer, one write at a time, so a slow
//! remote never holds up the caller. A failed remote apply never rolls the
//! local change back; the write is kept in the pending queue and the layer
//! flips to offline. Queued writes are flushed when the remote comes back and
//! re-applied on top of a remote load.

use parking_lot::RwLock;
use shared::error::ErrorCode;
use shared::message::RemoteEvent;
use shared::order::{CommandError, Order, OrderPatch, OrderStatus, User};
use std::sync::{Arc, OnceLock, Weak};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use super::collection::OrderCollection;
use super::local::{LocalOrderStorage, PendingWrite};
use super::remote::{RemoteError, RemoteStore};
use crate::batch::{BatchReport, settle_all};

/// Local mutation failure
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order {id} cannot move from {from} back to {to}")]
    InvalidTransition {
        id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl From<SyncError> for CommandError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::OrderNotFound(id) => {
                CommandError::new(ErrorCode::OrderNotFound, format!("Order not found: {id}"))
            }
            err @ SyncError::InvalidTransition { .. } => {
                CommandError::new(ErrorCode::InvalidTransition, err.to_string())
            }
        }
    }
}

/// Where the remote half of a mutation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote store accepted the write
    Synced,
    /// Applied locally, remote write handed to the background writer
    Queued,
    /// Applied locally only (no remote configured, or remote failed)
    LocalOnly,
}

/// Where [`OrderSync::load`] got its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote(usize),
    Local(usize),
    Empty,
}

/// Order id plus the write that triggered the push
type QueuedWrite = (String, PendingWrite);

pub struct OrderSync {
    orders: RwLock<OrderCollection>,
    remote: Option<Arc<dyn RemoteStore>>,
    local: Option<LocalOrderStorage>,
    online: watch::Sender<bool>,
    /// 后台写入任务（首次变更时启动）
    writer: OnceLock<mpsc::UnboundedSender<QueuedWrite>>,
    /// Writes handed to the writer and not yet finished
    in_flight: watch::Sender<usize>,
}

impl OrderSync {
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, local: Option<LocalOrderStorage>) -> Self {
        let (online, _) = watch::channel(false);
        let (in_flight, _) = watch::channel(0);
        Self {
            orders: RwLock::new(OrderCollection::new()),
            remote,
            local,
            online,
            writer: OnceLock::new(),
            in_flight,
        }
    }

    pub fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.remote.clone()
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    // ========== Online flag ==========

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn watch_online(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    pub(crate) fn set_online(&self, online: bool) {
        let changed = self.online.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if changed {
            if online {
                tracing::info!("Remote store reachable, back online");
            } else {
                tracing::warn!("Remote store unreachable, continuing offline");
            }
        }
    }

    // ========== Queries ==========

    pub fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<Order> {
        self.orders.read().list().to_vec()
    }

    pub fn visible_to(&self, user: &User) -> Vec<Order> {
        self.orders.read().visible_to(user)
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    // ========== Load ==========

    /// Load the full collection. Never fails: remote first, else the local
    /// snapshot, else empty. The online flag reports which one it was.
    pub async fn load(&self) -> LoadSource {
        if let Some(remote) = &self.remote {
            match remote.list().await {
                Ok(orders) => {
                    let count = orders.len();
                    let merged = {
                        let mut collection = self.orders.write();
                        collection.replace_all(orders);
                        self.reapply_pending(&mut collection);
                        collection.list().to_vec()
                    };
                    if let Some(local) = &self.local
                        && let Err(e) = local.replace_all(&merged)
                    {
                        tracing::error!(error = %e, "Failed to persist loaded orders");
                    }
                    self.set_online(true);
                    tracing::info!(count, "Orders loaded from remote store");
                    return LoadSource::Remote(count);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Remote load failed, falling back to local");
                    self.set_online(false);
                }
            }
        }

        let Some(local) = &self.local else {
            return LoadSource::Empty;
        };
        match local.load_all() {
            Ok(orders) => {
                let count = orders.len();
                self.orders.write().replace_all(orders);
                tracing::info!(count, "Orders loaded from local storage");
                LoadSource::Local(count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read local orders");
                LoadSource::Empty
            }
        }
    }

    /// Writes not yet accepted remotely still reflect the latest local state
    fn reapply_pending(&self, collection: &mut OrderCollection) {
        let Some(local) = &self.local else { return };
        let pending = match local.pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read pending writes");
                return;
            }
        };
        for (id, write) in pending {
            match write {
                PendingWrite::Insert { order } => collection.upsert(order),
                PendingWrite::Update { patch } => {
                    collection.apply_patch(&id, &patch);
                }
            }
        }
    }

    // ========== Local mutation ==========

    /// Apply `patch` to the in-memory collection and persist it.
    /// A status that would move backwards is rejected and nothing changes.
    pub fn apply_local(&self, id: &str, patch: &OrderPatch) -> Result<Order, SyncError> {
        let order = {
            let mut collection = self.orders.write();
            let current = collection
                .get(id)
                .ok_or_else(|| SyncError::OrderNotFound(id.to_string()))?;
            if let Some(next) = patch.status
                && !current.status.can_advance_to(next)
            {
                return Err(SyncError::InvalidTransition {
                    id: id.to_string(),
                    from: current.status,
                    to: next,
                });
            }
            collection
                .apply_patch(id, patch)
                .cloned()
                .ok_or_else(|| SyncError::OrderNotFound(id.to_string()))?
        };
        self.persist(&order);
        Ok(order)
    }

    fn persist(&self, order: &Order) {
        if let Some(local) = &self.local
            && let Err(e) = local.save_order(order)
        {
            tracing::error!(order_id = %order.id, error = %e, "Failed to persist order locally");
        }
    }

    // ========== Mutation (local + remote) ==========

    /// Optimistic mutation: local now, remote on the background writer.
    /// Not rolled back. Must run inside a Tokio runtime.
    pub fn apply_mutation(
        self: &Arc<Self>,
        id: &str,
        patch: &OrderPatch,
    ) -> Result<SyncOutcome, SyncError> {
        self.apply_local(id, patch)?;
        if self.remote.is_none() {
            return Ok(SyncOutcome::LocalOnly);
        }

        let write = PendingWrite::Update {
            patch: patch.clone(),
        };
        if let Some(local) = &self.local
            && let Err(e) = local.queue_pending(id, write.clone())
        {
            tracing::error!(order_id = %id, error = %e, "Failed to queue remote write");
        }
        self.enqueue_remote(id, write);
        Ok(SyncOutcome::Queued)
    }

    /// Same patch for many ids, concurrently, all-settle
    pub async fn apply_batch(self: &Arc<Self>, ids: &[String], patch: &OrderPatch) -> BatchReport {
        settle_all(ids, |id| async move {
            self.apply_mutation(&id, patch)
                .map(|_| ())
                .map_err(CommandError::from)
        })
        .await
    }

    fn enqueue_remote(self: &Arc<Self>, id: &str, write: PendingWrite) {
        let writer = self.writer.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(drain_writes(Arc::downgrade(self), rx));
            tx
        });
        self.in_flight.send_modify(|n| *n += 1);
        if writer.send((id.to_string(), write)).is_err() {
            // writer gone; the outbox still holds the write
            self.finish_write();
        }
    }

    fn finish_write(&self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Wait until every write handed to the background writer has been tried
    pub async fn remote_settled(&self) {
        let mut in_flight = self.in_flight.subscribe();
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }

    /// Prepend new orders locally, then insert remotely
    pub async fn insert_orders(&self, orders: Vec<Order>) -> SyncOutcome {
        if orders.is_empty() {
            return SyncOutcome::LocalOnly;
        }
        {
            let mut collection = self.orders.write();
            for order in &orders {
                collection.upsert(order.clone());
            }
        }
        if let Some(local) = &self.local
            && let Err(e) = local.save_orders(&orders)
        {
            tracing::error!(error = %e, "Failed to persist imported orders");
        }

        let Some(remote) = &self.remote else {
            return SyncOutcome::LocalOnly;
        };
        if let Some(local) = &self.local {
            for order in &orders {
                let write = PendingWrite::Insert {
                    order: order.clone(),
                };
                if let Err(e) = local.queue_pending(&order.id, write) {
                    tracing::error!(order_id = %order.id, error = %e, "Failed to queue insert");
                }
            }
        }

        match remote.insert(&orders).await {
            Ok(()) => {
                if let Some(local) = &self.local {
                    for order in &orders {
                        let sent = PendingWrite::Insert {
                            order: order.clone(),
                        };
                        let _ = local.clear_pending_if(&order.id, &sent);
                    }
                }
                self.set_online(true);
                SyncOutcome::Synced
            }
            Err(e) => {
                tracing::warn!(count = orders.len(), error = %e, "Remote insert failed, kept locally");
                self.mark_failure(&e);
                SyncOutcome::LocalOnly
            }
        }
    }

    async fn push_remote(&self, id: &str, write: PendingWrite) -> SyncOutcome {
        let Some(remote) = &self.remote else {
            return SyncOutcome::LocalOnly;
        };

        // 发送合并后的最新写入
        let write = match &self.local {
            Some(local) => match local.pending_for(id) {
                Ok(Some(latest)) => latest,
                // 已由 flush 或前一次推送发出
                Ok(None) => return SyncOutcome::Synced,
                Err(e) => {
                    tracing::error!(order_id = %id, error = %e, "Failed to read queued write");
                    write
                }
            },
            None => write,
        };

        match send_write(remote.as_ref(), id, &write).await {
            Ok(()) => {
                if let Some(local) = &self.local {
                    let _ = local.clear_pending_if(id, &write);
                }
                self.set_online(true);
                SyncOutcome::Synced
            }
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "Remote write failed, kept locally");
                self.mark_failure(&e);
                if is_permanent(&e)
                    && let Some(local) = &self.local
                {
                    tracing::error!(order_id = %id, "Dropping write rejected by remote store");
                    let _ = local.clear_pending_if(id, &write);
                }
                SyncOutcome::LocalOnly
            }
        }
    }

    fn mark_failure(&self, err: &RemoteError) {
        if !is_permanent(err) {
            self.set_online(false);
        }
    }

    /// Send every queued write. Stops at the first transport failure.
    pub async fn flush_pending(&self) -> Result<usize, RemoteError> {
        let (Some(remote), Some(local)) = (&self.remote, &self.local) else {
            return Ok(0);
        };
        let pending = local
            .pending()
            .map_err(|e| RemoteError::InvalidPayload(format!("pending queue unreadable: {e}")))?;

        let mut flushed = 0;
        for (id, write) in pending {
            match send_write(remote.as_ref(), &id, &write).await {
                Ok(()) => {
                    let _ = local.clear_pending_if(&id, &write);
                    flushed += 1;
                }
                Err(e) if is_permanent(&e) => {
                    tracing::error!(order_id = %id, error = %e, "Dropping write rejected by remote store");
                    let _ = local.clear_pending_if(&id, &write);
                }
                Err(e) => {
                    self.set_online(false);
                    return Err(e);
                }
            }
        }
        if flushed > 0 {
            tracing::info!(flushed, "Pending writes flushed to remote store");
        }
        Ok(flushed)
    }

    // ========== Push merge ==========

    /// Merge a push notification; idempotent, last arrival wins per id
    pub fn on_remote_event(&self, event: &RemoteEvent) {
        self.orders.write().merge(event);

        if let Some(local) = &self.local {
            let result = match event {
                RemoteEvent::Insert { record } | RemoteEvent::Update { record } => {
                    local.save_order(record)
                }
                RemoteEvent::Delete { id } => local.remove_order(id),
            };
            if let Err(e) = result {
                tracing::error!(order_id = %event.id(), error = %e, "Failed to persist remote event");
            }
        }
        tracing::debug!(order_id = %event.id(), kind = event.kind(), "Remote event merged");
    }
}

/// Background writer: one remote write at a time, in submission order.
/// Ends once the owning `OrderSync` is dropped.
async fn drain_writes(owner: Weak<OrderSync>, mut rx: mpsc::UnboundedReceiver<QueuedWrite>) {
    while let Some((id, write)) = rx.recv().await {
        let Some(sync) = owner.upgrade() else { break };
        let outcome = sync.push_remote(&id, write).await;
        tracing::debug!(order_id = %id, ?outcome, "Remote write finished");
        sync.finish_write();
    }
}

async fn send_write(
    remote: &dyn RemoteStore,
    id: &str,
    write: &PendingWrite,
) -> Result<(), RemoteError> {
    match write {
        PendingWrite::Insert { order } => remote.insert(std::slice::from_ref(order)).await,
        PendingWrite::Update { patch } => remote.update(id, patch).await,
    }
}

/// 4xx: retrying the same write will not help
fn is_permanent(err: &RemoteError) -> bool {
    matches!(err, RemoteError::Rejected { status, .. } if (400..500).contains(status) && *status != 408 && *status != 429)
}
