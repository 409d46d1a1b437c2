//! In-crate fakes and fixtures for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::message::RemoteEvent;
use shared::order::{Attachment, Order, OrderPatch, User};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::orders::traits::CommandMetadata;
use crate::sync::{RemoteError, RemoteStore, Subscription};
use crate::verification::{VisionClient, VisionError};

// ========== Fixtures ==========

/// Dispatched order assigned to `name`/`team`
pub fn assigned_order(id: &str, name: &str, team: &str) -> Order {
    let mut order = Order::new(id.into(), "Meter swap", 0);
    order.user_name = name.into();
    order.team = team.into();
    order
}

pub fn worker_metadata(name: &str, team: &str, timestamp: i64) -> CommandMetadata {
    CommandMetadata {
        command_id: "cmd-1".into(),
        actor: User::worker(name, team),
        timestamp,
    }
}

pub fn admin_metadata(timestamp: i64) -> CommandMetadata {
    CommandMetadata {
        command_id: "cmd-1".into(),
        actor: User::admin("boss"),
        timestamp,
    }
}

// ========== Vision ==========

/// Canned vision answer (or failure status), counting calls
#[derive(Clone)]
pub struct FakeVision {
    reply: Result<String, u16>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeVision {
    pub fn answering(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 429 maps to quota exhaustion like the HTTP client does
    pub fn failing_with_status(status: u16) -> Self {
        Self {
            reply: Err(status),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer only after `delay`, like a slow recognition call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionClient for FakeVision {
    async fn recognize(&self, _image: &Attachment, _prompt: &str) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(429) => Err(VisionError::QuotaExceeded),
            Err(status) => Err(VisionError::Status {
                status: *status,
                body: "fake failure".into(),
            }),
        }
    }
}

// ========== Remote store ==========

/// In-memory remote table with a push channel and switchable failures
#[derive(Default)]
pub struct FakeRemote {
    orders: Mutex<Vec<Order>>,
    offline: AtomicBool,
    no_push: AtomicBool,
    hang_updates: AtomicBool,
    reject_status: Mutex<Option<u16>>,
    subscribers: Mutex<Vec<mpsc::Sender<RemoteEvent>>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<Order>) -> Self {
        let remote = Self::default();
        *remote.orders.lock() = orders;
        remote
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// REST only: `subscribe` always fails
    pub fn without_push(self) -> Self {
        self.no_push.store(true, Ordering::SeqCst);
        self
    }

    /// Updates never answer while set
    pub fn hang_updates(&self, hang: bool) {
        self.hang_updates.store(hang, Ordering::SeqCst);
    }

    /// Every update answers with this HTTP status
    pub fn reject_updates(&self, status: u16) {
        *self.reject_status.lock() = Some(status);
    }

    pub fn order(&self, id: &str) -> Option<Order> {
        self.orders.lock().iter().find(|o| o.id == id).cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// Deliver a push event to every live subscription
    pub async fn push(&self, event: RemoteEvent) {
        let senders: Vec<_> = self.subscribers.lock().clone();
        for tx in senders {
            let _ = tx.send(event.clone()).await;
        }
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable("fake remote offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn list(&self) -> Result<Vec<Order>, RemoteError> {
        self.check_online()?;
        let mut orders = self.orders.lock().clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn insert(&self, orders: &[Order]) -> Result<(), RemoteError> {
        self.check_online()?;
        let mut stored = self.orders.lock();
        for order in orders {
            match stored.iter_mut().find(|o| o.id == order.id) {
                Some(existing) => *existing = order.clone(),
                None => stored.push(order.clone()),
            }
        }
        Ok(())
    }

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<(), RemoteError> {
        self.check_online()?;
        if self.hang_updates.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(status) = *self.reject_status.lock() {
            return Err(RemoteError::Rejected {
                status,
                body: "fake rejection".into(),
            });
        }
        if let Some(order) = self.orders.lock().iter_mut().find(|o| o.id == id) {
            patch.apply_to(order);
        }
        Ok(())
    }

    fn supports_push(&self) -> bool {
        !self.no_push.load(Ordering::SeqCst)
    }

    async fn subscribe(&self) -> Result<Subscription, RemoteError> {
        self.check_online()?;
        if !self.supports_push() {
            return Err(RemoteError::Unreachable("realtime URL not configured".into()));
        }
        let (tx, _cancel, subscription) = Subscription::channel(64);
        self.subscribers.lock().push(tx);
        Ok(subscription)
    }
}
