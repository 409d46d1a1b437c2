//! Remote store adapter contract

use async_trait::async_trait;
use shared::message::RemoteEvent;
use shared::order::{Order, OrderPatch};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Remote store failure
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store unreachable: {0}")]
    Unreachable(String),

    #[error("remote store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid remote payload: {0}")]
    InvalidPayload(String),

    #[error("realtime channel closed")]
    ChannelClosed,
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::InvalidPayload(err.to_string())
        } else {
            RemoteError::Unreachable(err.to_string())
        }
    }
}

/// Remote order table with a push channel
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Full collection, newest first
    async fn list(&self) -> Result<Vec<Order>, RemoteError>;

    async fn insert(&self, orders: &[Order]) -> Result<(), RemoteError>;

    async fn update(&self, id: &str, patch: &OrderPatch) -> Result<(), RemoteError>;

    /// Whether [`subscribe`](Self::subscribe) can ever succeed
    fn supports_push(&self) -> bool {
        true
    }

    /// Open the push channel
    async fn subscribe(&self) -> Result<Subscription, RemoteError>;
}

/// Push-notification stream.
///
/// Ends (yields `None`) once the channel closes or the subscription is
/// cancelled, and cannot be restarted; subscribe again instead. Dropping the
/// subscription cancels the reader task feeding it.
pub struct Subscription {
    rx: mpsc::Receiver<RemoteEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<RemoteEvent>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Sender side plus the token the feeding task should watch
    pub fn channel(buffer: usize) -> (mpsc::Sender<RemoteEvent>, CancellationToken, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        let cancel = CancellationToken::new();
        (tx, cancel.clone(), Self::new(rx, cancel))
    }

    pub async fn next(&mut self) -> Option<RemoteEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            event = self.rx.recv() => event,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Explicit teardown
    pub fn unsubscribe(self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
