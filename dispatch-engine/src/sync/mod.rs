//! Sync/reconciliation layer
//!
//! Owns the canonical order collection. Local mutations are applied first and
//! persisted to redb; remote writes follow asynchronously and are never rolled
//! back. Push events from the remote store are merged by id.

pub mod collection;
pub mod http_remote;
pub mod local;
pub mod remote;
pub mod service;
pub mod worker;

pub use collection::OrderCollection;
pub use http_remote::HttpRemoteStore;
pub use local::{LocalOrderStorage, PendingWrite, StorageError};
pub use remote::{RemoteError, RemoteStore, Subscription};
pub use service::{LoadSource, OrderSync, SyncError, SyncOutcome};
pub use worker::RealtimeWorker;
