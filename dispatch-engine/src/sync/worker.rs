//! RealtimeWorker - keeps the collection in step with the remote store
//!
//! 1. Subscribe to the push channel (when the store has one)
//! 2. Flush queued offline writes, then reload the full collection over REST
//! 3. Merge push events in arrival order
//! 4. Retry queued writes periodically
//! 5. Reconnect with exponential backoff on disconnect
//!
//! Without a push channel the worker only runs step 2, every
//! `PENDING_FLUSH_INTERVAL_SECS` while the store answers and on the backoff
//! schedule while it does not. A push channel failure alone never marks the
//! layer offline; only REST failures do.

use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::remote::{RemoteStore, Subscription};
use super::service::{LoadSource, OrderSync};

/// Initial retry delay
const INITIAL_RETRY_DELAY_SECS: u64 = 5;
/// Max reconnect delay
const MAX_RECONNECT_DELAY_SECS: u64 = 120;
/// Outbox retry interval while connected
const PENDING_FLUSH_INTERVAL_SECS: u64 = 60;

pub struct RealtimeWorker {
    sync: Arc<OrderSync>,
    shutdown: CancellationToken,
}

impl RealtimeWorker {
    pub fn new(sync: Arc<OrderSync>, shutdown: CancellationToken) -> Self {
        Self { sync, shutdown }
    }

    /// Main run loop: catch up, merge, reconnect on failure
    pub async fn run(self) {
        let Some(remote) = self.sync.remote() else {
            tracing::info!("No remote store configured, realtime worker idle");
            return;
        };
        let push = remote.supports_push();
        tracing::info!(push, "RealtimeWorker started");
        let mut retry_delay = Duration::from_secs(INITIAL_RETRY_DELAY_SECS);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let healthy = if push {
                self.push_round(remote.as_ref(), retry_delay).await
            } else {
                self.catch_up().await
            };
            if self.shutdown.is_cancelled() {
                break;
            }

            let wait = if healthy {
                retry_delay = Duration::from_secs(INITIAL_RETRY_DELAY_SECS);
                if push {
                    retry_delay
                } else {
                    Duration::from_secs(PENDING_FLUSH_INTERVAL_SECS)
                }
            } else {
                let wait = retry_delay;
                retry_delay =
                    (retry_delay * 2).min(Duration::from_secs(MAX_RECONNECT_DELAY_SECS));
                wait
            };

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {},
            }
        }

        tracing::info!("RealtimeWorker stopped");
    }

    /// Subscribe and run one session. `false` when the channel did not open.
    async fn push_round(&self, remote: &dyn RemoteStore, retry_delay: Duration) -> bool {
        match remote.subscribe().await {
            Ok(subscription) => {
                // 先推送离线期间的写入，再全量加载，避免旧数据覆盖本地修改
                self.catch_up().await;
                self.run_session(subscription).await;
                true
            }
            Err(e) => {
                tracing::warn!(
                    delay_secs = retry_delay.as_secs(),
                    "Realtime subscribe failed, retrying: {e}"
                );
                // 推送不可用时 REST 仍可能可用
                self.catch_up().await;
                false
            }
        }
    }

    /// Flush queued writes, then reload. `true` when the remote answered.
    async fn catch_up(&self) -> bool {
        if let Err(e) = self.sync.flush_pending().await {
            tracing::warn!("Flushing pending writes failed: {e}");
        }
        matches!(self.sync.load().await, LoadSource::Remote(_))
    }

    /// One subscription, until it ends or shutdown
    async fn run_session(&self, mut subscription: Subscription) {
        let mut flush_interval =
            tokio::time::interval(Duration::from_secs(PENDING_FLUSH_INTERVAL_SECS));
        flush_interval.tick().await; // skip immediate tick

        loop {
            tokio::select! {
                // dropping the subscription cancels its reader task
                _ = self.shutdown.cancelled() => return,

                _ = flush_interval.tick() => {
                    if let Err(e) = self.sync.flush_pending().await {
                        tracing::warn!("Periodic pending flush failed: {e}");
                    }
                }

                event = subscription.next() => match event {
                    Some(event) => self.sync.on_remote_event(&event),
                    None => {
                        tracing::warn!("Realtime subscription ended, reconnecting");
                        return;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::local::LocalOrderStorage;
    use crate::test_support::FakeRemote;
    use shared::message::RemoteEvent;
    use shared::order::{Order, OrderPatch};

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_worker_loads_and_merges_push_events() {
        let remote = Arc::new(FakeRemote::with_orders(vec![Order::new(
            "a".into(),
            "Meter swap",
            1,
        )]));
        let local = LocalOrderStorage::open_in_memory().unwrap();
        let sync = Arc::new(OrderSync::new(Some(remote.clone()), Some(local)));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(RealtimeWorker::new(sync.clone(), shutdown.clone()).run());

        wait_until(|| remote.subscriber_count() == 1 && sync.len() == 1).await;
        assert!(sync.is_online());

        remote
            .push(RemoteEvent::Insert {
                record: Order::new("b".into(), "Cable check", 2),
            })
            .await;
        wait_until(|| sync.get("b").is_some()).await;

        remote.push(RemoteEvent::Delete { id: "a".into() }).await;
        wait_until(|| sync.get("a").is_none()).await;

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_without_remote_returns() {
        let sync = Arc::new(OrderSync::new(None, None));
        RealtimeWorker::new(sync, CancellationToken::new()).run().await;
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown_while_backing_off() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_offline(true);
        let sync = Arc::new(OrderSync::new(Some(remote), None));
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(RealtimeWorker::new(sync.clone(), shutdown.clone()).run());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!sync.is_online());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_rest_only_remote_flushes_offline_writes() {
        let remote = Arc::new(
            FakeRemote::with_orders(vec![Order::new("a".into(), "Meter swap", 1)]).without_push(),
        );
        let local = LocalOrderStorage::open_in_memory().unwrap();
        let sync = Arc::new(OrderSync::new(Some(remote.clone()), Some(local.clone())));
        sync.load().await;

        remote.set_offline(true);
        let patch = OrderPatch {
            user_name: Some("Zhang".into()),
            ..Default::default()
        };
        sync.apply_mutation("a", &patch).unwrap();
        sync.remote_settled().await;
        assert_eq!(local.pending().unwrap().len(), 1);
        assert!(!sync.is_online());

        remote.set_offline(false);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(RealtimeWorker::new(sync.clone(), shutdown.clone()).run());

        wait_until(|| local.pending().unwrap().is_empty()).await;
        assert_eq!(remote.order("a").unwrap().user_name, "Zhang");
        wait_until(|| sync.is_online()).await;
        assert_eq!(sync.get("a").unwrap().user_name, "Zhang");
        assert_eq!(remote.subscriber_count(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
