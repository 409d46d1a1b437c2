//! Batch coordinator - run one mutation over many orders
//!
//! All-settle: every id is attempted, concurrently, and each outcome is
//! reported on its own. One failure never stops or reverts the others.

use futures::future::join_all;
use serde::Serialize;
use shared::order::CommandError;
use std::future::Future;

/// Per-id failure
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub order_id: String,
    pub error: CommandError,
}

/// Aggregate outcome of a batch
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub succeeded_ids: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `op` for every id and wait for all of them
pub async fn settle_all<F, Fut>(ids: &[String], op: F) -> BatchReport
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), CommandError>>,
{
    let results = join_all(ids.iter().map(|id| {
        let id = id.clone();
        let fut = op(id.clone());
        async move { (id, fut.await) }
    }))
    .await;

    let mut report = BatchReport {
        attempted: ids.len(),
        ..Default::default()
    };
    for (order_id, result) in results {
        match result {
            Ok(()) => {
                report.succeeded += 1;
                report.succeeded_ids.push(order_id);
            }
            Err(error) => report.failed.push(BatchFailure { order_id, error }),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[tokio::test]
    async fn test_one_failure_does_not_stop_others() {
        let ids: Vec<String> = (1..=5).map(|i| format!("o-{i}")).collect();
        let report = settle_all(&ids, |id| async move {
            if id == "o-3" {
                Err(CommandError::new(ErrorCode::OrderNotFound, "boom"))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(report.attempted, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].order_id, "o-3");
        assert!(!report.succeeded_ids.contains(&"o-3".to_string()));
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = settle_all(&[], |_| async { Ok(()) }).await;
        assert_eq!(report.attempted, 0);
        assert!(report.all_succeeded());
    }
}
