use super::*;
use crate::orders::import::{ColumnMapping, ImportRow};
use crate::orders::traits::OrderError;
use crate::sync::LocalOrderStorage;
use crate::test_support::{FakeRemote, FakeVision};
use std::time::Duration;
use shared::order::{
    AuditStatus, CompletionSubmission, HistoryAction, OrderEventType, OrderStatus, ReturnReason,
};

const SERIAL: &str = "0812345";

fn create_test_manager(vision: FakeVision) -> OrdersManager {
    let local = LocalOrderStorage::open_in_memory().unwrap();
    let sync = Arc::new(OrderSync::new(None, Some(local)));
    OrdersManager::new(
        sync,
        Some(Arc::new(VerificationService::new(Arc::new(vision)))),
    )
}

fn create_manager_with_remote(remote: Arc<FakeRemote>) -> OrdersManager {
    let local = LocalOrderStorage::open_in_memory().unwrap();
    let sync = Arc::new(OrderSync::new(Some(remote), Some(local)));
    OrdersManager::new(
        sync,
        Some(Arc::new(VerificationService::new(Arc::new(
            FakeVision::answering(r#"{"candidates": ["0812345"]}"#),
        )))),
    )
}

fn admin() -> User {
    User::admin("boss")
}

fn zhang() -> User {
    User::worker("Zhang", "North")
}

fn mapping() -> ColumnMapping {
    ColumnMapping {
        task_name: "task".into(),
        team: Some("team".into()),
        user_name: Some("worker".into()),
        serial_code: Some("serial".into()),
        ..Default::default()
    }
}

fn row(task: &str) -> ImportRow {
    [
        ("task", task),
        ("team", "North"),
        ("worker", "Zhang"),
        ("serial", SERIAL),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

// ========================================================================
// Helper: import one order assigned to Zhang/North
// ========================================================================

async fn import_one(manager: &OrdersManager, task: &str) -> String {
    let report = manager
        .import_orders(&admin(), &mapping(), &[row(task)])
        .await
        .unwrap();
    assert_eq!(report.created, 1);
    report.order_ids[0].clone()
}

async fn receive(manager: &OrdersManager, actor: User, order_id: &str) -> CommandResponse {
    manager
        .execute_command(OrderCommand::new(
            actor,
            OrderCommandPayload::ReceiveOrder {
                order_id: order_id.to_string(),
            },
        ))
        .await
}

async fn complete(
    manager: &OrdersManager,
    actor: User,
    order_id: &str,
    submission: CompletionSubmission,
) -> CommandResponse {
    manager
        .execute_command(OrderCommand::new(
            actor,
            OrderCommandPayload::CompleteOrder {
                order_id: order_id.to_string(),
                submission,
            },
        ))
        .await
}

async fn set_deadline(manager: &OrdersManager, order_id: &str, deadline: Option<i64>) -> CommandResponse {
    manager
        .execute_command(OrderCommand::new(
            admin(),
            OrderCommandPayload::SetDeadline {
                order_id: order_id.to_string(),
                deadline,
            },
        ))
        .await
}

fn photo_submission() -> CompletionSubmission {
    CompletionSubmission {
        return_reason: Some(ReturnReason::Resolved),
        photo: Some(Attachment::new("meter.jpg", "aGVsbG8=")),
        ..Default::default()
    }
}

fn attachments_only_submission() -> CompletionSubmission {
    CompletionSubmission {
        return_reason: Some(ReturnReason::CustomerAbsent),
        remark_images: vec![Attachment::new("door.jpg", "aGk=")],
        ..Default::default()
    }
}

fn error_code(response: &CommandResponse) -> ErrorCode {
    assert!(!response.success, "expected rejection");
    response.error.as_ref().map(|e| e.code).unwrap()
}

mod test_flows;
mod test_guards;
