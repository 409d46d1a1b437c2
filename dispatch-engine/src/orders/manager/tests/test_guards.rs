use super::*;

// ========================================================================
//  守卫：拒绝时状态不变
// ========================================================================

#[tokio::test]
async fn test_non_matching_worker_never_transitions() {
    let manager = create_test_manager(FakeVision::answering(r#"{"candidates": ["0812345"]}"#));
    let order_id = import_one(&manager, "Meter swap").await;
    let before = manager.get_order(&order_id).unwrap();

    for intruder in [
        User::worker("Li", "North"),
        User::worker("Zhang", "South"),
        admin(),
    ] {
        let resp = receive(&manager, intruder, &order_id).await;
        assert!(!resp.success);
    }
    assert_eq!(manager.get_order(&order_id).unwrap(), before);

    assert!(receive(&manager, zhang(), &order_id).await.success);
    let received = manager.get_order(&order_id).unwrap();
    let resp = complete(&manager, User::worker("Li", "North"), &order_id, photo_submission()).await;
    assert_eq!(error_code(&resp), ErrorCode::NotAssignee);
    assert_eq!(manager.get_order(&order_id).unwrap(), received);
}

#[tokio::test]
async fn test_complete_past_deadline_rejected() {
    let manager = create_test_manager(FakeVision::answering(r#"{"candidates": ["0812345"]}"#));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);
    assert!(set_deadline(&manager, &order_id, Some(now_millis() - 1)).await.success);
    let before = manager.get_order(&order_id).unwrap();

    let resp = complete(&manager, zhang(), &order_id, photo_submission()).await;
    assert_eq!(error_code(&resp), ErrorCode::DeadlinePassed);
    assert_eq!(manager.get_order(&order_id).unwrap(), before);
}

#[tokio::test]
async fn test_completion_without_proof_rejected() {
    let manager = create_test_manager(FakeVision::answering(""));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);

    let submission = CompletionSubmission {
        return_reason: Some(ReturnReason::Resolved),
        remark: Some("done".into()),
        ..Default::default()
    };
    let resp = complete(&manager, zhang(), &order_id, submission).await;
    assert_eq!(error_code(&resp), ErrorCode::ProofRequired);
    assert_eq!(
        manager.get_order(&order_id).unwrap().status,
        OrderStatus::Received
    );
}

#[tokio::test]
async fn test_failed_verification_leaves_audit_status_unset() {
    let manager = create_test_manager(FakeVision::answering(r#"{"candidates": ["0812399"]}"#));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);

    let resp = complete(&manager, zhang(), &order_id, photo_submission()).await;
    assert_eq!(error_code(&resp), ErrorCode::SerialMismatch);
    assert_eq!(
        resp.error.unwrap().detected.as_deref(),
        Some("0812399")
    );

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Received);
    assert_eq!(order.audit_status, None);
    assert!(order.completed_at.is_none());
    assert_eq!(order.history.len(), 2);
}

#[tokio::test]
async fn test_vision_outage_blocks_completion() {
    let manager = create_test_manager(FakeVision::failing_with_status(503));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);

    let resp = complete(&manager, zhang(), &order_id, photo_submission()).await;
    assert_eq!(error_code(&resp), ErrorCode::VerificationUnavailable);

    // 仅附件的回单不需要核验
    let resp = complete(&manager, zhang(), &order_id, attachments_only_submission()).await;
    assert!(resp.success);
    assert_eq!(
        manager.get_order(&order_id).unwrap().audit_status,
        Some(AuditStatus::Pending)
    );
}

#[tokio::test]
async fn test_unknown_order_rejected() {
    let manager = create_test_manager(FakeVision::answering(""));
    let resp = receive(&manager, zhang(), "missing").await;
    assert_eq!(error_code(&resp), ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn test_empty_reassign_target_rejected() {
    let manager = create_test_manager(FakeVision::answering(""));
    let order_id = import_one(&manager, "Meter swap").await;

    let report = manager.reassign_many(&admin(), &[order_id.clone()], "  ", "North").await;
    assert_eq!(report.succeeded, 0);
    assert_eq!(report.failed[0].error.code, ErrorCode::RequiredField);
    assert_eq!(manager.get_order(&order_id).unwrap().user_name, "Zhang");
}
