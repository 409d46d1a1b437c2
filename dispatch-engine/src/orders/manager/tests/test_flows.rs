use super::*;

// ========================================================================
//  核心流程
// ========================================================================

#[tokio::test]
async fn test_import_receive_complete_flow() {
    let manager = create_test_manager(FakeVision::answering(r#"{"candidates": ["O812345"]}"#));
    let mut events_rx = manager.subscribe();

    // 1. 导入
    let rows = vec![row("A"), row(""), row("C")];
    let report = manager
        .import_orders(&admin(), &mapping(), &rows)
        .await
        .unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(manager.sync().len(), 2);

    let order_id = report.order_ids[0].clone();
    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.task_name, "A");
    assert_eq!(order.status, OrderStatus::Dispatched);
    assert_eq!(order.history.len(), 1);
    assert_eq!(order.history.last().unwrap().action, HistoryAction::Imported);

    // 2. 接单
    let resp = receive(&manager, zhang(), &order_id).await;
    assert!(resp.success, "receive should succeed: {:?}", resp.error);
    assert_eq!(resp.order_id.as_deref(), Some(order_id.as_str()));

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Received);
    assert!(order.received_at.is_some());
    assert_eq!(order.history.len(), 2);

    // 3. 回单（O812345 vs 0812345 模糊匹配）
    let resp = complete(&manager, zhang(), &order_id, photo_submission()).await;
    assert!(resp.success, "complete should succeed: {:?}", resp.error);

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.audit_status, Some(AuditStatus::Passed));
    assert!(order.completed_at.is_some());
    assert_eq!(order.history.len(), 3);
    assert!(order.completion_remark.unwrap().contains("O812345"));

    // 4. 广播
    let received = events_rx.recv().await.unwrap();
    assert_eq!(received.event_type, OrderEventType::OrderReceived);
    let completed = events_rx.recv().await.unwrap();
    assert_eq!(completed.event_type, OrderEventType::OrderCompleted);
}

#[tokio::test]
async fn test_amend_keeps_completed_and_appends_history() {
    let manager = create_test_manager(FakeVision::answering(r#"{"candidates": ["0812345"]}"#));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);
    assert!(complete(&manager, zhang(), &order_id, photo_submission()).await.success);
    let first = manager.get_order(&order_id).unwrap();

    let resp = complete(&manager, zhang(), &order_id, attachments_only_submission()).await;
    assert!(resp.success);

    let amended = manager.get_order(&order_id).unwrap();
    assert_eq!(amended.status, OrderStatus::Completed);
    assert_eq!(amended.audit_status, Some(AuditStatus::Pending));
    assert_eq!(amended.return_reason, Some(ReturnReason::CustomerAbsent));
    assert!(amended.completion_photo.is_none());
    assert!(amended.completed_at >= first.completed_at);
    assert_eq!(amended.history.len(), first.history.len() + 1);
    assert_eq!(amended.history.last().unwrap().action, HistoryAction::Amended);
}

#[tokio::test]
async fn test_import_requires_admin() {
    let manager = create_test_manager(FakeVision::answering(""));
    let err = manager
        .import_orders(&zhang(), &mapping(), &[row("A")])
        .await
        .unwrap_err();
    assert!(matches!(err, ManagerError::Order(OrderError::AdminRequired)));
    assert!(manager.sync().is_empty());
}

#[tokio::test]
async fn test_admin_deadline_edit_after_expiry_succeeds() {
    let manager = create_test_manager(FakeVision::answering(""));
    let order_id = import_one(&manager, "Meter swap").await;

    let past = now_millis() - 60_000;
    assert!(set_deadline(&manager, &order_id, Some(past)).await.success);
    assert_eq!(
        error_code(&receive(&manager, zhang(), &order_id).await),
        ErrorCode::DeadlinePassed
    );

    // 已过期，管理员仍可延期
    let future = now_millis() + 3_600_000;
    assert!(set_deadline(&manager, &order_id, Some(future)).await.success);
    assert!(receive(&manager, zhang(), &order_id).await.success);

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.deadline, Some(future));
    let actions: Vec<_> = order.history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            HistoryAction::Imported,
            HistoryAction::DeadlineSet,
            HistoryAction::DeadlineSet,
            HistoryAction::Received,
        ]
    );
}

#[tokio::test]
async fn test_reassign_moves_order_between_workers() {
    let manager = create_test_manager(FakeVision::answering(""));
    let order_id = import_one(&manager, "Meter swap").await;

    let resp = manager
        .execute_command(OrderCommand::new(
            admin(),
            OrderCommandPayload::ReassignOrder {
                order_id: order_id.clone(),
                user_name: "Li".into(),
                team: "South".into(),
            },
        ))
        .await;
    assert!(resp.success);

    assert!(manager.orders_for(&zhang()).is_empty());
    assert_eq!(manager.orders_for(&User::worker("Li", "South")).len(), 1);
    assert_eq!(
        error_code(&receive(&manager, zhang(), &order_id).await),
        ErrorCode::NotAssignee
    );
    assert!(receive(&manager, User::worker("Li", "South"), &order_id).await.success);
}

#[tokio::test]
async fn test_verify_photo_manual_check() {
    let vision = FakeVision::answering(r#"{"candidates": ["0812345"]}"#);
    let calls = vision.clone();
    let manager = create_test_manager(vision);
    let order_id = import_one(&manager, "Meter swap").await;

    let report = manager
        .verify_photo(&order_id, &Attachment::new("meter.jpg", "aGk="))
        .await
        .unwrap();
    assert!(report.matched);
    assert_eq!(report.detected, "0812345");
    assert_eq!(calls.calls(), 1);

    // 手动核验不改变订单
    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Dispatched);
    assert_eq!(order.history.len(), 1);
}

#[tokio::test]
async fn test_offline_remote_keeps_local_changes() {
    let remote = Arc::new(FakeRemote::new());
    let manager = create_manager_with_remote(remote.clone());
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(remote.order(&order_id).is_some());

    remote.set_offline(true);
    let resp = receive(&manager, zhang(), &order_id).await;
    assert!(resp.success);
    manager.sync().remote_settled().await;
    assert!(!manager.sync().is_online());
    assert_eq!(
        manager.get_order(&order_id).unwrap().status,
        OrderStatus::Received
    );
    assert_eq!(
        remote.order(&order_id).unwrap().status,
        OrderStatus::Dispatched
    );

    remote.set_offline(false);
    assert_eq!(manager.sync().flush_pending().await.unwrap(), 1);
    assert_eq!(remote.order(&order_id).unwrap().status, OrderStatus::Received);
}

#[tokio::test]
async fn test_concurrent_commands_keep_both_history_entries() {
    let vision = FakeVision::answering(r#"{"candidates": ["0812345"]}"#)
        .with_delay(Duration::from_millis(200));
    let manager = Arc::new(create_test_manager(vision));
    let order_id = import_one(&manager, "Meter swap").await;
    assert!(receive(&manager, zhang(), &order_id).await.success);
    let before = manager.get_order(&order_id).unwrap().history.len();

    // 回单在等待识别结果时，管理员修改期限
    let completing = {
        let manager = manager.clone();
        let order_id = order_id.clone();
        tokio::spawn(async move { complete(&manager, zhang(), &order_id, photo_submission()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let deadline = now_millis() + 3_600_000;
    let resp = set_deadline(&manager, &order_id, Some(deadline)).await;
    assert!(resp.success, "deadline edit should succeed: {:?}", resp.error);

    let resp = completing.await.unwrap();
    assert!(resp.success, "complete should succeed: {:?}", resp.error);

    let order = manager.get_order(&order_id).unwrap();
    assert_eq!(order.history.len(), before + 2);
    let actions: Vec<_> = order.history.iter().map(|e| e.action).collect();
    assert!(actions.contains(&HistoryAction::Completed));
    assert!(actions.contains(&HistoryAction::DeadlineSet));
    assert_eq!(order.deadline, Some(deadline));
    assert_eq!(order.status, OrderStatus::Completed);
}
