use dispatch_engine::{AppState, print_banner, setup_environment};

/// 退出前等待远端写入的时间
const SHUTDOWN_WRITE_GRACE_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(environment = %config.environment, work_dir = %config.work_dir, "Dispatch engine starting...");

    // 2. 初始化服务
    let state = AppState::initialize(&config)?;

    // 3. 首次加载 + 后台同步
    state.load_orders().await;
    let tasks = state.start_background_tasks();
    tracing::info!(background_tasks = tasks.len(), orders = state.sync.len(), "Dispatch engine ready");

    // 4. 等待退出信号
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");

    tasks.shutdown().await;

    // 尽量把已提交的远端写入发完，未完成的留在 outbox 里下次启动再发
    if tokio::time::timeout(
        std::time::Duration::from_secs(SHUTDOWN_WRITE_GRACE_SECS),
        state.sync.remote_settled(),
    )
    .await
    .is_err()
    {
        tracing::warn!("Remote writes still in flight at shutdown, kept in outbox");
    }
    Ok(())
}
