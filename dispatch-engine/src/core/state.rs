use std::path::PathBuf;
use std::sync::Arc;

use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::orders::OrdersManager;
use crate::sync::{
    HttpRemoteStore, LoadSource, LocalOrderStorage, OrderSync, RealtimeWorker, RemoteStore,
};
use crate::utils::periodic_cleanup;
use crate::verification::{HttpVisionClient, VerificationService};

/// 引擎状态 - 持有所有服务的共享引用
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | sync | 工单集合 + 本地 redb + 可选远端 |
/// | verifier | 序列号照片核验 (未配置视觉 key 时为 None) |
/// | orders | 命令处理入口 |
///
/// 使用 Arc 实现浅拷贝。
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sync: Arc<OrderSync>,
    pub verifier: Option<Arc<VerificationService>>,
    pub orders: Arc<OrdersManager>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("online", &self.sync.is_online())
            .field("verifier", &self.verifier.is_some())
            .field("orders", &self.orders)
            .finish()
    }
}

impl AppState {
    /// 初始化所有服务
    ///
    /// 1. 打开 `work_dir/orders.redb`
    /// 2. 按配置创建远端存储与视觉客户端
    /// 3. 组装 OrderSync 与 OrdersManager
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let local = LocalOrderStorage::open(config.database_path())?;
        tracing::info!(path = %config.database_path().display(), "Local order storage opened");

        let remote: Option<Arc<dyn RemoteStore>> = match &config.remote {
            Some(remote_config) => {
                tracing::info!(url = %remote_config.rest_url, table = %remote_config.table, "Remote store configured");
                Some(Arc::new(HttpRemoteStore::new(remote_config.clone())?))
            }
            None => {
                tracing::warn!("REMOTE_REST_URL not set, running local-only");
                None
            }
        };

        let verifier = if config.vision.api_key.is_some() {
            let client = HttpVisionClient::new(config.vision.clone())?;
            tracing::info!(model = %config.vision.model, "Vision verification enabled");
            Some(Arc::new(VerificationService::new(Arc::new(client))))
        } else {
            tracing::warn!("VISION_API_KEY not set, photo completions will be rejected");
            None
        };

        let sync = Arc::new(OrderSync::new(remote, Some(local)));
        let orders = Arc::new(OrdersManager::new(sync.clone(), verifier.clone()));

        Ok(Self {
            config: config.clone(),
            sync,
            verifier,
            orders,
        })
    }

    /// 首次加载工单 (远端优先，失败时回退本地快照)
    pub async fn load_orders(&self) -> LoadSource {
        let source = self.sync.load().await;
        tracing::info!(?source, online = self.sync.is_online(), "Orders loaded");
        source
    }

    /// 启动后台任务 (日志清理 + 实时同步)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();
        let cleanup = periodic_cleanup(self.config.log_dir(), tasks.shutdown_token());
        tasks.spawn("log_cleanup", TaskKind::Periodic, cleanup);
        if self.sync.has_remote() {
            let worker = RealtimeWorker::new(self.sync.clone(), tasks.shutdown_token());
            tasks.spawn("realtime_sync", TaskKind::Worker, worker.run());
        }
        tasks
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    pub fn orders(&self) -> &Arc<OrdersManager> {
        &self.orders
    }
}
