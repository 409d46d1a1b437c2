//! Dispatch Engine - 外勤工单派发与回单核验
//!
//! # 架构概述
//!
//! - **工单** (`orders`): 命令 → 事件 → 快照，状态机与权限校验
//! - **核验** (`verification`): 视觉识别序列号 + 容错比对
//! - **同步** (`sync`): 内存集合、本地 redb、远端 REST + 实时推送
//! - **批量** (`batch`): 多工单 all-settle 执行
//!
//! # 模块结构
//!
//! ```text
//! dispatch-engine/src/
//! ├── core/          # 配置、状态、后台任务
//! ├── orders/        # 工单事件溯源
//! ├── verification/  # 序列号核验
//! ├── sync/          # 数据同步
//! ├── batch.rs       # 批量操作
//! └── utils/         # 日志
//! ```

pub mod batch;
pub mod core;
pub mod orders;
pub mod sync;
pub mod utils;
pub mod verification;

#[cfg(test)]
mod test_support;

// Re-export 公共类型
pub use batch::{BatchFailure, BatchReport};
pub use core::{AppState, BackgroundTasks, Config};
pub use orders::{ColumnMapping, ImportReport, ImportRow, OrdersManager};
pub use sync::{OrderSync, RealtimeWorker};
pub use verification::{VerificationReport, VerificationService};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file, periodic_cleanup};

/// 设置运行环境: 读取 .env、创建工作目录、初始化日志
///
/// 生产环境输出 JSON 日志并写入 `work_dir/logs`。
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = config.log_dir();
    init_logger_with_file(
        &config.log_level,
        config.is_production(),
        Some(log_dir.as_path()),
    )?;

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____  _                  __       __
   / __ \(_)________  ____ _/ /______/ /_
  / / / / / ___/ __ \/ __ `/ __/ ___/ __ \
 / /_/ / (__  ) /_/ / /_/ / /_/ /__/ / / /
/_____/_/____/ .___/\__,_/\__/\___/_/ /_/
            /_/
    "#
    );
}
