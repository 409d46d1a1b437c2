//! 核心模块 - 配置、运行时状态、后台任务
//!
//! - [`Config`] - 引擎配置
//! - [`AppState`] - 组装好的服务集合
//! - [`BackgroundTasks`] - 后台任务生命周期

pub mod config;
pub mod state;
pub mod tasks;

pub use config::{Config, RemoteConfig, VisionConfig};
pub use state::AppState;
pub use tasks::{BackgroundTasks, TaskKind};
