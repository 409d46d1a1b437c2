use std::path::PathBuf;

/// 默认视觉接口（OpenAI 兼容）
pub const DEFAULT_VISION_ENDPOINT: &str =
    "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";

/// 引擎配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./work_dir | 工作目录 (redb 文件、日志) |
/// | ENVIRONMENT | development | 运行环境，production 输出 JSON 日志 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | VISION_ENDPOINT | DashScope 兼容接口 | 视觉识别接口 |
/// | VISION_API_KEY | - | 未设置时照片核验不可用（拒绝回单） |
/// | VISION_MODEL | qwen-vl-max | 模型名 |
/// | VISION_TIMEOUT_MS | 20000 | 请求超时(毫秒) |
/// | REMOTE_REST_URL | - | 远端 REST 地址，未设置则仅本地运行 |
/// | REMOTE_REALTIME_URL | - | 远端实时推送 WebSocket 地址 |
/// | REMOTE_API_KEY | - | 远端 API key |
/// | REMOTE_TABLE | work_orders | 远端表名 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/dispatch VISION_API_KEY=sk-xxx cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 运行环境: development | production
    pub environment: String,
    pub log_level: String,
    pub vision: VisionConfig,
    /// `None` = local-only mode
    pub remote: Option<RemoteConfig>,
}

/// Vision service settings
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
}

/// Remote store settings
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// e.g. `https://xyz.example.co/rest/v1`
    pub rest_url: String,
    /// e.g. `wss://xyz.example.co/realtime/v1/websocket`
    pub realtime_url: Option<String>,
    pub api_key: String,
    pub table: String,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_opt("VISION_ENDPOINT").unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.into()),
            api_key: env_opt("VISION_API_KEY"),
            model: env_opt("VISION_MODEL").unwrap_or_else(|| "qwen-vl-max".into()),
            timeout_ms: env_opt("VISION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(20000),
        }
    }
}

impl RemoteConfig {
    /// `None` when `REMOTE_REST_URL` is unset
    pub fn from_env() -> Option<Self> {
        let rest_url = env_opt("REMOTE_REST_URL")?;
        Some(Self {
            rest_url: rest_url.trim_end_matches('/').to_string(),
            realtime_url: env_opt("REMOTE_REALTIME_URL"),
            api_key: env_opt("REMOTE_API_KEY").unwrap_or_default(),
            table: env_opt("REMOTE_TABLE").unwrap_or_else(|| "work_orders".into()),
        })
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: env_opt("WORK_DIR").unwrap_or_else(|| "./work_dir".into()),
            environment: env_opt("ENVIRONMENT").unwrap_or_else(|| "development".into()),
            log_level: env_opt("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            vision: VisionConfig::from_env(),
            remote: RemoteConfig::from_env(),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }
}
