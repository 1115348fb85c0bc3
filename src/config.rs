use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 题库 API 根地址
    pub api_base_url: String,
    /// 两次拉题之间的最小间隔（毫秒），所有进程共享
    pub min_fetch_interval_ms: u64,
    /// 答题后展示结果的时长（毫秒）
    pub reveal_delay_ms: u64,
    /// HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 共享存储所在目录
    pub state_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 默认日志过滤规则
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://opentdb.com".to_string(),
            min_fetch_interval_ms: 5000,
            reveal_delay_ms: 4000,
            request_timeout_secs: 10,
            state_dir: ".trivia_quiz".to_string(),
            verbose_logging: false,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// 默认的配置文件名
    pub const DEFAULT_FILE: &'static str = "trivia_quiz.toml";

    /// 先读取 TOML 配置文件（若存在），再应用环境变量覆盖
    pub fn load() -> Self {
        let path = std::env::var("TRIVIA_QUIZ_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_FILE));

        let base = if path.exists() {
            match Self::from_file(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("⚠️ 配置文件 {} 解析失败，使用默认配置: {:#}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        base.with_env_overrides()
    }

    /// 从 TOML 文件加载配置，未出现的字段使用默认值
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 只使用环境变量覆盖默认配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("TRIVIA_API_BASE_URL").unwrap_or(self.api_base_url),
            min_fetch_interval_ms: std::env::var("MIN_FETCH_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.min_fetch_interval_ms),
            reveal_delay_ms: std::env::var("REVEAL_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.reveal_delay_ms),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            state_dir: std::env::var("TRIVIA_STATE_DIR").unwrap_or(self.state_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            log_filter: std::env::var("LOG_FILTER").unwrap_or(self.log_filter),
        }
    }

    /// 跨进程共享的存储文件（保存上次拉题时间）
    pub fn shared_store_path(&self) -> PathBuf {
        Path::new(&self.state_dir).join("shared.json")
    }

    /// 保存上次测验设置的存储文件
    pub fn session_store_path(&self) -> PathBuf {
        Path::new(&self.state_dir).join("session.json")
    }
}
