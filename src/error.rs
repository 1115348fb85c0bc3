use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 分类列表获取失败（非致命）
    #[error("分类错误: {0}")]
    ConfigFetch(#[from] ConfigFetchError),
    /// 题目获取失败
    #[error("题目错误: {0}")]
    QuestionFetch(#[from] QuestionFetchError),
    /// 存储读写失败
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 测验配置不合法
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话状态错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 分类列表不可用
///
/// 配置界面仍可使用 "Any Category"，所以该错误只会被记录，不会终止会话。
#[derive(Debug, Error)]
#[error("Failed to fetch categories. Please try again later.")]
pub struct ConfigFetchError {
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl ConfigFetchError {
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }
}

/// 题目获取错误，对本次会话是致命的，只能通过 restart 恢复
#[derive(Debug, Error)]
pub enum QuestionFetchError {
    /// 过滤条件过窄，题库返回了非 0 的 response_code（或空结果）
    #[error("No questions found with the selected settings.")]
    NoResults { response_code: i64 },
    /// 网络或解析失败
    #[error("Failed to fetch questions. Please try again later.")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl QuestionFetchError {
    pub fn network(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        QuestionFetchError::Network {
            source: Box::new(source),
        }
    }

    /// 供日志使用的简短类别名
    pub fn kind(&self) -> &'static str {
        match self {
            QuestionFetchError::NoResults { .. } => "no_results",
            QuestionFetchError::Network { .. } => "network",
        }
    }
}

/// 拉题任务在返回结果前崩溃
#[derive(Debug, Error)]
#[error("拉题任务异常退出: {0}")]
pub struct FetchTaskPanic(pub String);

/// 题库 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// HTTP 状态码不是 2xx
    #[error("API返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// 键值存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取存储文件失败
    #[error("读取存储失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入存储文件失败
    #[error("写入存储失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 内容无法编码或解码
    #[error("存储内容编码失败 ({key}): {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 测验配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 题目数量不在 1..=50
    #[error("题目数量 {0} 超出范围 [1, 50]")]
    QuestionCountOutOfRange(u32),
    /// 计时器必须是 0..=60 内 5 的倍数
    #[error("计时器 {0} 秒不合法，应为 0-60 之间 5 的倍数")]
    InvalidTimer(u32),
}

/// 会话操作错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// 当前阶段不允许该操作
    #[error("阶段 {phase} 不允许操作 {operation}")]
    InvalidPhase {
        phase: &'static str,
        operation: &'static str,
    },
    /// 测验配置不合法
    #[error("测验配置不合法: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// 驱动任务已经退出
    #[error("会话驱动已关闭")]
    DriverClosed,
}

// ========== 便捷构造函数 ==========

impl ApiError {
    /// 创建API请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// 创建JSON解析失败错误
    pub fn json_parse_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ApiError::JsonParseFailed {
            endpoint: endpoint.into(),
            source,
        }
    }
}

impl From<ApiError> for QuestionFetchError {
    fn from(err: ApiError) -> Self {
        QuestionFetchError::network(err)
    }
}

impl From<ApiError> for ConfigFetchError {
    fn from(err: ApiError) -> Self {
        ConfigFetchError::new(err)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_fetch_messages() {
        let no_results = QuestionFetchError::NoResults { response_code: 1 };
        assert_eq!(
            no_results.to_string(),
            "No questions found with the selected settings."
        );
        assert_eq!(no_results.kind(), "no_results");

        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let network = QuestionFetchError::network(io);
        assert_eq!(
            network.to_string(),
            "Failed to fetch questions. Please try again later."
        );
        assert!(std::error::Error::source(&network).is_some());
    }

    #[test]
    fn test_app_error_wraps_config_error() {
        let err: AppError = ConfigError::InvalidTimer(7).into();
        assert!(err.to_string().contains("7"));
    }
}
