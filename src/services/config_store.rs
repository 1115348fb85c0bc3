//! 配置存储服务 - 业务能力层
//!
//! 保存"上次成功开始的测验配置"，下次打开配置界面和重新开始时读取。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::infrastructure::KeyValueStore;
use crate::models::QuizConfiguration;

/// 存储中保存测验配置的键
pub const SETTINGS_KEY: &str = "quizSettings";

/// 配置存储服务
#[derive(Clone)]
pub struct ConfigurationStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigurationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 读取上次保存的配置
    ///
    /// 不存在、无法解析或不合法时返回 `None`。
    pub fn load(&self) -> Option<QuizConfiguration> {
        let raw = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("⚠️ 读取测验配置失败: {}", e);
                return None;
            }
        };

        let config: QuizConfiguration = match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("⚠️ 已保存的测验配置无法解析，忽略: {}", e);
                return None;
            }
        };

        if let Err(e) = config.validate() {
            warn!("⚠️ 已保存的测验配置不合法，忽略: {}", e);
            return None;
        }

        Some(config)
    }

    /// 读取上次配置，没有则使用默认配置
    pub fn load_or_default(&self) -> QuizConfiguration {
        self.load().unwrap_or_default()
    }

    /// 保存配置
    pub fn save(&self, config: &QuizConfiguration) -> Result<(), StoreError> {
        let json = serde_json::to_string(config).map_err(|source| StoreError::Encoding {
            key: SETTINGS_KEY.to_string(),
            source,
        })?;
        self.store.set(SETTINGS_KEY, &json)?;
        debug!("已保存测验配置: {}", json);
        Ok(())
    }
}
