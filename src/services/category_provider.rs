//! 分类服务 - 业务能力层
//!
//! 只负责"获取分类列表"能力。不限流、不重试，失败时配置界面退化为只有 "Any Category"。

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::TriviaApi;
use crate::error::ConfigFetchError;
use crate::models::Category;

/// 分类加载结果
#[derive(Debug, Clone, Default)]
pub struct CategoryLoad {
    pub categories: Vec<Category>,
    /// 加载失败时给配置界面显示的提示
    pub error_message: Option<String>,
}

/// 分类服务
pub struct CategoryProvider {
    api: Arc<dyn TriviaApi>,
}

impl CategoryProvider {
    pub fn new(api: Arc<dyn TriviaApi>) -> Self {
        Self { api }
    }

    /// 获取分类列表（单次请求）
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ConfigFetchError> {
        let categories = self.api.categories().await?;
        info!("✓ 获取到 {} 个分类", categories.len());
        Ok(categories)
    }

    /// 获取分类列表，失败时返回空列表和提示信息
    pub async fn fetch_or_empty(&self) -> CategoryLoad {
        match self.fetch_categories().await {
            Ok(categories) => CategoryLoad {
                categories,
                error_message: None,
            },
            Err(e) => {
                warn!("⚠️ 分类获取失败: {:?}", e);
                CategoryLoad {
                    categories: Vec::new(),
                    error_message: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{QuestionResponse, QuizConfiguration};
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct StaticApi {
        categories: Option<Vec<Category>>,
    }

    impl TriviaApi for StaticApi {
        fn categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>> {
            let result = self.categories.clone().ok_or(ApiError::BadStatus {
                endpoint: "api_category.php".to_string(),
                status: 503,
            });
            async move { result }.boxed()
        }

        fn questions<'a>(
            &'a self,
            _config: &'a QuizConfiguration,
        ) -> BoxFuture<'a, Result<QuestionResponse, ApiError>> {
            async move {
                Ok(QuestionResponse {
                    response_code: 1,
                    results: Vec::new(),
                })
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_categories_pass_through() {
        let provider = CategoryProvider::new(Arc::new(StaticApi {
            categories: Some(vec![Category {
                id: 9,
                name: "General Knowledge".to_string(),
            }]),
        }));

        let load = provider.fetch_or_empty().await;
        assert_eq!(load.categories.len(), 1);
        assert!(load.error_message.is_none());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty_list() {
        let provider = CategoryProvider::new(Arc::new(StaticApi { categories: None }));

        assert!(provider.fetch_categories().await.is_err());

        let load = provider.fetch_or_empty().await;
        assert!(load.categories.is_empty());
        assert_eq!(
            load.error_message.as_deref(),
            Some("Failed to fetch categories. Please try again later.")
        );
    }
}
