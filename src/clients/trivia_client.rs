/// 题库 API 客户端
///
/// 封装所有与题库 HTTP 接口相关的调用逻辑
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Category, CategoryResponse, QuestionResponse, QuizConfiguration};

/// 题库数据源
///
/// 只负责一次 HTTP 往返，不做限流和结果判断。测试中用内存实现替换。
pub trait TriviaApi: Send + Sync {
    /// 获取分类列表
    fn categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>>;

    /// 按配置拉取题目
    fn questions<'a>(
        &'a self,
        config: &'a QuizConfiguration,
    ) -> BoxFuture<'a, Result<QuestionResponse, ApiError>>;
}

/// 题库客户端
pub struct TriviaClient {
    http: Client,
    base_url: String,
}

impl TriviaClient {
    /// 创建新的题库客户端
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::request_failed("client", e))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 分类接口地址
    pub fn category_url(&self) -> String {
        format!("{}/api_category.php", self.base_url)
    }

    /// 拉题接口地址
    pub fn question_url(&self) -> String {
        format!("{}/api.php", self.base_url)
    }

    /// 发送 GET 请求并解析 JSON
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::json_parse_failed(&url, e))
    }
}

impl TriviaApi for TriviaClient {
    fn categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>> {
        async move {
            let response: CategoryResponse = self.get_json(self.category_url(), &[]).await?;
            Ok(response.trivia_categories)
        }
        .boxed()
    }

    fn questions<'a>(
        &'a self,
        config: &'a QuizConfiguration,
    ) -> BoxFuture<'a, Result<QuestionResponse, ApiError>> {
        async move {
            let response: QuestionResponse = self
                .get_json(self.question_url(), &config.query_params())
                .await?;
            debug!(
                "拉题结果: response_code={}, 题目数={}",
                response.response_code,
                response.results.len()
            );
            Ok(response)
        }
        .boxed()
    }
}
