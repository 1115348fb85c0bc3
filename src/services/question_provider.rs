//! 拉题服务 - 业务能力层
//!
//! 只负责"按配置拉一组题目"能力：先过限流，再请求一次题库，不重试。

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::clients::TriviaApi;
use crate::error::QuestionFetchError;
use crate::infrastructure::RateLimitedFetcher;
use crate::models::{QuestionSet, QuizConfiguration};

/// 会话驱动使用的题目来源
pub trait QuestionSource: Send + Sync {
    /// 拉取一组题目。成功时保证非空。
    fn fetch_questions<'a>(
        &'a self,
        config: &'a QuizConfiguration,
    ) -> BoxFuture<'a, Result<QuestionSet, QuestionFetchError>>;

    /// 限流等待的预计秒数，没有限流时为 `None`
    fn wait_estimate(&self) -> Option<watch::Receiver<u64>> {
        None
    }
}

/// 拉题服务
pub struct QuestionProvider {
    api: Arc<dyn TriviaApi>,
    limiter: Arc<RateLimitedFetcher>,
    min_interval: Duration,
}

impl QuestionProvider {
    /// 题库要求的最小拉题间隔
    pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(5000);

    pub fn new(api: Arc<dyn TriviaApi>, limiter: Arc<RateLimitedFetcher>) -> Self {
        Self::with_interval(api, limiter, Self::DEFAULT_MIN_INTERVAL)
    }

    pub fn with_interval(
        api: Arc<dyn TriviaApi>,
        limiter: Arc<RateLimitedFetcher>,
        min_interval: Duration,
    ) -> Self {
        Self {
            api,
            limiter,
            min_interval,
        }
    }

    async fn fetch(&self, config: &QuizConfiguration) -> Result<QuestionSet, QuestionFetchError> {
        self.limiter.acquire(self.min_interval).await;

        let response = self.api.questions(config).await.map_err(|e| {
            warn!("❌ 拉题请求失败: {}", e);
            QuestionFetchError::from(e)
        })?;

        if !response.is_success() {
            warn!("⚠️ 当前设置下没有题目 (response_code={})", response.response_code);
            return Err(QuestionFetchError::NoResults {
                response_code: response.response_code,
            });
        }

        if response.results.is_empty() {
            warn!("⚠️ 题库返回成功但题目为空");
            return Err(QuestionFetchError::NoResults {
                response_code: response.response_code,
            });
        }

        if response.results.len() < config.question_count as usize {
            info!(
                "题库只返回了 {}/{} 道题，按实际数量进行",
                response.results.len(),
                config.question_count
            );
        }

        Ok(response.results)
    }
}

impl QuestionSource for QuestionProvider {
    fn fetch_questions<'a>(
        &'a self,
        config: &'a QuizConfiguration,
    ) -> BoxFuture<'a, Result<QuestionSet, QuestionFetchError>> {
        self.fetch(config).boxed()
    }

    fn wait_estimate(&self) -> Option<watch::Receiver<u64>> {
        Some(self.limiter.subscribe_wait())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::infrastructure::{MemoryStore, TokioClock};
    use crate::models::{Category, Question, QuestionResponse};
    use std::sync::Mutex;

    struct ScriptedApi {
        response: Mutex<Option<Result<QuestionResponse, ApiError>>>,
        requests: Mutex<Vec<QuizConfiguration>>,
    }

    impl ScriptedApi {
        fn new(response: Result<QuestionResponse, ApiError>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl TriviaApi for ScriptedApi {
        fn categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>> {
            async move { Ok(Vec::new()) }.boxed()
        }

        fn questions<'a>(
            &'a self,
            config: &'a QuizConfiguration,
        ) -> BoxFuture<'a, Result<QuestionResponse, ApiError>> {
            self.requests.lock().unwrap().push(config.clone());
            let response = self.response.lock().unwrap().take().expect("只应请求一次");
            async move { response }.boxed()
        }
    }

    fn provider(api: Arc<ScriptedApi>) -> QuestionProvider {
        let limiter = RateLimitedFetcher::new(
            Arc::new(MemoryStore::new()),
            Arc::new(TokioClock::new(0)),
        );
        QuestionProvider::new(api, Arc::new(limiter))
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_questions() {
        let api = Arc::new(ScriptedApi::new(Ok(QuestionResponse {
            response_code: 0,
            results: vec![Question::new("Capital of France?", "Paris", ["Rome"])],
        })));
        let quiz = QuizConfiguration {
            question_count: 5,
            ..Default::default()
        };

        let questions = provider(api.clone()).fetch_questions(&quiz).await.unwrap();

        // 少于请求数量时照常返回
        assert_eq!(questions.len(), 1);
        assert_eq!(api.requests.lock().unwrap().as_slice(), &[quiz]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nonzero_response_code_is_no_results() {
        let api = Arc::new(ScriptedApi::new(Ok(QuestionResponse {
            response_code: 1,
            results: Vec::new(),
        })));

        let err = provider(api)
            .fetch_questions(&QuizConfiguration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionFetchError::NoResults { response_code: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_network_error() {
        let api = Arc::new(ScriptedApi::new(Err(ApiError::BadStatus {
            endpoint: "api.php".to_string(),
            status: 500,
        })));

        let err = provider(api)
            .fetch_questions(&QuizConfiguration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionFetchError::Network { .. }));
    }
}
