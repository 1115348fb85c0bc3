#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;

use trivia_quiz::clients::TriviaApi;
use trivia_quiz::error::ApiError;
use trivia_quiz::infrastructure::{MemoryStore, RateLimitedFetcher, TokioClock};
use trivia_quiz::models::{Category, Question, QuestionResponse, QuizConfiguration};
use trivia_quiz::orchestrator::{DriverSettings, SessionDriver, SessionHandle};
use trivia_quiz::services::{ConfigurationStore, QuestionProvider};
use trivia_quiz::workflow::SessionMachine;

pub const EPOCH: i64 = 1_700_000_000_000;

/// 按脚本返回结果的题库，记录每次拉题的（虚拟）时间
#[derive(Default)]
pub struct FakeTriviaApi {
    responses: Mutex<VecDeque<Result<QuestionResponse, ApiError>>>,
    calls: Mutex<Vec<Instant>>,
}

impl FakeTriviaApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_questions(&self, questions: Vec<Question>) {
        self.responses.lock().unwrap().push_back(Ok(QuestionResponse {
            response_code: 0,
            results: questions,
        }));
    }

    pub fn push_response_code(&self, response_code: i64) {
        self.responses.lock().unwrap().push_back(Ok(QuestionResponse {
            response_code,
            results: Vec::new(),
        }));
    }

    pub fn push_network_failure(&self) {
        self.responses.lock().unwrap().push_back(Err(ApiError::BadStatus {
            endpoint: "api.php".to_string(),
            status: 502,
        }));
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

impl TriviaApi for FakeTriviaApi {
    fn categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>> {
        async move {
            Ok(vec![Category {
                id: 22,
                name: "Geography".to_string(),
            }])
        }
        .boxed()
    }

    fn questions<'a>(
        &'a self,
        _config: &'a QuizConfiguration,
    ) -> BoxFuture<'a, Result<QuestionResponse, ApiError>> {
        self.calls.lock().unwrap().push(Instant::now());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(QuestionResponse {
                response_code: 1,
                results: Vec::new(),
            }));
        async move { response }.boxed()
    }
}

/// 模拟同源的多个标签页：共享拉题时间，各自保存设置
pub struct Browser {
    pub shared: MemoryStore,
    pub clock: Arc<TokioClock>,
}

impl Browser {
    pub fn new() -> Self {
        Self {
            shared: MemoryStore::new(),
            clock: Arc::new(TokioClock::new(EPOCH)),
        }
    }

    pub fn open_tab(&self, api: Arc<FakeTriviaApi>) -> SessionHandle {
        let limiter = RateLimitedFetcher::new(Arc::new(self.shared.clone()), self.clock.clone());
        let provider = QuestionProvider::new(api, Arc::new(limiter));
        SessionDriver::spawn_with_machine(
            SessionMachine::with_seed(QuizConfiguration::default(), 5),
            Arc::new(provider),
            ConfigurationStore::new(Arc::new(MemoryStore::new())),
            DriverSettings::default(),
        )
    }
}

pub fn paris() -> Question {
    Question::new("What is the capital of France?", "Paris", ["Rome", "Berlin"])
}

pub fn quiz(question_count: u32, timer_seconds: u32) -> QuizConfiguration {
    QuizConfiguration {
        question_count,
        timer_seconds,
        ..Default::default()
    }
}
