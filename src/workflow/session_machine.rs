//! 会话状态机 - 流程层
//!
//! 状态流转：
//! 1. Configuring → start → Loading / AwaitingRateLimit（持久化配置并拉题）
//! 2. Loading → 拉题成功 → InProgress；失败或为空 → Error
//! 3. InProgress → 作答或超时 → 揭晓 → 下一题 / Finished
//! 4. 任意阶段 → restart → Configuring
//!
//! 所有挂起的工作（拉题、倒计时、揭晓延时）都带着发起时的 `generation`。
//! 每次状态转换都会推进 `generation`，过期事件因此会被直接丢弃。

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info};

use super::answer_order::shuffle_answers;
use super::session_state::{Phase, SessionState, SessionView};
use crate::error::{QuestionFetchError, SessionError};
use crate::models::{QuestionSet, QuizConfiguration, Submission};
use crate::utils::truncate_text;

/// 状态转换产生的副作用，由编排层执行
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// 保存配置
    PersistConfiguration(QuizConfiguration),
    /// 拉题（受限流约束）
    FetchQuestions {
        generation: u64,
        configuration: QuizConfiguration,
    },
    /// 启动每秒一次的倒计时
    StartTimer { generation: u64 },
    /// 停止倒计时
    StopTimer,
    /// 启动揭晓延时
    ScheduleReveal { generation: u64 },
    /// 取消所有挂起的工作（拉题、倒计时、揭晓延时）
    CancelAll,
}

/// 会话状态机
///
/// 职责：
/// - 持有 SessionState，是唯一能修改它的地方
/// - 判分、计时、推进题目
/// - 不持有任何定时器或网络资源，只返回 Effect
pub struct SessionMachine {
    state: SessionState,
    generation: u64,
    rng: StdRng,
}

impl SessionMachine {
    /// 以给定配置（通常是上次保存的配置）创建状态机
    pub fn new(configuration: QuizConfiguration) -> Self {
        Self::with_rng(configuration, StdRng::from_entropy())
    }

    /// 使用固定种子，答案顺序可复现
    pub fn with_seed(configuration: QuizConfiguration, seed: u64) -> Self {
        Self::with_rng(configuration, StdRng::seed_from_u64(seed))
    }

    fn with_rng(configuration: QuizConfiguration, rng: StdRng) -> Self {
        Self {
            state: SessionState::new(configuration),
            generation: 0,
            rng,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> SessionView {
        self.state.view()
    }

    fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// 开始会话
    pub fn start(&mut self, configuration: QuizConfiguration) -> Result<Vec<Effect>, SessionError> {
        if self.state.phase != Phase::Configuring {
            return Err(SessionError::InvalidPhase {
                phase: self.state.phase.as_str(),
                operation: "start",
            });
        }

        let generation = self.bump_generation();
        self.state = SessionState::new(configuration.clone());
        self.state.phase = Phase::Loading;

        info!("🎯 会话开始拉题 (generation={}): {}", generation, configuration);

        Ok(vec![
            Effect::PersistConfiguration(configuration.clone()),
            Effect::FetchQuestions {
                generation,
                configuration,
            },
        ])
    }

    /// 限流等待更新
    pub fn rate_limit_wait(&mut self, generation: u64, secs: u64) {
        if !self.is_current(generation) || !self.state.phase.is_loading() {
            return;
        }

        self.state.wait_secs = secs;
        self.state.phase = if secs > 0 {
            Phase::AwaitingRateLimit
        } else {
            Phase::Loading
        };
    }

    /// 拉题完成
    pub fn questions_loaded(
        &mut self,
        generation: u64,
        result: Result<QuestionSet, QuestionFetchError>,
    ) -> Vec<Effect> {
        if !self.is_current(generation) || !self.state.phase.is_loading() {
            debug!("丢弃过期的拉题结果 (generation={})", generation);
            return Vec::new();
        }

        self.state.wait_secs = 0;

        let questions = match result {
            Ok(questions) if !questions.is_empty() => questions,
            Ok(_) => {
                return self.fail(QuestionFetchError::NoResults { response_code: 0 });
            }
            Err(e) => return self.fail(e),
        };

        info!("✓ 拉到 {} 道题，开始答题", questions.len());
        self.state.questions = questions;
        self.state.score = 0;
        self.state.phase = Phase::InProgress;
        self.enter_question(0)
    }

    fn fail(&mut self, err: QuestionFetchError) -> Vec<Effect> {
        error!("❌ 拉题失败 [{}]: {:?}", err.kind(), err);
        self.bump_generation();
        self.state.phase = Phase::Error;
        self.state.error_message = Some(err.to_string());
        Vec::new()
    }

    fn enter_question(&mut self, index: usize) -> Vec<Effect> {
        let generation = self.bump_generation();
        self.state.current_index = index;
        self.state.selected_answer = None;

        let question = &self.state.questions[index];
        debug!(
            "进入第 {}/{} 题: {}",
            index + 1,
            self.state.questions.len(),
            truncate_text(&question.prompt, 40)
        );
        self.state.shuffled_answers = shuffle_answers(question, &mut self.rng);

        if self.state.configuration.timer_enabled() {
            self.state.time_remaining = self.state.configuration.timer_seconds;
            vec![Effect::StartTimer { generation }]
        } else {
            self.state.time_remaining = 0;
            Vec::new()
        }
    }

    /// 提交玩家选择的答案
    ///
    /// 已经作答（等待揭晓）时再次提交会被忽略。
    pub fn submit_answer(&mut self, answer: &str) -> Vec<Effect> {
        self.submit(Submission::from(answer))
    }

    fn submit(&mut self, submission: Submission) -> Vec<Effect> {
        if self.state.phase != Phase::InProgress || self.state.selected_answer.is_some() {
            debug!("忽略答案提交: phase={}, 已作答={}", self.state.phase, self.state.selected_answer.is_some());
            return Vec::new();
        }

        let generation = self.bump_generation();
        let question = &self.state.questions[self.state.current_index];
        let is_correct = question.judge(&submission);
        if is_correct {
            self.state.score += 1;
        }

        info!(
            "第 {} 题作答: {} ({})",
            self.state.current_index + 1,
            submission.answer().map_or_else(|| "超时".to_string(), |a| truncate_text(a, 30)),
            if is_correct { "✅ 正确" } else { "❌ 错误" }
        );
        self.state.selected_answer = Some(submission);

        vec![Effect::StopTimer, Effect::ScheduleReveal { generation }]
    }

    /// 倒计时走一秒
    pub fn tick(&mut self, generation: u64) -> Vec<Effect> {
        if !self.is_current(generation)
            || self.state.phase != Phase::InProgress
            || self.state.selected_answer.is_some()
        {
            return Vec::new();
        }

        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        if self.state.time_remaining == 0 {
            info!("⏰ 第 {} 题超时", self.state.current_index + 1);
            return self.submit(Submission::Timeout);
        }
        Vec::new()
    }

    /// 揭晓结束，进入下一题或结束
    pub fn reveal_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if !self.is_current(generation) || self.state.phase != Phase::InProgress {
            return Vec::new();
        }

        let next = self.state.current_index + 1;
        if next < self.state.questions.len() {
            return self.enter_question(next);
        }

        self.bump_generation();
        self.state.current_index = self.state.questions.len();
        self.state.selected_answer = None;
        self.state.shuffled_answers.clear();
        self.state.time_remaining = 0;
        self.state.phase = Phase::Finished;
        info!(
            "🏁 测验结束: {}/{}",
            self.state.score,
            self.state.questions.len()
        );
        vec![Effect::StopTimer]
    }

    /// 重新开始，回到配置界面
    ///
    /// `last_configuration` 为上次保存的配置，没有时使用默认配置。
    pub fn restart(&mut self, last_configuration: Option<QuizConfiguration>) -> Vec<Effect> {
        self.bump_generation();
        debug!("重新开始，从 {} 回到配置界面", self.state.phase);
        self.state = SessionState::new(last_configuration.unwrap_or_default());
        vec![Effect::CancelAll]
    }
}
