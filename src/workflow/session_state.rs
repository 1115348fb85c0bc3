//! 会话状态与界面视图

use std::fmt;

use crate::models::{QuestionSet, QuizConfiguration, Submission};

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 配置界面（初始状态）
    Configuring,
    /// 等待跨进程限流
    AwaitingRateLimit,
    /// 正在拉题
    Loading,
    /// 拉题失败，只能 restart
    Error,
    /// 答题中
    InProgress,
    /// 全部答完
    Finished,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Configuring => "configuring",
            Phase::AwaitingRateLimit => "awaiting_rate_limit",
            Phase::Loading => "loading",
            Phase::Error => "error",
            Phase::InProgress => "in_progress",
            Phase::Finished => "finished",
        }
    }

    /// 拉题尚未完成
    pub fn is_loading(self) -> bool {
        matches!(self, Phase::AwaitingRateLimit | Phase::Loading)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 会话状态
///
/// 只能通过 [`SessionMachine`](super::SessionMachine) 的状态转换修改。
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    pub configuration: QuizConfiguration,
    pub questions: QuestionSet,
    pub current_index: usize,
    /// 当前题目的答案顺序，进入题目时计算一次
    pub shuffled_answers: Vec<String>,
    /// 仅在开启计时且 `phase == InProgress` 时有意义
    pub time_remaining: u32,
    /// 只在提交答案到进入下一题之间有值
    pub selected_answer: Option<Submission>,
    pub score: usize,
    pub error_message: Option<String>,
    /// 限流预计等待秒数
    pub wait_secs: u64,
}

impl SessionState {
    pub fn new(configuration: QuizConfiguration) -> Self {
        Self {
            phase: Phase::Configuring,
            configuration,
            questions: Vec::new(),
            current_index: 0,
            shuffled_answers: Vec::new(),
            time_remaining: 0,
            selected_answer: None,
            score: 0,
            error_message: None,
            wait_secs: 0,
        }
    }

    /// 已作答的题目数
    pub fn answered_count(&self) -> usize {
        match self.phase {
            Phase::Finished => self.questions.len(),
            Phase::InProgress if self.selected_answer.is_some() => self.current_index + 1,
            Phase::InProgress => self.current_index,
            _ => 0,
        }
    }

    /// 生成界面视图
    pub fn view(&self) -> SessionView {
        let question = (self.phase == Phase::InProgress)
            .then(|| self.question_view())
            .flatten();

        let summary = (self.phase == Phase::Finished).then(|| {
            format!(
                "You scored {} out of {}!",
                self.score,
                self.questions.len()
            )
        });

        SessionView {
            phase: self.phase,
            configuration: self.configuration.clone(),
            question,
            score: self.score,
            total: self.questions.len(),
            error_message: self.error_message.clone(),
            wait_secs: self.wait_secs,
            summary,
        }
    }

    fn question_view(&self) -> Option<QuestionView> {
        let question = self.questions.get(self.current_index)?;
        let total = self.questions.len();
        let selected = self.selected_answer.as_ref();

        let answers = self
            .shuffled_answers
            .iter()
            .map(|text| {
                let mark = match selected {
                    None => AnswerMark::Neutral,
                    Some(s) if s.answer() == Some(text.as_str()) && question.is_correct(text) => {
                        AnswerMark::Correct
                    }
                    Some(s) if s.answer() == Some(text.as_str()) => AnswerMark::Incorrect,
                    Some(_) if question.is_correct(text) => AnswerMark::Revealed,
                    Some(_) => AnswerMark::Neutral,
                };
                AnswerView {
                    text: text.clone(),
                    mark,
                }
            })
            .collect();

        let timer = self.configuration.timer_enabled().then(|| {
            TimerView::new(self.time_remaining, self.configuration.timer_seconds)
        });
        let timed_out = timer.as_ref().is_some_and(|t| t.remaining == 0);

        Some(QuestionView {
            number: self.current_index + 1,
            total,
            progress: (self.current_index + 1) as f32 / total as f32,
            prompt: question.prompt.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            answers,
            answers_enabled: selected.is_none() && !timed_out,
            timer,
            selected_answer: self.selected_answer.clone(),
            is_correct: selected.map(|s| question.judge(s)),
            correct_answer: selected.map(|_| question.correct_answer.clone()),
        })
    }
}

/// 提供给界面渲染的会话视图
///
/// 文本均为题库原始内容，显示前需清洗。
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub phase: Phase,
    pub configuration: QuizConfiguration,
    pub question: Option<QuestionView>,
    pub score: usize,
    pub total: usize,
    pub error_message: Option<String>,
    pub wait_secs: u64,
    /// 结束时的总结文字
    pub summary: Option<String>,
}

impl Default for SessionView {
    fn default() -> Self {
        SessionState::new(QuizConfiguration::default()).view()
    }
}

/// 当前题目视图
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    /// 从 1 开始的题号
    pub number: usize,
    pub total: usize,
    /// 进度条比例 (0, 1]
    pub progress: f32,
    pub prompt: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub answers: Vec<AnswerView>,
    pub answers_enabled: bool,
    pub timer: Option<TimerView>,
    pub selected_answer: Option<Submission>,
    pub is_correct: Option<bool>,
    /// 揭晓阶段才有值
    pub correct_answer: Option<String>,
}

/// 单个答案按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub text: String,
    pub mark: AnswerMark,
}

/// 答案按钮的揭晓标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMark {
    /// 未作答，或与本次选择无关的错误选项
    Neutral,
    /// 选中且正确
    Correct,
    /// 选中但错误
    Incorrect,
    /// 选错后标出的正确答案
    Revealed,
}

/// 倒计时视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerView {
    pub remaining: u32,
    pub duration: u32,
    pub urgency: TimerUrgency,
}

impl TimerView {
    pub fn new(remaining: u32, duration: u32) -> Self {
        Self {
            remaining,
            duration,
            urgency: TimerUrgency::from_remaining(remaining, duration),
        }
    }
}

/// 倒计时紧迫程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUrgency {
    Calm,
    /// 剩余不超过一半
    Warning,
    /// 剩余不超过四分之一
    Critical,
}

impl TimerUrgency {
    pub fn from_remaining(remaining: u32, duration: u32) -> Self {
        if remaining * 4 <= duration {
            TimerUrgency::Critical
        } else if remaining * 2 <= duration {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Calm
        }
    }
}
