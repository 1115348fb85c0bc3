//! 终端界面
//!
//! 只负责读输入、渲染视图。所有会话逻辑都在 SessionDriver 中。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use crate::clients::{TriviaApi, TriviaClient};
use crate::config::Config;
use crate::infrastructure::{FileStore, KeyValueStore, RateLimitedFetcher, SystemClock};
use crate::models::{
    category_name, Category, Difficulty, QuestionType, QuizConfiguration, Submission,
    MAX_TIMER_SECS, QUESTION_COUNT_CHOICES, TIMER_STEP_SECS,
};
use crate::orchestrator::{DriverSettings, SessionDriver, SessionHandle};
use crate::services::{CategoryLoad, CategoryProvider, ConfigurationStore, QuestionProvider};
use crate::utils::logging::log_startup;
use crate::utils::to_plain_text;
use crate::workflow::{AnswerMark, Phase, SessionView, TimerUrgency};

type InputLines = Lines<BufReader<Stdin>>;

/// 应用主结构
pub struct App {
    categories: CategoryLoad,
    config_store: ConfigurationStore,
    session: SessionHandle,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let api: Arc<dyn TriviaApi> =
            Arc::new(TriviaClient::new(&config).context("无法创建题库客户端")?);

        // 拉题时间所有进程共享；测验设置只属于本状态目录
        let shared: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.shared_store_path()));
        let config_store =
            ConfigurationStore::new(Arc::new(FileStore::new(config.session_store_path())));

        let limiter = Arc::new(RateLimitedFetcher::new(shared, Arc::new(SystemClock)));
        let provider = QuestionProvider::with_interval(
            api.clone(),
            limiter,
            Duration::from_millis(config.min_fetch_interval_ms),
        );

        let categories = CategoryProvider::new(api).fetch_or_empty().await;

        let session = SessionDriver::spawn(
            Arc::new(provider),
            config_store.clone(),
            DriverSettings::from_config(&config),
        );

        Ok(Self {
            categories,
            config_store,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let defaults = self.config_store.load_or_default();
            let Some(quiz) = self.prompt_configuration(&mut input, defaults).await? else {
                info!("👋 退出");
                return Ok(());
            };

            if let Err(e) = self.session.start(quiz).await {
                warn!("⚠️ 无法开始测验: {}", e);
                println!("{}", e);
                continue;
            }

            if !self.play(&mut input).await? {
                return Ok(());
            }

            self.session.restart()?;
            self.session.wait_for_phase(Phase::Configuring).await?;
        }
    }

    /// 进行一轮测验，返回 false 表示用户要退出
    async fn play(&self, input: &mut InputLines) -> Result<bool> {
        self.session
            .wait_for(|v| v.phase != Phase::Configuring)
            .await?;

        let mut views = self.session.subscribe();
        let mut renderer = Renderer::default();
        renderer.render(&views.borrow_and_update().clone(), &self.categories.categories);

        loop {
            let view = views.borrow().clone();
            if view.phase == Phase::Configuring {
                // 用户中途输入了 r
                return Ok(true);
            }
            if matches!(view.phase, Phase::Finished | Phase::Error) {
                println!("\n按回车重新开始，输入 q 退出");
                return match input.next_line().await? {
                    Some(line) if line.trim().eq_ignore_ascii_case("q") => Ok(false),
                    Some(_) => Ok(true),
                    None => Ok(false),
                };
            }

            tokio::select! {
                changed = views.changed() => {
                    changed.context("会话驱动已关闭")?;
                    let view = views.borrow_and_update().clone();
                    renderer.render(&view, &self.categories.categories);
                }
                line = input.next_line() => {
                    let Some(line) = line? else {
                        return Ok(false);
                    };
                    self.handle_answer_input(&view, line.trim())?;
                }
            }
        }
    }

    fn handle_answer_input(&self, view: &SessionView, line: &str) -> Result<()> {
        if line.eq_ignore_ascii_case("r") {
            self.session.restart()?;
            return Ok(());
        }

        let Some(question) = view.question.as_ref() else {
            return Ok(());
        };
        if !question.answers_enabled {
            return Ok(());
        }

        match line.parse::<usize>() {
            Ok(n) if (1..=question.answers.len()).contains(&n) => {
                self.session.submit_answer(question.answers[n - 1].text.clone())?;
            }
            _ => println!("请输入 1-{} 之间的数字", question.answers.len()),
        }
        Ok(())
    }

    /// 配置界面，返回 None 表示退出
    async fn prompt_configuration(
        &self,
        input: &mut InputLines,
        defaults: QuizConfiguration,
    ) -> Result<Option<QuizConfiguration>> {
        let categories = &self.categories.categories;

        println!("\n{}", "=".repeat(40));
        println!("Quiz Settings");
        println!("{}", "=".repeat(40));
        if let Some(message) = &self.categories.error_message {
            println!("⚠️ {}", message);
        }

        let counts = QUESTION_COUNT_CHOICES
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("/");
        let Some(question_count) = ask(
            input,
            &format!("Number of Questions [{}] ({}): ", counts, defaults.question_count),
            |s| parse_question_count(s, defaults.question_count),
        )
        .await?
        else {
            return Ok(None);
        };

        println!("Category:");
        println!("  0) Any Category");
        for (i, category) in categories.iter().enumerate() {
            println!("  {}) {}", i + 1, to_plain_text(&category.name));
        }
        let default_category = defaults
            .category_id
            .and_then(|id| category_name(categories, id).map(|_| id));
        let Some(category_id) = ask(input, "Category (0): ", |s| {
            parse_category(s, categories, default_category)
        })
        .await?
        else {
            return Ok(None);
        };

        let Some(difficulty) = ask(
            input,
            "Difficulty [0 Any / 1 Easy / 2 Medium / 3 Hard]: ",
            |s| parse_option(s, &Difficulty::ALL, defaults.difficulty),
        )
        .await?
        else {
            return Ok(None);
        };

        let Some(question_type) = ask(
            input,
            "Type of Question [0 Any / 1 Multiple Choice / 2 True/False]: ",
            |s| parse_option(s, &QuestionType::ALL, defaults.question_type),
        )
        .await?
        else {
            return Ok(None);
        };

        let Some(timer_seconds) = ask(
            input,
            &format!(
                "Time per question [0-{} step {}, 0 = No timer] ({}): ",
                MAX_TIMER_SECS, TIMER_STEP_SECS, defaults.timer_seconds
            ),
            |s| parse_timer(s, defaults.timer_seconds),
        )
        .await?
        else {
            return Ok(None);
        };

        Ok(Some(QuizConfiguration {
            question_count,
            category_id,
            difficulty,
            question_type,
            timer_seconds,
        }))
    }
}

/// 反复提问直到输入合法；EOF 或 q 返回 None
async fn ask<T>(
    input: &mut InputLines,
    label: &str,
    mut parse: impl FnMut(&str) -> Option<T>,
) -> Result<Option<T>> {
    loop {
        print!("{}", label);
        use std::io::Write;
        std::io::stdout().flush().ok();

        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match parse(line) {
            Some(value) => return Ok(Some(value)),
            None => println!("输入无效，请重试"),
        }
    }
}

fn parse_question_count(input: &str, default: u32) -> Option<u32> {
    if input.is_empty() {
        return Some(default);
    }
    input
        .parse()
        .ok()
        .filter(|n| QUESTION_COUNT_CHOICES.contains(n))
}

fn parse_category(input: &str, categories: &[Category], default: Option<u32>) -> Option<Option<u32>> {
    if input.is_empty() {
        return Some(default);
    }
    match input.parse::<usize>().ok()? {
        0 => Some(None),
        n => categories.get(n - 1).map(|c| Some(c.id)),
    }
}

fn parse_option<T: Copy>(input: &str, choices: &[T], default: Option<T>) -> Option<Option<T>> {
    if input.is_empty() {
        return Some(default);
    }
    match input.parse::<usize>().ok()? {
        0 => Some(None),
        n => choices.get(n - 1).map(|c| Some(*c)),
    }
}

fn parse_timer(input: &str, default: u32) -> Option<u32> {
    if input.is_empty() {
        return Some(default);
    }
    input
        .parse()
        .ok()
        .filter(|n| *n <= MAX_TIMER_SECS && n % TIMER_STEP_SECS == 0)
}

/// 记录已经渲染过的内容，避免每秒重绘整道题
#[derive(Default)]
struct Renderer {
    last_phase: Option<Phase>,
    last_question: Option<(usize, bool)>,
    last_wait: u64,
}

impl Renderer {
    fn render(&mut self, view: &SessionView, categories: &[Category]) {
        let phase_changed = self.last_phase != Some(view.phase);
        self.last_phase = Some(view.phase);

        match view.phase {
            Phase::Configuring => {}
            Phase::AwaitingRateLimit => {
                if phase_changed || self.last_wait != view.wait_secs {
                    println!("Please wait {} seconds...", view.wait_secs);
                }
            }
            Phase::Loading => {
                if phase_changed {
                    println!("Loading...");
                }
            }
            Phase::Error => {
                if let Some(message) = &view.error_message {
                    println!("\n❌ {}", message);
                }
            }
            Phase::Finished => {
                println!("\n🏁 Quiz over!");
                if let Some(summary) = &view.summary {
                    println!("{}", summary);
                }
            }
            Phase::InProgress => self.render_question(view, categories),
        }
        self.last_wait = view.wait_secs;
    }

    fn render_question(&mut self, view: &SessionView, categories: &[Category]) {
        let Some(question) = &view.question else {
            return;
        };

        let key = (question.number, question.selected_answer.is_some());
        if self.last_question == Some(key) {
            if let Some(timer) = question.timer {
                if timer.remaining % 5 == 0 || timer.remaining <= 3 {
                    println!("⏱️ {}{} seconds", urgency_marker(timer.urgency), timer.remaining);
                }
            }
            return;
        }
        self.last_question = Some(key);

        if question.selected_answer.is_none() {
            let filled = (question.progress * 20.0).round() as usize;
            println!("\n{}", "─".repeat(40));
            println!(
                "Question {} / {}  [{}{}]",
                question.number,
                question.total,
                "■".repeat(filled),
                "□".repeat(20 - filled.min(20))
            );
            let category = question
                .category
                .clone()
                .or_else(|| {
                    view.configuration
                        .category_id
                        .and_then(|id| category_name(categories, id).map(str::to_string))
                });
            if let Some(category) = category {
                let difficulty = question.difficulty.clone().unwrap_or_default();
                println!("{} {}", to_plain_text(&category), difficulty);
            }
            if let Some(timer) = question.timer {
                println!("Time remaining: {} seconds", timer.remaining);
            }
            println!("\n{}\n", to_plain_text(&question.prompt));
            for (i, answer) in question.answers.iter().enumerate() {
                println!("  {}) {}", i + 1, to_plain_text(&answer.text));
            }
            println!("\n输入答案编号（r 重新开始）：");
            return;
        }

        for (i, answer) in question.answers.iter().enumerate() {
            let marker = match answer.mark {
                AnswerMark::Correct => "✅",
                AnswerMark::Incorrect => "❌",
                AnswerMark::Revealed => "👉",
                AnswerMark::Neutral => "  ",
            };
            println!("{} {}) {}", marker, i + 1, to_plain_text(&answer.text));
        }
        match question.is_correct {
            Some(true) => println!("Correct!"),
            _ => {
                if question.selected_answer.as_ref().is_some_and(Submission::is_timeout) {
                    println!("Time's up!");
                }
                if let Some(correct) = &question.correct_answer {
                    println!("The correct answer was: {}", to_plain_text(correct));
                }
            }
        }
        println!("Score: {}", view.score);
    }
}

fn urgency_marker(urgency: TimerUrgency) -> &'static str {
    match urgency {
        TimerUrgency::Calm => "",
        TimerUrgency::Warning => "⚠️ ",
        TimerUrgency::Critical => "🔥 ",
    }
}
