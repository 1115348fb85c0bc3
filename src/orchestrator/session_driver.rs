//! 会话驱动 - 编排层
//!
//! 一个 tokio 任务独占 [`SessionMachine`]，所有事件经同一个通道串行处理。
//! 拉题、倒计时和揭晓延时各自是独立的子任务，只通过弱引用发送带 generation 的事件，
//! 所有 [`SessionHandle`] 被丢弃后驱动任务自动退出。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{FetchTaskPanic, QuestionFetchError, SessionError};
use crate::models::{QuestionSet, QuizConfiguration};
use crate::services::{ConfigurationStore, QuestionSource};
use crate::utils::logging::{log_session_start, log_session_summary};
use crate::workflow::{Effect, Phase, SessionMachine, SessionView};

/// 驱动参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    /// 作答后揭晓结果的时长
    pub reveal_delay: Duration,
    /// 倒计时步长
    pub tick_period: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_millis(4000),
            tick_period: Duration::from_secs(1),
        }
    }
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reveal_delay: Duration::from_millis(config.reveal_delay_ms),
            ..Self::default()
        }
    }
}

/// 驱动任务接收的事件
enum SessionEvent {
    Start {
        configuration: QuizConfiguration,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SubmitAnswer(String),
    Restart,
    RateLimitWait {
        generation: u64,
        secs: u64,
    },
    QuestionsLoaded {
        generation: u64,
        result: Result<QuestionSet, QuestionFetchError>,
    },
    Tick {
        generation: u64,
    },
    RevealElapsed {
        generation: u64,
    },
}

/// 会话句柄
///
/// 界面通过它发出命令并订阅视图，可以随意克隆。
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    view_rx: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// 以给定配置开始会话（只能在配置界面调用）
    pub async fn start(&self, configuration: QuizConfiguration) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Start {
            configuration,
            reply,
        })?;
        rx.await.map_err(|_| SessionError::DriverClosed)?
    }

    /// 提交答案；等待揭晓期间的重复提交会被忽略
    pub fn submit_answer(&self, answer: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionEvent::SubmitAnswer(answer.into()))
    }

    /// 重新开始，回到配置界面
    pub fn restart(&self) -> Result<(), SessionError> {
        self.send(SessionEvent::Restart)
    }

    /// 订阅视图变化
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// 当前视图快照
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// 等待视图满足条件
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView, SessionError> {
        let mut rx = self.view_rx.clone();
        let view = rx
            .wait_for(|view| predicate(view))
            .await
            .map_err(|_| SessionError::DriverClosed)?;
        Ok(view.clone())
    }

    /// 等待进入指定阶段
    pub async fn wait_for_phase(&self, phase: Phase) -> Result<SessionView, SessionError> {
        self.wait_for(|view| view.phase == phase).await
    }

    fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events
            .send(event)
            .map_err(|_| SessionError::DriverClosed)
    }
}

/// 会话驱动
pub struct SessionDriver {
    machine: SessionMachine,
    source: Arc<dyn QuestionSource>,
    config_store: ConfigurationStore,
    settings: DriverSettings,
    events: mpsc::WeakUnboundedSender<SessionEvent>,
    view_tx: watch::Sender<SessionView>,
    fetch_task: Option<JoinHandle<()>>,
    timer_task: Option<JoinHandle<()>>,
    reveal_task: Option<JoinHandle<()>>,
}

impl SessionDriver {
    /// 启动驱动任务，初始配置取上次保存的配置
    pub fn spawn(
        source: Arc<dyn QuestionSource>,
        config_store: ConfigurationStore,
        settings: DriverSettings,
    ) -> SessionHandle {
        let machine = SessionMachine::new(config_store.load_or_default());
        Self::spawn_with_machine(machine, source, config_store, settings)
    }

    /// 使用指定的状态机启动（测试中用固定种子）
    pub fn spawn_with_machine(
        machine: SessionMachine,
        source: Arc<dyn QuestionSource>,
        config_store: ConfigurationStore,
        settings: DriverSettings,
    ) -> SessionHandle {
        let (driver, handle, events_rx) = Self::new(machine, source, config_store, settings);
        tokio::spawn(driver.run(events_rx));
        handle
    }

    fn new(
        machine: SessionMachine,
        source: Arc<dyn QuestionSource>,
        config_store: ConfigurationStore,
        settings: DriverSettings,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(machine.view());

        let driver = Self {
            machine,
            source,
            config_store,
            settings,
            events: events_tx.downgrade(),
            view_tx,
            fetch_task: None,
            timer_task: None,
            reveal_task: None,
        };
        let handle = SessionHandle {
            events: events_tx,
            view_rx,
        };
        (driver, handle, events_rx)
    }

    async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events_rx.recv().await {
            let before = self.machine.phase();
            self.handle(event);
            let after = self.machine.phase();

            if before != after {
                debug!("阶段变化: {} → {}", before, after);
                if after == Phase::Finished {
                    let state = self.machine.state();
                    log_session_summary(state.score, state.questions.len());
                }
            }
            self.publish();
        }

        self.cancel_all();
        debug!("会话驱动退出");
    }

    fn handle(&mut self, event: SessionEvent) {
        let effects = match event {
            SessionEvent::Start {
                configuration,
                reply,
            } => {
                let result = configuration
                    .validate()
                    .map_err(SessionError::from)
                    .and_then(|_| self.machine.start(configuration.clone()));
                match result {
                    Ok(effects) => {
                        log_session_start(&configuration);
                        let _ = reply.send(Ok(()));
                        effects
                    }
                    Err(e) => {
                        warn!("⚠️ 无法开始会话: {}", e);
                        let _ = reply.send(Err(e));
                        Vec::new()
                    }
                }
            }
            SessionEvent::SubmitAnswer(answer) => self.machine.submit_answer(&answer),
            SessionEvent::Restart => {
                let last = self.config_store.load();
                self.machine.restart(last)
            }
            SessionEvent::RateLimitWait { generation, secs } => {
                self.machine.rate_limit_wait(generation, secs);
                Vec::new()
            }
            SessionEvent::QuestionsLoaded { generation, result } => {
                // 过期结果不能摘掉当前拉题任务的句柄
                if generation == self.machine.generation() {
                    self.fetch_task = None;
                }
                self.machine.questions_loaded(generation, result)
            }
            SessionEvent::Tick { generation } => self.machine.tick(generation),
            SessionEvent::RevealElapsed { generation } => {
                self.machine.reveal_elapsed(generation)
            }
        };

        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::PersistConfiguration(configuration) => {
                if let Err(e) = self.config_store.save(&configuration) {
                    warn!("⚠️ 保存测验配置失败: {}", e);
                }
            }
            Effect::FetchQuestions {
                generation,
                configuration,
            } => {
                abort(&mut self.fetch_task);
                self.fetch_task = Some(self.spawn_fetch(generation, configuration));
            }
            Effect::StartTimer { generation } => {
                abort(&mut self.timer_task);
                self.timer_task = Some(self.spawn_timer(generation));
            }
            Effect::StopTimer => abort(&mut self.timer_task),
            Effect::ScheduleReveal { generation } => {
                abort(&mut self.reveal_task);
                self.reveal_task = Some(self.spawn_reveal(generation));
            }
            Effect::CancelAll => self.cancel_all(),
        }
    }

    fn cancel_all(&mut self) {
        abort(&mut self.fetch_task);
        abort(&mut self.timer_task);
        abort(&mut self.reveal_task);
    }

    fn publish(&self) {
        let view = self.machine.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn spawn_fetch(&self, generation: u64, configuration: QuizConfiguration) -> JoinHandle<()> {
        let source = self.source.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let fetch = async {
                let mut fetch = source.fetch_questions(&configuration);

                match source.wait_estimate() {
                    Some(mut wait_rx) => loop {
                        tokio::select! {
                            result = &mut fetch => break result,
                            changed = wait_rx.changed() => {
                                if changed.is_err() {
                                    break (&mut fetch).await;
                                }
                                let secs = *wait_rx.borrow_and_update();
                                emit(&events, SessionEvent::RateLimitWait { generation, secs });
                            }
                        }
                    },
                    None => fetch.await,
                }
            };

            // 拉题崩溃也必须让会话离开 Loading
            let result = AssertUnwindSafe(fetch)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!("❌ 拉题任务崩溃: {}", message);
                    Err(QuestionFetchError::network(FetchTaskPanic(message)))
                });

            emit(&events, SessionEvent::QuestionsLoaded { generation, result });
        })
    }

    fn spawn_timer(&self, generation: u64) -> JoinHandle<()> {
        let events = self.events.clone();
        let period = self.settings.tick_period;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !emit(&events, SessionEvent::Tick { generation }) {
                    break;
                }
            }
        })
    }

    fn spawn_reveal(&self, generation: u64) -> JoinHandle<()> {
        let events = self.events.clone();
        let delay = self.settings.reveal_delay;

        tokio::spawn(async move {
            sleep(delay).await;
            emit(&events, SessionEvent::RevealElapsed { generation });
        })
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = task.take() {
        handle.abort();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "未知错误".to_string())
}

/// 向驱动发送事件，驱动已退出时返回 false
fn emit(events: &mpsc::WeakUnboundedSender<SessionEvent>, event: SessionEvent) -> bool {
    match events.upgrade() {
        Some(tx) => tx.send(event).is_ok(),
        None => {
            info!("会话已关闭，丢弃后台事件");
            false
        }
    }
}
