//! # Trivia Quiz
//!
//! 一个终端版的知识问答测验：按设置从公开题库拉题，逐题作答、计时、判分。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 键值存储、时钟、跨进程限流器
//!
//! ### ② 业务能力层（Services）
//! - `CategoryProvider` - 获取分类列表
//! - `QuestionProvider` - 限流后按配置拉题
//! - `ConfigurationStore` - 保存上次的测验设置
//!
//! ### ③ 流程层（Workflow）
//! - `SessionMachine` - 纯同步的会话状态机（阶段、判分、倒计时、揭晓）
//!
//! ### ④ 编排层（Orchestration）
//! - `SessionDriver` - 串行事件循环，执行状态机的副作用并发布视图
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Question, QuestionSet, QuizConfiguration};
pub use orchestrator::{DriverSettings, SessionDriver, SessionHandle};
pub use workflow::{Phase, SessionMachine, SessionView};
