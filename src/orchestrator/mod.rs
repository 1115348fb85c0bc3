//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 持有会话状态机，串行处理所有事件（用户命令、拉题结果、倒计时、揭晓延时），
//! 执行状态机返回的 Effect，并把最新视图发布给界面。
//!
//! ## 层次关系
//!
//! ```text
//! session_driver (串行事件循环，持有定时器句柄)
//!     ↓
//! workflow::SessionMachine (纯状态转换)
//!     ↓
//! services (能力层：拉题 / 配置存储)
//!     ↓
//! infrastructure (基础设施：限流、存储、时钟)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一事件循环**：状态只在驱动任务内修改，不需要锁
//! 2. **确定的取消**：每个定时器句柄在离开其所属题目时立即 abort
//! 3. **代际校验**：已经发出的过期事件由状态机按 generation 丢弃

pub mod session_driver;

pub use session_driver::{DriverSettings, SessionDriver, SessionHandle};
