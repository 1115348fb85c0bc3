//! 流程层（Workflow）
//!
//! 定义"一次测验会话"的完整状态流转。本层是纯同步逻辑：不持有定时器和网络资源，
//! 每次状态转换返回需要由编排层执行的 [`Effect`]。

pub mod answer_order;
pub mod session_machine;
pub mod session_state;

pub use answer_order::shuffle_answers;
pub use session_machine::{Effect, SessionMachine};
pub use session_state::{
    AnswerMark, AnswerView, Phase, QuestionView, SessionState, SessionView, TimerUrgency,
    TimerView,
};
