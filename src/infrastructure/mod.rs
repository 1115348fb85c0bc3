//! 基础设施层
//!
//! 持有跨组件共享的资源（键值存储、时钟），只暴露能力，不认识题目和会话。

pub mod clock;
pub mod kv_store;
pub mod rate_limiter;

pub use clock::{Clock, SystemClock, TokioClock};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore};
pub use rate_limiter::RateLimitedFetcher;
