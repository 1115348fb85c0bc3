//! 时钟
//!
//! 限流时间戳需要在多个进程之间比较，所以使用 Unix 毫秒时间戳。

use tokio::time::Instant;

/// 毫秒级时钟
pub trait Clock: Send + Sync {
    /// 当前 Unix 时间（毫秒）
    fn now_millis(&self) -> i64;
}

/// 系统墙上时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 以 tokio 单调时钟推进的时钟
///
/// 以创建时刻的 `anchor_millis` 为起点。测试中暂停 tokio 时间后，它会跟随虚拟时间前进。
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor_millis: i64,
    start: Instant,
}

impl TokioClock {
    pub fn new(anchor_millis: i64) -> Self {
        Self {
            anchor_millis,
            start: Instant::now(),
        }
    }

    /// 以当前墙上时间为起点
    pub fn from_system() -> Self {
        Self::new(SystemClock.now_millis())
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        self.anchor_millis + self.start.elapsed().as_millis() as i64
    }
}
