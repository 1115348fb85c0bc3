//! 跨进程限流
//!
//! 题库要求两次拉题之间至少间隔 5 秒。上次拉题时间保存在共享存储里，
//! 同一状态目录下的所有进程（相当于同源的多个标签页）共同遵守这个间隔。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::kv_store::KeyValueStore;

/// 共享存储中保存上次拉题时间的键
pub const LAST_FETCH_KEY: &str = "lastFetchTime";

/// 等待轮数上限，超过后不再等待直接放行
const MAX_WAIT_ROUNDS: usize = 32;

/// 限流器
///
/// 职责：
/// - 读取共享的上次拉题时间，等待到满足最小间隔
/// - 放行前写入新的拉题时间（后写者胜出）
/// - 通过 watch 通道暴露预计等待秒数
pub struct RateLimitedFetcher {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    wait_tx: watch::Sender<u64>,
}

impl RateLimitedFetcher {
    /// 创建新的限流器
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let (wait_tx, _) = watch::channel(0);
        Self {
            store,
            clock,
            wait_tx,
        }
    }

    /// 订阅预计等待秒数
    pub fn subscribe_wait(&self) -> watch::Receiver<u64> {
        self.wait_tx.subscribe()
    }

    /// 当前预计等待秒数（向上取整），不在等待时为 0
    pub fn wait_estimate_secs(&self) -> u64 {
        *self.wait_tx.borrow()
    }

    /// 距离可以再次拉题还需等待的时间
    pub fn remaining_wait(&self, min_interval: Duration) -> Duration {
        match self.last_attempt_millis() {
            Some(last) => wait_after(last, self.clock.now_millis(), min_interval),
            None => Duration::ZERO,
        }
    }

    /// 等待直到距上次拉题至少 `min_interval`，然后记录本次拉题时间
    ///
    /// 每次醒来都会重新读取共享时间戳，因为等待期间其他进程可能已经拉过题。
    /// 丢弃返回的 future 即可取消等待。
    pub async fn acquire(&self, min_interval: Duration) {
        let _reset = WaitEstimateReset(&self.wait_tx);

        for round in 1..=MAX_WAIT_ROUNDS {
            let now = self.clock.now_millis();
            let last = self.last_attempt_millis();

            // 未来的时间戳改写为当前时间，之后最多再等一个间隔
            if let Some(future) = last.filter(|last| *last > now) {
                warn!("⚠️ 上次拉题时间 {} 晚于当前时间 {}，按当前时间处理", future, now);
                self.store_timestamp(now);
            }

            let remaining = last.map_or(Duration::ZERO, |last| wait_after(last, now, min_interval));
            if remaining.is_zero() {
                self.record_attempt();
                return;
            }

            let secs = div_ceil_secs(remaining);
            self.wait_tx.send_replace(secs);
            info!("⏳ 题库限流，约 {} 秒后拉题 (第 {} 轮)", secs, round);

            sleep(remaining).await;
        }

        warn!("⚠️ 等待已达 {} 轮上限，直接拉题", MAX_WAIT_ROUNDS);
        self.record_attempt();
    }

    fn last_attempt_millis(&self) -> Option<i64> {
        match self.store.get(LAST_FETCH_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(millis) => Some(millis),
                Err(_) => {
                    warn!("⚠️ 无法解析上次拉题时间 '{}'，视为从未拉题", raw);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("⚠️ 读取上次拉题时间失败，视为从未拉题: {}", e);
                None
            }
        }
    }

    fn record_attempt(&self) {
        let now = self.clock.now_millis();
        self.store_timestamp(now);
        debug!("记录拉题时间: {}", now);
    }

    fn store_timestamp(&self, millis: i64) {
        if let Err(e) = self.store.set(LAST_FETCH_KEY, &millis.to_string()) {
            // 写失败最多导致一次过快的请求，由题库返回限流错误
            warn!("⚠️ 写入拉题时间失败: {}", e);
        }
    }
}

/// 距上次拉题 `last` 还需等待多久
///
/// 差值溢出说明时间戳已损坏，视为从未拉题；`last` 在未来时按刚刚拉过题处理。
fn wait_after(last: i64, now: i64, min_interval: Duration) -> Duration {
    let Some(elapsed) = now.checked_sub(last) else {
        return Duration::ZERO;
    };
    let interval_ms = u64::try_from(min_interval.as_millis()).unwrap_or(u64::MAX);
    let elapsed_ms = u64::try_from(elapsed).unwrap_or(0);
    Duration::from_millis(interval_ms.saturating_sub(elapsed_ms))
}

/// 离开 acquire（包括被取消）时把预计等待清零
struct WaitEstimateReset<'a>(&'a watch::Sender<u64>);

impl Drop for WaitEstimateReset<'_> {
    fn drop(&mut self) {
        self.0.send_replace(0);
    }
}

fn div_ceil_secs(d: Duration) -> u64 {
    let millis = d.as_millis() as u64;
    (millis + 999) / 1000
}
