//! 日志初始化
//!
//! 日志写到 stderr，stdout 留给终端界面

use crate::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅者
///
/// `RUST_LOG` 优先；否则使用配置中的 `log_filter`，`verbose_logging` 时强制为 debug。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(config: &Config) {
    let fallback = if config.verbose_logging {
        "debug"
    } else {
        config.log_filter.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
