/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::QuizConfiguration;
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 题库地址: {}", config.api_base_url);
    info!("⏱️ 拉题最小间隔: {} ms", config.min_fetch_interval_ms);
    info!("📁 状态目录: {}", config.state_dir);
    info!("{}", "=".repeat(60));
}

/// 记录会话开始
pub fn log_session_start(quiz: &QuizConfiguration) {
    info!("\n{}", "─".repeat(60));
    info!("🎯 开始新测验: {}", quiz);
    info!("{}", "─".repeat(60));
}

/// 打印会话结束统计
///
/// # 参数
/// - `score`: 得分
/// - `total`: 题目总数
pub fn log_session_summary(score: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测验完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 得分: {}/{}", score, total);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("Which planet is largest?", 5), "Which...");
        assert_eq!(truncate_text("首都是哪里", 2), "首都...");
    }
}
