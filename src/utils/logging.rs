/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::orchestrator::{ChainReport, StopReason};

/// 初始化日志输出
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 info / debug。
/// 重复调用不会报错，便于测试中多次初始化。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录题目链启动信息
pub fn log_chain_start(start_url: &str, email: &str, budget_secs: u64) {
    info!("{}", "=".repeat(60));
    info!("🎯 开始解题 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🔗 起始地址: {}", start_url);
    info!("📧 邮箱: {} (长度 {})", email, email.len());
    info!("⏱️ 时间预算: {} 秒", budget_secs);
    info!("{}", "=".repeat(60));
}

/// 记录单题开始信息
pub fn log_task_start(task_index: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("[题目 #{}] 📄 {}", task_index, url);
    info!("{}", "─".repeat(60));
}

/// 记录提交结果
pub fn log_submission(task_index: usize, correct: bool, reason: Option<&str>, next: Option<&str>) {
    info!("[题目 #{}] 📊 提交结果", task_index);
    info!("[题目 #{}]   正确: {}", task_index, correct);
    info!("[题目 #{}]   原因: {}", task_index, reason.unwrap_or("N/A"));
    info!(
        "[题目 #{}]   下一题: {}",
        task_index,
        next.unwrap_or("无 (题目链结束)")
    );
}

/// 打印最终统计信息
pub fn print_chain_summary(report: &ChainReport) {
    let reason = match report.stop_reason {
        StopReason::Completed => "题目链完成",
        StopReason::DeadlineExceeded => "超出时间预算",
        StopReason::Failed => "遇到无法恢复的错误",
    };
    info!("\n{}", "=".repeat(60));
    info!("📊 解题结束统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔁 尝试题目: {}", report.tasks_attempted);
    info!("📤 成功提交: {}", report.tasks_submitted);
    info!("🛑 结束原因: {}", reason);
    info!("⏱️ 总耗时: {:.1} 秒", report.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
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
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("题目内容很长", 2), "题目...");
    }
}
