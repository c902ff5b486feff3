//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DispatchMode};
use crate::orchestrator::RunStats;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`；未设置时默认 `info`，详细模式下为 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("archive_dispatch={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 档案发送任务启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📊 范围: {}   |   DRY_RUN={}", config.filter, config.dry_run);
    info!(
        "📮 方式: {}   |   收件人: {}",
        match config.dispatch_mode {
            DispatchMode::Form => "网站表单",
            DispatchMode::Mail => "SMTP 邮件",
        },
        config.email_to
    );
    info!("🌐 起始页面: {}", config.start_url);
    match &config.source {
        Some(path) => info!("📄 配置文件: {}", path.display()),
        None => info!("📄 配置文件: 无（使用默认值和环境变量）"),
    }
    info!("💾 状态文件: {}", config.state_file);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, state_file: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔎 范围内条目: {}", stats.matched);
    info!("⏭️ 之前已处理: {}", stats.already_done);
    info!("✅ 本次发送: {}/{}", stats.dispatched, stats.attempted());
    if stats.simulated > 0 {
        info!("🧪 模拟发送: {}", stats.simulated);
    }
    info!("⚠️ 无法打开: {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    if stats.interrupted {
        warn!("⚠️ 目录未遍历完，重新运行即可从未处理的条目继续");
    }
    info!("{}", "=".repeat(60));
    info!("\n状态已保存至: {}", state_file.display());
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
