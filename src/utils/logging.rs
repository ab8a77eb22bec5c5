/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::CategorizedGroups;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则根据 `verbose` 选择 debug 或 info 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `model`: 模型名称
/// - `endpoint`: 后端地址
pub fn log_startup(model: &str, endpoint: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 动态 Agent 生成及评审流程启动");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {} @ {}", model, endpoint);
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始信息
///
/// # 参数
/// - `phase`: 阶段编号
/// - `title`: 阶段说明
pub fn log_phase_start(phase: usize, title: &str) {
    info!("\n--- [Phase {}] {} ---", phase, title);
}

/// 记录发现的大分类及其项目数
pub fn log_categories(groups: &CategorizedGroups) {
    info!("✅ 项目分类完成，发现的大分类:");
    for group in groups.iter() {
        info!("  - {}: {} 个项目", group.category, group.items.len());
    }
}

/// 记录批量评审完成信息
///
/// # 参数
/// - `success`: 成功数量
/// - `total`: 总数
pub fn log_batch_complete(success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ [Phase 2] 个别评审完成: 成功 {}/{}", success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终报告
pub fn print_final_report(report: &str) {
    println!("\n\n🚀 最终综合评审报告");
    println!("{}", "=".repeat(60));
    println!("{}", report);
    println!("{}", "=".repeat(60));
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
}

/// 打印"无评审任务"信息
pub fn print_no_work() {
    println!("没有需要评审的任务。");
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
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
