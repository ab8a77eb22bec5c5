//! Reporter 阶段 - 流程层 (Phase 3)
//!
//! 把所有个别评审结果拼接后交给 Reporter，生成一份最终报告

use std::sync::Arc;

use crate::error::PipelineError;
use crate::models::{ExecutionResult, WorkUnit, Worker};
use crate::orchestrator::batch_executor::{BatchExecutor, BatchOutcome};
use crate::services::TextGenerator;

pub const REPORTER_ROLE: &str = "首席评审分析师 (Chief Evaluation Analyst)";
const REPORTER_GOAL: &str =
    "综合多份个别评审报告，写出一份可供管理层决策的完整最终报告";
const REPORTER_PERSONA: &str =
    "你非常擅长汇总多个部门的报告，提炼核心内容，从整体角度分析优势和不足并撰写最终报告。";

/// 个别评审结果之间的分隔符
pub const RESULT_DELIMITER: &str = "\n\n";

pub fn make_reporter(backend: Arc<dyn TextGenerator>) -> Worker {
    Worker::new(REPORTER_ROLE, REPORTER_GOAL, REPORTER_PERSONA, backend)
}

/// 按顺序拼接所有结果
pub fn concatenate_results(results: &[ExecutionResult]) -> String {
    results
        .iter()
        .map(|result| result.to_string())
        .collect::<Vec<_>>()
        .join(RESULT_DELIMITER)
}

/// 构建报告任务
///
/// 批次部分失败时，在指令中列出未完成评审的项目
pub fn build_report_unit(reporter: Arc<Worker>, outcome: &BatchOutcome) -> WorkUnit {
    let reports = concatenate_results(&outcome.results);

    let missing = if outcome.failures.is_empty() {
        String::new()
    } else {
        let labels: Vec<&str> = outcome.failures.iter().map(|f| f.label.as_str()).collect();
        format!(
            "注意：以下 {} 个项目评审失败，未包含在上述报告中，请在最终报告中说明：{}\n\n",
            labels.len(),
            labels.join(", ")
        )
    };

    let instruction = format!(
        "以下是各领域专家撰写的个别评审报告。\n\n[个别评审报告列表]\n{}\n\n{}请综合以上所有报告，撰写一份针对整个提案书的最终评审报告，包含总体评价、优势和不足。",
        reports, missing
    );

    WorkUnit::new(reporter, instruction, "一份完整的最终评审报告").with_label("最终报告")
}

/// 执行 Phase 3
pub async fn run_report(
    executor: &BatchExecutor,
    backend: Arc<dyn TextGenerator>,
    outcome: &BatchOutcome,
) -> Result<String, PipelineError> {
    let reporter = Arc::new(make_reporter(backend));
    let unit = build_report_unit(reporter, outcome);

    executor
        .execute_one(unit)
        .await
        .map_err(|source| PipelineError::Backend {
            phase: "Phase 3",
            source,
        })
}
