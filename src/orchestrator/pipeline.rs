//! 评审流水线 - 编排层
//!
//! ```text
//! Phase 1  Dispatcher  (单个任务，顺序)   items → CategorizedGroups
//!     ↓
//! Phase 2  Specialists (一个批次，并发)   CategorizedGroups → Vec<ExecutionResult>
//!     ↓
//! Phase 3  Reporter    (单个任务，顺序)   Vec<ExecutionResult> → FinalReport
//! ```
//!
//! 每个阶段完全结束后才开始下一阶段。流水线不持有全局状态，
//! 所有 Worker 和 WorkUnit 都是一次运行内的局部值。

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppResult, PipelineError};
use crate::models::EvaluationItem;
use crate::orchestrator::batch_executor::BatchExecutor;
use crate::services::{ContextProvider, TextGenerator};
use crate::utils::logging::{log_batch_complete, log_phase_start};
use crate::workflow::{build_evaluation_plan, run_dispatch, run_report};

/// 最终报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub text: String,
    /// 成功评审的项目数
    pub evaluated: usize,
    /// 评审失败的项目主题
    pub failed: Vec<String>,
}

/// 流水线运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// 没有发现任何评审任务
    NoWork,
    Report(FinalReport),
}

/// 评审流水线
pub struct EvaluationPipeline {
    backend: Arc<dyn TextGenerator>,
    context_provider: Arc<dyn ContextProvider>,
    executor: BatchExecutor,
    document_reference: String,
}

impl EvaluationPipeline {
    pub fn new(
        backend: Arc<dyn TextGenerator>,
        context_provider: Arc<dyn ContextProvider>,
        executor: BatchExecutor,
        document_reference: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            context_provider,
            executor,
            document_reference: document_reference.into(),
        }
    }

    pub fn from_config(
        config: &Config,
        backend: Arc<dyn TextGenerator>,
        context_provider: Arc<dyn ContextProvider>,
    ) -> Self {
        Self::new(
            backend,
            context_provider,
            config.batch_executor(),
            config.document_reference.clone(),
        )
    }

    /// 运行完整的三阶段流程
    pub async fn run(&self, items: &[EvaluationItem]) -> AppResult<PipelineOutcome> {
        // ========== Phase 1: 分类 ==========
        log_phase_start(1, "Dispatcher 识别大分类并对项目分类");
        let groups = run_dispatch(&self.executor, self.backend.clone(), items).await?;

        // ========== Phase 2: 动态生成专家并并发评审 ==========
        log_phase_start(2, "按发现的大分类动态生成领域专家并并发评审");
        let plan = build_evaluation_plan(
            &groups,
            self.context_provider.as_ref(),
            &self.document_reference,
            self.backend.clone(),
        )
        .await;

        if plan.is_empty() {
            info!("没有需要评审的任务");
            return Ok(PipelineOutcome::NoWork);
        }

        info!(
            "🧑‍⚖️ 生成了 {} 个领域专家，共 {} 个评审任务",
            plan.specialist_count(),
            plan.unit_count()
        );

        let outcome = self.executor.execute(plan.units).await?;
        log_batch_complete(outcome.results.len(), outcome.total());

        if outcome.results.is_empty() {
            return Err(PipelineError::AllUnitsFailed {
                total: outcome.total(),
            });
        }
        if outcome.is_partial() {
            warn!(
                "⚠️ 部分评审失败 ({}/{})，将基于已完成的评审生成报告",
                outcome.failures.len(),
                outcome.total()
            );
        }

        // ========== Phase 3: 生成最终报告 ==========
        log_phase_start(3, "Reporter 撰写最终报告");
        let text = run_report(&self.executor, self.backend.clone(), &outcome).await?;

        Ok(PipelineOutcome::Report(FinalReport {
            text,
            evaluated: outcome.results.len(),
            failed: outcome.failures.into_iter().map(|f| f.label).collect(),
        }))
    }
}
