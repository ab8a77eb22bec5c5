//! # Proposal Evaluator
//!
//! 动态发现评审项目的大分类，为每个大分类生成一个领域专家 Agent，
//! 并发完成所有项目的评审，最后汇总成一份最终报告。
//!
//! ## 架构设计
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `TextGenerator` - 文本生成契约，`LlmService` 为兼容 OpenAI API 的实现
//! - `ContextProvider` - 按主题检索提案书内容
//!
//! ### ② 模型层（Models）
//! - `EvaluationItem` / `CategorizedGroups` - 评审项目及其分组
//! - `Worker` / `WorkUnit` / `ExecutionResult` - 执行身份、调度单元和结果
//!
//! ### ③ 流程层（Workflow）
//! - `dispatcher` - Phase 1，分类并解析模型输出
//! - `specialist` - Phase 2 准备，按大分类动态生成专家和任务
//! - `reporter` - Phase 3，汇总报告
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_executor` - 并发批量执行，顺序保持
//! - `orchestrator/pipeline` - 三阶段流水线
//! - `orchestrator/app` - 应用入口
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[doc(hidden)]
pub mod test_support;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppResult, BackendError, ClassificationParseError, PipelineError};
pub use models::{CategorizedGroups, EvaluationItem, ExecutionResult, WorkUnit, Worker};
pub use orchestrator::{
    App, BatchExecutor, EvaluationPipeline, FailurePolicy, FinalReport, PipelineOutcome,
    RetryPolicy,
};
pub use services::{ContextProvider, LlmService, PlaceholderContextProvider, TextGenerator};
