//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_executor` - 批量执行器
//! - 按提交顺序收集结果
//! - 控制并发数量（Semaphore）
//! - 重试、超时和失败策略
//!
//! ### `pipeline` - 三阶段评审流水线
//! - 分类 → 动态生成专家并发评审 → 汇总报告
//!
//! ### `app` - 应用入口
//! - 装配后端、加载评审项目、输出结果
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! pipeline
//!     ↓
//! workflow (dispatcher / specialist / reporter)
//!     ↓
//! batch_executor → models::Worker → services::TextGenerator
//! ```

pub mod app;
pub mod batch_executor;
pub mod pipeline;

pub use app::App;
pub use batch_executor::{BatchExecutor, BatchOutcome, FailurePolicy, RetryPolicy};
pub use pipeline::{EvaluationPipeline, FinalReport, PipelineOutcome};
