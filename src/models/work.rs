//! Worker / WorkUnit / ExecutionResult
//!
//! Dispatcher、Specialist、Reporter 都是同一个 `Worker` 类型，
//! 只是 role / goal / persona 不同

use std::fmt;
use std::sync::Arc;

use crate::error::BackendError;
use crate::services::{GenerationRequest, TextGenerator};

/// 执行身份
///
/// 除身份外没有其他状态，只在一次流水线运行中有效
#[derive(Clone)]
pub struct Worker {
    pub role: String,
    pub goal: String,
    pub persona: String,
    backend: Arc<dyn TextGenerator>,
}

impl Worker {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        persona: impl Into<String>,
        backend: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            persona: persona.into(),
            backend,
        }
    }

    /// 执行一个分配给自己的任务
    pub async fn perform(&self, unit: &WorkUnit) -> Result<String, BackendError> {
        self.backend.generate(&unit.request()).await
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("persona", &self.persona)
            .field("model", &self.backend.model_name())
            .finish()
    }
}

/// 最小调度单元
///
/// 创建后不可变，执行时按值消费
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub instruction: String,
    pub expected_output: String,
    /// 日志和报告中使用的简短标签（如评审主题）
    pub label: String,
    worker: Arc<Worker>,
}

impl WorkUnit {
    pub fn new(
        worker: Arc<Worker>,
        instruction: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        let label = worker.role.clone();
        Self {
            instruction: instruction.into(),
            expected_output: expected_output.into(),
            label,
            worker,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    pub fn request(&self) -> GenerationRequest {
        GenerationRequest {
            role: self.worker.role.clone(),
            goal: self.worker.goal.clone(),
            persona: self.worker.persona.clone(),
            instruction: self.instruction.clone(),
            expected_output: self.expected_output.clone(),
        }
    }
}

/// 单个任务的执行结果，按位置与提交的 WorkUnit 对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// 在批次中的提交位置
    pub index: usize,
    pub worker_role: String,
    pub label: String,
    pub output: String,
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output)
    }
}
