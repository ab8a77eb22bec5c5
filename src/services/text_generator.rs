//! 文本生成后端接口
//!
//! 核心逻辑只依赖这个契约：输入文本，输出文本（可能格式错误）

use async_trait::async_trait;

use crate::error::BackendError;

/// 一次生成请求
///
/// Worker 的身份（role / goal / persona）加上 WorkUnit 的指令和期望输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub role: String,
    pub goal: String,
    pub persona: String,
    pub instruction: String,
    pub expected_output: String,
}

impl GenerationRequest {
    /// 由 Worker 身份组成的系统消息
    pub fn system_message(&self) -> String {
        format!(
            "你的角色: {}\n你的目标: {}\n背景: {}",
            self.role, self.goal, self.persona
        )
    }

    /// 由指令和期望输出组成的用户消息
    pub fn user_message(&self) -> String {
        format!(
            "{}\n\n期望输出: {}",
            self.instruction, self.expected_output
        )
    }
}

/// 文本生成后端
///
/// 实现必须可以被多个 Worker 并发调用
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BackendError>;

    /// 目标模型名称
    fn model_name(&self) -> &str;
}
