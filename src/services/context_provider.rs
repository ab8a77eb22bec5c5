//! 上下文检索服务 - 业务能力层
//!
//! 给定提案书引用和评审主题，返回相关内容

use async_trait::async_trait;
use tracing::info;

/// 上下文检索接口
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn retrieve(&self, document_reference: &str, topic: &str) -> String;
}

/// 占位检索实现
///
/// 不访问任何存储，返回标明文档和主题的占位内容
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderContextProvider;

#[async_trait]
impl ContextProvider for PlaceholderContextProvider {
    async fn retrieve(&self, document_reference: &str, topic: &str) -> String {
        info!("🔍 正在从 '{}' 中检索 '{}' 的相关内容...", document_reference, topic);
        format!(
            "'{}' 中与 '{}' 相关的内容。（模拟检索结果）",
            document_reference, topic
        )
    }
}
