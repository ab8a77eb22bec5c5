use serde::{Deserialize, Serialize};

/// 评审项目
///
/// 读取后不再修改。以在列表中的位置作为身份，不要求 (category, topic) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationItem {
    /// 大分类
    #[serde(rename = "대분류", alias = "category", default)]
    pub category: String,
    /// 评审主题
    pub topic: String,
    /// 评审标准
    pub criteria: String,
}

impl EvaluationItem {
    pub fn new(
        category: impl Into<String>,
        topic: impl Into<String>,
        criteria: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            topic: topic.into(),
            criteria: criteria.into(),
        }
    }
}
