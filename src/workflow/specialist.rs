//! 领域专家构建 - 流程层 (Phase 2 准备)
//!
//! 每个发现的大分类生成一个 Specialist，每个项目生成一个 WorkUnit，
//! 并分配给所属大分类的 Specialist。

use std::sync::Arc;

use crate::models::{CategorizedGroups, EvaluationItem, WorkUnit, Worker};
use crate::services::{ContextProvider, TextGenerator};

/// Specialist 的角色名
pub fn specialist_role(category: &str) -> String {
    format!("'{}' 领域评审专家", category)
}

/// 为一个大分类创建 Specialist
pub fn make_specialist(category: &str, backend: Arc<dyn TextGenerator>) -> Worker {
    Worker::new(
        specialist_role(category),
        format!("专业地评审提案书中属于 '{}' 领域的所有评审项目", category),
        format!("你是专门为 '{}' 领域评审而投入的顶级专家。", category),
        backend,
    )
}

/// 构建单个项目的评审任务
///
/// 指令第一行只包含大分类和主题
pub fn build_evaluation_unit(
    specialist: Arc<Worker>,
    category: &str,
    item: &EvaluationItem,
    context: &str,
) -> WorkUnit {
    let instruction = format!(
        "评审 '{}' 领域的 '{}' 项目。\n- 评审标准: {}\n- 相关内容: {}",
        category, item.topic, item.criteria, context
    );
    let expected_output = format!("关于 '{}' 的评审报告，包含评审分数、摘要和依据", item.topic);

    WorkUnit::new(specialist, instruction, expected_output).with_label(item.topic.clone())
}

/// Phase 2 的执行计划
#[derive(Debug, Default)]
pub struct EvaluationPlan {
    /// 大分类 → Specialist，按大分类的发现顺序
    pub specialists: Vec<(String, Arc<Worker>)>,
    /// 所有评审任务，按大分类顺序、组内按项目顺序
    pub units: Vec<WorkUnit>,
}

impl EvaluationPlan {
    pub fn specialist_count(&self) -> usize {
        self.specialists.len()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn specialist_for(&self, category: &str) -> Option<&Arc<Worker>> {
        self.specialists
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, worker)| worker)
    }
}

/// 根据分组结果构建 Specialist 和评审任务
pub async fn build_evaluation_plan(
    groups: &CategorizedGroups,
    context_provider: &dyn ContextProvider,
    document_reference: &str,
    backend: Arc<dyn TextGenerator>,
) -> EvaluationPlan {
    let mut plan = EvaluationPlan::default();

    for group in groups.iter() {
        let specialist = Arc::new(make_specialist(&group.category, backend.clone()));

        for item in &group.items {
            let context = context_provider
                .retrieve(document_reference, &item.topic)
                .await;
            plan.units.push(build_evaluation_unit(
                specialist.clone(),
                &group.category,
                item,
                &context,
            ));
        }

        plan.specialists.push((group.category.clone(), specialist));
    }

    plan
}
