//! Dispatcher 阶段 - 流程层 (Phase 1)
//!
//! 把未结构化的评审项目列表交给 Dispatcher，让它按大分类分组并返回 JSON。
//! 模型输出是不可信的外部格式：解析失败时退化为空分组，不中止流水线。

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::error::{ClassificationParseError, PipelineError};
use crate::models::{CategorizedGroups, EvaluationItem, WorkUnit, Worker};
use crate::orchestrator::BatchExecutor;
use crate::services::TextGenerator;
use crate::utils::logging::log_categories;
use crate::utils::truncate_text;

pub const DISPATCHER_ROLE: &str = "评审项目自动分类与分组专家";
const DISPATCHER_GOAL: &str =
    "以 '대분류' 为基准，将给定评审项目列表中的所有项目分组，并以 JSON 返回";
const DISPATCHER_PERSONA: &str =
    "你非常擅长接收复杂的列表，按主要类别整理并结构化。";

/// 创建 Dispatcher
pub fn make_dispatcher(backend: Arc<dyn TextGenerator>) -> Worker {
    Worker::new(DISPATCHER_ROLE, DISPATCHER_GOAL, DISPATCHER_PERSONA, backend)
}

/// 构建分类任务
pub fn build_dispatch_unit(dispatcher: Arc<Worker>, items: &[EvaluationItem]) -> WorkUnit {
    let items_json = serde_json::to_string(items).unwrap_or_default();

    let instruction = format!(
        r#"请分析下面的评审项目列表，以 '대분류' 键的值为基准进行分组。

[全部评审项目列表]
{}

结果 JSON 的 key 必须是列表中存在的 '대분류' 名称。
例如，如果只有 '기술' 和 '관리' 两个大分类，结果应当如下：
{{
  "기술": [{{"대분류": "기술", "topic": "...", "criteria": "..."}}, ...],
  "관리": [{{"대분류": "관리", "topic": "...", "criteria": "..."}}, ...]
}}
只返回 JSON，不要返回任何其他内容。"#,
        items_json
    );

    WorkUnit::new(
        dispatcher,
        instruction,
        "JSON 对象。每个 key 是评审项目列表中的 '대분류'，value 是属于该大分类的项目对象列表。",
    )
    .with_label("分类")
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("code fence regex is valid")
    })
}

/// 从模型输出中截取 JSON 对象文本
///
/// 去掉 Markdown 代码块，取第一个 `{` 到最后一个 `}` 之间的内容
fn extract_json_object(raw: &str) -> Option<&str> {
    let body = code_fence()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

/// 解析 Dispatcher 的输出
///
/// 缺少大分类字段的项目使用所在组的 key
pub fn decode_categorization(raw: &str) -> Result<CategorizedGroups, ClassificationParseError> {
    let json = extract_json_object(raw).ok_or(ClassificationParseError::NoJsonObject)?;
    let object: Map<String, JsonValue> = serde_json::from_str(json)?;

    let mut groups = CategorizedGroups::new();
    for (category, value) in object {
        let mut items: Vec<EvaluationItem> = serde_json::from_value(value)?;
        for item in items.iter_mut() {
            if item.category.trim().is_empty() {
                item.category = category.clone();
            }
        }
        groups.insert(category, items);
    }

    Ok(groups)
}

/// 执行 Phase 1
///
/// - 空列表直接得到空分组，不调用 Dispatcher
/// - LLM 调用失败向上传播
/// - 解析失败记录警告并返回空分组
pub async fn run_dispatch(
    executor: &BatchExecutor,
    backend: Arc<dyn TextGenerator>,
    items: &[EvaluationItem],
) -> Result<CategorizedGroups, PipelineError> {
    if items.is_empty() {
        info!("评审项目列表为空，跳过分类");
        return Ok(CategorizedGroups::new());
    }

    let dispatcher = Arc::new(make_dispatcher(backend));
    let unit = build_dispatch_unit(dispatcher, items);

    let raw = executor
        .execute_one(unit)
        .await
        .map_err(|source| PipelineError::Backend {
            phase: "Phase 1",
            source,
        })?;

    match decode_categorization(&raw) {
        Ok(groups) => {
            if !groups.is_partition_of(items) {
                warn!(
                    "⚠️ 分类结果与输入不一致: 输入 {} 个项目，分类后 {} 个项目",
                    items.len(),
                    groups.total_items()
                );
            }
            log_categories(&groups);
            Ok(groups)
        }
        Err(e) => {
            warn!("❌ 项目分类失败: {}", e);
            debug!("Dispatcher 原始输出: {}", truncate_text(&raw, 200));
            Ok(CategorizedGroups::new())
        }
    }
}
