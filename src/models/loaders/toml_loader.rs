use std::path::Path;

use serde::Deserialize;
use tokio::fs;

use crate::error::ItemLoadError;
use crate::models::EvaluationItem;

/// TOML 文件结构：`[[items]]` 表数组
#[derive(Debug, Deserialize)]
struct ItemsFile {
    #[serde(default)]
    items: Vec<EvaluationItem>,
}

/// 解析 TOML 文本为评审项目列表
pub fn parse_items_toml(content: &str, path: &str) -> Result<Vec<EvaluationItem>, ItemLoadError> {
    let file: ItemsFile =
        toml::from_str(content).map_err(|source| ItemLoadError::TomlParseFailed {
            path: path.to_string(),
            source,
        })?;
    Ok(file.items)
}

/// 从 TOML 文件加载评审项目，保持文件中的顺序
pub async fn load_items_from_toml(
    toml_file_path: &Path,
) -> Result<Vec<EvaluationItem>, ItemLoadError> {
    let path = toml_file_path.display().to_string();

    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|source| ItemLoadError::ReadFailed {
            path: path.clone(),
            source,
        })?;

    let items = parse_items_toml(&content, &path)?;
    tracing::info!("成功加载 {} 个评审项目: {}", items.len(), path);

    Ok(items)
}
