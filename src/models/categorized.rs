//! 按大分类分组后的评审项目
//!
//! 分组的 key 在运行时才确定，迭代顺序即插入（发现）顺序，
//! 下游结果的顺序依赖于此，所以不做排序。

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::EvaluationItem;

/// 单个大分类及其项目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<EvaluationItem>,
}

/// 大分类 → 项目列表，保持插入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedGroups {
    groups: Vec<CategoryGroup>,
}

/// 规范化大分类名称：去掉首尾空白，大小写保持不变
pub fn normalize_category(category: &str) -> &str {
    category.trim()
}

impl CategorizedGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按项目自身的大分类字段分组
    pub fn group_by_category(items: &[EvaluationItem]) -> Self {
        let mut groups = Self::new();
        for item in items {
            groups.insert(item.category.clone(), vec![item.clone()]);
        }
        groups
    }

    /// 追加项目到某个大分类
    ///
    /// 规范化后相同的 key 会合并，保留第一次出现的位置
    pub fn insert(&mut self, category: impl Into<String>, items: Vec<EvaluationItem>) {
        let category = category.into();
        let key = normalize_category(&category);

        match self.groups.iter_mut().find(|g| g.category == key) {
            Some(group) => group.items.extend(items),
            None => self.groups.push(CategoryGroup {
                category: key.to_string(),
                items,
            }),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[EvaluationItem]> {
        let key = normalize_category(category);
        self.groups
            .iter()
            .find(|g| g.category == key)
            .map(|g| g.items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.iter()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.category.as_str()).collect()
    }

    /// 大分类数量
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 所有分类下的项目总数
    pub fn total_items(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// 检查是否是 `items` 按大分类的严格划分
    ///
    /// 每个输入项目恰好出现一次，且位于自身大分类对应的组中
    pub fn is_partition_of(&self, items: &[EvaluationItem]) -> bool {
        let mut remaining: HashMap<&EvaluationItem, usize> = HashMap::new();
        for item in items {
            *remaining.entry(item).or_default() += 1;
        }

        for group in &self.groups {
            for item in &group.items {
                if normalize_category(&item.category) != group.category {
                    return false;
                }
                match remaining.get_mut(item) {
                    Some(count) if *count > 0 => *count -= 1,
                    _ => return false,
                }
            }
        }

        remaining.values().all(|&count| count == 0)
    }
}

impl Serialize for CategorizedGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(&group.category, &group.items)?;
        }
        map.end()
    }
}
