pub mod categorized;
pub mod evaluation_item;
pub mod loaders;
pub mod work;

pub use categorized::{normalize_category, CategorizedGroups, CategoryGroup};
pub use evaluation_item::EvaluationItem;
pub use loaders::load_items_from_toml;
pub use work::{ExecutionResult, WorkUnit, Worker};
