use pl_core::Category;

/// Lookup key: category plus an optional, case-folded model name. A `None`
/// model addresses the category-wide entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub category: Category,
    pub model: Option<String>,
}

impl StoreKey {
    pub fn new(category: Category, model: Option<&str>) -> Self {
        Self {
            category,
            model: normalize_model(model),
        }
    }

    pub fn category_wide(category: Category) -> Self {
        Self {
            category,
            model: None,
        }
    }

    /// Keys to try in order: exact model, then category-wide.
    pub fn lookup_chain(category: Category, model: Option<&str>) -> Vec<StoreKey> {
        let exact = Self::new(category, model);
        if exact.model.is_none() {
            return vec![exact];
        }
        vec![exact, Self::category_wide(category)]
    }

    /// Column value used by the sqlite backend; empty means category-wide.
    pub(crate) fn model_column(&self) -> &str {
        self.model.as_deref().unwrap_or("")
    }
}

fn normalize_model(model: Option<&str>) -> Option<String> {
    model
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.to_ascii_lowercase())
}
