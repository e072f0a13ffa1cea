use crate::key::StoreKey;
use async_trait::async_trait;
use dashmap::DashMap;
use pl_core::{Category, LearnedOptimization, LearnedStore, StoreError};

/// Process-local store, typically seeded from configuration.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<StoreKey, LearnedOptimization>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, category: Category, model: Option<&str>, learned: LearnedOptimization) {
        self.entries.insert(StoreKey::new(category, model), learned);
    }

    pub fn with_entry(
        self,
        category: Category,
        model: Option<&str>,
        learned: LearnedOptimization,
    ) -> Self {
        self.put(category, model, learned);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LearnedStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn lookup(
        &self,
        category: Category,
        model: Option<&str>,
    ) -> Result<LearnedOptimization, StoreError> {
        for key in StoreKey::lookup_chain(category, model) {
            if let Some(entry) = self.entries.get(&key) {
                return Ok(entry.value().clone());
            }
        }
        Ok(LearnedOptimization::empty())
    }
}
