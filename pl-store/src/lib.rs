//! Learned-store backends for PromptLight.
//!
//! Backends are opaque key-value stores keyed by (category, model). A lookup
//! tries the exact model first and falls back to the category-wide entry.

mod key;
mod memory;
mod sqlite;

pub use key::StoreKey;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
