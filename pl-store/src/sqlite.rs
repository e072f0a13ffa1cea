use crate::key::StoreKey;
use async_trait::async_trait;
use pl_core::{Category, LearnedOptimization, LearnedStore, StoreError};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS learned_optimizations (
  category TEXT NOT NULL,
  model TEXT NOT NULL DEFAULT '',
  keywords TEXT NOT NULL,
  patterns TEXT NOT NULL,
  confidence REAL NOT NULL,
  updated_at TEXT NOT NULL DEFAULT (datetime('now')),
  PRIMARY KEY (category, model)
)
"#;

/// File-backed store. Each call opens its own connection on the blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Backend("sqlite path is required".to_string()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let store = Self { path };
        store
            .blocking(|conn| conn.execute_batch(SCHEMA).map_err(backend))
            .await?;
        tracing::info!(path = %store.path.display(), "learned store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn put(
        &self,
        category: Category,
        model: Option<&str>,
        learned: &LearnedOptimization,
    ) -> Result<(), StoreError> {
        let key = StoreKey::new(category, model);
        let keywords = serde_json::to_string(&learned.learned_keywords)?;
        let patterns = serde_json::to_string(&learned.learned_patterns)?;
        let confidence = learned.confidence;
        self.blocking(move |conn| {
            conn.execute(
                r#"
INSERT INTO learned_optimizations (category, model, keywords, patterns, confidence, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
ON CONFLICT (category, model) DO UPDATE SET
  keywords = excluded.keywords,
  patterns = excluded.patterns,
  confidence = excluded.confidence,
  updated_at = excluded.updated_at
"#,
                params![
                    key.category.as_str(),
                    key.model_column(),
                    keywords,
                    patterns,
                    confidence
                ],
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
    }

    /// Exact-key read without the category-wide fallback.
    pub async fn get(
        &self,
        category: Category,
        model: Option<&str>,
    ) -> Result<Option<LearnedOptimization>, StoreError> {
        let key = StoreKey::new(category, model);
        self.blocking(move |conn| read_entry(conn, &key)).await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path).map_err(backend)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("sqlite task failed: {e}")))?
    }
}

#[async_trait]
impl LearnedStore for SqliteStore {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn lookup(
        &self,
        category: Category,
        model: Option<&str>,
    ) -> Result<LearnedOptimization, StoreError> {
        let chain = StoreKey::lookup_chain(category, model);
        self.blocking(move |conn| {
            for key in &chain {
                if let Some(learned) = read_entry(conn, key)? {
                    return Ok(learned);
                }
            }
            Ok(LearnedOptimization::empty())
        })
        .await
    }
}

fn read_entry(
    conn: &Connection,
    key: &StoreKey,
) -> Result<Option<LearnedOptimization>, StoreError> {
    let row = conn
        .prepare_cached(
            r#"
SELECT keywords, patterns, confidence
FROM learned_optimizations
WHERE category = ?1 AND model = ?2
"#,
        )
        .map_err(backend)?
        .query_row(params![key.category.as_str(), key.model_column()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })
        .optional()
        .map_err(backend)?;

    let Some((keywords, patterns, confidence)) = row else {
        return Ok(None);
    };
    Ok(Some(LearnedOptimization {
        learned_keywords: serde_json::from_str(&keywords)?,
        learned_patterns: serde_json::from_str(&patterns)?,
        confidence,
    }))
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}
