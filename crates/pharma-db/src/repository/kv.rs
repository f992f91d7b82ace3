//! # Document Repository
//!
//! A key→JSON document store on top of the `kv_store` table.
//!
//! ## Batches
//! ```text
//! save_batch([("drugs", …), ("sales", …)])
//!
//!   BEGIN
//!     UPSERT drugs      ← written in the order given
//!     UPSERT sales
//!   COMMIT              ← both or neither
//! ```
//!
//! Callers still pass keys in a deliberate order so a backend without
//! multi-key transactions would fail in the safer direction.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

const UPSERT_SQL: &str = r#"
    INSERT INTO kv_store (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

/// Repository for JSON documents.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Loads the raw document stored under `key`.
    pub async fn load(&self, key: &str) -> DbResult<Option<Value>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        raw.map(|text| serde_json::from_str(&text).map_err(|e| DbError::serialization(key, e)))
            .transpose()
    }

    /// Loads and decodes the document stored under `key`.
    pub async fn load_as<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.load(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| DbError::serialization(key, e)),
            None => Ok(None),
        }
    }

    /// Stores one document, replacing any previous value.
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let text = serde_json::to_string(value).map_err(|e| DbError::serialization(key, e))?;

        sqlx::query(UPSERT_SQL)
            .bind(key)
            .bind(&text)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(key = %key, bytes = text.len(), "Document saved");
        Ok(())
    }

    /// Stores several documents in one transaction, in the given order.
    pub async fn save_batch(&self, documents: &[(&str, Value)]) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (key, value) in documents {
            let text = serde_json::to_string(value).map_err(|e| DbError::serialization(*key, e))?;
            sqlx::query(UPSERT_SQL)
                .bind(*key)
                .bind(text)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(documents = documents.len(), "Document batch committed");
        Ok(())
    }

    /// Removes a document. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lists stored keys in alphabetical order.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, StoreConfig};
    use serde_json::json;

    async fn repo() -> DocumentRepository {
        Database::new(StoreConfig::in_memory()).await.unwrap().documents()
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let repo = repo().await;
        assert_eq!(repo.load("drugs").await.unwrap(), None);
        assert!(!repo.remove("drugs").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_replaces_value() {
        let repo = repo().await;
        repo.save("drugs", &json!([{"id": "a"}])).await.unwrap();
        repo.save("drugs", &json!([])).await.unwrap();

        assert_eq!(repo.load("drugs").await.unwrap(), Some(json!([])));
        assert_eq!(repo.keys().await.unwrap(), vec!["drugs"]);
    }

    #[tokio::test]
    async fn test_batch_writes_all_keys() {
        let repo = repo().await;
        repo.save_batch(&[("drugs", json!([1])), ("sales", json!([2]))])
            .await
            .unwrap();

        let sales: Option<Vec<i64>> = repo.load_as("sales").await.unwrap();
        assert_eq!(sales, Some(vec![2]));
        assert_eq!(repo.keys().await.unwrap(), vec!["drugs", "sales"]);
    }

    #[tokio::test]
    async fn test_corrupt_document_reported() {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO kv_store (key, value, updated_at) VALUES ('drugs', 'not json', '')")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.documents().load("drugs").await.unwrap_err();
        assert!(matches!(err, DbError::Serialization { .. }));
    }
}
