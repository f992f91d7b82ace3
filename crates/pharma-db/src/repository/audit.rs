//! # Audit Repository
//!
//! Append-only event log. Rows are never updated; the only delete is the
//! bulk wipe in [`AuditRepository::clear`].

use pharma_core::AuditEvent;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

/// Repository for the `audit_log` table.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends one event.
    pub async fn record(&self, event: &AuditEvent) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (action, details, actor, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&event.action)
        .bind(&event.details)
        .bind(&event.user)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;

        debug!(action = %event.action, actor = %event.user, "Audit event recorded");
        Ok(())
    }

    /// All events in insertion order.
    pub async fn list(&self) -> DbResult<Vec<AuditEvent>> {
        let events = sqlx::query_as::<_, AuditEvent>(
            "SELECT action, details, actor, timestamp FROM audit_log ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    /// Events with the given action, in insertion order.
    pub async fn list_by_action(&self, action: &str) -> DbResult<Vec<AuditEvent>> {
        let events = sqlx::query_as::<_, AuditEvent>(
            "SELECT action, details, actor, timestamp FROM audit_log WHERE action = ?1 ORDER BY id",
        )
        .bind(action)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Deletes every event. Returns the number removed.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM audit_log")
            .execute(&self.pool)
            .await?;

        info!(removed = result.rows_affected(), "Audit log cleared");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, StoreConfig};
    use chrono::Utc;

    fn event(action: &str, details: &str) -> AuditEvent {
        AuditEvent {
            action: action.to_string(),
            details: details.to_string(),
            timestamp: Utc::now(),
            user: "system".to_string(),
        }
    }

    #[tokio::test]
    async fn test_record_list_clear() {
        let db = Database::new(StoreConfig::in_memory()).await.unwrap();
        let audit = db.audit();

        audit.record(&event("sale", "first")).await.unwrap();
        audit.record(&event("delete_sale", "second")).await.unwrap();
        audit.record(&event("sale", "third")).await.unwrap();

        let events = audit.list().await.unwrap();
        let details: Vec<_> = events.iter().map(|e| e.details.as_str()).collect();
        assert_eq!(details, vec!["first", "second", "third"]);
        assert_eq!(events[0].user, "system");

        assert_eq!(audit.list_by_action("sale").await.unwrap().len(), 2);
        assert_eq!(audit.count().await.unwrap(), 3);

        assert_eq!(audit.clear().await.unwrap(), 3);
        assert!(audit.list().await.unwrap().is_empty());
    }
}
