use crate::ports::snapshot_store::{Result, SnapshotStore as SnapshotStoreTrait};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

/// PostgreSQL implementation of SnapshotStore
///
/// Each key maps to one row of the `snapshots` table holding the whole
/// collection as JSONB. Writes replace the previous value (last-writer-wins).
pub struct SnapshotStore {
    pool: PgPool,
}

impl SnapshotStore {
    /// Create a new SnapshotStore with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStoreTrait for SnapshotStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let value: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT value
            FROM snapshots
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// Upsert all entries inside a single transaction
    ///
    /// Either every snapshot is replaced or none is.
    async fn save_many(&self, entries: Vec<(&'static str, Value)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO snapshots (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM snapshots WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
