use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::schema::Database;

impl Database {
    // ========================================================================
    // Key-Value Operations
    // ========================================================================

    /// Get a stored value, or `None` if the key is absent.
    ///
    /// A present-but-unparsable blob is treated the same as an absent one:
    /// the corruption is logged and swallowed, never surfaced. Only a genuine
    /// database error propagates.
    pub async fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some((raw,)) = row else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Stored value is corrupt, falling back");
                Ok(None)
            }
        }
    }

    /// Get a stored value, or `fallback` if the key is absent or the stored
    /// blob is unparsable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> Result<T> {
        Ok(self.get_opt(key).await?.unwrap_or(fallback))
    }

    /// Store a value under `key`, replacing whatever was there (UPSERT).
    ///
    /// Writes are whole-value overwrites; there is no partial-write state to
    /// recover from.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(&raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a key. No-op if the key does not exist.
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Raw stored blob for a key, bypassing deserialization. Test support.
    #[cfg(test)]
    pub(crate) async fn raw_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }
}
