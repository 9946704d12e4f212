//! Key/value helpers over the `client_store` table.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::StorageError;

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    pub(crate) async fn put_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            r"
                INSERT INTO client_store (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    pub(crate) async fn get_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let row = sqlx::query("SELECT value FROM client_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row
            .try_get("value")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Read and delete a key inside one transaction.
    pub(crate) async fn take_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let row = sqlx::query("SELECT value FROM client_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(conn)?;
            return Ok(None);
        };
        let raw: String = row
            .try_get("value")
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        sqlx::query("DELETE FROM client_store WHERE key = ?1")
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        tx.commit().await.map_err(conn)?;

        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub(crate) async fn delete_key(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM client_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
