// src/session.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::AppError;

/// Per-student ephemeral key-value store.
///
/// The quiz flow keeps exactly one kind of entry here: the start timestamp of
/// an in-progress attempt, keyed `quiz_{id}_start_time`. The core logic only
/// ever goes through this trait, so the backing store is swappable.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, student_id: i64, key: &str) -> Result<Option<String>, AppError>;

    /// Inserts or overwrites the entry.
    async fn set(&self, student_id: i64, key: &str, value: &str) -> Result<(), AppError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, student_id: i64, key: &str) -> Result<(), AppError>;
}

/// Session entries persisted in the `session_entries` table.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, student_id: i64, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM session_entries WHERE student_id = $1 AND key = $2",
        )
        .bind(student_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set(&self, student_id: i64, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO session_entries (student_id, key, value) VALUES ($1, $2, $3)
             ON CONFLICT (student_id, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(student_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, student_id: i64, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session_entries WHERE student_id = $1 AND key = $2")
            .bind(student_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// In-memory store, used by tests.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<(i64, String), String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, student_id: i64, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(student_id, key.to_string())).cloned())
    }

    async fn set(&self, student_id: i64, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.insert((student_id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete(&self, student_id: i64, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.remove(&(student_id, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_overwrites_and_delete_clears() {
        let store = MemorySessionStore::new();

        store.set(1, "quiz_7_start_time", "a").await.unwrap();
        store.set(1, "quiz_7_start_time", "b").await.unwrap();
        assert_eq!(
            store.get(1, "quiz_7_start_time").await.unwrap(),
            Some("b".to_string())
        );

        store.delete(1, "quiz_7_start_time").await.unwrap();
        assert_eq!(store.get(1, "quiz_7_start_time").await.unwrap(), None);

        // Deleting again is a no-op.
        store.delete(1, "quiz_7_start_time").await.unwrap();
    }

    #[tokio::test]
    async fn entries_are_scoped_per_student() {
        let store = MemorySessionStore::new();

        store.set(1, "quiz_7_start_time", "a").await.unwrap();
        assert_eq!(store.get(2, "quiz_7_start_time").await.unwrap(), None);
    }
}
