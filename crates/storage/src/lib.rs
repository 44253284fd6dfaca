use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub const MEMORY_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub kind: String,
    pub user_input: String,
    pub response: Value,
}

impl InteractionRecord {
    pub fn new(kind: impl Into<String>, user_input: impl Into<String>, response: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            kind: kind.into(),
            user_input: user_input.into(),
            response,
        }
    }
}

pub trait ContextRepository: Send + Sync {
    async fn get_context(&self, key: &str) -> Result<Option<Value>>;
    async fn update_context(&self, key: &str, value: &Value) -> Result<()>;
    async fn add_interaction(&self, record: &InteractionRecord) -> Result<()>;
    /// Newest first.
    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    context: Arc<RwLock<HashMap<String, Value>>>,
    history: Arc<RwLock<VecDeque<InteractionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextRepository for MemoryStore {
    async fn get_context(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.context.read().get(key).cloned())
    }

    async fn update_context(&self, key: &str, value: &Value) -> Result<()> {
        self.context.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn add_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let mut history = self.history.write();
        history.push_back(record.clone());
        while history.len() > MEMORY_HISTORY_LIMIT {
            history.pop_front();
        }
        Ok(())
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        Ok(self.history.read().iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trip_context (
              context_key TEXT PRIMARY KEY,
              value_json TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              at TEXT NOT NULL,
              kind TEXT NOT NULL,
              user_input TEXT NOT NULL,
              response_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ContextRepository for SqliteStore {
    async fn get_context(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value_json FROM trip_context WHERE context_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value_json: String = row.get("value_json");
        let value = serde_json::from_str(&value_json)
            .with_context(|| format!("corrupt context value for key {key}"))?;
        Ok(Some(value))
    }

    async fn update_context(&self, key: &str, value: &Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trip_context (context_key, value_json, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(context_key) DO UPDATE SET
              value_json=excluded.value_json,
              updated_at=excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_interaction(&self, record: &InteractionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO interactions (id, at, kind, user_input, response_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.at.to_rfc3339())
        .bind(&record.kind)
        .bind(&record.user_input)
        .bind(serde_json::to_string(&record.response)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, at, kind, user_input, response_json
            FROM interactions
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<InteractionRecord> {
                let response_json: String = row.get("response_json");
                Ok(InteractionRecord {
                    id: row
                        .get::<String, _>("id")
                        .parse()
                        .context("interaction id is not a uuid")?,
                    at: row
                        .get::<String, _>("at")
                        .parse()
                        .unwrap_or_else(|_| Utc::now()),
                    kind: row.get("kind"),
                    user_input: row.get("user_input"),
                    response: serde_json::from_str(&response_json).unwrap_or(Value::Null),
                })
            })
            .collect()
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    /// SQLite when a database URL is given, memory otherwise.
    pub async fn from_database_url(database_url: Option<&str>) -> Result<Self> {
        match database_url {
            Some(url) => Self::sqlite(url).await,
            None => Ok(Self::memory()),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl ContextRepository for Store {
    async fn get_context(&self, key: &str) -> Result<Option<Value>> {
        match self {
            Store::Memory(store) => store.get_context(key).await,
            Store::Sqlite(store) => store.get_context(key).await,
        }
    }

    async fn update_context(&self, key: &str, value: &Value) -> Result<()> {
        match self {
            Store::Memory(store) => store.update_context(key, value).await,
            Store::Sqlite(store) => store.update_context(key, value).await,
        }
    }

    async fn add_interaction(&self, record: &InteractionRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.add_interaction(record).await,
            Store::Sqlite(store) => store.add_interaction(record).await,
        }
    }

    async fn recent_interactions(&self, limit: usize) -> Result<Vec<InteractionRecord>> {
        match self {
            Store::Memory(store) => store.recent_interactions(limit).await,
            Store::Sqlite(store) => store.recent_interactions(limit).await,
        }
    }
}
