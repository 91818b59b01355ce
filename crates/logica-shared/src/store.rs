//! Translation history storage.
//!
//! Append-only: records are inserted after a successful translation and
//! read back per user, newest first. Nothing here updates or deletes.

use crate::error::StoreError;
use crate::translation::{NewTranslation, PropositionMap, TranslationMode, TranslationRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Persist one translation and return its id
    async fn save(&self, entry: NewTranslation) -> Result<i64, StoreError>;

    /// Up to `limit` records for `user_id`, most recent first
    async fn list_by_user(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<TranslationRecord>, StoreError>;
}

/// Database location
#[derive(Debug, Clone)]
pub enum DbLocation {
    File(PathBuf),
    /// In-memory database, used by tests
    Memory,
}

/// SQLite-backed store (single connection behind a mutex)
pub struct SqliteTranslationStore {
    conn: Arc<Mutex<Connection>>,
    location: DbLocation,
}

impl SqliteTranslationStore {
    /// Open or create the database and its schema
    pub async fn open(location: DbLocation) -> Result<Self, StoreError> {
        if let DbLocation::File(path) = &location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            info!("Opening translation database at: {}", path.display());
        }

        let loc = location.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = match &loc {
                DbLocation::File(path) => {
                    let conn = Connection::open(path)?;
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                    conn.pragma_update(None, "synchronous", "NORMAL")?;
                    conn
                }
                DbLocation::Memory => Connection::open_in_memory()?,
            };
            init_schema(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(DbLocation::Memory).await
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    /// Total number of stored translations
    pub async fn count(&self) -> Result<usize, StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            let conn = conn.blocking_lock();
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            mode TEXT NOT NULL CHECK (mode IN ('nl_to_cpc', 'cpc_to_nl')),
            input TEXT NOT NULL,
            output TEXT NOT NULL,
            propositions TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_translations_user_created
         ON translations(user_id, created_at)",
        [],
    )?;

    Ok(())
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

#[derive(Debug, thiserror::Error)]
#[error("unknown translation mode '{0}'")]
struct UnknownMode(String);

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranslationRecord> {
    let mode: String = row.get(2)?;
    let mode = TranslationMode::parse(&mode).ok_or_else(|| conversion_error(2, UnknownMode(mode)))?;

    let propositions: Option<String> = row.get(5)?;
    let propositions = propositions
        .map(|json| serde_json::from_str::<PropositionMap>(&json))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;

    let created_at: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| conversion_error(6, e))?
        .with_timezone(&Utc);

    Ok(TranslationRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mode,
        input: row.get(3)?,
        output: row.get(4)?,
        propositions,
        created_at,
    })
}

#[async_trait]
impl TranslationStore for SqliteTranslationStore {
    async fn save(&self, entry: NewTranslation) -> Result<i64, StoreError> {
        let propositions = entry
            .propositions
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let conn = Arc::clone(&self.conn);

        let id = tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO translations (user_id, mode, input, output, propositions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.user_id,
                    entry.mode.as_str(),
                    entry.input,
                    entry.output,
                    propositions,
                    created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        debug!("Saved translation {}", id);
        Ok(id)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> Result<Vec<TranslationRecord>, StoreError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                r#"
                SELECT id, user_id, mode, input, output, propositions, created_at
                FROM translations
                WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
                "#,
            )?;

            let rows = stmt.query_map(params![user_id, limit], record_from_row)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
