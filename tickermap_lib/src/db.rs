//! SQLite-backed Mapping Store.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::store::{MappingEntry, MappingStore, MatchType};

const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("ticker {0} is already mapped")]
    DuplicateTicker(String),
    #[error("unknown match type: {0}")]
    UnknownMatchType(String),
}

pub struct Db {
    conn: Connection,
}

impl Db {
    /// Open (or create) a database file. `synchronous = FULL` so each
    /// committed mapping survives power loss, not just process crashes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM run_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO run_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn count_mappings(&self) -> Result<i64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM mappings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete every mapping. Used for explicit fresh re-runs.
    pub fn clear_mappings(&self) -> Result<usize, DbError> {
        let removed = self.conn.execute("DELETE FROM mappings", [])?;
        Ok(removed)
    }

    /// Insert mappings whose ticker is not already present, in one
    /// transaction. Returns how many were inserted.
    pub fn import_mappings(&mut self, entries: &[MappingEntry]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO mappings (ticker, company_id, match_type, score, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in entries {
                inserted += stmt.execute(params![
                    entry.ticker,
                    entry.company_id,
                    entry.match_type.as_str(),
                    entry.score,
                    entry.created_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, f64, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn build_entry(raw: (String, String, String, f64, String)) -> Result<MappingEntry, DbError> {
        let (ticker, company_id, match_type, score, created_at) = raw;
        Ok(MappingEntry {
            ticker,
            company_id,
            match_type: match_type.parse()?,
            score,
            created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
        })
    }
}

impl MappingStore for Db {
    fn get(&self, ticker: &str) -> Result<Option<MappingEntry>, DbError> {
        let raw = self
            .conn
            .query_row(
                "SELECT ticker, company_id, match_type, score, created_at
                 FROM mappings WHERE ticker = ?1",
                params![ticker],
                Self::row_to_entry,
            )
            .optional()?;
        raw.map(Self::build_entry).transpose()
    }

    fn put(&mut self, entry: MappingEntry) -> Result<(), DbError> {
        let result = self.conn.execute(
            "INSERT INTO mappings (ticker, company_id, match_type, score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.ticker,
                entry.company_id,
                entry.match_type.as_str(),
                entry.score,
                entry.created_at.to_rfc3339(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(DbError::DuplicateTicker(entry.ticker))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn owners_of(&self, company_id: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT ticker FROM mappings WHERE company_id = ?1 ORDER BY created_at, ticker",
        )?;
        let owners = stmt
            .query_map(params![company_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    fn persist(&mut self) -> Result<(), DbError> {
        // Autocommit writes are already durable; fold the WAL back in.
        self.conn
            .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<MappingEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT ticker, company_id, match_type, score, created_at
             FROM mappings ORDER BY ticker",
        )?;
        let raw = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(Self::build_entry).collect()
    }
}
