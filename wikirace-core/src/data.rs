use crate::error::StoreError;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub type Result<T> = std::result::Result<T, StoreError>;

/// The persisted outbound links of one article, frozen at first expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionRecord {
    pub title: String,
    pub links: Vec<String>,
    /// Unix seconds.
    pub expanded_at: i64,
}

/// Durable title → links store. Records are insert-once.
pub trait EdgeStore {
    /// Stores `links` for `title` unless a record already exists.
    /// Returns `true` when this call created the record.
    fn write(&self, title: &str, links: &[String]) -> Result<bool>;

    fn read(&self, title: &str) -> Result<Option<ExpansionRecord>>;

    /// Every record, in insertion order.
    fn read_all(&self) -> Result<Vec<ExpansionRecord>>;
}

pub struct Database {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn row_to_record(title: String, links: String, expanded_at: i64) -> Result<ExpansionRecord> {
    Ok(ExpansionRecord {
        title,
        links: serde_json::from_str(&links)?,
        expanded_at,
    })
}

impl Database {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- One row per expanded article; never updated once written
            CREATE TABLE IF NOT EXISTS expansions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                links TEXT NOT NULL,          -- JSON array of link titles
                link_count INTEGER NOT NULL,
                expanded_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expansions_expanded_at ON expansions(expanded_at);
            ",
        )?;
        Ok(())
    }

    pub fn record_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM expansions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn persisted_edge_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(link_count), 0) FROM expansions",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Unix seconds of the most recent expansion, if any.
    pub fn last_expanded_at(&self) -> Result<Option<i64>> {
        let ts = self
            .conn
            .query_row("SELECT MAX(expanded_at) FROM expansions", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(ts)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl EdgeStore for Database {
    fn write(&self, title: &str, links: &[String]) -> Result<bool> {
        let encoded = serde_json::to_string(links)?;
        let inserted = self.conn.execute(
            "INSERT INTO expansions (title, links, link_count, expanded_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(title) DO NOTHING",
            params![title, encoded, links.len() as i64, current_timestamp()],
        )?;
        Ok(inserted > 0)
    }

    fn read(&self, title: &str) -> Result<Option<ExpansionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, links, expanded_at FROM expansions WHERE title = ?1")?;

        let row = stmt
            .query_row(params![title], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()?;

        row.map(|(title, links, expanded_at)| row_to_record(title, links, expanded_at))
            .transpose()
    }

    fn read_all(&self) -> Result<Vec<ExpansionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, links, expanded_at FROM expansions ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<(String, String, i64)>, _>>()?;

        rows.into_iter()
            .map(|(title, links, expanded_at)| row_to_record(title, links, expanded_at))
            .collect()
    }
}

impl<T: EdgeStore> EdgeStore for &T {
    fn write(&self, title: &str, links: &[String]) -> Result<bool> {
        (**self).write(title, links)
    }

    fn read(&self, title: &str) -> Result<Option<ExpansionRecord>> {
        (**self).read(title)
    }

    fn read_all(&self) -> Result<Vec<ExpansionRecord>> {
        (**self).read_all()
    }
}
