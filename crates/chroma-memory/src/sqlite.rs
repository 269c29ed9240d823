//! SQLite-backed episode store.
//!
//! Holds the same episodes as [`EpisodeStore`] in a local SQLite database and
//! answers the same two time-ordered query shapes through [`EpisodeIndex`],
//! so the retrieval engine can run unchanged against either backend.
//!
//! # Storage layout
//!
//! A single table `episodes` is created (if it does not already exist) with
//! an index on `label`:
//!
//! | column    | type    | description                          |
//! |-----------|---------|--------------------------------------|
//! | timestamp | INTEGER | Stream position, primary key         |
//! | label     | TEXT    | Semantic label at recording time     |
//! | r         | INTEGER | Red channel `0..=255`                |
//! | g         | INTEGER | Green channel `0..=255`              |
//! | b         | INTEGER | Blue channel `0..=255`               |
//!
//! # Example
//!
//! ```rust
//! use chroma_memory::sqlite::SqliteEpisodeStore;
//! use chroma_types::{Color, Episode};
//!
//! let store = SqliteEpisodeStore::open_in_memory().unwrap();
//! store.store(&Episode { timestamp: 0, color: Color::new(255, 0, 0), label: "red".into() }).unwrap();
//!
//! let reds = store.query_by_label("red").unwrap();
//! assert_eq!(reds[0].color, Color::new(255, 0, 0));
//! ```

use std::path::Path;

use chroma_types::{Color, Episode};
use rusqlite::{Connection, Row, params};

use crate::episodic::{EpisodeIndex, EpisodeStore, EpisodicError};

const SELECT_ALL: &str = "SELECT timestamp, label, r, g, b FROM episodes ORDER BY timestamp ASC";
const SELECT_BY_LABEL: &str =
    "SELECT timestamp, label, r, g, b FROM episodes WHERE label = ?1 ORDER BY timestamp ASC";

/// SQLite-backed episode store.
pub struct SqliteEpisodeStore {
    conn: Connection,
}

impl SqliteEpisodeStore {
    /// Open (or create) a database file at `path`.
    pub fn open(path: &Path) -> Result<Self, EpisodicError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a temporary in-memory database.
    pub fn open_in_memory() -> Result<Self, EpisodicError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Copy every episode of an in-memory store into a fresh in-memory
    /// database.
    pub fn from_store(source: &EpisodeStore) -> Result<Self, EpisodicError> {
        let mut store = Self::open_in_memory()?;
        store.store_all(source.query_all())?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), EpisodicError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS episodes (
                timestamp INTEGER NOT NULL PRIMARY KEY,
                label     TEXT    NOT NULL,
                r         INTEGER NOT NULL,
                g         INTEGER NOT NULL,
                b         INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS episodes_by_label ON episodes (label, timestamp);",
        )?;
        Ok(())
    }

    /// Insert one episode.
    ///
    /// Returns [`EpisodicError::NonMonotonic`] if the timestamp is not after
    /// the latest stored one.
    pub fn store(&self, episode: &Episode) -> Result<(), EpisodicError> {
        let next = self.next_timestamp()?;
        if episode.timestamp < next {
            return Err(EpisodicError::NonMonotonic { start: episode.timestamp, next });
        }
        insert(&self.conn, episode)?;
        Ok(())
    }

    /// Insert many episodes in one transaction.
    pub fn store_all(&mut self, episodes: &[Episode]) -> Result<(), EpisodicError> {
        let mut next = self.next_timestamp()?;
        let tx = self.conn.transaction()?;
        for episode in episodes {
            if episode.timestamp < next {
                return Err(EpisodicError::NonMonotonic { start: episode.timestamp, next });
            }
            insert(&tx, episode)?;
            next = episode.timestamp + 1;
        }
        tx.commit()?;
        Ok(())
    }

    /// Every episode, oldest first.
    pub fn query_all(&self) -> Result<Vec<Episode>, EpisodicError> {
        let mut episodes = Vec::new();
        self.scan_all(&mut |e| episodes.push(e.clone()))?;
        Ok(episodes)
    }

    /// Episodes labelled exactly `label`, oldest first.
    pub fn query_by_label(&self, label: &str) -> Result<Vec<Episode>, EpisodicError> {
        let mut episodes = Vec::new();
        self.scan_label(label, &mut |e| episodes.push(e.clone()))?;
        Ok(episodes)
    }

    /// Number of stored episodes.
    pub fn len(&self) -> Result<usize, EpisodicError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM episodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, EpisodicError> {
        Ok(self.len()? == 0)
    }

    fn next_timestamp(&self) -> Result<u64, EpisodicError> {
        let last: Option<i64> = self
            .conn
            .query_row("SELECT MAX(timestamp) FROM episodes", [], |row| row.get(0))?;
        Ok(last.map_or(0, |t| t as u64 + 1))
    }
}

impl EpisodeIndex for SqliteEpisodeStore {
    fn scan_all(&self, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError> {
        let mut stmt = self.conn.prepare_cached(SELECT_ALL)?;
        let rows = stmt.query_map([], row_to_episode)?;
        for row in rows {
            visit(&row?);
        }
        Ok(())
    }

    fn scan_label(&self, label: &str, visit: &mut dyn FnMut(&Episode)) -> Result<(), EpisodicError> {
        let mut stmt = self.conn.prepare_cached(SELECT_BY_LABEL)?;
        let rows = stmt.query_map([label], row_to_episode)?;
        for row in rows {
            visit(&row?);
        }
        Ok(())
    }
}

fn insert(conn: &Connection, episode: &Episode) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO episodes (timestamp, label, r, g, b) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            episode.timestamp as i64,
            episode.label,
            episode.color.r,
            episode.color.g,
            episode.color.b,
        ],
    )
}

fn row_to_episode(row: &Row<'_>) -> rusqlite::Result<Episode> {
    let timestamp: i64 = row.get(0)?;
    Ok(Episode {
        timestamp: timestamp as u64,
        label: row.get(1)?,
        color: Color::new(row.get(2)?, row.get(3)?, row.get(4)?),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
