//! Local note cache.
//!
//! A `SQLite`-backed [`NoteCollection`] that keeps the last known copy of
//! each user's notes on disk, so the list survives restarts and shows before
//! the first remote round trip completes.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::collection::NoteCollection;
use crate::error::{Error, Result};
use crate::note::Note;

/// `SQLite` note cache.
///
/// The connection sits behind a mutex so the cache can be shared with the
/// store as an `Arc<dyn NoteCollection>`. The lock is never held across an
/// await point.
#[derive(Debug)]
pub struct LocalCache {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl LocalCache {
    /// Open or create a cache database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening note cache at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Note cache opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("note cache connection lock poisoned"))
    }

    /// List a user's cached notes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, title, content, created_at
            FROM notes WHERE user_id = ?1
            ORDER BY created_at DESC, seq DESC
            ",
        )?;

        let notes = stmt
            .query_map([user_id], Self::row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Insert or update a note.
    ///
    /// Returns `false` when an identical copy was already cached and the
    /// write was skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_note(&self, user_id: &str, note: &Note) -> Result<bool> {
        let conn = self.conn()?;
        let hash = note.content_hash();

        let existing: Option<(String, i64)> = conn
            .query_row(
                "SELECT content_hash, created_at FROM notes WHERE user_id = ?1 AND id = ?2",
                params![user_id, note.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if existing.is_some_and(|(stored_hash, created_at)| {
            stored_hash == hash && created_at == note.created_at
        }) {
            debug!("Skipping unchanged cached note {}", note.id);
            return Ok(false);
        }

        conn.execute(
            r"
            INSERT INTO notes (user_id, id, title, content, created_at, content_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                created_at = excluded.created_at,
                content_hash = excluded.content_hash
            ",
            params![
                user_id,
                note.id,
                note.title,
                note.content,
                note.created_at,
                hash
            ],
        )?;

        debug!("Cached note {}", note.id);
        Ok(true)
    }

    /// Delete a cached note.
    ///
    /// Returns `true` if a note was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_note(&self, user_id: &str, note_id: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM notes WHERE user_id = ?1 AND id = ?2",
            params![user_id, note_id],
        )?;
        Ok(affected > 0)
    }

    /// Count a user's cached notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, user_id: &str) -> Result<i64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM notes WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get cache statistics for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, user_id: &str) -> Result<CacheStats> {
        let cached_notes = self.count(user_id)?;

        let newest_created_at: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT MAX(created_at) FROM notes WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(CacheStats {
            cached_notes,
            newest_created_at,
            db_size_bytes,
        })
    }

    fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

#[async_trait]
impl NoteCollection for LocalCache {
    fn name(&self) -> &'static str {
        "local cache"
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Note>> {
        self.list_notes(user_id)
    }

    async fn upsert(&self, user_id: &str, note: &Note) -> Result<Note> {
        self.upsert_note(user_id, note)?;
        Ok(note.clone())
    }

    async fn delete(&self, user_id: &str, note_id: &str) -> Result<()> {
        self.delete_note(user_id, note_id)?;
        Ok(())
    }
}

/// Statistics about the cache for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of notes cached for the user.
    pub cached_notes: i64,
    /// Creation time of the newest cached note, in epoch milliseconds.
    pub newest_created_at: Option<i64>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
