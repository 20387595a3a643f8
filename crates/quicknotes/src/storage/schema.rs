//! `SQLite` schema definitions for the local note cache.

/// SQL statement to create the notes table.
///
/// `seq` preserves insertion order so notes sharing a timestamp list in a
/// stable order.
pub const CREATE_NOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    UNIQUE (user_id, id)
)
";

/// SQL statement to create an index for newest-first listing per user.
pub const CREATE_USER_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notes_user_created ON notes(user_id, created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_NOTES_TABLE,
    CREATE_USER_CREATED_INDEX,
    CREATE_METADATA_TABLE,
];
