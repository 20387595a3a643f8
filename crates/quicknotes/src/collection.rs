//! The persistence capability the flashcard store synchronizes against.
//!
//! A collection holds a user's notes somewhere other than process memory: a
//! document database behind an HTTP facade, a local `SQLite` cache, or a test
//! double. The store only ever talks to this trait, so backends are
//! interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::note::Note;

/// A user-scoped, async collection of notes.
///
/// # Errors
///
/// Every method reports failures as an [`Error`](crate::Error) for which
/// [`is_remote`](crate::Error::is_remote) holds. The store records whatever
/// a call returns in its `error` field.
#[async_trait]
pub trait NoteCollection: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// List the user's notes, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Note>>;

    /// Insert or replace a note by id, returning the persisted form.
    ///
    /// The returned note may carry an id assigned by the backend.
    async fn upsert(&self, user_id: &str, note: &Note) -> Result<Note>;

    /// Delete a note by id. Deleting an absent id succeeds.
    async fn delete(&self, user_id: &str, note_id: &str) -> Result<()>;
}
