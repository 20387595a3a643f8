//! The note record shared by the store, the collections and the CLI.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Last identifier handed out by [`next_note_id`].
static LAST_ISSUED_ID: AtomicI64 = AtomicI64::new(0);

/// A single flashcard.
///
/// Serialized with camelCase field names, matching the records exchanged
/// with the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Identifier, unique within one user's collection.
    ///
    /// Either time-based (assigned by the client) or assigned by the
    /// remote collection, depending on the configured id policy.
    #[serde(alias = "_id")]
    pub id: String,

    /// Display title. Never empty.
    pub title: String,

    /// Card body. May be empty.
    #[serde(default)]
    pub content: String,

    /// Creation time in epoch milliseconds; the only sort key.
    pub created_at: i64,
}

impl Note {
    /// Create a note stamped with the current time and a fresh time-based id.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let created_at = Utc::now().timestamp_millis();
        Self {
            id: next_note_id(created_at),
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Create a note with every field supplied by the caller.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Check the fields a note needs before it may enter the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the id or the title is blank.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("note id must not be empty"));
        }
        if self.title.trim().is_empty() {
            return Err(Error::validation("note title must not be empty"));
        }
        Ok(())
    }

    /// Hash of the user-visible fields, used to skip redundant cache writes.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.title.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.content.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Produce a time-based note id.
///
/// The id is the decimal millisecond timestamp, bumped past the last id
/// issued in this process so two notes created within the same millisecond
/// never collide.
#[must_use]
pub fn next_note_id(now_millis: i64) -> String {
    let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now_millis.max(last + 1);
        match LAST_ISSUED_ID.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate.to_string(),
            Err(observed) => last = observed,
        }
    }
}

/// Sort notes newest first. Stable, so equal timestamps keep their order.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
