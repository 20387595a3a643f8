//! A signed-in user's view of the store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Config, RemoteBackend};
use crate::error::{Error, Result};
use crate::note::Note;
use crate::remote::HttpCollection;
use crate::storage::LocalCache;
use crate::store::{FlashcardStore, StoreState};
use crate::summarizer::Summarizer;

/// Supplies the identity of the current user.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user's stable identifier, or `None` when signed out.
    fn user_id(&self) -> Option<String>;
}

/// An identity fixed at construction, e.g. from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(String);

impl StaticIdentity {
    /// Wrap a user identifier.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(user_id.into())
    }
}

impl IdentityProvider for StaticIdentity {
    fn user_id(&self) -> Option<String> {
        Some(self.0.clone()).filter(|id| !id.trim().is_empty())
    }
}

/// Binds one user to a [`FlashcardStore`].
#[derive(Debug)]
pub struct Session {
    user_id: String,
    store: Arc<FlashcardStore>,
}

impl Session {
    /// Start a session for whoever `identity` reports.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when no user is signed in.
    pub fn open(identity: &dyn IdentityProvider, store: Arc<FlashcardStore>) -> Result<Self> {
        let user_id = identity
            .user_id()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::validation("no user is signed in"))?;
        info!("Session opened for {}", user_id);
        Ok(Self { user_id, store })
    }

    /// The session's user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &FlashcardStore {
        &self.store
    }

    /// Snapshot of the store state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// Show cached notes, if a cache is configured.
    ///
    /// # Errors
    ///
    /// See [`FlashcardStore::restore`].
    pub async fn restore(&self) -> Result<()> {
        self.store.restore(&self.user_id).await
    }

    /// Reload all notes.
    ///
    /// # Errors
    ///
    /// See [`FlashcardStore::load`].
    pub async fn load(&self) -> Result<()> {
        self.store.load(&self.user_id).await
    }

    /// Add an existing note.
    ///
    /// # Errors
    ///
    /// See [`FlashcardStore::create`].
    pub async fn create(&self, note: Note) -> Result<()> {
        self.store.create(&self.user_id, note).await
    }

    /// Delete a note by id.
    ///
    /// # Errors
    ///
    /// See [`FlashcardStore::delete`].
    pub async fn delete(&self, note_id: &str) -> Result<()> {
        self.store.delete(&self.user_id, note_id).await
    }

    /// Create a note with a fresh id and the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank title.
    pub async fn new_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Note> {
        let note = Note::new(title, content);
        self.store.create(&self.user_id, note.clone()).await?;
        Ok(note)
    }

    /// Summarize `text` and store the result as a new note.
    ///
    /// Nothing is created when summarization fails.
    ///
    /// # Errors
    ///
    /// Returns the summarizer's error, or [`Error::Validation`] if the
    /// summary cannot form a note.
    pub async fn summarize_into_note(
        &self,
        summarizer: &dyn Summarizer,
        text: &str,
    ) -> Result<Note> {
        let summary = summarizer.summarize(text).await?;
        debug!("Summary produced title {:?}", summary.title);
        self.new_note(summary.title, summary.content).await
    }

    /// End the session and forget every note it showed.
    pub fn sign_out(self) {
        self.store.reset();
        info!("Session closed for {}", self.user_id);
    }
}

/// Assemble a store from configuration.
///
/// # Errors
///
/// Returns an error if the remote URL is invalid or the cache database
/// cannot be opened.
pub fn store_from_config(config: &Config) -> Result<FlashcardStore> {
    let mut store = FlashcardStore::new()
        .with_id_policy(config.sync.id_policy)
        .with_timeout(config.remote_timeout());

    if config.remote.backend == RemoteBackend::Http {
        let remote = HttpCollection::new(
            &config.remote.base_url,
            config.remote_timeout(),
            config.sync.id_policy,
        )?;
        store = store.with_remote(Arc::new(remote));
    }

    if config.cache.enabled {
        let cache = LocalCache::open(config.database_path())?;
        store = store.with_cache(Arc::new(cache));
    }

    debug!("Assembled {:?}", store);
    Ok(store)
}
