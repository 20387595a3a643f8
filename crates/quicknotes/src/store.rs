//! The flashcard store.
//!
//! Owns the in-process list of a user's notes and keeps it in step with the
//! configured collections. Mutations are applied optimistically before the
//! collection call is made and reconciled when it settles:
//!
//! ```text
//! Idle -> Pending (optimistic edit applied) -> Settled-Success
//!                                           -> Settled-Failure (create rolled back,
//!                                                               delete left applied)
//! ```
//!
//! Operations are not serialized against each other. Each one applies its
//! optimistic edit synchronously, suspends only on the collection call, then
//! applies its settlement, so the final list is the composition of all edits
//! in completion order. Remote failures never escape as `Err`: they settle
//! into [`StoreState::error`]. Only malformed input is returned as an error.
//!
//! State is published through a [`tokio::sync::watch`] channel, so every
//! observer sees each optimistic edit and each settlement.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::collection::NoteCollection;
use crate::config::IdPolicy;
use crate::error::{Error, Result};
use crate::note::{sort_newest_first, Note};

/// The kind of operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A full reload (or a restore from the cache).
    Load,
    /// Creating a note.
    Create,
    /// Deleting a note.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Create => write!(f, "create"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// The last failure recorded by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    /// Which operation failed.
    pub kind: OperationKind,
    /// Human-readable reason.
    pub message: String,
}

/// Snapshot of the store as observers see it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    /// Notes, newest first. Ids are unique.
    pub notes: Vec<Note>,
    /// True while at least one reload is in flight.
    pub loading: bool,
    /// Last failure, cleared when the next operation of the same kind starts.
    pub error: Option<OperationError>,
}

impl StoreState {
    /// The last failure message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Whether a note with `id` is in the list.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.notes.iter().any(|n| n.id == id)
    }

    /// Look a note up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn clear_error(&mut self, kind: OperationKind) {
        if self.error.as_ref().is_some_and(|e| e.kind == kind) {
            self.error = None;
        }
    }

    fn set_error(&mut self, kind: OperationKind, message: String) {
        self.error = Some(OperationError { kind, message });
    }
}

/// Creates and deletes whose collection call has not settled yet.
#[derive(Debug, Default)]
struct InFlight {
    creates: HashMap<String, usize>,
    /// Pending creates the user deleted before they settled.
    deleted_creates: HashSet<String>,
    deletes: HashMap<String, usize>,
}

impl InFlight {
    fn begin_create(&mut self, id: &str) {
        *self.creates.entry(id.to_string()).or_default() += 1;
        // Re-created after a delete
        self.deleted_creates.remove(id);
        self.deletes.remove(id);
    }

    /// Returns true when the note was deleted while this create was pending.
    fn finish_create(&mut self, id: &str) -> bool {
        let remaining = release(&mut self.creates, id);
        if remaining == 0 {
            self.deleted_creates.remove(id)
        } else {
            self.deleted_creates.contains(id)
        }
    }

    fn begin_delete(&mut self, id: &str) {
        *self.deletes.entry(id.to_string()).or_default() += 1;
        if self.creates.contains_key(id) {
            self.deleted_creates.insert(id.to_string());
        }
    }

    fn finish_delete(&mut self, id: &str) {
        release(&mut self.deletes, id);
    }

    fn is_deleting(&self, id: &str) -> bool {
        self.deletes.contains_key(id)
    }
}

/// Decrement the count for `id`, dropping the entry at zero.
fn release(counts: &mut HashMap<String, usize>, id: &str) -> usize {
    let remaining = match counts.get_mut(id) {
        Some(count) => {
            *count = count.saturating_sub(1);
            *count
        }
        None => 0,
    };
    if remaining == 0 {
        counts.remove(id);
    }
    remaining
}

/// Optimistic note store synchronized with up to two collections.
///
/// | remote | cache | primary | mirrored to |
/// |--------|-------|---------|-------------|
/// | -      | -     | none (in-memory only) | - |
/// | yes    | -     | remote  | -           |
/// | -      | yes   | cache   | -           |
/// | yes    | yes   | remote  | cache       |
///
/// The primary decides success or failure. A mirror failure is recorded in
/// `error` but never rolls state back.
pub struct FlashcardStore {
    state: watch::Sender<StoreState>,
    remote: Option<Arc<dyn NoteCollection>>,
    cache: Option<Arc<dyn NoteCollection>>,
    id_policy: IdPolicy,
    timeout: Option<Duration>,
    loads_in_flight: AtomicUsize,
    /// Bumped each time a successful reload replaces the list.
    loads_applied: AtomicU64,
    pending: Mutex<InFlight>,
}

impl fmt::Debug for FlashcardStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashcardStore")
            .field("remote", &self.remote.as_ref().map(|c| c.name()))
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .field("id_policy", &self.id_policy)
            .field("timeout", &self.timeout)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Default for FlashcardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashcardStore {
    /// Create an empty, purely in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            state,
            remote: None,
            cache: None,
            id_policy: IdPolicy::default(),
            timeout: None,
            loads_in_flight: AtomicUsize::new(0),
            loads_applied: AtomicU64::new(0),
            pending: Mutex::new(InFlight::default()),
        }
    }

    /// Synchronize with a remote collection.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn NoteCollection>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Keep a local cache collection.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn NoteCollection>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Choose how server-assigned ids are reconciled.
    #[must_use]
    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }

    /// Fail collection calls that take longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured id policy.
    #[must_use]
    pub fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    /// A snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Empty the store, as on sign-out.
    pub fn reset(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = InFlight::default();
        drop(pending);

        let loading = self.loads_in_flight.load(Ordering::SeqCst) > 0;
        self.state.send_replace(StoreState {
            loading,
            ..StoreState::default()
        });
        debug!("Store reset");
    }

    fn current_notes(&self) -> Vec<Note> {
        self.state.borrow().notes.clone()
    }

    fn primary(&self) -> Option<&Arc<dyn NoteCollection>> {
        self.remote.as_ref().or(self.cache.as_ref())
    }

    fn mirror(&self) -> Option<&Arc<dyn NoteCollection>> {
        if self.remote.is_some() {
            self.cache.as_ref()
        } else {
            None
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, InFlight> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop notes whose delete is still in flight from a fetched list.
    fn without_pending_deletes(&self, notes: &mut Vec<Note>) {
        let pending = self.pending();
        notes.retain(|n| {
            let deleting = pending.is_deleting(&n.id);
            if deleting {
                debug!("Keeping note {} hidden while its delete is pending", n.id);
            }
            !deleting
        });
    }

    async fn call<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout {
                    operation: operation.to_string(),
                })?,
            None => fut.await,
        }
    }

    fn record_error(&self, kind: OperationKind, message: String) {
        self.state.send_modify(|s| s.set_error(kind, message));
    }

    fn record_mirror_error(&self, kind: OperationKind, cache: &dyn NoteCollection, err: &Error) {
        log_failure(&format!("{kind} mirror to {}", cache.name()), err);
        self.record_error(kind, format!("{} out of sync: {err}", cache.name()));
    }

    /// Reload the full list from the primary collection.
    ///
    /// On success the list is replaced wholesale; on failure it is left
    /// untouched and `error` is set. `loading` is true while the call is in
    /// flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `user_id` is empty. Collection
    /// failures are recorded in the state instead.
    pub async fn load(&self, user_id: &str) -> Result<()> {
        require_user(user_id)?;

        self.loads_in_flight.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|s| {
            s.loading = true;
            s.clear_error(OperationKind::Load);
        });

        let outcome = match self.primary() {
            Some(primary) => self.call("list notes", primary.list(user_id)).await,
            None => Ok(self.current_notes()),
        };

        let remaining = self.loads_in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        match outcome {
            Ok(mut notes) => {
                self.without_pending_deletes(&mut notes);
                normalize(&mut notes);
                info!("Loaded {} notes for {}", notes.len(), user_id);
                let mirrored = notes.clone();
                self.state.send_modify(|s| {
                    self.loads_applied.fetch_add(1, Ordering::SeqCst);
                    s.notes = notes;
                    s.loading = remaining > 0;
                });

                if let Some(cache) = self.mirror() {
                    if let Err(err) = self.reconcile_cache(cache.as_ref(), user_id, &mirrored).await {
                        self.record_mirror_error(OperationKind::Load, cache.as_ref(), &err);
                    }
                }
            }
            Err(err) => {
                log_failure(&format!("Loading notes for {user_id}"), &err);
                self.state.send_modify(|s| {
                    s.loading = remaining > 0;
                    s.set_error(OperationKind::Load, err.to_string());
                });
            }
        }

        Ok(())
    }

    /// Make the cache hold exactly `notes` for the user.
    async fn reconcile_cache(
        &self,
        cache: &dyn NoteCollection,
        user_id: &str,
        notes: &[Note],
    ) -> Result<()> {
        let keep: HashSet<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        let cached = self.call("list cached notes", cache.list(user_id)).await?;

        for stale in cached.iter().filter(|n| !keep.contains(n.id.as_str())) {
            self.call("delete cached note", cache.delete(user_id, &stale.id))
                .await?;
        }
        // Oldest first so equal timestamps keep the remote's order in the cache
        for note in notes.iter().rev() {
            self.call("cache note", cache.upsert(user_id, note)).await?;
        }
        debug!("Cache reconciled with {} notes", notes.len());
        Ok(())
    }

    /// Show the cached list without contacting the remote.
    ///
    /// Used at session start so the last known notes appear before the first
    /// reload resolves. Does nothing when no cache is configured, and leaves
    /// the list alone if a reload landed while the cache was being read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `user_id` is empty. Cache failures
    /// are recorded as a load error.
    pub async fn restore(&self, user_id: &str) -> Result<()> {
        require_user(user_id)?;

        let Some(cache) = self.cache.as_ref() else {
            return Ok(());
        };

        let generation = self.loads_applied.load(Ordering::SeqCst);
        match self.call("list cached notes", cache.list(user_id)).await {
            Ok(mut notes) => {
                self.without_pending_deletes(&mut notes);
                normalize(&mut notes);
                let applied = self.state.send_if_modified(|s| {
                    if self.loads_applied.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    s.notes = notes;
                    true
                });
                if applied {
                    debug!("Restored cached notes for {}", user_id);
                } else {
                    debug!("Skipped cached notes for {}; a reload already landed", user_id);
                }
            }
            Err(err) => {
                log_failure(&format!("Restoring cached notes for {user_id}"), &err);
                self.record_error(OperationKind::Load, err.to_string());
            }
        }
        Ok(())
    }

    /// Add a note.
    ///
    /// The note appears in the list immediately. If the primary collection
    /// rejects it, exactly that note (matched by id) is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `user_id` is empty, the note has a
    /// blank id or title, or a note with the same id is already listed.
    pub async fn create(&self, user_id: &str, note: Note) -> Result<()> {
        require_user(user_id)?;
        note.validate()?;

        let mut duplicate = false;
        self.state.send_if_modified(|s| {
            if s.contains(&note.id) {
                duplicate = true;
                return false;
            }
            s.clear_error(OperationKind::Create);
            insert_ordered(&mut s.notes, note.clone());
            true
        });
        if duplicate {
            return Err(Error::validation(format!(
                "a note with id `{}` already exists",
                note.id
            )));
        }
        self.pending().begin_create(&note.id);
        debug!("Optimistically inserted note {}", note.id);

        let Some(primary) = self.primary() else {
            self.pending().finish_create(&note.id);
            return Ok(());
        };

        let outcome = self.call("upsert note", primary.upsert(user_id, &note)).await;
        let deleted_meanwhile = self.pending().finish_create(&note.id);

        match outcome {
            Ok(persisted) if deleted_meanwhile => {
                self.discard_deleted(primary.as_ref(), user_id, &note, &persisted)
                    .await;
            }
            Ok(persisted) => {
                let settled = self.settle_created(&note, persisted);
                if let (Some(cache), Some(settled)) = (self.mirror(), settled) {
                    if let Err(err) = self.call("cache note", cache.upsert(user_id, &settled)).await {
                        self.record_mirror_error(OperationKind::Create, cache.as_ref(), &err);
                    }
                }
            }
            Err(err) => {
                log_failure(&format!("Creating note {}, rolling back", note.id), &err);
                self.state.send_modify(|s| {
                    s.notes.retain(|n| n.id != note.id);
                    s.set_error(OperationKind::Create, err.to_string());
                });
            }
        }

        Ok(())
    }

    /// Apply a successful create. Returns the note as it now stands in the
    /// list, or `None` if it is no longer listed.
    fn settle_created(&self, optimistic: &Note, persisted: Note) -> Option<Note> {
        if self.id_policy == IdPolicy::ClientIdPermanent || persisted.id == optimistic.id {
            debug!("Note {} confirmed", optimistic.id);
            return self.state.borrow().get(&optimistic.id).cloned();
        }

        let mut settled = None;
        self.state.send_if_modified(|s| {
            let Some(position) = s.notes.iter().position(|n| n.id == optimistic.id) else {
                debug!(
                    "Note {} left the list before its server id {} arrived",
                    optimistic.id, persisted.id
                );
                return false;
            };
            s.notes.remove(position);
            if s.contains(&persisted.id) {
                debug!(
                    "Server id {} already listed; dropping optimistic {}",
                    persisted.id, optimistic.id
                );
            } else {
                debug!("Re-keyed note {} to {}", optimistic.id, persisted.id);
                insert_ordered(&mut s.notes, persisted.clone());
            }
            settled = s.get(&persisted.id).cloned();
            true
        });
        settled
    }

    /// The user deleted a note whose create was still in flight. The
    /// collection now holds a copy the user no longer wants, so remove it.
    async fn discard_deleted(
        &self,
        primary: &dyn NoteCollection,
        user_id: &str,
        optimistic: &Note,
        persisted: &Note,
    ) {
        debug!(
            "Note {} was deleted while being created; removing {}",
            optimistic.id, persisted.id
        );
        // The optimistic delete already ran; the note stays off the list either way
        if let Err(err) = self
            .call("delete note", primary.delete(user_id, &persisted.id))
            .await
        {
            log_failure(&format!("Removing deleted note {}", persisted.id), &err);
            self.record_error(
                OperationKind::Create,
                format!("note was deleted during creation but the stored copy remains: {err}"),
            );
        }
    }

    /// Remove a note.
    ///
    /// The note leaves the list immediately and is not restored if the
    /// collection call fails; a reload shows whether it still exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `user_id` or `note_id` is empty.
    pub async fn delete(&self, user_id: &str, note_id: &str) -> Result<()> {
        require_user(user_id)?;
        if note_id.trim().is_empty() {
            return Err(Error::validation("note id must not be empty"));
        }

        self.state.send_modify(|s| {
            s.clear_error(OperationKind::Delete);
            s.notes.retain(|n| n.id != note_id);
        });
        debug!("Optimistically removed note {}", note_id);

        let Some(primary) = self.primary() else {
            return Ok(());
        };

        self.pending().begin_delete(note_id);
        let outcome = self.call("delete note", primary.delete(user_id, note_id)).await;
        self.pending().finish_delete(note_id);

        match outcome {
            Ok(()) => {
                if let Some(cache) = self.mirror() {
                    if let Err(err) = self
                        .call("delete cached note", cache.delete(user_id, note_id))
                        .await
                    {
                        self.record_mirror_error(OperationKind::Delete, cache.as_ref(), &err);
                    }
                }
            }
            Err(err) => {
                log_failure(&format!("Deleting note {note_id}"), &err);
                self.record_error(OperationKind::Delete, err.to_string());
            }
        }

        Ok(())
    }
}

/// Log a settled failure. Anything other than a collection failure is a bug.
fn log_failure(context: &str, err: &Error) {
    if err.is_remote() {
        warn!("{} failed: {}", context, err);
    } else {
        error!("{} failed: {}", context, err);
    }
}

fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::validation("user id must not be empty"));
    }
    Ok(())
}

/// Insert in front of every note with an equal or older timestamp.
fn insert_ordered(notes: &mut Vec<Note>, note: Note) {
    let position = notes
        .iter()
        .position(|n| n.created_at <= note.created_at)
        .unwrap_or(notes.len());
    notes.insert(position, note);
}

/// Order newest first and drop repeated ids, keeping the first occurrence.
fn normalize(notes: &mut Vec<Note>) {
    sort_newest_first(notes);
    let mut seen = HashSet::new();
    notes.retain(|n| seen.insert(n.id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::fake::{Call, FakeCollection, Outcome};
    use crate::logging::init_test_logging;
    use crate::storage::LocalCache;

    fn note(id: &str, created_at: i64) -> Note {
        Note::with_id(id, format!("Title {id}"), "C", created_at)
    }

    fn ids(store: &FlashcardStore) -> Vec<String> {
        store.state().notes.into_iter().map(|n| n.id).collect()
    }

    fn remote_store(remote: &Arc<FakeCollection>) -> FlashcardStore {
        init_test_logging();
        FlashcardStore::new().with_remote(remote.clone())
    }

    fn assert_unique(store: &FlashcardStore) {
        let all = ids(store);
        let unique: HashSet<&String> = all.iter().collect();
        assert_eq!(unique.len(), all.len(), "duplicate ids in {all:?}");
    }

    /// Let every ready future in a `join!` make progress.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_create_success() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);

        store
            .create("u1", Note::with_id("n1", "T", "C", 1000))
            .await
            .unwrap();

        let state = store.state();
        assert_eq!(state.notes.len(), 1);
        assert_eq!(state.notes[0].id, "n1");
        assert!(state.error.is_none());
        assert_eq!(remote.stored("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("existing", 500)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();
        let before = store.state().notes;

        remote.fail_with("network error");
        store
            .create("u1", Note::with_id("n1", "T", "C", 1000))
            .await
            .unwrap();

        let state = store.state();
        assert!(!state.contains("n1"));
        assert_eq!(state.notes, before);
        let error = state.error.unwrap();
        assert_eq!(error.kind, OperationKind::Create);
        assert!(error.message.contains("network error"));
    }

    #[tokio::test]
    async fn test_create_is_visible_before_remote_resolves() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::Upsert("n1".to_string()));
        let store = remote_store(&remote);

        let check = async {
            settle().await;
            assert!(store.state().contains("n1"));
            assert!(remote.stored("u1").is_empty());
            gate.send(Outcome::Accept).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("n1", 1000)), check);

        result.unwrap();
        assert!(store.state().contains("n1"));
    }

    #[tokio::test]
    async fn test_rollback_removes_only_the_failed_note() {
        let remote = Arc::new(FakeCollection::new());
        let gate_a = remote.hold(Call::Upsert("a".to_string()));
        let store = remote_store(&remote);

        let scenario = async {
            settle().await;
            // B is created and confirmed while A is still pending
            store.create("u1", note("b", 2000)).await.unwrap();
            assert_eq!(ids(&store), vec!["b", "a"]);
            gate_a.send(Outcome::Reject("network error".to_string())).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("a", 1000)), scenario);

        result.unwrap();
        assert_eq!(ids(&store), vec!["b"]);
        assert!(store.state().error_message().unwrap().contains("network error"));
    }

    #[tokio::test]
    async fn test_rollback_matches_by_id_not_position() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::Upsert("new".to_string()));
        let store = remote_store(&remote);

        let scenario = async {
            settle().await;
            // A newer note lands in front of the pending one
            store.create("u1", note("newer", 5000)).await.unwrap();
            gate.send(Outcome::Reject("rejected".to_string())).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("new", 3000)), scenario);

        result.unwrap();
        assert_eq!(ids(&store), vec!["newer"]);
    }

    #[tokio::test]
    async fn test_delete_is_immediate_and_not_restored_on_failure() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("n1", 1), note("n2", 2)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        let gate = remote.hold(Call::Delete("n1".to_string()));
        let check = async {
            settle().await;
            assert!(!store.state().contains("n1"));
            gate.send(Outcome::Reject("network error".to_string())).unwrap();
        };
        let (result, ()) = tokio::join!(store.delete("u1", "n1"), check);

        result.unwrap();
        let state = store.state();
        assert!(!state.contains("n1"));
        assert!(state.contains("n2"));
        assert_eq!(state.error.unwrap().kind, OperationKind::Delete);
    }

    #[tokio::test]
    async fn test_delete_absent_id_is_noop() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("n1", 1)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        store.delete("u1", "missing").await.unwrap();

        assert_eq!(ids(&store), vec!["n1"]);
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn test_two_deletes_both_apply_immediately() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("a", 1), note("b", 2), note("c", 3)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        let gate_a = remote.hold(Call::Delete("a".to_string()));
        let gate_b = remote.hold(Call::Delete("b".to_string()));
        let check = async {
            settle().await;
            assert_eq!(ids(&store), vec!["c"]);
            gate_b.send(Outcome::Accept).unwrap();
            gate_a.send(Outcome::Accept).unwrap();
        };
        let (a, b, ()) = tokio::join!(store.delete("u1", "a"), store.delete("u1", "b"), check);

        a.unwrap();
        b.unwrap();
        assert_eq!(ids(&store), vec!["c"]);
        assert_eq!(remote.stored("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_reload_restores_surviving_note() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("n1", 1)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        remote.fail_with("network error");
        store.delete("u1", "n1").await.unwrap();
        assert!(!store.state().contains("n1"));

        remote.recover();
        store.load("u1").await.unwrap();
        assert!(store.state().contains("n1"));
    }

    #[tokio::test]
    async fn test_concurrent_creates_second_settles_first() {
        let remote = Arc::new(FakeCollection::new());
        let gate_a = remote.hold(Call::Upsert("a".to_string()));
        let gate_b = remote.hold(Call::Upsert("b".to_string()));
        let store = remote_store(&remote);

        let check = async {
            settle().await;
            gate_b.send(Outcome::Accept).unwrap();
            settle().await;
            assert_eq!(ids(&store), vec!["b", "a"]);
            gate_a.send(Outcome::Accept).unwrap();
        };
        let (a, b, ()) = tokio::join!(
            store.create("u1", note("a", 1000)),
            store.create("u1", note("b", 2000)),
            check
        );

        a.unwrap();
        b.unwrap();
        assert_eq!(ids(&store), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_optimistic_insert_respects_created_at() {
        let store = FlashcardStore::new();
        store.create("u1", note("mid", 2)).await.unwrap();
        store.create("u1", note("old", 1)).await.unwrap();
        store.create("u1", note("new", 3)).await.unwrap();
        store.create("u1", note("tie", 3)).await.unwrap();

        assert_eq!(ids(&store), vec!["tie", "new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_load_replaces_wholesale() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);
        store.create("u1", note("local-only", 10)).await.unwrap();

        // Another client rewrote the collection
        remote.seed("u1", vec![note("x", 1), note("y", 3), note("z", 2)]);
        store.load("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["y", "z", "x"]);

        remote.seed("u1", vec![note("y", 3)]);
        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["y"]);
    }

    #[tokio::test]
    async fn test_load_collapses_duplicate_ids() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("dup", 5), note("dup", 4), note("other", 1)]);
        let store = remote_store(&remote);

        store.load("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["dup", "other"]);
        assert_eq!(store.state().notes[0].created_at, 5);
    }

    #[tokio::test]
    async fn test_loading_flag_settles_on_success() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::List);
        let store = remote_store(&remote);
        assert!(!store.state().loading);

        let check = async {
            settle().await;
            assert!(store.state().loading);
            gate.send(Outcome::Accept).unwrap();
        };
        let (result, ()) = tokio::join!(store.load("u1"), check);

        result.unwrap();
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_loading_flag_settles_on_failure() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("kept", 1)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        let gate = remote.hold(Call::List);
        let check = async {
            settle().await;
            assert!(store.state().loading);
            gate.send(Outcome::Reject("offline".to_string())).unwrap();
        };
        let (result, ()) = tokio::join!(store.load("u1"), check);

        result.unwrap();
        let state = store.state();
        assert!(!state.loading);
        assert_eq!(ids(&store), vec!["kept"]);
        assert_eq!(state.error.unwrap().kind, OperationKind::Load);
    }

    #[tokio::test]
    async fn test_overlapping_loads_keep_flag_until_last_settles() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::List);
        let store = remote_store(&remote);

        let check = async {
            settle().await;
            // The second load was not held and has settled already
            assert!(store.state().loading);
            gate.send(Outcome::Accept).unwrap();
        };
        let (first, second, ()) = tokio::join!(store.load("u1"), store.load("u1"), check);

        first.unwrap();
        second.unwrap();
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_validation_rejects_before_any_mutation() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);

        assert!(store.load("").await.unwrap_err().is_validation());
        assert!(store
            .create(" ", note("n1", 1))
            .await
            .unwrap_err()
            .is_validation());
        assert!(store
            .create("u1", Note::with_id("n1", "", "C", 1))
            .await
            .unwrap_err()
            .is_validation());
        assert!(store.delete("u1", "").await.unwrap_err().is_validation());

        assert_eq!(store.state(), StoreState::default());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_rejected() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);
        store.create("u1", note("n1", 1)).await.unwrap();

        let err = store.create("u1", note("n1", 2)).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(ids(&store), vec!["n1"]);
        assert_eq!(remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_recreate_after_delete() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);
        store.create("u1", note("n1", 1)).await.unwrap();
        store.delete("u1", "n1").await.unwrap();
        store.create("u1", note("n1", 1)).await.unwrap();

        assert_eq!(ids(&store), vec!["n1"]);
        assert_eq!(remote.stored("u1").len(), 1);
    }

    #[tokio::test]
    async fn test_error_cleared_only_by_same_kind() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);

        remote.fail_with("offline");
        store.create("u1", note("n1", 1)).await.unwrap();
        assert_eq!(store.state().error.unwrap().kind, OperationKind::Create);

        remote.recover();
        store.load("u1").await.unwrap();
        assert_eq!(store.state().error.unwrap().kind, OperationKind::Create);

        store.create("u1", note("n2", 2)).await.unwrap();
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn test_client_id_permanent_ignores_server_id() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ClientIdPermanent);

        store.create("u1", note("client-1", 1)).await.unwrap();

        assert_eq!(ids(&store), vec!["client-1"]);
        assert_eq!(remote.stored("u1")[0].id, "srv-1");
    }

    #[tokio::test]
    async fn test_server_id_wins_rekeys_note() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ServerIdWins);
        store.create("u1", note("older", 1)).await.unwrap();

        store.create("u1", note("client-2", 5)).await.unwrap();

        assert_eq!(ids(&store), vec!["srv-2", "srv-1"]);
        // A reload now agrees with the local view
        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["srv-2", "srv-1"]);
    }

    #[tokio::test]
    async fn test_server_id_wins_then_reload_has_no_duplicate() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let gate = remote.hold(Call::Upsert("client-1".to_string()));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ServerIdWins);

        let scenario = async {
            settle().await;
            gate.send(Outcome::Accept).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("client-1", 1)), scenario);
        result.unwrap();
        store.load("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["srv-1"]);
        assert_unique(&store);
    }

    #[tokio::test]
    async fn test_server_id_already_listed_drops_optimistic_copy() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let gate = remote.hold(Call::Upsert("client-1".to_string()));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ServerIdWins);

        let scenario = async {
            settle().await;
            // Simulate a reload that already saw the server copy
            store.state.send_modify(|s| insert_ordered(&mut s.notes, note("srv-1", 1)));
            gate.send(Outcome::Accept).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("client-1", 1)), scenario);

        result.unwrap();
        assert_eq!(ids(&store), vec!["srv-1"]);
    }

    #[tokio::test]
    async fn test_delete_during_create_removes_stored_copy() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let gate = remote.hold(Call::Upsert("client-1".to_string()));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ServerIdWins);

        let scenario = async {
            settle().await;
            store.delete("u1", "client-1").await.unwrap();
            gate.send(Outcome::Accept).unwrap();
        };
        let (result, ()) = tokio::join!(store.create("u1", note("client-1", 1)), scenario);
        result.unwrap();

        assert!(store.state().notes.is_empty());
        assert!(remote.stored("u1").is_empty());
        assert!(remote.calls().contains(&Call::Delete("srv-1".to_string())));

        store.load("u1").await.unwrap();
        assert!(store.state().notes.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_settles_as_failure() {
        let remote = Arc::new(FakeCollection::new());
        let _gate = remote.hold(Call::Upsert("slow".to_string()));
        let store = remote_store(&remote).with_timeout(Duration::from_millis(20));

        store.create("u1", note("slow", 1)).await.unwrap();

        let state = store.state();
        assert!(!state.contains("slow"));
        assert!(state.error_message().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_in_memory_store_without_collections() {
        let store = FlashcardStore::new();
        store.create("u1", note("a", 1)).await.unwrap();
        store.create("u1", note("b", 2)).await.unwrap();
        store.delete("u1", "a").await.unwrap();
        store.load("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["b"]);
        assert!(!store.state().loading);
        assert!(store.state().error.is_none());
    }

    #[tokio::test]
    async fn test_cache_only_store_persists_locally() {
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        let store = FlashcardStore::new().with_cache(cache.clone());

        store.create("u1", note("a", 1)).await.unwrap();
        store.create("u1", note("b", 2)).await.unwrap();
        store.delete("u1", "a").await.unwrap();

        let reopened = FlashcardStore::new().with_cache(cache.clone());
        reopened.load("u1").await.unwrap();
        assert_eq!(ids(&reopened), vec!["b"]);
    }

    #[tokio::test]
    async fn test_remote_and_cache_mirror_mutations() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        let store = remote_store(&remote).with_cache(cache.clone());

        store.create("u1", note("a", 1)).await.unwrap();
        store.create("u1", note("b", 2)).await.unwrap();
        store.delete("u1", "a").await.unwrap();

        let cached: Vec<String> = cache
            .list_notes("u1")
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(cached, vec!["b"]);
    }

    #[tokio::test]
    async fn test_failed_remote_create_is_not_cached() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        let store = remote_store(&remote).with_cache(cache.clone());

        remote.fail_with("network error");
        store.create("u1", note("a", 1)).await.unwrap();

        assert_eq!(cache.count("u1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_load_reconciles_cache_with_remote() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        cache.upsert_note("u1", &note("stale", 9)).unwrap();
        remote.seed("u1", vec![note("fresh", 1), note("fresher", 2)]);
        let store = remote_store(&remote).with_cache(cache.clone());

        store.restore("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["stale"]);

        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["fresher", "fresh"]);
        let cached: Vec<String> = cache
            .list_notes("u1")
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(cached, vec!["fresher", "fresh"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_cache_untouched() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        cache.upsert_note("u1", &note("cached", 1)).unwrap();
        let store = remote_store(&remote).with_cache(cache.clone());

        store.restore("u1").await.unwrap();
        remote.fail_with("offline");
        store.load("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["cached"]);
        assert_eq!(cache.count("u1").unwrap(), 1);
        assert!(store.state().error_message().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_cache_mirror_failure_is_recorded_without_rollback() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(FakeCollection::new());
        let store = remote_store(&remote).with_cache(cache.clone());

        cache.fail_with("disk full");
        store.create("u1", note("a", 1)).await.unwrap();

        let state = store.state();
        assert!(state.contains("a"));
        let error = state.error.unwrap();
        assert_eq!(error.kind, OperationKind::Create);
        assert!(error.message.contains("out of sync"));
        assert!(error.message.contains("disk full"));
    }

    #[tokio::test]
    async fn test_restore_without_cache_is_noop() {
        let store = FlashcardStore::new();
        store.create("u1", note("a", 1)).await.unwrap();

        store.restore("u1").await.unwrap();

        assert_eq!(ids(&store), vec!["a"]);
    }

    #[tokio::test]
    async fn test_subscribers_see_optimistic_and_settled_states() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::Upsert("n1".to_string()));
        let store = remote_store(&remote);
        let mut rx = store.subscribe();

        let observer = async {
            rx.changed().await.unwrap();
            assert!(rx.borrow_and_update().contains("n1"));
            gate.send(Outcome::Reject("offline".to_string())).unwrap();
            rx.changed().await.unwrap();
            let settled = rx.borrow_and_update().clone();
            assert!(!settled.contains("n1"));
            assert!(settled.error.is_some());
        };
        let (result, ()) = tokio::join!(store.create("u1", note("n1", 1)), observer);

        result.unwrap();
    }

    #[tokio::test]
    async fn test_reset_empties_state() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);
        store.create("u1", note("a", 1)).await.unwrap();
        remote.fail_with("offline");
        store.delete("u1", "a").await.unwrap();

        store.reset();

        assert_eq!(store.state(), StoreState::default());
    }

    #[tokio::test]
    async fn test_ids_stay_unique_across_mixed_outcomes() {
        let remote = Arc::new(FakeCollection::new());
        let store = remote_store(&remote);

        for step in 0..60_i64 {
            let id = format!("n{}", step % 7);
            if step % 5 == 0 {
                remote.fail_with("flaky");
            } else {
                remote.recover();
            }
            if step % 3 == 0 {
                store.delete("u1", &id).await.unwrap();
            } else {
                match store.create("u1", note(&id, step)).await {
                    Ok(()) => {}
                    Err(err) => assert!(err.is_validation()),
                }
            }
            assert_unique(&store);
        }

        remote.recover();
        store.load("u1").await.unwrap();
        assert_unique(&store);
    }

    #[tokio::test]
    async fn test_load_keeps_note_with_pending_delete_hidden() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("n1", 2), note("n2", 1)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        let delete_gate = remote.hold(Call::Delete("n1".to_string()));
        let list_gate = remote.hold(Call::List);
        let scenario = async {
            settle().await;
            list_gate.send(Outcome::Accept).unwrap();
            settle().await;
            // The listing still had n1 because the delete had not landed
            assert!(!store.state().contains("n1"));
            delete_gate.send(Outcome::Accept).unwrap();
        };
        let (deleted, loaded, ()) =
            tokio::join!(store.delete("u1", "n1"), store.load("u1"), scenario);
        deleted.unwrap();
        loaded.unwrap();

        assert_eq!(ids(&store), vec!["n2"]);
        let stored: Vec<String> = remote.stored("u1").into_iter().map(|n| n.id).collect();
        assert_eq!(stored, vec!["n2"]);
    }

    #[tokio::test]
    async fn test_failed_delete_overlapping_load_shows_note_on_next_load() {
        let remote = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("n1", 1)]);
        let store = remote_store(&remote);
        store.load("u1").await.unwrap();

        let delete_gate = remote.hold(Call::Delete("n1".to_string()));
        let scenario = async {
            settle().await;
            store.load("u1").await.unwrap();
            assert!(store.state().notes.is_empty());
            delete_gate
                .send(Outcome::Reject("server error".to_string()))
                .unwrap();
        };
        let (deleted, ()) = tokio::join!(store.delete("u1", "n1"), scenario);
        deleted.unwrap();
        assert!(store.state().notes.is_empty());
        assert_eq!(store.state().error.unwrap().kind, OperationKind::Delete);

        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["n1"]);
    }

    #[tokio::test]
    async fn test_load_during_pending_create_does_not_readd_note() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::Upsert("a".to_string()));
        let store = remote_store(&remote);

        let scenario = async {
            settle().await;
            store.load("u1").await.unwrap();
            assert!(!store.state().contains("a"));
            gate.send(Outcome::Accept).unwrap();
        };
        let (created, ()) = tokio::join!(store.create("u1", note("a", 1)), scenario);
        created.unwrap();
        assert!(!store.state().contains("a"));
        assert!(store.state().error.is_none());

        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["a"]);
    }

    #[tokio::test]
    async fn test_load_during_pending_server_id_create_does_not_readd_note() {
        let remote = Arc::new(FakeCollection::assigning_ids("srv-"));
        let gate = remote.hold(Call::Upsert("client-1".to_string()));
        let store = remote_store(&remote).with_id_policy(IdPolicy::ServerIdWins);

        let scenario = async {
            settle().await;
            store.load("u1").await.unwrap();
            assert!(store.state().notes.is_empty());
            gate.send(Outcome::Accept).unwrap();
        };
        let (created, ()) = tokio::join!(store.create("u1", note("client-1", 1)), scenario);
        created.unwrap();
        assert!(store.state().notes.is_empty());

        store.load("u1").await.unwrap();
        assert_eq!(ids(&store), vec!["srv-1"]);
        assert_unique(&store);
    }

    #[tokio::test]
    async fn test_restore_settling_after_load_keeps_loaded_list() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(FakeCollection::new());
        remote.seed("u1", vec![note("fresh", 2)]);
        cache.seed("u1", vec![note("stale", 1)]);
        let gate = cache.hold(Call::List);
        let store = remote_store(&remote).with_cache(cache.clone());

        let scenario = async {
            settle().await;
            store.load("u1").await.unwrap();
            assert_eq!(ids(&store), vec!["fresh"]);
            // The cache read by restore predates the reload
            cache.seed("u1", vec![note("stale", 1)]);
            gate.send(Outcome::Accept).unwrap();
        };
        let (restored, ()) = tokio::join!(store.restore("u1"), scenario);
        restored.unwrap();

        assert_eq!(ids(&store), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_restore_skips_notes_with_pending_delete() {
        let remote = Arc::new(FakeCollection::new());
        let cache = Arc::new(LocalCache::open_in_memory().unwrap());
        cache.upsert_note("u1", &note("a", 2)).unwrap();
        cache.upsert_note("u1", &note("b", 1)).unwrap();
        let delete_gate = remote.hold(Call::Delete("a".to_string()));
        let store = remote_store(&remote).with_cache(cache.clone());

        let scenario = async {
            settle().await;
            store.restore("u1").await.unwrap();
            assert_eq!(ids(&store), vec!["b"]);
            delete_gate.send(Outcome::Accept).unwrap();
        };
        let (deleted, ()) = tokio::join!(store.delete("u1", "a"), scenario);
        deleted.unwrap();

        assert_eq!(ids(&store), vec!["b"]);
    }

    #[tokio::test]
    async fn test_non_collection_failure_settles_like_any_other() {
        let remote = Arc::new(FakeCollection::new());
        let gate = remote.hold(Call::Upsert("a".to_string()));
        let store = remote_store(&remote);
        drop(gate);

        store.create("u1", note("a", 1)).await.unwrap();

        assert!(store.state().notes.is_empty());
        let error = store.state().error.unwrap();
        assert_eq!(error.kind, OperationKind::Create);
        assert!(error.message.contains("held call dropped"));
    }

    #[test]
    fn test_in_flight_create_tracking() {
        let mut pending = InFlight::default();
        pending.begin_create("a");
        pending.begin_delete("a");
        pending.begin_delete("b");
        assert!(pending.finish_create("a"));
        assert!(!pending.finish_create("b"));
        pending.finish_delete("a");
        pending.finish_delete("b");

        pending.begin_create("c");
        pending.begin_delete("c");
        pending.begin_create("c");
        assert!(!pending.finish_create("c"));
        assert!(!pending.finish_create("c"));
        pending.finish_delete("c");
        assert!(pending.creates.is_empty());
        assert!(pending.deleted_creates.is_empty());
        assert!(pending.deletes.is_empty());
    }

    #[test]
    fn test_in_flight_delete_tracking() {
        let mut pending = InFlight::default();
        pending.begin_delete("a");
        pending.begin_delete("a");
        assert!(pending.is_deleting("a"));

        pending.finish_delete("a");
        assert!(pending.is_deleting("a"));
        pending.finish_delete("a");
        assert!(!pending.is_deleting("a"));

        // Re-creating an id ends its hidden state
        pending.begin_delete("b");
        pending.begin_create("b");
        assert!(!pending.is_deleting("b"));
        pending.finish_delete("b");
        assert!(pending.deletes.is_empty());
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::Load.to_string(), "load");
        assert_eq!(OperationKind::Create.to_string(), "create");
        assert_eq!(OperationKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_store_debug_names_collections() {
        let store = FlashcardStore::new().with_remote(Arc::new(FakeCollection::new()));
        let debug = format!("{store:?}");
        assert!(debug.contains("fake collection"));
        assert!(debug.contains("ClientIdPermanent"));
    }
}
