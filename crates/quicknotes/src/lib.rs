//! `quicknotes` - Flashcard notes with optimistic sync
//!
//! This library provides the flashcard store, the collections it keeps in
//! step with (an HTTP facade and a local `SQLite` cache), AI summarization of
//! text into cards, and the configuration and logging used by the `qnotes`
//! binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod note;
pub mod remote;
pub mod session;
pub mod storage;
pub mod store;
pub mod summarizer;

pub use collection::NoteCollection;
pub use config::{Config, IdPolicy};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use note::Note;
pub use remote::HttpCollection;
pub use session::{IdentityProvider, Session, StaticIdentity};
pub use storage::{CacheStats, LocalCache};
pub use store::{FlashcardStore, OperationError, OperationKind, StoreState};
pub use summarizer::{HttpSummarizer, Summarizer, Summary};
