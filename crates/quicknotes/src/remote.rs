//! HTTP remote collection.
//!
//! Talks to the CRUD facade in front of the document database:
//!
//! | Operation | Request                                   | Success       |
//! |-----------|-------------------------------------------|---------------|
//! | list      | `GET /api/flashcards?userId=U`            | 200 + array   |
//! | upsert    | `POST /api/flashcards` + record           | 200/201 + record |
//! | delete    | `DELETE /api/flashcards/{id}?userId=U`    | 200/204/404   |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collection::NoteCollection;
use crate::config::IdPolicy;
use crate::error::{Error, Result};
use crate::note::Note;

const COLLECTION_NAME: &str = "remote collection";
const FLASHCARDS_PATH: &str = "api/flashcards";

/// Upper bound on how much of an error body ends up in a message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Record shape sent on upsert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    user_id: &'a str,
    title: &'a str,
    content: &'a str,
    created_at: i64,
}

/// Record shape returned by the facade. The id may come back as `_id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecord {
    #[serde(alias = "_id")]
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    created_at: Option<i64>,
}

/// [`NoteCollection`] backed by the HTTP CRUD facade.
#[derive(Debug, Clone)]
pub struct HttpCollection {
    client: Client,
    base_url: String,
    id_policy: IdPolicy,
}

impl HttpCollection {
    /// Create a client for the facade at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteUnavailable`] when the URL is not http(s) or
    /// the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, id_policy: IdPolicy) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::unavailable(
                COLLECTION_NAME,
                format!("base URL must start with http:// or https://, got `{base_url}`"),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::unavailable(COLLECTION_NAME, e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            id_policy,
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/{FLASHCARDS_PATH}", self.base_url)
    }

    fn note_url(&self, note_id: &str) -> String {
        format!("{}/{FLASHCARDS_PATH}/{note_id}", self.base_url)
    }

    fn transport_error(err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                operation: format!("{COLLECTION_NAME} request"),
            }
        } else {
            Error::unavailable(COLLECTION_NAME, err.to_string())
        }
    }

    /// Turn a non-success status into [`Error::RemoteRejected`].
    async fn reject(response: Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = summarize_body(&body, status);
        Error::rejected(COLLECTION_NAME, status.as_u16(), message)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::transport_error(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| Error::malformed(COLLECTION_NAME, e.to_string()))
    }
}

#[async_trait]
impl NoteCollection for HttpCollection {
    fn name(&self) -> &'static str {
        COLLECTION_NAME
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Note>> {
        trace!("GET {} for {}", self.collection_url(), user_id);
        let response = self
            .client
            .get(self.collection_url())
            .query(&[("userId", user_id)])
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let records: Vec<RemoteRecord> = Self::decode(response).await?;
        let notes = records
            .into_iter()
            .map(|record| record_to_note(record, None))
            .collect::<Result<Vec<_>>>()?;
        debug!("Fetched {} notes from {}", notes.len(), self.base_url);
        Ok(notes)
    }

    async fn upsert(&self, user_id: &str, note: &Note) -> Result<Note> {
        let body = UpsertRequest {
            id: match self.id_policy {
                IdPolicy::ClientIdPermanent => Some(note.id.as_str()),
                IdPolicy::ServerIdWins => None,
            },
            user_id,
            title: &note.title,
            content: &note.content,
            created_at: note.created_at,
        };

        trace!("POST {} note {}", self.collection_url(), note.id);
        let response = self
            .client
            .post(self.collection_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::reject(response).await);
        }

        let record: RemoteRecord = Self::decode(response).await?;
        record_to_note(record, Some(note))
    }

    async fn delete(&self, user_id: &str, note_id: &str) -> Result<()> {
        trace!("DELETE {}", self.note_url(note_id));
        let response = self
            .client
            .delete(self.note_url(note_id))
            .query(&[("userId", user_id)])
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::reject(response).await)
    }
}

/// Build a note from a facade record.
///
/// On upsert the sent note fills in any field the facade leaves out of its
/// echo. On list every field except `content` is required.
fn record_to_note(record: RemoteRecord, sent: Option<&Note>) -> Result<Note> {
    let missing = |field: &str| Error::malformed(COLLECTION_NAME, format!("record without `{field}`"));

    let id = record
        .id
        .filter(|id| !id.is_empty())
        .or_else(|| sent.map(|n| n.id.clone()))
        .ok_or_else(|| missing("id"))?;
    let title = record
        .title
        .or_else(|| sent.map(|n| n.title.clone()))
        .ok_or_else(|| missing("title"))?;
    let content = record
        .content
        .or_else(|| sent.map(|n| n.content.clone()))
        .unwrap_or_default();
    let created_at = record
        .created_at
        .or_else(|| sent.map(|n| n.created_at))
        .ok_or_else(|| missing("createdAt"))?;

    Ok(Note {
        id,
        title,
        content,
        created_at,
    })
}

/// Single-line, length-capped description of an error response.
fn summarize_body(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    // The facade reports failures as {"error": "..."}
    let text = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| trimmed.to_string());

    let single_line = text.replace(['\n', '\r'], " ");
    let mut capped: String = single_line.chars().take(MAX_ERROR_BODY_CHARS).collect();
    if single_line.chars().count() > MAX_ERROR_BODY_CHARS {
        capped.push_str("...");
    }
    capped
}
