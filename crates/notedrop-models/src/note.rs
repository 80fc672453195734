//! Note records and the shapes they take on their way to the remote store.
//!
//! A [`Record`] is one unit of user content to persist. Its wire identifier
//! is a composite of the chat id and the message id, so editing a message
//! resubmits the same identifier and the remote upserts instead of creating
//! a duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A note captured from a chat message, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Chat the message came from, when known. Part of the wire identifier.
    pub chat_id: Option<i64>,

    /// Message identifier within the chat. Stable across edits.
    pub message_id: String,

    /// The note text.
    pub content: String,

    /// When the note was first submitted. Fixed for the lifetime of the record.
    pub created_at: DateTime<Utc>,

    /// When the note was last resubmitted. Advances on every edit.
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Creates a new record with both timestamps set to now.
    pub fn new(
        chat_id: Option<i64>,
        message_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            chat_id,
            message_id: message_id.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The identifier sent to the remote store.
    ///
    /// `"{chat_id}_{message_id}"` when the chat id is known, otherwise the
    /// bare message id. The remote upserts by this value, so the same message
    /// edited twice converges to a single stored note.
    pub fn wire_id(&self) -> String {
        match self.chat_id {
            Some(chat_id) => format!("{}_{}", chat_id, self.message_id),
            None => self.message_id.clone(),
        }
    }

    /// Replaces the content after an edit and advances `updated_at`.
    pub fn touch(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.updated_at = Utc::now();
    }
}

/// A record waiting in the offline queue for the backend to come back.
///
/// Created when a save cannot reach the remote, removed when a later sync
/// persists it. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    /// The record to persist.
    pub record: Record,

    /// When the record entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl PendingRecord {
    /// Wraps a record with the current enqueue time.
    pub fn new(record: Record) -> Self {
        Self {
            record,
            enqueued_at: Utc::now(),
        }
    }
}

/// A note as returned by the remote history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNote {
    /// Identifier assigned by the remote store.
    pub note_id: String,

    /// When the remote recorded the note.
    pub timestamp: DateTime<Utc>,

    /// The note text.
    pub text: String,
}

/// One row of the combined history view shown to the user.
///
/// Merges queued-but-unsynced records with the last snapshot fetched from the
/// remote. Display only; the offline queue remains the source of truth for
/// what still needs syncing.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// When the note was written (enqueue time for pending entries).
    pub timestamp: DateTime<Utc>,

    /// The note text.
    pub text: String,

    /// True when the entry is still waiting to be synced.
    pub pending: bool,
}
