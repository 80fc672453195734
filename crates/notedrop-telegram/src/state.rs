//! Shared state for the Telegram bot.
//!
//! `BotState` is the single object handlers see. It owns the caller side of
//! the save flow: try the remote first, fall back to the offline queue when
//! the failure is transient, and never let an adapter error escape to the
//! chat loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use notedrop_models::{HistoryEntry, Record, SaveResult};
use notedrop_sync::{
    Availability, AvailabilityState, DrainReport, NoteStore, OfflineBuffer, SyncError,
};

use crate::config::BotConfig;

/// What happened to a submitted note.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveDisposition {
    /// The remote stored it.
    Saved(SaveResult),
    /// The remote was unreachable; the note is queued for later sync.
    Buffered,
    /// The remote rejected it in a way retrying cannot fix. Logged, dropped.
    Rejected,
}

/// Snapshot of the offline machinery, for the `/memory` command.
#[derive(Debug, Clone)]
pub struct MemoryStatus {
    pub availability: Availability,
    pub last_checked: Option<DateTime<Utc>>,
    pub pending: usize,
    pub cached: usize,
}

/// Shared state for the Telegram bot, accessible across all handlers.
pub struct BotState {
    /// Remote notes store.
    store: Arc<dyn NoteStore>,
    /// Offline queue and remote snapshot cache.
    buffer: Arc<OfflineBuffer>,
    /// Backend availability, maintained by the monitor.
    availability: Arc<AvailabilityState>,
    /// Bot settings.
    config: BotConfig,
}

impl BotState {
    /// Creates the shared state.
    pub fn new(
        store: Arc<dyn NoteStore>,
        buffer: Arc<OfflineBuffer>,
        availability: Arc<AvailabilityState>,
        config: BotConfig,
    ) -> Self {
        Self {
            store,
            buffer,
            availability,
            config,
        }
    }

    /// Bot settings.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Whether the bot serves this chat.
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.config.is_allowed(chat_id)
    }

    /// Whether the backend looked reachable at the last probe.
    pub async fn is_available(&self) -> bool {
        self.availability.is_available().await
    }

    /// Persists a note, queueing it when the backend is unreachable.
    ///
    /// Known-down backends skip the doomed request entirely. A transient
    /// failure (timeout, connection trouble, 5xx, retries exhausted) queues
    /// the record; a permanent rejection is logged and dropped so it cannot
    /// poison every future drain.
    pub async fn submit(&self, record: Record) -> SaveDisposition {
        if !self.is_available().await {
            debug!(message_id = %record.wire_id(), "backend not available, queueing note");
            self.buffer.enqueue(record).await;
            return SaveDisposition::Buffered;
        }

        match self.store.save_note(&record).await {
            Ok(result) => SaveDisposition::Saved(result),
            Err(e) if should_buffer(&e) => {
                warn!(
                    message_id = %record.wire_id(),
                    error = %e,
                    "save failed transiently, queueing note"
                );
                self.buffer.enqueue(record).await;
                SaveDisposition::Buffered
            }
            Err(e) => {
                error!(
                    message_id = %record.wire_id(),
                    error = %e,
                    "save rejected permanently, dropping note"
                );
                SaveDisposition::Rejected
            }
        }
    }

    /// Recent notes: remote history when reachable, merged with the queue.
    ///
    /// A failed fetch falls back to the cached snapshot rather than erroring
    /// the command.
    pub async fn history(&self, limit: usize) -> (Vec<HistoryEntry>, usize) {
        if self.is_available().await {
            match self.store.fetch_notes(limit).await {
                Ok(notes) => self.buffer.update_last_known(notes).await,
                Err(e) => {
                    warn!(error = %e, "history fetch failed, showing cached notes");
                }
            }
        }

        let entries = self.buffer.combined_view(limit).await;
        let pending = self.buffer.pending_count().await;
        (entries, pending)
    }

    /// Number of notes waiting to sync.
    pub async fn pending_count(&self) -> usize {
        self.buffer.pending_count().await
    }

    /// Pushes queued notes to the backend now.
    pub async fn sync_now(&self) -> DrainReport {
        self.buffer.drain(self.store.as_ref()).await
    }

    /// Discards queued notes, returning how many were dropped.
    pub async fn flush(&self) -> usize {
        self.buffer.clear_pending().await
    }

    /// Snapshot for the `/memory` command.
    pub async fn memory_status(&self) -> MemoryStatus {
        MemoryStatus {
            availability: self.availability.availability().await,
            last_checked: self.availability.last_checked().await,
            pending: self.buffer.pending_count().await,
            cached: self.buffer.last_known_count().await,
        }
    }
}

/// Transient failures are worth keeping; permanent rejections are not.
fn should_buffer(err: &SyncError) -> bool {
    matches!(err, SyncError::RetriesExhausted { .. }) || err.is_retryable()
}
