//! In-memory queue for notes that could not reach the backend.
//!
//! While the backend is down, saves land here instead of being lost. A later
//! drain (triggered by the availability monitor or the user's manual sync)
//! replays them against the store. The buffer also caches the last history
//! snapshot fetched from the remote so the user can still see a combined
//! view while offline.

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use notedrop_models::{HistoryEntry, PendingRecord, Record, RemoteNote};

use crate::store::NoteStore;

/// Outcome of one drain pass over the pending queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records persisted and removed from the queue.
    pub synced: usize,
    /// Records that failed and stay queued for a later drain.
    pub failed: usize,
}

impl DrainReport {
    /// True when nothing was left behind.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Offline queue plus last-known remote snapshot.
#[derive(Default)]
pub struct OfflineBuffer {
    /// Records waiting to be persisted, in enqueue order.
    pending: Mutex<Vec<PendingRecord>>,
    /// Most recent history fetched from the backend.
    last_known: RwLock<Vec<RemoteNote>>,
}

impl OfflineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the pending queue.
    ///
    /// No deduplication by wire identifier: a second edit queued before the
    /// first drains produces two entries, and the remote's upsert collapses
    /// them at sync time.
    pub async fn enqueue(&self, record: Record) {
        let mut pending = self.pending.lock().await;
        pending.push(PendingRecord::new(record));
        debug!(pending = pending.len(), "record queued for later sync");
    }

    /// Number of records waiting to sync.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// A copy of the pending queue, in enqueue order.
    pub async fn pending_snapshot(&self) -> Vec<PendingRecord> {
        self.pending.lock().await.clone()
    }

    /// Replaces the cached remote snapshot.
    pub async fn update_last_known(&self, notes: Vec<RemoteNote>) {
        let mut last_known = self.last_known.write().await;
        debug!(count = notes.len(), "updated last-known remote notes");
        *last_known = notes;
    }

    /// Number of notes in the cached remote snapshot.
    pub async fn last_known_count(&self) -> usize {
        self.last_known.read().await.len()
    }

    /// Drops all pending records, returning how many were discarded.
    pub async fn clear_pending(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        pending.clear();
        debug!(count, "cleared pending records");
        count
    }

    /// Merges pending records with the cached remote snapshot.
    ///
    /// Newest first, truncated to `limit`. Display only.
    pub async fn combined_view(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = {
            let pending = self.pending.lock().await;
            pending
                .iter()
                .map(|p| HistoryEntry {
                    timestamp: p.enqueued_at,
                    text: p.record.content.clone(),
                    pending: true,
                })
                .collect()
        };

        {
            let last_known = self.last_known.read().await;
            entries.extend(last_known.iter().map(|n| HistoryEntry {
                timestamp: n.timestamp,
                text: n.text.clone(),
                pending: false,
            }));
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        entries
    }

    /// Replays pending records against the store.
    ///
    /// Iterates over a snapshot so records enqueued mid-drain are untouched
    /// until the next pass. Each success removes exactly the drained entry
    /// from the live queue (membership is re-checked, so overlapping drains
    /// stay idempotent); each failure leaves the entry where it is.
    pub async fn drain<S>(&self, store: &S) -> DrainReport
    where
        S: NoteStore + ?Sized,
    {
        let snapshot = self.pending_snapshot().await;
        if snapshot.is_empty() {
            return DrainReport::default();
        }

        debug!(count = snapshot.len(), "draining pending records");
        let mut report = DrainReport::default();

        for entry in snapshot {
            match store.save_note(&entry.record).await {
                Ok(result) => {
                    let mut pending = self.pending.lock().await;
                    if let Some(pos) = pending.iter().position(|p| *p == entry) {
                        pending.remove(pos);
                    }
                    report.synced += 1;
                    debug!(
                        message_id = %result.message_id,
                        outcome = ?result.outcome,
                        "synced pending record"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        message_id = %entry.record.wire_id(),
                        error = %e,
                        "failed to sync pending record, keeping it queued"
                    );
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;

    use notedrop_models::{SaveOutcome, SaveResult};

    use crate::error::{Result, SyncError};

    /// Store stub whose saves can be switched between success and failure.
    struct FakeStore {
        up: AtomicBool,
        saved: Mutex<Vec<String>>,
        // Enqueued into this buffer on the first save, to simulate a user
        // submitting while a drain is running.
        inject_into: Mutex<Option<(Arc<OfflineBuffer>, Record)>>,
    }

    impl FakeStore {
        fn new(up: bool) -> Self {
            Self {
                up: AtomicBool::new(up),
                saved: Mutex::new(Vec::new()),
                inject_into: Mutex::new(None),
            }
        }

        fn set_up(&self, up: bool) {
            self.up.store(up, Ordering::SeqCst);
        }

        async fn saved_ids(&self) -> Vec<String> {
            self.saved.lock().await.clone()
        }
    }

    #[async_trait]
    impl NoteStore for FakeStore {
        async fn save_note(&self, record: &Record) -> Result<SaveResult> {
            if let Some((buffer, injected)) = self.inject_into.lock().await.take() {
                buffer.enqueue(injected).await;
            }
            if !self.up.load(Ordering::SeqCst) {
                return Err(SyncError::ServerUnavailable { status: 503 });
            }
            let wire_id = record.wire_id();
            self.saved.lock().await.push(wire_id.clone());
            Ok(SaveResult {
                outcome: SaveOutcome::Created,
                note_id: format!("n-{wire_id}"),
                message_id: wire_id,
            })
        }

        async fn fetch_notes(&self, _limit: usize) -> Result<Vec<RemoteNote>> {
            if !self.up.load(Ordering::SeqCst) {
                return Err(SyncError::Timeout);
            }
            Ok(Vec::new())
        }
    }

    fn record(message_id: &str, content: &str) -> Record {
        Record::new(Some(7), message_id, content)
    }

    #[tokio::test]
    async fn test_drain_persists_in_enqueue_order() {
        let buffer = OfflineBuffer::new();
        let store = FakeStore::new(true);

        buffer.enqueue(record("1", "first")).await;
        buffer.enqueue(record("2", "second")).await;

        let report = buffer.drain(&store).await;
        assert_eq!(report, DrainReport { synced: 2, failed: 0 });
        assert!(report.is_clean());
        assert_eq!(buffer.pending_count().await, 0);
        assert_eq!(store.saved_ids().await, vec!["7_1", "7_2"]);
    }

    #[tokio::test]
    async fn test_drain_is_idempotent() {
        let buffer = OfflineBuffer::new();
        let store = FakeStore::new(true);

        buffer.enqueue(record("1", "only")).await;
        let first = buffer.drain(&store).await;
        assert_eq!(first.synced, 1);

        let second = buffer.drain(&store).await;
        assert_eq!(second, DrainReport::default());
        assert_eq!(store.saved_ids().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_records_stay_queued() {
        let buffer = OfflineBuffer::new();
        let store = FakeStore::new(false);

        buffer.enqueue(record("1", "stuck")).await;
        let report = buffer.drain(&store).await;
        assert_eq!(report, DrainReport { synced: 0, failed: 1 });
        assert_eq!(buffer.pending_count().await, 1);

        // Backend comes back, the same record drains on the next pass
        store.set_up(true);
        let report = buffer.drain(&store).await;
        assert_eq!(report, DrainReport { synced: 1, failed: 0 });
        assert_eq!(buffer.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_no_dedup_for_repeated_wire_id() {
        let buffer = OfflineBuffer::new();
        let store = FakeStore::new(true);

        buffer.enqueue(record("1", "draft")).await;
        buffer.enqueue(record("1", "final")).await;
        assert_eq!(buffer.pending_count().await, 2);

        let report = buffer.drain(&store).await;
        assert_eq!(report.synced, 2);
        // Both replays hit the remote; its upsert collapses them
        assert_eq!(store.saved_ids().await, vec!["7_1", "7_1"]);
    }

    #[tokio::test]
    async fn test_enqueue_during_drain_survives_for_next_pass() {
        let buffer = Arc::new(OfflineBuffer::new());
        let store = FakeStore::new(true);

        buffer.enqueue(record("1", "before drain")).await;
        *store.inject_into.lock().await =
            Some((Arc::clone(&buffer), record("2", "during drain")));

        let report = buffer.drain(&store).await;
        assert_eq!(report.synced, 1);

        // The mid-drain record was not touched by the snapshot iteration
        let remaining = buffer.pending_snapshot().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].record.message_id, "2");
    }

    #[tokio::test]
    async fn test_combined_view_merges_and_sorts() {
        let buffer = OfflineBuffer::new();

        let now = Utc::now();
        buffer
            .update_last_known(vec![
                RemoteNote {
                    note_id: "n-1".to_string(),
                    timestamp: now - chrono::Duration::minutes(10),
                    text: "older remote".to_string(),
                },
                RemoteNote {
                    note_id: "n-2".to_string(),
                    timestamp: now - chrono::Duration::minutes(5),
                    text: "newer remote".to_string(),
                },
            ])
            .await;
        buffer.enqueue(record("1", "pending note")).await;

        let view = buffer.combined_view(5).await;
        assert_eq!(view.len(), 3);
        assert!(view[0].pending);
        assert_eq!(view[0].text, "pending note");
        assert_eq!(view[1].text, "newer remote");
        assert_eq!(view[2].text, "older remote");
    }

    #[tokio::test]
    async fn test_combined_view_truncates_to_limit() {
        let buffer = OfflineBuffer::new();
        for i in 0..10 {
            buffer.enqueue(record(&i.to_string(), "note")).await;
        }
        assert_eq!(buffer.combined_view(4).await.len(), 4);
    }

    #[tokio::test]
    async fn test_clear_pending_reports_dropped_count() {
        let buffer = OfflineBuffer::new();
        buffer.enqueue(record("1", "a")).await;
        buffer.enqueue(record("2", "b")).await;

        assert_eq!(buffer.clear_pending().await, 2);
        assert_eq!(buffer.pending_count().await, 0);
        assert_eq!(buffer.clear_pending().await, 0);
    }
}
