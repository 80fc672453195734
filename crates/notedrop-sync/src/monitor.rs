//! Periodic backend liveness probe and recovery-driven sync.
//!
//! The monitor owns the availability state: it probes the backend on a fixed
//! interval with a cheap bounded history fetch, records the result, and on
//! every flap publishes a [`StatusChange`] for the frontend to relay. When
//! the backend transitions back to available, the monitor drains the offline
//! buffer exactly once.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, sleep};
use tracing::{debug, info};

use crate::buffer::{DrainReport, OfflineBuffer};
use crate::store::NoteStore;

/// What the monitor currently believes about the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No probe has completed yet. Treated as unavailable by callers.
    Unknown,
    /// The last probe succeeded.
    Available,
    /// The last probe failed.
    Unavailable,
}

/// Shared availability flag plus the time of the last probe.
///
/// Mutated only by the monitor; everything else reads.
#[derive(Default)]
pub struct AvailabilityState {
    inner: RwLock<StateInner>,
}

#[derive(Default)]
struct StateInner {
    availability: Option<Availability>,
    last_checked: Option<DateTime<Utc>>,
}

impl AvailabilityState {
    /// Creates a state with no probe result yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current belief about the backend.
    pub async fn availability(&self) -> Availability {
        self.inner
            .read()
            .await
            .availability
            .unwrap_or(Availability::Unknown)
    }

    /// True only when the last probe succeeded.
    pub async fn is_available(&self) -> bool {
        self.availability().await == Availability::Available
    }

    /// When the last probe completed, if ever.
    pub async fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_checked
    }

    /// Records a probe result and returns the previous belief.
    pub(crate) async fn record(&self, available: bool) -> Availability {
        let mut inner = self.inner.write().await;
        let previous = inner.availability.unwrap_or(Availability::Unknown);
        inner.availability = Some(if available {
            Availability::Available
        } else {
            Availability::Unavailable
        });
        inner.last_checked = Some(Utc::now());
        previous
    }
}

/// Published once per availability flap.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// The new state after the flap.
    pub now_available: bool,
    /// Result of the recovery drain, set only on transitions to available.
    pub drained: Option<DrainReport>,
}

/// Timing configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between probes.
    pub interval: Duration,
    /// Delay before the first probe.
    pub warmup: Duration,
    /// History fetch size used as the liveness check.
    pub probe_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            warmup: Duration::from_secs(10),
            probe_limit: 1,
        }
    }
}

/// Probes the backend and reconciles the offline buffer on recovery.
pub struct AvailabilityMonitor<S> {
    store: Arc<S>,
    buffer: Arc<OfflineBuffer>,
    state: Arc<AvailabilityState>,
    config: MonitorConfig,
    events: mpsc::Sender<StatusChange>,
}

impl<S: NoteStore> AvailabilityMonitor<S> {
    /// Creates a monitor and the receiving end of its flap events.
    pub fn new(
        store: Arc<S>,
        buffer: Arc<OfflineBuffer>,
        state: Arc<AvailabilityState>,
        config: MonitorConfig,
    ) -> (Self, mpsc::Receiver<StatusChange>) {
        let (events, receiver) = mpsc::channel(16);
        (
            Self {
                store,
                buffer,
                state,
                config,
                events,
            },
            receiver,
        )
    }

    /// One liveness check: a bounded history fetch, pass or fail.
    ///
    /// No internal retry; a failed probe simply waits for the next interval.
    pub async fn probe(&self) -> bool {
        match self.store.fetch_notes(self.config.probe_limit).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "availability probe failed");
                false
            }
        }
    }

    /// One monitor cycle: probe, record, and on a flap drain and notify.
    ///
    /// Returns the change when the availability flipped, `None` otherwise.
    pub async fn tick(&self) -> Option<StatusChange> {
        let available = self.probe().await;
        let previous = self.state.record(available).await;

        let current = if available {
            Availability::Available
        } else {
            Availability::Unavailable
        };
        if previous == current {
            return None;
        }

        info!(available, "backend availability changed");
        let drained = if available {
            let report = self.buffer.drain(self.store.as_ref()).await;
            info!(synced = report.synced, failed = report.failed, "recovery sync finished");
            Some(report)
        } else {
            None
        };

        let change = StatusChange {
            now_available: available,
            drained,
        };
        // Flap events are advisory; a slow or absent listener must not stall
        // the probe loop.
        if let Err(e) = self.events.try_send(change.clone()) {
            debug!(error = %e, "dropped availability event");
        }
        Some(change)
    }

    /// Runs the probe loop forever. Spawn this on the runtime.
    pub async fn run(self) {
        sleep(self.config.warmup).await;
        let mut ticker = interval(self.config.interval);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use notedrop_models::{Record, RemoteNote, SaveOutcome, SaveResult};

    use crate::error::{Result, SyncError};

    struct FlakyStore {
        up: AtomicBool,
        saved: Mutex<Vec<String>>,
    }

    impl FlakyStore {
        fn new(up: bool) -> Self {
            Self {
                up: AtomicBool::new(up),
                saved: Mutex::new(Vec::new()),
            }
        }

        fn set_up(&self, up: bool) {
            self.up.store(up, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl NoteStore for FlakyStore {
        async fn save_note(&self, record: &Record) -> Result<SaveResult> {
            if !self.up.load(Ordering::SeqCst) {
                return Err(SyncError::Connection("refused".to_string()));
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

    fn monitor_with(
        up: bool,
    ) -> (
        AvailabilityMonitor<FlakyStore>,
        mpsc::Receiver<StatusChange>,
        Arc<FlakyStore>,
        Arc<OfflineBuffer>,
        Arc<AvailabilityState>,
    ) {
        let store = Arc::new(FlakyStore::new(up));
        let buffer = Arc::new(OfflineBuffer::new());
        let state = Arc::new(AvailabilityState::new());
        let (monitor, events) = AvailabilityMonitor::new(
            Arc::clone(&store),
            Arc::clone(&buffer),
            Arc::clone(&state),
            MonitorConfig::default(),
        );
        (monitor, events, store, buffer, state)
    }

    #[tokio::test]
    async fn test_first_successful_probe_reports_available() {
        let (monitor, mut events, _store, _buffer, state) = monitor_with(true);

        let change = monitor.tick().await.expect("first probe always flaps");
        assert!(change.now_available);
        assert_eq!(change.drained, Some(DrainReport::default()));
        assert!(state.is_available().await);
        assert!(state.last_checked().await.is_some());

        let published = events.recv().await.unwrap();
        assert!(published.now_available);
    }

    #[tokio::test]
    async fn test_first_failed_probe_reports_unavailable() {
        let (monitor, mut events, _store, _buffer, state) = monitor_with(false);

        let change = monitor.tick().await.expect("first probe always flaps");
        assert!(!change.now_available);
        assert!(change.drained.is_none());
        assert_eq!(state.availability().await, Availability::Unavailable);

        let published = events.recv().await.unwrap();
        assert!(!published.now_available);
    }

    #[tokio::test]
    async fn test_steady_state_emits_nothing() {
        let (monitor, mut events, _store, _buffer, _state) = monitor_with(true);

        assert!(monitor.tick().await.is_some());
        assert!(monitor.tick().await.is_none());
        assert!(monitor.tick().await.is_none());

        // Only the first flap was published
        assert!(events.recv().await.is_some());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_recovery_drains_pending_exactly_once() {
        let (monitor, _events, store, buffer, state) = monitor_with(false);

        // Backend is down; a record gets queued
        assert!(monitor.tick().await.is_some());
        buffer
            .enqueue(Record::new(Some(7), "1", "queued while down"))
            .await;
        assert!(!state.is_available().await);

        // Backend recovers: one flap, one drain, queue empties
        store.set_up(true);
        let change = monitor.tick().await.expect("recovery flaps");
        assert!(change.now_available);
        assert_eq!(change.drained, Some(DrainReport { synced: 1, failed: 0 }));
        assert_eq!(buffer.pending_count().await, 0);
        assert_eq!(*store.saved.lock().await, vec!["7_1"]);

        // Steady available: no further drain
        buffer
            .enqueue(Record::new(Some(7), "2", "queued while up"))
            .await;
        assert!(monitor.tick().await.is_none());
        assert_eq!(buffer.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_flap_down_then_up_notifies_both_ways() {
        let (monitor, mut events, store, _buffer, _state) = monitor_with(true);

        assert!(monitor.tick().await.is_some());
        store.set_up(false);
        let down = monitor.tick().await.unwrap();
        assert!(!down.now_available);
        store.set_up(true);
        let up = monitor.tick().await.unwrap();
        assert!(up.now_available);

        let mut seen = Vec::new();
        while let Ok(change) = events.try_recv() {
            seen.push(change.now_available);
        }
        assert_eq!(seen, vec![true, false, true]);
    }
}
