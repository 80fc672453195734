//! Resilient save adapter for the Notedrop notes API.
//!
//! This crate owns everything between "the user sent a note" and "the note is
//! durably stored remotely":
//!
//! - A [`NoteStore`] trait describing the remote store, with [`ApiStore`] as
//!   the HTTP implementation. Saves are idempotent upserts keyed by the wire
//!   identifier, retried with exponential backoff when the failure looks
//!   transient.
//! - An [`OfflineBuffer`] that queues records in memory while the backend is
//!   unreachable and drains them once it recovers.
//! - An [`AvailabilityMonitor`] that probes the backend on a fixed interval,
//!   tracks the availability state, and triggers a buffer drain when the
//!   backend comes back.
//!
//! The bot frontend only sees [`SyncError`] values it can log and a small set
//! of state accessors; nothing in here talks to the chat transport.

pub mod backoff;
pub mod buffer;
pub mod error;
pub mod monitor;
pub mod retry;
pub mod store;

pub use backoff::BackoffPolicy;
pub use buffer::{DrainReport, OfflineBuffer};
pub use error::{Result, Retryability, SyncError};
pub use monitor::{
    Availability, AvailabilityMonitor, AvailabilityState, MonitorConfig, StatusChange,
};
pub use retry::{run_with_retry, RetryConfig};
pub use store::{ApiStore, NoteStore, StoreConfig};
