//! Core data models for Notedrop.
//!
//! This crate provides the fundamental data types shared by the sync adapter
//! and the bot frontend: note records, save outcomes, offline-queue entries,
//! and the shapes returned by the remote notes API.

pub mod note;
pub mod save;

// Re-export main types
pub use note::{HistoryEntry, PendingRecord, Record, RemoteNote};
pub use save::{SaveOutcome, SaveResult};
