//! Outcomes of a save against the remote notes API.

use serde::{Deserialize, Serialize};

/// What the remote did with the submitted note.
///
/// The remote decides by looking up the wire identifier: unseen identifiers
/// are created, known ones are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    /// A new note was stored.
    Created,
    /// An existing note with the same wire identifier was overwritten.
    Updated,
}

impl SaveOutcome {
    /// Parses the wire string the API returns in its `status` field.
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "created" => Some(SaveOutcome::Created),
            "updated" => Some(SaveOutcome::Updated),
            _ => None,
        }
    }
}

/// The result of one successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResult {
    /// Whether the note was created or updated.
    pub outcome: SaveOutcome,

    /// Identifier the remote store assigned to the note.
    pub note_id: String,

    /// The wire identifier that was submitted, echoed back.
    pub message_id: String,
}
