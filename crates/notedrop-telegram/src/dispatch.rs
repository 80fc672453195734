//! Routing for free-text messages.
//!
//! An ordered list of (predicate, action) pairs evaluated first-match-wins,
//! ending in a catch-all. Adding a new text behavior means adding a row, not
//! touching the handler.

/// Decides whether a route applies to the message text.
pub type Predicate = fn(&str) -> bool;

/// What to do with a free-text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAction {
    /// Health-check easter egg: reply "pong".
    Pong,
    /// Persist the text as a note.
    SaveNote,
}

/// One routing rule.
pub struct Route {
    pub matches: Predicate,
    pub action: TextAction,
}

fn is_ping(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("ping")
}

fn catch_all(_: &str) -> bool {
    true
}

/// Routing table, checked top to bottom.
const ROUTES: &[Route] = &[
    Route {
        matches: is_ping,
        action: TextAction::Pong,
    },
    Route {
        matches: catch_all,
        action: TextAction::SaveNote,
    },
];

/// Picks the action for a message text.
pub fn route_text(text: &str) -> TextAction {
    ROUTES
        .iter()
        .find(|route| (route.matches)(text))
        .map(|route| route.action)
        .unwrap_or(TextAction::SaveNote)
}
