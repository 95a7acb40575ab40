//! Event bus for the review desk.
//!
//! Results from the background persistence worker are normalised into a single
//! `DeskEvent` enum and sent over a tokio unbounded MPSC channel. The owner of the
//! [`crate::app::ReviewDesk`] receives from this channel and feeds each event to
//! `ReviewDesk::apply_event`.

use revdesk_core::ReviewStatus;
use tokio::sync::mpsc;

/// All events the desk can receive from background tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeskEvent {
    /// Feedback for a retired review was stored.
    Persisted { review_id: String, status: ReviewStatus },
    /// Storing feedback failed. The retired review keeps its payload for a retry.
    PersistFailed { review_id: String, error: String },
}

impl DeskEvent {
    pub fn review_id(&self) -> &str {
        match self {
            DeskEvent::Persisted { review_id, .. } | DeskEvent::PersistFailed { review_id, .. } => {
                review_id
            }
        }
    }
}

/// Holds the sender and receiver ends of the event channel.
///
/// The sender (`tx`) is cloned and handed to background tasks;
/// the receiver (`rx`) is owned by whoever drives the desk.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<DeskEvent>,
    pub rx: mpsc::UnboundedReceiver<DeskEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
