//! Owned messages for the persistence worker.
//!
//! Everything here is owned and `Send` so it can cross into the worker task.

use revdesk_core::{FeedbackPayload, Review};

/// Who is submitting feedback. Passed explicitly to whatever persists it; the
/// engine itself never sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub reviewer: String,
}

impl SessionContext {
    pub fn new(reviewer: impl Into<String>) -> Self {
        Self { reviewer: reviewer.into() }
    }
}

/// One retired review to store, with the payload built at retirement time.
///
/// Retries resend the same request; the payload is never rebuilt from state.
#[derive(Debug, Clone)]
pub struct PersistRequest {
    pub session: SessionContext,
    pub review: Review,
    pub payload: FeedbackPayload,
}
