//! Background task that owns the feedback store connection.
//!
//! All communication is via channels: `PersistRequest` in, `DeskEvent` out. A failed
//! request is reported and the loop carries on with the next one; it never touches
//! the desk's adjudication state.

use revdesk_core::{db, ReviewStatus};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_rusqlite::Connection;

use crate::event::DeskEvent;
use crate::persist::types::PersistRequest;

/// Spawns the persistence loop.
///
/// Runs until every `PersistRequest` sender has been dropped. Outcomes are sent on
/// `event_tx`; send errors are ignored because a dropped receiver only means nobody
/// is waiting for late results any more.
pub fn spawn_persist_worker(
    conn: Connection,
    mut rx: UnboundedReceiver<PersistRequest>,
    event_tx: UnboundedSender<DeskEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let event = handle_request(&conn, request).await;
            let _ = event_tx.send(event);
        }
        tracing::debug!("persistence channel closed; worker exiting");
    })
}

async fn handle_request(conn: &Connection, request: PersistRequest) -> DeskEvent {
    let review_id = request.payload.review_id.clone();
    match persist(conn, &request).await {
        Ok(status) => {
            tracing::info!(%review_id, status = status.as_str(), "feedback stored");
            DeskEvent::Persisted { review_id, status }
        }
        Err(e) => {
            tracing::warn!(%review_id, error = %e, "storing feedback failed");
            DeskEvent::PersistFailed { review_id, error: e.to_string() }
        }
    }
}

/// Saves the review row, then its feedback. Both are upserts, so a retry after a
/// partial failure is safe.
async fn persist(
    conn: &Connection,
    request: &PersistRequest,
) -> Result<ReviewStatus, tokio_rusqlite::Error> {
    db::save_review(conn, &request.review).await?;
    db::record_feedback(conn, &request.session.reviewer, &request.payload).await
}
