//! The review desk: queue, per-review adjudication state, and retirement.
//!
//! `ReviewDesk` owns every queued review together with its section registry and
//! adjudication state. Each transition re-runs the completion check; a complete
//! review has its payload built, handed to the persistence worker, and is then
//! retired from the queue. Retired reviews stay readable but frozen until
//! [`ReviewDesk::prune_stored`] drops the ones whose feedback is stored.
//! No I/O happens here beyond sending on the persistence channel.

use std::collections::{HashMap, HashSet};

use revdesk_core::{
    build_payload, derive_disposition, ingest_batch, is_complete, parse_sections, BatchItem,
    Disposition, FeedbackPayload, Review, ReviewError, ReviewQueue, ReviewState, ReviewStatus,
    SectionRegistry, SectionVocabulary, Verdict,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{DeskError, DeskResult};
use crate::event::DeskEvent;
use crate::persist::types::{PersistRequest, SessionContext};

/// Registry and adjudication state of a review still in the queue.
#[derive(Debug, Clone)]
pub struct ActiveReview {
    pub registry: SectionRegistry,
    pub state: ReviewState,
}

/// Where a retired review's payload is in the persistence pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    InFlight,
    Stored(ReviewStatus),
    Failed(String),
}

/// A review that left the queue. Its state and payload never change again.
#[derive(Debug, Clone)]
pub struct RetiredReview {
    pub review: Review,
    pub state: ReviewState,
    pub payload: FeedbackPayload,
    pub persistence: Persistence,
}

/// Outcome of one adjudication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Sections are still unset.
    Pending { remaining: usize },
    /// Every actionable section is settled; the review was retired with this payload.
    Retired(FeedbackPayload),
}

pub struct ReviewDesk {
    vocabulary: SectionVocabulary,
    session: SessionContext,
    queue: ReviewQueue,
    active: HashMap<String, ActiveReview>,
    retired: HashMap<String, RetiredReview>,
    /// Ids of pruned retired reviews.
    pruned: HashSet<String>,
    persist_tx: UnboundedSender<PersistRequest>,
}

impl ReviewDesk {
    pub fn new(
        vocabulary: SectionVocabulary,
        session: SessionContext,
        persist_tx: UnboundedSender<PersistRequest>,
    ) -> Self {
        Self {
            vocabulary,
            session,
            queue: ReviewQueue::new(),
            active: HashMap::new(),
            retired: HashMap::new(),
            pruned: HashSet::new(),
            persist_tx,
        }
    }

    /// Parses `review`, computes its actionable sections, and appends it to the queue
    /// with every section unset. Returns the review id.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::DuplicateReview` if the id is queued or already retired.
    pub fn enqueue(&mut self, review: Review) -> DeskResult<String> {
        let id = review.id().to_owned();
        if self.is_retired(&id) {
            return Err(ReviewError::DuplicateReview(id).into());
        }
        let parsed = parse_sections(review.generated(), &self.vocabulary);
        let registry = SectionRegistry::compute(&review, &parsed, &self.vocabulary);
        let state = ReviewState::new(&id, &registry);
        self.queue.push(review)?;
        tracing::debug!(
            review_id = %id,
            sections = parsed.len(),
            actionable = registry.actionable().count(),
            "review queued"
        );
        self.active.insert(id.clone(), ActiveReview { registry, state });
        Ok(id)
    }

    /// Queues every item of a multi-file submission, in order.
    ///
    /// Each item gets its own result; a failure for one item (a duplicate id, say)
    /// leaves the others queued.
    pub fn enqueue_batch(&mut self, items: Vec<BatchItem>) -> Vec<DeskResult<String>> {
        ingest_batch(items)
            .into_iter()
            .map(|review| self.enqueue(review))
            .collect()
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn current(&self) -> Option<&Review> {
        self.queue.current()
    }

    pub fn next(&mut self) {
        self.queue.next();
    }

    pub fn previous(&mut self) {
        self.queue.previous();
    }

    pub fn active(&self, review_id: &str) -> Option<&ActiveReview> {
        self.active.get(review_id)
    }

    pub fn retired(&self, review_id: &str) -> Option<&RetiredReview> {
        self.retired.get(review_id)
    }

    /// The frozen adjudication state of a retired review.
    pub fn retired_state(&self, review_id: &str) -> Option<&ReviewState> {
        self.retired.get(review_id).map(|r| &r.state)
    }

    /// Completion of a queued review; `None` if it is not in the queue.
    pub fn is_complete(&self, review_id: &str) -> Option<bool> {
        self.active
            .get(review_id)
            .map(|a| is_complete(&a.registry, &a.state.snapshot()))
    }

    /// Records `verdict` for `section` of a queued review and re-checks completion.
    ///
    /// When the last unset section is settled the review is retired with a payload
    /// whose disposition follows the section verdicts.
    ///
    /// # Errors
    ///
    /// - `ReviewError::ReviewRetired` if the review was already retired.
    /// - `ReviewError::ReviewNotFound` if the id is unknown.
    /// - `ReviewError::InvalidSection` if the section is not actionable.
    /// - `DeskError::PersistenceClosed` if the payload could not be handed over; the
    ///   review then stays queued with the new verdict recorded.
    pub fn adjudicate(&mut self, review_id: &str, section: &str, verdict: Verdict) -> DeskResult<Progress> {
        let entry = self.active_mut(review_id)?;
        entry.state.transition(section, verdict)?;

        let snapshot = entry.state.snapshot();
        if !is_complete(&entry.registry, &snapshot) {
            return Ok(Progress::Pending { remaining: entry.state.remaining() });
        }
        let payload = build_payload(&entry.state, derive_disposition(&snapshot), &[] as &[&str], None);
        self.retire(review_id, payload.clone())?;
        Ok(Progress::Retired(payload))
    }

    /// Adjudicates a section of the focused review.
    ///
    /// # Errors
    ///
    /// Same as [`Self::adjudicate`]; `ReviewNotFound` with an empty id when the queue
    /// is empty.
    pub fn adjudicate_current(&mut self, section: &str, verdict: Verdict) -> DeskResult<Progress> {
        let id = self
            .queue
            .current()
            .map(|r| r.id().to_owned())
            .ok_or_else(|| ReviewError::ReviewNotFound(String::new()))?;
        self.adjudicate(&id, section, verdict)
    }

    /// Explicit overall feedback. Retires the review whatever its completion state;
    /// sections still unset are left out of the payload.
    ///
    /// # Errors
    ///
    /// - `ReviewError::MissingRejectionReason` for a `Negative` submission with no
    ///   reasons and no custom reason.
    /// - `ReviewRetired`, `ReviewNotFound`, `PersistenceClosed` as for
    ///   [`Self::adjudicate`].
    pub fn submit_feedback<S: AsRef<str>>(
        &mut self,
        review_id: &str,
        disposition: Disposition,
        reasons: &[S],
        custom_reason: Option<&str>,
    ) -> DeskResult<FeedbackPayload> {
        let entry = self.active_mut(review_id)?;
        let payload = build_payload(&entry.state, disposition, reasons, custom_reason);
        if disposition == Disposition::Negative && !payload.has_rejection_reason() {
            return Err(ReviewError::MissingRejectionReason.into());
        }
        self.retire(review_id, payload.clone())?;
        Ok(payload)
    }

    /// Records the outcome of a persistence attempt. Events for reviews the desk does
    /// not know are ignored.
    pub fn apply_event(&mut self, event: DeskEvent) {
        let Some(retired) = self.retired.get_mut(event.review_id()) else {
            tracing::debug!(review_id = event.review_id(), "ignoring event for unknown review");
            return;
        };
        retired.persistence = match event {
            DeskEvent::Persisted { status, .. } => Persistence::Stored(status),
            DeskEvent::PersistFailed { error, .. } => Persistence::Failed(error),
        };
    }

    /// Re-sends the payload built at retirement for a review whose persistence failed.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::NothingToRetry` unless the last attempt failed, and
    /// `DeskError::PersistenceClosed` if the worker is gone.
    pub fn retry(&mut self, review_id: &str) -> DeskResult<()> {
        let retired = match self.retired.get_mut(review_id) {
            Some(r) if matches!(r.persistence, Persistence::Failed(_)) => r,
            _ => return Err(DeskError::NothingToRetry(review_id.to_owned())),
        };
        self.persist_tx
            .send(PersistRequest {
                session: self.session.clone(),
                review: retired.review.clone(),
                payload: retired.payload.clone(),
            })
            .map_err(|_| DeskError::PersistenceClosed)?;
        retired.persistence = Persistence::InFlight;
        tracing::info!(%review_id, "feedback resent");
        Ok(())
    }

    /// Reviews whose last persistence attempt failed.
    pub fn failed_persistence(&self) -> impl Iterator<Item = &RetiredReview> {
        self.retired
            .values()
            .filter(|r| matches!(r.persistence, Persistence::Failed(_)))
    }

    /// Drops retired reviews whose feedback is confirmed stored and returns how many
    /// were dropped. Their ids stay known, so they still cannot be adjudicated or
    /// queued again.
    pub fn prune_stored(&mut self) -> usize {
        let stored: Vec<String> = self
            .retired
            .iter()
            .filter(|(_, r)| matches!(r.persistence, Persistence::Stored(_)))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stored {
            self.retired.remove(id);
        }
        let count = stored.len();
        tracing::debug!(pruned = count, "pruned stored reviews");
        self.pruned.extend(stored);
        count
    }

    fn is_retired(&self, review_id: &str) -> bool {
        self.retired.contains_key(review_id) || self.pruned.contains(review_id)
    }

    fn active_mut(&mut self, review_id: &str) -> DeskResult<&mut ActiveReview> {
        if self.is_retired(review_id) {
            return Err(ReviewError::ReviewRetired(review_id.to_owned()).into());
        }
        self.active
            .get_mut(review_id)
            .ok_or_else(|| ReviewError::ReviewNotFound(review_id.to_owned()).into())
    }

    /// Hands `payload` to the persistence worker, then removes the review from the
    /// queue and freezes its state.
    fn retire(&mut self, review_id: &str, payload: FeedbackPayload) -> DeskResult<()> {
        let review = self
            .queue
            .get(review_id)
            .cloned()
            .ok_or_else(|| ReviewError::ReviewNotFound(review_id.to_owned()))?;
        self.persist_tx
            .send(PersistRequest {
                session: self.session.clone(),
                review: review.clone(),
                payload: payload.clone(),
            })
            .map_err(|_| DeskError::PersistenceClosed)?;

        self.queue.remove(review_id);
        let active = self
            .active
            .remove(review_id)
            .ok_or_else(|| ReviewError::ReviewNotFound(review_id.to_owned()))?;
        tracing::info!(
            %review_id,
            disposition = payload.feedback.as_str(),
            sections = payload.section_feedback.len(),
            "review retired"
        );
        self.retired.insert(
            review_id.to_owned(),
            RetiredReview {
                review,
                state: active.state,
                payload,
                persistence: Persistence::InFlight,
            },
        );
        Ok(())
    }
}
