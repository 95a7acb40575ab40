//! Per-review adjudication record.

use indexmap::IndexMap;

use crate::error::{ReviewError, ReviewResult};
use crate::registry::SectionRegistry;
use crate::types::{AdjudicationState, Verdict};

/// Section name → adjudication state, in the registry's display order.
pub type Snapshot = IndexMap<String, AdjudicationState>;

/// The accept/reject state of every actionable section of one review.
///
/// Built once from the review's [`SectionRegistry`] with every section `Unset`.
/// Only in-memory state changes here; persisting it is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewState {
    review_id: String,
    states: Snapshot,
}

impl ReviewState {
    pub fn new(review_id: impl Into<String>, registry: &SectionRegistry) -> Self {
        Self {
            review_id: review_id.into(),
            states: registry
                .actionable()
                .map(|name| (name.to_owned(), AdjudicationState::Unset))
                .collect(),
        }
    }

    pub fn review_id(&self) -> &str {
        &self.review_id
    }

    /// Records `verdict` for `section`, overwriting any earlier verdict.
    ///
    /// Returns the previous state.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidSection` if `section` is not actionable for this
    /// review. That means the caller offered a control it should not have, so it
    /// is logged at error level as well.
    pub fn transition(&mut self, section: &str, verdict: Verdict) -> ReviewResult<AdjudicationState> {
        match self.states.get_mut(section) {
            Some(state) => Ok(std::mem::replace(state, verdict.into())),
            None => {
                tracing::error!(
                    review_id = %self.review_id,
                    section,
                    "adjudication attempted on a section that is not actionable"
                );
                Err(ReviewError::InvalidSection {
                    review_id: self.review_id.clone(),
                    section: section.to_owned(),
                })
            }
        }
    }

    pub fn get(&self, section: &str) -> Option<AdjudicationState> {
        self.states.get(section).copied()
    }

    /// Number of actionable sections still `Unset`.
    pub fn remaining(&self) -> usize {
        self.states.values().filter(|s| !s.is_settled()).count()
    }

    /// A copy of the full mapping, for rendering and payload construction.
    pub fn snapshot(&self) -> Snapshot {
        self.states.clone()
    }

    pub(crate) fn states(&self) -> &Snapshot {
        &self.states
    }
}
