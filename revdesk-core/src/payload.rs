//! The feedback record handed to persistence.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::state::{ReviewState, Snapshot};
use crate::types::{AdjudicationState, Disposition, ReviewStatus, Verdict};

/// Predefined rejection reasons offered by the feedback form.
pub const REJECTION_REASONS: [&str; 12] = [
    "Syntax errors present",
    "Security vulnerabilities found",
    "Incorrect output / results",
    "Code logic is incorrect",
    "Poor or missing comments",
    "Code style inconsistent",
    "Inefficient algorithm",
    "Unnecessary complexity",
    "Duplicate / redundant code",
    "Variable/method naming not clear",
    "Does not handle edge cases",
    "Other (optional text box)",
];

/// Wire shape of a feedback submission.
///
/// `section_feedback` only holds sections that were actually adjudicated; an
/// actionable section left unset when the review was retired is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    pub review_id: String,
    pub feedback: Disposition,
    pub rejection_reasons: Vec<String>,
    pub custom_rejection_reason: Option<String>,
    pub section_feedback: IndexMap<String, Verdict>,
}

impl FeedbackPayload {
    /// Status the review ends up with once this feedback is stored.
    ///
    /// Explicit rejection reasons always reject. Otherwise more than half of the
    /// adjudicated sections must be accepted; with nothing adjudicated the overall
    /// disposition decides.
    pub fn status(&self) -> ReviewStatus {
        if !self.rejection_reasons.is_empty() || self.custom_rejection_reason.is_some() {
            return ReviewStatus::Rejected;
        }
        let total = self.section_feedback.len();
        if total == 0 {
            return match self.feedback {
                Disposition::Positive => ReviewStatus::Reviewed,
                Disposition::Negative => ReviewStatus::Rejected,
            };
        }
        let accepted = self
            .section_feedback
            .values()
            .filter(|v| **v == Verdict::Accepted)
            .count();
        if accepted * 2 > total {
            ReviewStatus::Reviewed
        } else {
            ReviewStatus::Rejected
        }
    }

    pub fn has_rejection_reason(&self) -> bool {
        !self.rejection_reasons.is_empty() || self.custom_rejection_reason.is_some()
    }
}

/// Projects `state` into a [`FeedbackPayload`]. Never touches `state`.
///
/// Reasons are trimmed, blank ones dropped and duplicates removed in order. A blank
/// custom reason becomes `None`.
pub fn build_payload<S: AsRef<str>>(
    state: &ReviewState,
    disposition: Disposition,
    reasons: &[S],
    custom_reason: Option<&str>,
) -> FeedbackPayload {
    let mut rejection_reasons: Vec<String> = Vec::new();
    for reason in reasons {
        let reason = reason.as_ref().trim();
        if !reason.is_empty() && !rejection_reasons.iter().any(|r| r == reason) {
            rejection_reasons.push(reason.to_owned());
        }
    }

    let section_feedback = state
        .states()
        .iter()
        .filter_map(|(name, s)| s.verdict().map(|v| (name.clone(), v)))
        .collect();

    FeedbackPayload {
        review_id: state.review_id().to_owned(),
        feedback: disposition,
        rejection_reasons,
        custom_rejection_reason: custom_reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned),
        section_feedback,
    }
}

/// Disposition implied by section verdicts alone, used when completion rather than
/// an explicit submission retires a review. Positive when strictly more than half of
/// the adjudicated sections were accepted, or when nothing needed adjudicating.
pub fn derive_disposition(snapshot: &Snapshot) -> Disposition {
    let settled = snapshot.values().filter(|s| s.is_settled()).count();
    let accepted = snapshot
        .values()
        .filter(|s| **s == AdjudicationState::Accepted)
        .count();
    if settled == 0 || accepted * 2 > settled {
        Disposition::Positive
    } else {
        Disposition::Negative
    }
}

pub fn is_catalog_reason(reason: &str) -> bool {
    REJECTION_REASONS.contains(&reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(sections: &[(&str, Verdict)], reasons: &[&str]) -> FeedbackPayload {
        FeedbackPayload {
            review_id: "r1".into(),
            feedback: Disposition::Positive,
            rejection_reasons: reasons.iter().map(|r| (*r).to_owned()).collect(),
            custom_rejection_reason: None,
            section_feedback: sections.iter().map(|(n, v)| ((*n).to_owned(), *v)).collect(),
        }
    }

    #[test]
    fn test_status_from_acceptance_rate() {
        use Verdict::{Accepted, Rejected};
        assert_eq!(payload(&[("A", Accepted), ("B", Accepted), ("C", Rejected)], &[]).status(), ReviewStatus::Reviewed);
        assert_eq!(payload(&[("A", Accepted), ("B", Rejected)], &[]).status(), ReviewStatus::Rejected);
        assert_eq!(payload(&[("A", Accepted)], &["Inefficient algorithm"]).status(), ReviewStatus::Rejected);
        assert_eq!(payload(&[], &[]).status(), ReviewStatus::Reviewed);
    }

    #[test]
    fn test_derive_disposition() {
        let mut snapshot = Snapshot::new();
        assert_eq!(derive_disposition(&snapshot), Disposition::Positive);
        snapshot.insert("A".into(), AdjudicationState::Accepted);
        snapshot.insert("B".into(), AdjudicationState::Rejected);
        snapshot.insert("C".into(), AdjudicationState::Unset);
        assert_eq!(derive_disposition(&snapshot), Disposition::Negative);
        snapshot.insert("C".into(), AdjudicationState::Accepted);
        assert_eq!(derive_disposition(&snapshot), Disposition::Positive);
    }

    #[test]
    fn test_catalog() {
        assert!(is_catalog_reason("Incorrect output / results"));
        assert!(!is_catalog_reason("I just don't like it"));
    }
}
