use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Returns the current Unix timestamp in seconds.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Whether a review came back from the generator or stands in for a failed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Generated,
    /// Placeholder for a batch item whose generation failed. Never actionable.
    Failed { error: String },
}

/// One generated review: the submitted code plus the model's marker-delimited text.
///
/// Reviews are keyed by the server-issued id, or a UUID v4 when the server has not
/// assigned one yet. The generated text is fixed at construction; new content means
/// a new `Review`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    id: String,
    title: String,
    filename: Option<String>,
    submitted: String,
    generated: String,
    optimized_code: Option<String>,
    explanation: Option<String>,
    outcome: ReviewOutcome,
    created_at: i64, // Unix timestamp seconds
}

impl Review {
    /// Creates a review for successfully generated text.
    ///
    /// `id` of `None` generates a local UUID v4. The title is derived from the
    /// generated text (see [`crate::ingest::derive_title`]).
    pub fn new(
        id: Option<String>,
        submitted: impl Into<String>,
        generated: impl Into<String>,
    ) -> Self {
        let submitted = submitted.into();
        let generated = generated.into();
        Self {
            id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            title: crate::ingest::derive_title(&generated, &submitted),
            filename: None,
            submitted,
            generated,
            optimized_code: None,
            explanation: None,
            outcome: ReviewOutcome::Generated,
            created_at: now_secs(),
        }
    }

    /// Creates an error placeholder whose generated text is a synthetic error message.
    pub fn failed(
        filename: Option<String>,
        submitted: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let label = filename.as_deref().unwrap_or("submission");
        let generated = format!("Review generation failed for {label}: {error}");
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: generated.clone(),
            filename,
            submitted: submitted.into(),
            generated,
            optimized_code: None,
            explanation: None,
            outcome: ReviewOutcome::Failed { error },
            created_at: now_secs(),
        }
    }

    /// Rebuilds a stored review as it was saved.
    pub(crate) fn restored(
        id: String,
        title: String,
        submitted: String,
        generated: String,
        outcome: ReviewOutcome,
    ) -> Self {
        Self {
            id,
            title,
            filename: None,
            submitted,
            generated,
            optimized_code: None,
            explanation: None,
            outcome,
            created_at: now_secs(),
        }
    }

    pub fn with_optimized_code(mut self, code: Option<String>) -> Self {
        self.optimized_code = code;
        self
    }

    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation;
        self
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The code that was submitted for review.
    pub fn submitted(&self) -> &str {
        &self.submitted
    }

    /// The raw generated text, before section parsing.
    pub fn generated(&self) -> &str {
        &self.generated
    }

    pub fn optimized_code(&self) -> Option<&str> {
        self.optimized_code.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn outcome(&self) -> &ReviewOutcome {
        &self.outcome
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ReviewOutcome::Failed { .. })
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// Per-section adjudication state held by [`crate::state::ReviewState`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjudicationState {
    #[default]
    Unset,
    Accepted,
    Rejected,
}

impl AdjudicationState {
    /// `true` once the section has been accepted or rejected.
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// The wire verdict, or `None` for a section nobody adjudicated.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Self::Unset => None,
            Self::Accepted => Some(Verdict::Accepted),
            Self::Rejected => Some(Verdict::Rejected),
        }
    }
}

/// An explicit user judgment on one section. Also the wire vocabulary of
/// `section_feedback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl From<Verdict> for AdjudicationState {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Accepted => Self::Accepted,
            Verdict::Rejected => Self::Rejected,
        }
    }
}

/// Overall thumbs-up / thumbs-down on a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Positive,
    Negative,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Stored status of a review once feedback has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Reviewed,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "reviewed" => Some(Self::Reviewed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Accepted/rejected counts for one section across all stored feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionTally {
    pub section: String,
    pub accepted: i64,
    pub rejected: i64,
}

/// One row of the review history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub id: String,
    pub title: String,
    pub filename: Option<String>,
    /// First 200 characters of the generated text.
    pub preview: String,
    pub status: ReviewStatus,
    pub created_at: i64,
}
