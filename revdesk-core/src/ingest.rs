//! Normalises backend responses into [`Review`] records.
//!
//! The backend has used different field names for the same data over time
//! (`review` / `ai_feedback`, `code` / `comment`, string or integer ids). They are
//! resolved here so nothing past this module needs to know about them.

use serde::Deserialize;

use crate::types::Review;

const TITLE_KEYWORDS: [&str; 6] = ["error", "exception", "bug", "issue", "fail", "vulnerability"];

/// Review id as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawId::Text(s) => f.write_str(s),
            RawId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// One review-generation response, in any of its historical shapes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub ai_feedback: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub optimized_code: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl GenerationResponse {
    /// The generated text, preferring `ai_feedback` over `review`.
    pub fn generated_text(&self) -> &str {
        first_non_empty(&self.ai_feedback, &self.review)
    }

    /// The submitted code echoed back, preferring `code` over `comment`.
    pub fn submitted_text(&self) -> &str {
        first_non_empty(&self.code, &self.comment)
    }

    /// Converts into a [`Review`]. `submitted` overrides the echoed code when given.
    pub fn into_review(self, submitted: Option<String>) -> Review {
        let submitted = submitted.unwrap_or_else(|| self.submitted_text().to_owned());
        let generated = self.generated_text().to_owned();
        let mut review = Review::new(self.id.map(|id| id.to_string()), submitted, generated)
            .with_optimized_code(non_blank(self.optimized_code))
            .with_explanation(non_blank(self.explanation))
            .with_filename(self.filename);
        if let Some(created_at) = self.created_at {
            review = review.with_created_at(created_at);
        }
        review
    }
}

fn first_non_empty<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> &'a str {
    match preferred.as_deref() {
        Some(s) if !s.trim().is_empty() => s,
        _ => fallback.as_deref().unwrap_or_default(),
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

/// One file of a multi-file submission, with the outcome of its generation call.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub filename: Option<String>,
    pub submitted: String,
    /// The backend response, or a description of why generation failed.
    pub outcome: Result<GenerationResponse, String>,
}

/// Converts every batch item into a review, in order.
///
/// Items are handled independently: a failed item becomes an error placeholder
/// (see [`Review::failed`]) and the remaining items are unaffected.
pub fn ingest_batch(items: Vec<BatchItem>) -> Vec<Review> {
    items
        .into_iter()
        .map(|item| match item.outcome {
            Ok(response) => {
                let filename = response.filename.clone().or(item.filename);
                response
                    .into_review(Some(item.submitted))
                    .with_filename(filename)
            }
            Err(error) => {
                tracing::warn!(
                    filename = item.filename.as_deref().unwrap_or("<unnamed>"),
                    %error,
                    "review generation failed; queueing placeholder"
                );
                Review::failed(item.filename, item.submitted, error)
            }
        })
        .collect()
}

/// Picks a short title for a review.
///
/// The first non-blank line of `generated` that mentions a problem keyword, capped at
/// 200 characters; otherwise the start of `generated`; otherwise the first 120
/// characters of the submitted code.
pub fn derive_title(generated: &str, submitted: &str) -> String {
    if generated.trim().is_empty() {
        return truncate(submitted, 120);
    }
    generated
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| {
            let lower = line.to_lowercase();
            TITLE_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .map(|line| truncate(line, 200))
        .unwrap_or_else(|| truncate(generated.trim(), 200))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_field_names() {
        let json = r####"{"id": 42, "ai_feedback": "###SECURITY###\nok", "comment": "x = 1"}"####;
        let response: GenerationResponse = serde_json::from_str(json).unwrap();
        let review = response.into_review(None);
        assert_eq!(review.id(), "42");
        assert_eq!(review.generated(), "###SECURITY###\nok");
        assert_eq!(review.submitted(), "x = 1");
    }

    #[test]
    fn test_ai_feedback_wins_over_review() {
        let json = r#"{"id": "abc", "review": "old", "ai_feedback": "new"}"#;
        let response: GenerationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.generated_text(), "new");
    }

    #[test]
    fn test_missing_id_gets_local_uuid() {
        let review = GenerationResponse::default().into_review(Some("code".into()));
        assert!(uuid::Uuid::parse_str(review.id()).is_ok());
    }

    #[test]
    fn test_blank_optimized_code_is_dropped() {
        let json = r#"{"review": "fine", "optimized_code": "   "}"#;
        let response: GenerationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_review(None).optimized_code(), None);
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(
            derive_title("Overview\nPossible SQL injection vulnerability in login()\nMore", ""),
            "Possible SQL injection vulnerability in login()"
        );
        assert_eq!(derive_title("  All good here.\nNothing else.", ""), "All good here.\nNothing else.");
        assert_eq!(derive_title("", &"x".repeat(300)).len(), 120);
    }
}
