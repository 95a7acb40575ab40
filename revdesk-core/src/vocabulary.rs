//! The canonical section vocabulary.
//!
//! One table row per section name says whether the section is informational
//! (displayed, never adjudicated) or actionable, and which legacy prose headings
//! map onto it when the generated text carries no `###NAME###` markers.
//! Every other module asks this table instead of branching on names.

use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};

pub const CODE_QUALITY: &str = "CODE_QUALITY";
pub const KEY_FINDINGS: &str = "KEY_FINDINGS";
pub const SECURITY: &str = "SECURITY";
pub const PERFORMANCE: &str = "PERFORMANCE";
pub const ARCHITECTURE: &str = "ARCHITECTURE";
pub const BEST_PRACTICES: &str = "BEST_PRACTICES";
pub const RECOMMENDATIONS: &str = "RECOMMENDATIONS";
pub const SYNTAX_ERRORS: &str = "SYNTAX_ERRORS";
pub const SEMANTIC_ERRORS: &str = "SEMANTIC_ERRORS";
pub const EXPLANATION: &str = "EXPLANATION";
/// Filled from the review's submitted content, not from marker text.
pub const ORIGINAL_CODE: &str = "ORIGINAL_CODE";
/// Filled from the backend's dedicated optimized-code field, not from marker text.
pub const OPTIMIZED_CODE: &str = "OPTIMIZED_CODE";
/// Key of the single section produced when free-form text has no recognised headings.
pub const REVIEW: &str = "REVIEW";

/// Sections that are informational in every vocabulary, built-in or configured.
pub const FIXED_INFORMATIONAL: [&str; 5] =
    [CODE_QUALITY, PERFORMANCE, BEST_PRACTICES, EXPLANATION, ORIGINAL_CODE];

/// Whether a section takes part in adjudication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionRole {
    Informational,
    Actionable,
}

/// One row of the vocabulary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Canonical marker name, `[A-Z_]+`.
    pub name: String,
    pub role: SectionRole,
    /// Legacy heading phrases (case-insensitive) that open this section in prose mode.
    #[serde(default)]
    pub headings: Vec<String>,
}

impl SectionSpec {
    fn new(name: &str, role: SectionRole, headings: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            role,
            headings: headings.iter().map(|h| (*h).to_owned()).collect(),
        }
    }
}

/// Lookup table mapping canonical section names to their role.
///
/// Names missing from the table are actionable, except the [`FIXED_INFORMATIONAL`]
/// sections, which are informational whatever the table says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionVocabulary {
    specs: Vec<SectionSpec>,
}

impl SectionVocabulary {
    /// The built-in vocabulary used by current review prompts.
    pub fn standard() -> Self {
        use SectionRole::{Actionable, Informational};
        Self {
            specs: vec![
                SectionSpec::new(CODE_QUALITY, Informational, &["Code Quality", "Code Quality Assessment"]),
                SectionSpec::new(
                    KEY_FINDINGS,
                    Actionable,
                    &["Key Findings", "Issues Found", "Identified Issues", "Issues"],
                ),
                SectionSpec::new(
                    SECURITY,
                    Actionable,
                    &["Security", "Security Check", "Security Analysis", "Security Concerns", "Security Issues"],
                ),
                SectionSpec::new(PERFORMANCE, Informational, &["Performance", "Performance Issues", "Performance Analysis"]),
                SectionSpec::new(ARCHITECTURE, Actionable, &["Architecture", "Architecture Review", "Code Structure"]),
                SectionSpec::new(BEST_PRACTICES, Informational, &["Best Practices", "Best Practice Suggestions"]),
                SectionSpec::new(
                    RECOMMENDATIONS,
                    Actionable,
                    &["Recommendations", "Suggestions", "Improvement Suggestions"],
                ),
                SectionSpec::new(SYNTAX_ERRORS, Actionable, &["Syntax Errors"]),
                SectionSpec::new(SEMANTIC_ERRORS, Actionable, &["Semantic Errors", "Logic Errors"]),
                SectionSpec::new(EXPLANATION, Informational, &["Explanation"]),
                SectionSpec::new(ORIGINAL_CODE, Informational, &[]),
                SectionSpec::new(OPTIMIZED_CODE, Actionable, &[]),
            ],
        }
    }

    /// Builds a vocabulary from configured rows.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Vocabulary` if a name is empty, is not `[A-Z_]+`,
    /// appears twice, or marks one of [`FIXED_INFORMATIONAL`] actionable.
    pub fn new(specs: Vec<SectionSpec>) -> ReviewResult<Self> {
        validate(&specs)?;
        Ok(Self { specs })
    }

    /// Layers `overrides` over this table.
    ///
    /// A row for a known name replaces its role, and its headings too when it lists
    /// any; an empty `headings` keeps the existing phrases. Rows for new names are
    /// appended. Names not mentioned keep their current row.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`], checked against the override rows.
    pub fn with_overrides(mut self, overrides: Vec<SectionSpec>) -> ReviewResult<Self> {
        validate(&overrides)?;
        for row in overrides {
            match self.specs.iter_mut().find(|s| s.name == row.name) {
                Some(existing) => {
                    existing.role = row.role;
                    if !row.headings.is_empty() {
                        existing.headings = row.headings;
                    }
                }
                None => self.specs.push(row),
            }
        }
        Ok(self)
    }

    pub fn specs(&self) -> &[SectionSpec] {
        &self.specs
    }

    pub fn role_of(&self, name: &str) -> SectionRole {
        if is_fixed_informational(name) {
            return SectionRole::Informational;
        }
        self.specs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.role)
            .unwrap_or(SectionRole::Actionable)
    }

    pub fn is_informational(&self, name: &str) -> bool {
        self.role_of(name) == SectionRole::Informational
    }

    /// Returns the canonical name whose heading phrase matches `line`, if any.
    ///
    /// Leading markdown hashes, bullets, emphasis and emoji are ignored, as is a
    /// trailing colon. The rest of the line must equal a phrase exactly, ignoring case,
    /// so prose such as `Security: input is unchecked` never opens a section.
    pub fn heading_for(&self, line: &str) -> Option<&str> {
        let candidate = normalize_heading(line)?;
        self.specs
            .iter()
            .find(|spec| spec.headings.iter().any(|h| h.eq_ignore_ascii_case(&candidate)))
            .map(|spec| spec.name.as_str())
    }
}

impl Default for SectionVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

fn is_fixed_informational(name: &str) -> bool {
    FIXED_INFORMATIONAL.iter().any(|fixed| *fixed == name)
}

fn validate(specs: &[SectionSpec]) -> ReviewResult<()> {
    let mut seen = std::collections::HashSet::new();
    for spec in specs {
        if spec.name.is_empty() || !spec.name.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
            return Err(ReviewError::Vocabulary(format!(
                "section name {:?} must match [A-Z_]+",
                spec.name
            )));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ReviewError::Vocabulary(format!("duplicate section {}", spec.name)));
        }
        if spec.role == SectionRole::Actionable && is_fixed_informational(&spec.name) {
            return Err(ReviewError::Vocabulary(format!(
                "section {} is always informational",
                spec.name
            )));
        }
    }
    Ok(())
}

fn normalize_heading(line: &str) -> Option<String> {
    let unemphasized = line.replace("**", "");
    let s = unemphasized
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end();
    let s = s.strip_suffix(':').unwrap_or(s).trim_end();
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_informational_set() {
        let vocab = SectionVocabulary::standard();
        for name in [CODE_QUALITY, PERFORMANCE, BEST_PRACTICES, EXPLANATION, ORIGINAL_CODE] {
            assert!(vocab.is_informational(name), "{name} should be informational");
        }
        for name in [KEY_FINDINGS, SECURITY, ARCHITECTURE, RECOMMENDATIONS, OPTIMIZED_CODE, REVIEW] {
            assert!(!vocab.is_informational(name), "{name} should be actionable");
        }
    }

    #[test]
    fn test_unknown_names_are_actionable() {
        let vocab = SectionVocabulary::standard();
        assert_eq!(vocab.role_of("DEPENDENCIES"), SectionRole::Actionable);
    }

    #[test]
    fn test_heading_matching() {
        let vocab = SectionVocabulary::standard();
        assert_eq!(vocab.heading_for("Security Check:"), Some(SECURITY));
        assert_eq!(vocab.heading_for("  ISSUES FOUND  "), Some(KEY_FINDINGS));
        assert_eq!(vocab.heading_for("**Recommendations:**"), Some(RECOMMENDATIONS));
        assert_eq!(vocab.heading_for("### 🔒 Security Concerns:"), Some(SECURITY));
        assert_eq!(vocab.heading_for("Security: input is unchecked"), None);
        assert_eq!(vocab.heading_for("   "), None);
    }

    #[test]
    fn test_rejects_bad_names() {
        let bad = vec![SectionSpec::new("lower", SectionRole::Actionable, &[])];
        assert!(matches!(SectionVocabulary::new(bad), Err(ReviewError::Vocabulary(_))));

        let dup = vec![
            SectionSpec::new(SECURITY, SectionRole::Actionable, &[]),
            SectionSpec::new(SECURITY, SectionRole::Informational, &[]),
        ];
        assert!(matches!(SectionVocabulary::new(dup), Err(ReviewError::Vocabulary(_))));

        let pinned = vec![SectionSpec::new(ORIGINAL_CODE, SectionRole::Actionable, &[])];
        assert!(matches!(SectionVocabulary::new(pinned), Err(ReviewError::Vocabulary(_))));
    }

    #[test]
    fn test_fixed_informational_even_when_unlisted() {
        let vocab = SectionVocabulary::new(vec![SectionSpec::new(SECURITY, SectionRole::Actionable, &[])])
            .unwrap();
        for name in FIXED_INFORMATIONAL {
            assert!(vocab.is_informational(name), "{name} should stay informational");
        }
    }

    #[test]
    fn test_overrides_layer_over_standard() {
        let vocab = SectionVocabulary::standard()
            .with_overrides(vec![
                SectionSpec::new(ARCHITECTURE, SectionRole::Informational, &[]),
                SectionSpec::new(SECURITY, SectionRole::Actionable, &["Threat Model"]),
                SectionSpec::new("LICENSING", SectionRole::Actionable, &["License Check"]),
            ])
            .unwrap();
        assert!(vocab.is_informational(ARCHITECTURE));
        assert_eq!(vocab.heading_for("Code Structure:"), Some(ARCHITECTURE));
        assert_eq!(vocab.heading_for("Threat Model"), Some(SECURITY));
        assert_eq!(vocab.heading_for("Security Check:"), None);
        assert_eq!(vocab.heading_for("Issues Found:"), Some(KEY_FINDINGS));
        assert_eq!(vocab.heading_for("License Check"), Some("LICENSING"));
        assert!(!vocab.is_informational(RECOMMENDATIONS));

        let err = SectionVocabulary::standard()
            .with_overrides(vec![SectionSpec::new(EXPLANATION, SectionRole::Actionable, &[])]);
        assert!(matches!(err, Err(ReviewError::Vocabulary(_))));
    }
}
