//! Decides which sections of one review are present and which need adjudication.

use indexmap::IndexMap;

use crate::parser::ParsedSections;
use crate::types::Review;
use crate::vocabulary::{SectionVocabulary, EXPLANATION, OPTIMIZED_CODE, ORIGINAL_CODE};

/// One section of a review as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPresence {
    pub name: String,
    /// Trimmed body text; empty when the section was announced but had no content.
    pub body: String,
    /// Non-empty body.
    pub present: bool,
    /// Present and not informational.
    pub actionable: bool,
}

/// The present/actionable verdict for every section of one review.
///
/// Entries follow the parsed order, followed by the sections that come from
/// dedicated review fields (`ORIGINAL_CODE`, `OPTIMIZED_CODE`, and `EXPLANATION`
/// when the text did not carry its own).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionRegistry {
    entries: Vec<SectionPresence>,
}

impl SectionRegistry {
    /// Computes the registry for `review` from its parsed sections.
    ///
    /// `ORIGINAL_CODE` and `OPTIMIZED_CODE` always come from the review's own fields;
    /// marker occurrences of those names in the generated text are ignored. An error
    /// placeholder review has no actionable sections at all.
    pub fn compute(review: &Review, parsed: &ParsedSections, vocabulary: &SectionVocabulary) -> Self {
        let mut bodies: IndexMap<&str, &str> = IndexMap::new();
        for (name, body) in parsed.iter() {
            if name != ORIGINAL_CODE && name != OPTIMIZED_CODE {
                bodies.insert(name, body);
            }
        }
        bodies.insert(ORIGINAL_CODE, review.submitted());
        bodies.insert(OPTIMIZED_CODE, review.optimized_code().unwrap_or_default());
        if !bodies.contains_key(EXPLANATION) {
            bodies.insert(EXPLANATION, review.explanation().unwrap_or_default());
        }

        let entries = bodies
            .into_iter()
            .map(|(name, body)| {
                let body = body.trim();
                let present = !body.is_empty();
                let actionable = present && !review.is_failed() && !vocabulary.is_informational(name);
                SectionPresence {
                    name: name.to_owned(),
                    body: body.to_owned(),
                    present,
                    actionable,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SectionPresence] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&SectionPresence> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.present)
    }

    pub fn is_actionable(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.actionable)
    }

    /// Names of the actionable sections, in display order.
    pub fn actionable(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.actionable)
            .map(|e| e.name.as_str())
    }

    /// Section name → "present and actionable" for every known section.
    pub fn actionable_flags(&self) -> IndexMap<String, bool> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.actionable))
            .collect()
    }
}
