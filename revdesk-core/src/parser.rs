//! Splits generated review text into named sections.
//!
//! Two modes, picked per input:
//!
//! - **Marker mode**: used whenever the text contains at least one `###NAME###`
//!   token (`NAME` is `[A-Z_]+`). Each body runs from the end of its marker to the
//!   next marker or end of input. A repeated marker overwrites the earlier body but
//!   keeps the section's first position.
//! - **Heading mode**: legacy free-form prose. A line that matches a vocabulary
//!   heading phrase opens that section; following lines accumulate until the next
//!   heading. Text with no recognised heading becomes one `REVIEW` section.
//!
//! Both modes normalise CRLF line endings, strip `**` emphasis, collapse runs of
//! 3+ newlines to exactly two, and trim every body.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::vocabulary::{SectionVocabulary, REVIEW};

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"###[A-Z_]+###").expect("marker pattern is valid"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run pattern is valid"));

/// Ordered section-name → body mapping, in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedSections {
    sections: IndexMap<String, String>,
}

impl ParsedSections {
    /// Body of `name`, possibly empty. `None` if the section never appeared.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    // IndexMap::insert keeps the original slot for an existing key.
    fn insert(&mut self, name: &str, body: String) {
        self.sections.insert(name.to_owned(), body);
    }
}

/// Parses `text` into sections. Empty or whitespace-only input yields no sections.
pub fn parse_sections(text: &str, vocabulary: &SectionVocabulary) -> ParsedSections {
    if text.trim().is_empty() {
        return ParsedSections::default();
    }
    if MARKER.is_match(text) {
        parse_markers(text)
    } else {
        parse_headings(text, vocabulary)
    }
}

fn parse_markers(text: &str) -> ParsedSections {
    let markers: Vec<regex::Match<'_>> = MARKER.find_iter(text).collect();
    let mut sections = ParsedSections::default();

    for (i, marker) in markers.iter().enumerate() {
        let token = marker.as_str();
        let name = &token[3..token.len() - 3];
        let stop = markers.get(i + 1).map_or(text.len(), |next| next.start());
        sections.insert(name, sanitize(&text[marker.end()..stop]));
    }
    sections
}

fn parse_headings(text: &str, vocabulary: &SectionVocabulary) -> ParsedSections {
    let mut sections = ParsedSections::default();
    let mut open: Option<(&str, Vec<&str>)> = None;

    for line in text.lines() {
        if let Some(name) = vocabulary.heading_for(line) {
            if let Some((prev, body)) = open.take() {
                sections.insert(prev, sanitize(&body.join("\n")));
            }
            open = Some((name, Vec::new()));
        } else if let Some((_, body)) = open.as_mut() {
            body.push(line);
        }
    }
    if let Some((name, body)) = open {
        sections.insert(name, sanitize(&body.join("\n")));
    }

    if sections.is_empty() {
        sections.insert(REVIEW, sanitize(text));
    }
    sections
}

/// Turns CRLF into LF, removes `**` emphasis, collapses 3+ consecutive newlines to
/// two, and trims.
pub fn sanitize(body: &str) -> String {
    let plain = body.replace("\r\n", "\n").replace("**", "");
    BLANK_RUNS.replace_all(&plain, "\n\n").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{ARCHITECTURE, KEY_FINDINGS, RECOMMENDATIONS, SECURITY};

    fn parse(text: &str) -> ParsedSections {
        parse_sections(text, &SectionVocabulary::standard())
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse(" \n\t\n").is_empty());
    }

    #[test]
    fn test_marker_bodies_are_trimmed() {
        let sections = parse("###SECURITY###\n  SQL injection in login()  \n\n###ARCHITECTURE###\nFine.\n");
        assert_eq!(sections.get(SECURITY), Some("SQL injection in login()"));
        assert_eq!(sections.get(ARCHITECTURE), Some("Fine."));
    }

    #[test]
    fn test_text_before_first_marker_is_ignored() {
        let sections = parse("Here is your review.\n###KEY_FINDINGS###\nOne bug.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.get(KEY_FINDINGS), Some("One bug."));
    }

    #[test]
    fn test_repeated_marker_keeps_first_position() {
        let sections = parse("###SECURITY###\nA\n###ARCHITECTURE###\nX\n###SECURITY###\nB\n");
        assert_eq!(sections.get(SECURITY), Some("B"));
        let names: Vec<&str> = sections.names().collect();
        assert_eq!(names, vec![SECURITY, ARCHITECTURE]);
    }

    #[test]
    fn test_sanitization() {
        let sections = parse("###RECOMMENDATIONS###\nUse **prepared** statements.\n\n\n\n\nAlso log.\n");
        assert_eq!(
            sections.get(RECOMMENDATIONS),
            Some("Use prepared statements.\n\nAlso log.")
        );
    }

    #[test]
    fn test_crlf_sanitized_the_same_in_both_modes() {
        let marked = parse("###SECURITY###\r\nA\r\n\r\n\r\n\r\nB\r\n");
        assert_eq!(marked.get(SECURITY), Some("A\n\nB"));

        let prose = parse("Security Check:\r\nA\r\n\r\n\r\n\r\nB\r\n");
        assert_eq!(prose.get(SECURITY), marked.get(SECURITY));

        let unnamed = parse("Fine.\r\n\r\n\r\nShip it.\r\n");
        assert_eq!(unnamed.get(REVIEW), Some("Fine.\n\nShip it."));
    }

    #[test]
    fn test_heading_mode() {
        let text = "Overall the code works.\n\nIssues Found:\n- off by one\n\nSecurity Check:\n- none\n\nRecommendations:\n- add tests";
        let sections = parse(text);
        let names: Vec<&str> = sections.names().collect();
        assert_eq!(names, vec![KEY_FINDINGS, SECURITY, RECOMMENDATIONS]);
        assert_eq!(sections.get(KEY_FINDINGS), Some("- off by one"));
        assert_eq!(sections.get(RECOMMENDATIONS), Some("- add tests"));
    }

    #[test]
    fn test_unrecognised_prose_becomes_one_section() {
        let sections = parse("Looks **good** to me.\n\n\n\nShip it.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.get(REVIEW), Some("Looks good to me.\n\nShip it."));
    }
}
