//! revdesk-core: section parsing and feedback workflow engine for generated code
//! reviews.
//!
//! A generated review arrives as one block of text. [`parser`] splits it into named
//! sections, [`registry`] decides which of them the user must accept or reject,
//! [`state`] tracks those verdicts, [`completion`] says when nothing is left to
//! decide, and [`payload`] turns the verdicts into the feedback record that
//! [`db`] stores. [`queue`] orders the reviews of a batch and tracks which one is
//! focused.

pub mod completion;
pub mod db;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod payload;
pub mod queue;
pub mod registry;
pub mod schema;
pub mod state;
pub mod types;
pub mod vocabulary;

pub use completion::is_complete;
pub use error::{ReviewError, ReviewResult};
pub use ingest::{ingest_batch, BatchItem, GenerationResponse};
pub use parser::{parse_sections, ParsedSections};
pub use payload::{build_payload, derive_disposition, FeedbackPayload, REJECTION_REASONS};
pub use queue::ReviewQueue;
pub use registry::{SectionPresence, SectionRegistry};
pub use state::{ReviewState, Snapshot};
pub use types::{AdjudicationState, Disposition, Review, ReviewOutcome, ReviewStatus, ReviewSummary, SectionTally, Verdict};
pub use vocabulary::{SectionRole, SectionSpec, SectionVocabulary};
