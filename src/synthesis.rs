//! Narrative synthesis.
//!
//! A [`Summarizer`] is a black-box text generator (for example a language
//! model client living outside this crate). It receives a read-only
//! [`SynthesisContext`] and may return nothing, in which case the
//! deterministic [`fallback_summary`] is used.

pub mod context;
pub mod fallback;
pub mod qa;

pub use context::SynthesisContext;
pub use fallback::fallback_summary;
pub use qa::answer_question;

use serde::{Deserialize, Serialize};

/// Turns the aggregated analysis context into narrative text.
pub trait Summarizer {
    /// `None` when no summary could be produced.
    fn summarize(&self, context: &SynthesisContext<'_>) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Narrative,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub text: String,
    pub source: SummarySource,
}
