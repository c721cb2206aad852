//! Prompt construction and AI summarization of aggregated data.

pub mod prompt;
pub mod summarizer;

pub use summarizer::{Summarizer, SummarizerConfig};
