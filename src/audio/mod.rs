//! Audio transcription and transcript summaries.

pub mod summarize;
pub mod transcribe;

pub use summarize::summarize;
pub use transcribe::{transcribe, transcribe_batch, Transcript, TranscriptBatch};
