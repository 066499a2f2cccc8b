//! Structured summaries of transcripts via the chat provider.

use crate::config::AiConfig;
use crate::error::FilekitError;
use crate::llm;
use crate::prompts::{summary_user_message, SUMMARY_SYSTEM_PROMPT};
use tracing::info;

/// The first `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Summarise `text` into topics, action items, references and a conclusion.
///
/// Only the first [`AiConfig::max_summary_chars`] characters are sent.
pub async fn summarize(text: &str, config: &AiConfig) -> Result<String, FilekitError> {
    if text.trim().is_empty() {
        return Err(FilekitError::InvalidInput(
            "nothing to summarise: the transcript is empty".into(),
        ));
    }

    let provider = llm::resolve_provider(config)?;
    let input = truncate_chars(text, config.max_summary_chars);
    if input.len() < text.len() {
        info!(
            "Transcript truncated to {} characters for summarising",
            config.max_summary_chars
        );
    }

    let completion = llm::complete(
        &provider,
        SUMMARY_SYSTEM_PROMPT,
        &summary_user_message(input),
        config,
    )
    .await?;

    info!(
        "Summary: {} input tokens, {} output tokens",
        completion.input_tokens, completion.output_tokens
    );
    Ok(completion.content.trim().to_string())
}
