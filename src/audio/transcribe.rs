//! Speech-to-text through the OpenAI-compatible `audio/transcriptions` API.

use crate::config::AiConfig;
use crate::error::{FilekitError, ItemError};
use crate::progress::ProgressCallback;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Audio extensions accepted for upload.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] =
    &["mp3", "wav", "m4a", "ogg", "flac", "mp4", "webm"];

/// One transcribed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub name: String,
    pub text: String,
}

/// Output of [`transcribe_batch`].
#[derive(Debug, Default, Serialize)]
pub struct TranscriptBatch {
    pub transcripts: Vec<Transcript>,
    pub errors: Vec<ItemError>,
}

impl TranscriptBatch {
    /// All transcripts in one document, each under a `--- Audio: name ---` header.
    pub fn combined_text(&self) -> String {
        self.transcripts
            .iter()
            .map(|t| format!("--- Audio: {} ---\n{}", t.name, t.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whether `file_name` has an extension the transcription API accepts.
pub fn is_supported_audio(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Upload name sent to the API. The service infers the codec from the
/// extension, so only the directory part is dropped.
fn upload_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("audio.mp3")
        .to_string()
}

/// Transcribe one audio file. The returned text is trimmed.
pub async fn transcribe(
    file_name: &str,
    bytes: Vec<u8>,
    config: &AiConfig,
) -> Result<String, FilekitError> {
    let api_key = config
        .resolve_api_key()
        .ok_or_else(|| FilekitError::ProviderNotConfigured {
            provider: "openai".to_string(),
            hint: "Set OPENAI_API_KEY or pass --api-key to transcribe audio.".to_string(),
        })?;

    if !is_supported_audio(file_name) {
        return Err(FilekitError::InvalidInput(format!(
            "'{file_name}' is not a supported audio file ({})",
            SUPPORTED_AUDIO_EXTENSIONS.join(", ")
        )));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .build()
        .map_err(|e| FilekitError::TranscriptionFailed(e.to_string()))?;

    let size = bytes.len();
    let part = Part::bytes(bytes).file_name(upload_name(file_name));
    let form = Form::new()
        .text("model", config.transcription_model.clone())
        .part("file", part);

    let url = format!("{}/audio/transcriptions", config.api_base_url);
    debug!("Uploading '{}' ({} bytes) to {}", file_name, size, url);

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                FilekitError::TranscriptionFailed(format!(
                    "request timed out after {}s",
                    config.api_timeout_secs
                ))
            } else {
                FilekitError::TranscriptionFailed(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FilekitError::TranscriptionFailed(format!(
            "HTTP {status}: {}",
            body.trim()
        )));
    }

    let parsed: TranscriptionResponse = response
        .json()
        .await
        .map_err(|e| FilekitError::TranscriptionFailed(format!("invalid response: {e}")))?;

    let text = parsed.text.trim().to_string();
    info!("Transcribed '{}': {} characters", file_name, text.chars().count());
    Ok(text)
}

/// Transcribe every `(name, bytes)` input in order. A failing file is
/// recorded and the rest continue.
pub async fn transcribe_batch(
    inputs: Vec<(String, Vec<u8>)>,
    config: &AiConfig,
    progress: Option<ProgressCallback>,
) -> TranscriptBatch {
    let total = inputs.len();
    let mut batch = TranscriptBatch::default();

    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    for (i, (name, bytes)) in inputs.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = progress {
            cb.on_item_start(index, total, &name);
        }
        match transcribe(&name, bytes, config).await {
            Ok(text) => {
                if let Some(ref cb) = progress {
                    cb.on_item_complete(index, total, &name);
                }
                batch.transcripts.push(Transcript { name, text });
            }
            Err(e) => {
                warn!("Transcription of '{}' failed: {}", name, e);
                if let Some(ref cb) = progress {
                    cb.on_item_error(index, total, &e.to_string());
                }
                batch.errors.push(ItemError::from_error(&name, e));
            }
        }
    }

    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, batch.transcripts.len());
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported_audio("meeting.MP3"));
        assert!(is_supported_audio("voice.m4a"));
        assert!(!is_supported_audio("notes.txt"));
        assert!(!is_supported_audio("noext"));
    }

    #[test]
    fn upload_name_keeps_extension() {
        assert_eq!(upload_name("/tmp/rec/call.ogg"), "call.ogg");
        assert_eq!(upload_name(""), "audio.mp3");
    }

    #[test]
    fn combined_text_has_headers() {
        let batch = TranscriptBatch {
            transcripts: vec![
                Transcript {
                    name: "a.mp3".into(),
                    text: "first".into(),
                },
                Transcript {
                    name: "b.wav".into(),
                    text: "second".into(),
                },
            ],
            errors: vec![],
        };
        assert_eq!(
            batch.combined_text(),
            "--- Audio: a.mp3 ---\nfirst\n\n--- Audio: b.wav ---\nsecond"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let config = AiConfig {
            api_key: Some(String::new()),
            ..AiConfig::default()
        };
        // A blank configured key is treated as no key at all.
        assert!(config.resolve_api_key().is_none());
        let err = transcribe("a.mp3", vec![1, 2, 3], &config).await.unwrap_err();
        assert!(matches!(err, FilekitError::ProviderNotConfigured { .. }));
    }
}
