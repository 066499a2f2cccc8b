//! Chat provider resolution and retrying completion calls.
//!
//! Used by the transcript summariser and the book-details suggester. Both
//! send one system and one user message and want plain text back.
//!
//! ## Retry Strategy
//!
//! Rate-limit and overload errors are transient, so failed calls are retried
//! with exponential backoff (`retry_backoff_ms * 2^attempt`). With the
//! defaults the waits are 500 ms → 1 s → 2 s.

use crate::config::AiConfig;
use crate::error::FilekitError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Provider name override, e.g. `openai`, `anthropic`, `groq`.
pub const PROVIDER_ENV: &str = "FILEKIT_AI_PROVIDER";
/// Model override used together with [`PROVIDER_ENV`].
pub const MODEL_ENV: &str = "FILEKIT_AI_MODEL";

/// Text returned by a completion, with token accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
}

/// Provider names that answer with canned text instead of calling a model.
const OFFLINE_PROVIDERS: &[&str] = &["mock"];

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, FilekitError> {
    if OFFLINE_PROVIDERS.contains(&name.trim().to_ascii_lowercase().as_str()) {
        return Err(FilekitError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: "The mock provider returns canned text and cannot be used for real requests.\n\
                Choose a real provider such as openai, anthropic or ollama."
                .to_string(),
        });
    }

    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        FilekitError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the chat provider, most specific first:
///
/// 1. `config.provider`, a pre-built provider
/// 2. `config.provider_name` with `config.model`
/// 3. `FILEKIT_AI_PROVIDER` + `FILEKIT_AI_MODEL`, when both are set
/// 4. `openai` with `config.model`, keyed by `config.api_key` or `OPENAI_API_KEY`
///
/// Anything else is [`FilekitError::ProviderNotConfigured`], raised before
/// any request is made.
pub fn resolve_provider(config: &AiConfig) -> Result<Arc<dyn LLMProvider>, FilekitError> {
    resolve_provider_with(config, |name| std::env::var(name).ok())
}

fn resolve_provider_with(
    config: &AiConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Arc<dyn LLMProvider>, FilekitError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, &config.model);
    }

    let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());
    if let (Some(prov), Some(model)) = (non_empty(PROVIDER_ENV), non_empty(MODEL_ENV)) {
        return create_provider(&prov, &model);
    }

    let key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| non_empty("OPENAI_API_KEY"));
    if let Some(key) = key {
        debug!("Using openai chat provider with model {}", config.model);
        return Ok(Arc::new(OpenAIProvider::new(key).with_model(&config.model)));
    }

    Err(FilekitError::ProviderNotConfigured {
        provider: "openai".to_string(),
        hint: format!(
            "No API key found.\n\
            Set OPENAI_API_KEY, or {PROVIDER_ENV} and {MODEL_ENV} with that provider's key."
        ),
    })
}

fn build_options(config: &AiConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Send `system` + `user` to `provider`, retrying on failure.
pub async fn complete(
    provider: &Arc<dyn LLMProvider>,
    system: &str,
    user: &str,
    config: &AiConfig,
) -> Result<Completion, FilekitError> {
    let start = Instant::now();
    let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
    let options = build_options(config);

    let mut last_err: Option<String> = None;
    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Chat retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Chat: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(Completion {
                    content: response.content,
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    retries: attempt,
                });
            }
            Err(e) => {
                let msg = format!("{e}");
                warn!("Chat attempt {} failed: {}", attempt + 1, msg);
                last_err = Some(msg);
            }
        }
    }

    Err(FilekitError::LlmApiError {
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
