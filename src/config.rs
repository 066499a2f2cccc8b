//! Configuration types for the filekit utilities.
//!
//! Utilities with only one or two knobs take plain option structs
//! ([`TreeOptions`], [`DocxConfig`]). The two with many knobs ([`AiConfig`]
//! and [`RasterConfig`]) are built through builders that validate ranges in
//! `build()`, so a bad DPI or temperature is reported before any file is
//! opened or any request is sent.

use crate::error::FilekitError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

// ── Folder tree ──────────────────────────────────────────────────────────

/// Bounds and presentation for [`crate::files::tree::render_tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOptions {
    /// Directories at this depth are printed but not expanded. Default: 5.
    pub max_depth: usize,
    /// Maximum children shown per directory before truncation. Default: 50.
    pub max_items: usize,
    /// Prefix entries with an extension-based icon instead of a `/` suffix.
    pub use_icons: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_items: 50,
            use_icons: false,
        }
    }
}

// ── PDF rasterisation ────────────────────────────────────────────────────

/// Image format produced by [`crate::pdf::pdf_to_images`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Lossless PNG (default).
    #[default]
    Png,
    /// JPEG at [`RasterConfig::jpeg_quality`], alpha channel dropped.
    Jpeg,
}

impl RasterFormat {
    /// File extension used for rendered pages.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }

    /// MIME type of a single rendered page.
    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Configuration for PDF → image conversion.
#[derive(Clone)]
pub struct RasterConfig {
    /// Rendering DPI. Range: 72–300. Default: 150.
    ///
    /// Pages are scaled by `dpi / 72`, since PDF user space is 72 points per inch.
    pub dpi: u32,

    /// Output image format. Default: PNG.
    pub format: RasterFormat,

    /// JPEG quality when `format` is JPEG. Default: 95.
    pub jpeg_quality: u8,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            format: RasterFormat::default(),
            jpeg_quality: 95,
            password: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterConfig")
            .field("dpi", &self.dpi)
            .field("format", &self.format)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl RasterConfig {
    /// Create a new builder for `RasterConfig`.
    pub fn builder() -> RasterConfigBuilder {
        RasterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterConfig`].
#[derive(Debug)]
pub struct RasterConfigBuilder {
    config: RasterConfig,
}

impl RasterConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: RasterFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterConfig, FilekitError> {
        let c = &self.config;
        if !(72..=300).contains(&c.dpi) {
            return Err(FilekitError::InvalidConfig(format!(
                "DPI must be 72–300, got {}",
                c.dpi
            )));
        }
        Ok(self.config)
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// One comma-separated part of a page selection (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSpan {
    /// A single page.
    Single(usize),
    /// An inclusive range of pages.
    Range(usize, usize),
}

/// Specifies which pages of a PDF to extract.
///
/// Parsed from strings such as `"1, 3-5, 8"` or `"all"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// Explicit singles and ranges.
    Spans(Vec<PageSpan>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    ///
    /// Ranges are clamped to `[1, total_pages]`; single pages outside that
    /// interval are dropped.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Spans(spans) => spans
                .iter()
                .flat_map(|span| match *span {
                    PageSpan::Single(p) => {
                        if p >= 1 && p <= total_pages {
                            vec![p - 1]
                        } else {
                            vec![]
                        }
                    }
                    PageSpan::Range(start, end) => {
                        let s = start.max(1);
                        let e = end.min(total_pages);
                        (s..=e).map(|p| p - 1).collect()
                    }
                })
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromStr for PageSelection {
    type Err = FilekitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = |reason: String| FilekitError::InvalidPageSelection {
            input: s.to_string(),
            reason,
        };
        let parse_num = |part: &str| -> Result<usize, FilekitError> {
            part.trim()
                .parse::<usize>()
                .map_err(|_| invalid(format!("'{}' is not a page number", part.trim())))
        };

        let mut spans = Vec::new();
        for part in trimmed.split(',').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            if let Some((start, end)) = part.split_once('-') {
                spans.push(PageSpan::Range(parse_num(start)?, parse_num(end)?));
            } else {
                spans.push(PageSpan::Single(parse_num(part)?));
            }
        }

        Ok(PageSelection::Spans(spans))
    }
}

// ── AI (transcription, summaries, suggestions) ───────────────────────────

/// Configuration for every call that reaches an AI provider.
#[derive(Clone)]
pub struct AiConfig {
    /// OpenAI API key. If None, read from `OPENAI_API_KEY` at call time.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible REST API used for speech-to-text.
    /// Default: `https://api.openai.com/v1`.
    pub api_base_url: String,

    /// Speech-to-text model. Default: `whisper-1`.
    pub transcription_model: String,

    /// Chat provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, uses `FILEKIT_AI_PROVIDER` or auto-detection.
    pub provider_name: Option<String>,

    /// Chat model. Default: `gpt-4o-mini`.
    pub model: String,

    /// Pre-constructed chat provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for summaries. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Retry attempts on a failed chat call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Characters of transcript sent to the summariser. Default: 50 000.
    pub max_summary_chars: usize,

    /// HTTP timeout for uploads in seconds. Default: 300.
    pub api_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://api.openai.com/v1".to_string(),
            transcription_model: "whisper-1".to_string(),
            provider_name: None,
            model: "gpt-4o-mini".to_string(),
            provider: None,
            temperature: 0.3,
            max_tokens: 2048,
            max_retries: 3,
            retry_backoff_ms: 500,
            max_summary_chars: 50_000,
            api_timeout_secs: 300,
        }
    }
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("transcription_model", &self.transcription_model)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl AiConfig {
    /// Create a new builder for `AiConfig`.
    pub fn builder() -> AiConfigBuilder {
        AiConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key from the config or the `OPENAI_API_KEY` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Builder for [`AiConfig`].
#[derive(Debug)]
pub struct AiConfigBuilder {
    config: AiConfig,
}

impl AiConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn transcription_model(mut self, model: impl Into<String>) -> Self {
        self.config.transcription_model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn max_summary_chars(mut self, n: usize) -> Self {
        self.config.max_summary_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AiConfig, FilekitError> {
        let c = &self.config;
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(FilekitError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_summary_chars == 0 {
            return Err(FilekitError::InvalidConfig(
                "max_summary_chars must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(FilekitError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── DOCX → Markdown ──────────────────────────────────────────────────────

/// Markdown dialect requested from pandoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkdownFlavor {
    /// Pandoc's own Markdown, chosen from the `.md` extension (default).
    #[default]
    Pandoc,
    /// GitHub-Flavored Markdown.
    Gfm,
    /// Strict CommonMark.
    CommonMark,
}

impl MarkdownFlavor {
    /// Value passed to `pandoc -t`, if any.
    pub fn pandoc_writer(self) -> Option<&'static str> {
        match self {
            MarkdownFlavor::Pandoc => None,
            MarkdownFlavor::Gfm => Some("gfm"),
            MarkdownFlavor::CommonMark => Some("commonmark"),
        }
    }
}

/// Configuration for [`crate::document::docx_to_markdown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocxConfig {
    /// Pandoc executable. Default: `$PANDOC_PATH` or `pandoc`.
    pub pandoc_binary: PathBuf,
    /// Output dialect. Default: pandoc Markdown.
    pub flavor: MarkdownFlavor,
    /// Run the deterministic Markdown cleanup pass. Default: true.
    pub clean_output: bool,
}

impl Default for DocxConfig {
    fn default() -> Self {
        let pandoc_binary = std::env::var_os("PANDOC_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pandoc"));
        Self {
            pandoc_binary,
            flavor: MarkdownFlavor::default(),
            clean_output: true,
        }
    }
}
