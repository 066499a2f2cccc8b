//! AI completion of book details from a title.

use crate::config::AiConfig;
use crate::document::postprocess::strip_code_fences;
use crate::error::FilekitError;
use crate::library::record::{Book, KIND_NON_TECHNICAL, KIND_TECHNICAL};
use crate::library::score::category_names;
use crate::llm;
use crate::prompts::{book_details_user_message, BOOK_DETAILS_SYSTEM_PROMPT};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

/// Details proposed by the model. Every field is optional: the model may
/// not know, and the caller reviews the suggestion before saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSuggestion {
    #[serde(default, alias = "Autor")]
    pub author: Option<String>,
    #[serde(
        default,
        alias = "Ano",
        alias = "Ano (pub.)",
        deserialize_with = "lenient_year"
    )]
    pub year: Option<i32>,
    #[serde(default, alias = "Tipo")]
    pub kind: Option<String>,
    #[serde(default, alias = "Categoria")]
    pub category: Option<String>,
    #[serde(default, alias = "Motivação", alias = "Motivacao")]
    pub motivation: Option<String>,
}

/// Years come back as `1965`, `"1965"` or `null`.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl BookSuggestion {
    /// Fill the empty fields of `book`; values already set are kept.
    /// Only the two known book types are accepted for `kind`.
    pub fn fill(&self, book: &mut Book) {
        fn fill_text(target: &mut String, value: &Option<String>) {
            if target.trim().is_empty() {
                if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                    *target = v.to_string();
                }
            }
        }

        fill_text(&mut book.author, &self.author);
        fill_text(&mut book.category, &self.category);
        if book.kind.trim().is_empty() {
            if let Some(kind) = self
                .kind
                .as_deref()
                .map(str::trim)
                .filter(|k| *k == KIND_TECHNICAL || *k == KIND_NON_TECHNICAL)
            {
                book.kind = kind.to_string();
            }
        }
        if book.year.is_none() {
            book.year = self.year.filter(|y| *y > 0);
        }
        if book.motivation.is_none() {
            book.motivation = self
                .motivation
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
        }
    }
}

/// Parse the model's answer, tolerating code fences and surrounding prose.
pub fn parse_suggestion(raw: &str) -> Result<BookSuggestion, FilekitError> {
    let text = strip_code_fences(raw);
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(FilekitError::InvalidAiResponse {
                detail: format!("no JSON object in response: {}", preview(&text)),
            })
        }
    };
    serde_json::from_str(json).map_err(|e| FilekitError::InvalidAiResponse {
        detail: format!("{e}: {}", preview(json)),
    })
}

fn preview(s: &str) -> String {
    let short: String = s.chars().take(120).collect();
    if short.len() < s.len() {
        format!("{short}…")
    } else {
        short
    }
}

/// Ask the chat provider for the details of the book titled `title`.
pub async fn suggest_book_details(
    title: &str,
    config: &AiConfig,
) -> Result<BookSuggestion, FilekitError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FilekitError::InvalidInput("a title is required".into()));
    }

    let provider = llm::resolve_provider(config)?;
    let completion = llm::complete(
        &provider,
        BOOK_DETAILS_SYSTEM_PROMPT,
        &book_details_user_message(title, &category_names()),
        config,
    )
    .await?;
    debug!("Suggestion response: {}", completion.content);

    let suggestion = parse_suggestion(&completion.content)?;
    info!("Suggested details for '{}'", title);
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_english_keys() {
        let s = parse_suggestion(
            r#"{"author": "Frank Herbert", "year": 1965, "kind": "Não Técnico",
                "category": "Épicos & Ficção Reflexiva", "motivation": "A classic."}"#,
        )
        .unwrap();
        assert_eq!(s.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(s.year, Some(1965));
        assert_eq!(s.kind.as_deref(), Some("Não Técnico"));
    }

    #[test]
    fn parses_fenced_portuguese_keys_with_string_year() {
        let raw = "```json\n{\"Autor\": \"Robert C. Martin\", \"Ano (pub.)\": \"2008\", \"Tipo\": \"Técnico\"}\n```";
        let s = parse_suggestion(raw).unwrap();
        assert_eq!(s.author.as_deref(), Some("Robert C. Martin"));
        assert_eq!(s.year, Some(2008));
        assert_eq!(s.category, None);
    }

    #[test]
    fn tolerates_prose_around_json() {
        let s = parse_suggestion("Sure! {\"author\": \"X\", \"year\": null} Hope it helps").unwrap();
        assert_eq!(s.author.as_deref(), Some("X"));
        assert_eq!(s.year, None);
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_suggestion("I don't know this book.").unwrap_err();
        assert!(matches!(err, FilekitError::InvalidAiResponse { .. }));
    }

    #[test]
    fn fill_keeps_existing_values() {
        let mut book = Book {
            title: "Dune".into(),
            author: "F. Herbert".into(),
            ..Book::default()
        };
        let s = BookSuggestion {
            author: Some("Frank Herbert".into()),
            year: Some(1965),
            kind: Some("Fiction".into()),
            category: Some("Épicos & Ficção Reflexiva".into()),
            motivation: Some("  Desert politics. ".into()),
        };
        s.fill(&mut book);
        assert_eq!(book.author, "F. Herbert");
        assert_eq!(book.year, Some(1965));
        assert_eq!(book.kind, "");
        assert_eq!(book.category, "Épicos & Ficção Reflexiva");
        assert_eq!(book.motivation.as_deref(), Some("Desert politics."));
    }
}
