//! Prompts sent to the chat model.
//!
//! Kept in one place so prompt wording can be tested and changed without
//! touching the request or parsing code.

/// System prompt for summarising a transcript.
pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an assistant that turns raw speech transcripts into concise, structured notes.

Write the summary in the language of the transcript, in Markdown, with exactly these sections:

## Main Topics
- The subjects discussed, one bullet each

## Action Items
- Tasks, decisions or follow-ups mentioned (write "None" if there are none)

## Tools and References
- Software, books, people, links or other references cited (write "None" if there are none)

## Overall Conclusion
A short paragraph with the overall takeaway.

Do not invent content that is not in the transcript."#;

/// User message carrying the (already truncated) transcript.
pub fn summary_user_message(transcript: &str) -> String {
    format!("Analyse the following transcript and summarise it.\n\nTranscript:\n\"\"\"\n{transcript}\n\"\"\"")
}

/// System prompt for suggesting book details from a title.
pub const BOOK_DETAILS_SYSTEM_PROMPT: &str = r#"You are a librarian. Given a book title, you answer ONLY with a JSON object, no prose and no code fences."#;

/// User message asking for the details of `title`.
///
/// `categories` lists the reading-list categories the answer must pick from.
pub fn book_details_user_message(title: &str, categories: &[&str]) -> String {
    let category_list = categories
        .iter()
        .map(|c| format!("  - {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"For the book titled "{title}", suggest its details as a JSON object with these keys:

- "author": the author's full name
- "year": the original publication year as an integer
- "kind": exactly "Técnico" (technical) or "Não Técnico" (non-technical)
- "category": exactly one of:
{category_list}
- "motivation": one short sentence on why the book is worth reading

Answer with the JSON object only."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_has_all_sections() {
        for section in [
            "Main Topics",
            "Action Items",
            "Tools and References",
            "Overall Conclusion",
        ] {
            assert!(SUMMARY_SYSTEM_PROMPT.contains(section), "missing {section}");
        }
    }

    #[test]
    fn summary_message_embeds_transcript() {
        let msg = summary_user_message("hello there");
        assert!(msg.contains("hello there"));
    }

    #[test]
    fn book_prompt_lists_categories_and_title() {
        let msg = book_details_user_message("Dune", &["Design & UX", "Estatística & Incerteza"]);
        assert!(msg.contains("\"Dune\""));
        assert!(msg.contains("  - Design & UX"));
        assert!(msg.contains("  - Estatística & Incerteza"));
        assert!(msg.contains("\"motivation\""));
    }
}
