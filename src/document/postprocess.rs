//! Deterministic cleanup of Markdown produced by pandoc.
//!
//! Rules run in a fixed order: line endings are normalised first so every
//! later rule only sees `\n`, and the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to `input`.
///
/// 1. Normalise line endings (CRLF/CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Drop pandoc image size attributes (`{width="…" height="…"}`)
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines to at most two
/// 6. End with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = remove_image_attributes(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\n(.*)\n```\s*$").unwrap());

/// Remove one outer code fence, e.g. a chat answer wrapped in ```` ```json ````.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

static RE_IMAGE_ATTRS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(!\[[^\]]*\]\([^)]*\))\{[^}]*(?:width|height)=[^}]*\}"#).unwrap());

fn remove_image_attributes(input: &str) -> String {
    RE_IMAGE_ATTRS.replace_all(input, "$1").to_string()
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_becomes_lf() {
        assert_eq!(clean_markdown("a\r\nb\rc"), "a\nb\nc\n");
    }

    #[test]
    fn trailing_spaces_removed() {
        assert_eq!(clean_markdown("title   \ntext\t"), "title\ntext\n");
    }

    #[test]
    fn blank_runs_collapse_to_two() {
        assert_eq!(clean_markdown("a\n\n\n\n\n\nb"), "a\n\n\nb\n");
    }

    #[test]
    fn invisible_chars_stripped() {
        assert_eq!(clean_markdown("\u{FEFF}he\u{200B}llo"), "hello\n");
    }

    #[test]
    fn image_size_attributes_dropped() {
        let md = r#"![Logo](media/image1.png){width="2.5in" height="1in"}"#;
        assert_eq!(clean_markdown(md), "![Logo](media/image1.png)\n");
    }

    #[test]
    fn other_attribute_spans_kept() {
        let md = "[text]{.underline}";
        assert_eq!(clean_markdown(md), "[text]{.underline}\n");
    }

    #[test]
    fn empty_input_is_single_newline() {
        assert_eq!(clean_markdown("  \n\n"), "\n");
    }

    #[test]
    fn fences_stripped_with_language() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
