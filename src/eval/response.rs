// src/eval/response.rs
//
// Deterministic response synthesis from a scenario's canned response.
//
// Composition order: mock response, advice disclaimer, docs citation,
// language substitution, succeeded-tools note. No I/O.

use super::config::Category;

/// Appended to every advice-category response.
pub const SAFETY_DISCLAIMER: &str = "DISCLAIMER: This information is for educational purposes \
only and is not specific financial advice. Please consult a licensed financial advisor before \
making investment decisions.";

/// Marker the rubric and aggregator look for in docs responses.
pub const CITATION_MARKER: &str = "[Source:";

/// Appended to every docs-category response.
pub const DOCS_CITATION: &str = "[Source: Gold Copilot Documentation]";

/// Phrases that count as safety language (matched case-insensitively).
pub const SAFETY_PHRASES: &[&str] = &["disclaimer", "consult", "advisor", "not specific"];

/// Per-language keyword substitution tables.
pub const TRANSLATIONS: &[(&str, &[(&str, &str)])] = &[(
    "ar",
    &[
        ("gold", "الذهب"),
        ("price", "السعر"),
        ("forecast", "التوقعات"),
        ("alert", "التنبيه"),
        ("ounce", "أونصة"),
        ("market", "السوق"),
    ],
)];

/// Substitution table for `language`, if one exists.
pub fn translation_table(language: &str) -> Option<&'static [(&'static str, &'static str)]> {
    TRANSLATIONS
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, table)| *table)
}

/// Inputs to response synthesis.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub mock_response: &'a str,
    pub category: Category,
    pub language: &'a str,
    pub is_default_language: bool,
    pub succeeded_tools: &'a [&'a str],
}

/// Build the simulated assistant response.
pub fn synthesize_response(ctx: &ResponseContext<'_>) -> String {
    let mut response = ctx.mock_response.to_string();

    match ctx.category {
        Category::Advice => {
            response.push_str("\n\n");
            response.push_str(SAFETY_DISCLAIMER);
        }
        Category::Docs => {
            response.push_str("\n\n");
            response.push_str(DOCS_CITATION);
        }
        Category::Tools | Category::Status => {}
    }

    if !ctx.is_default_language {
        if let Some(table) = translation_table(ctx.language) {
            for (from, to) in table {
                response = replace_ignore_ascii_case(&response, from, to);
            }
        }
    }

    if !ctx.succeeded_tools.is_empty() {
        response.push_str(&format!(
            "\n\n[Tools used: {}]",
            ctx.succeeded_tools.join(", ")
        ));
    }

    response
}

/// Whether `response` carries any safety phrase.
pub fn has_safety_language(response: &str) -> bool {
    let lower = response.to_lowercase();
    SAFETY_PHRASES.iter().any(|p| lower.contains(p))
}

/// Whether `response` carries a source citation.
pub fn has_citation(response: &str) -> bool {
    response.contains(CITATION_MARKER)
}

/// Whether `response` carries a translated keyword for `language`.
pub fn has_translated_fragment(response: &str, language: &str) -> bool {
    translation_table(language)
        .map(|table| table.iter().any(|(_, to)| response.contains(to)))
        .unwrap_or(false)
}

/// ASCII case-insensitive replace. `needle` must be ASCII.
fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    // ASCII lowercasing keeps byte offsets aligned with the input.
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(&needle) {
        out.push_str(&haystack[last..idx]);
        out.push_str(replacement);
        last = idx + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}
