//! Prompt construction for single-article and batch summaries.
//!
//! Output is deterministic: the same request always renders the same prompt.

use crate::summary::{SummaryRequest, POINTS_PER_SUMMARY};
use crate::taxonomy::{MISCELLANEOUS, TAXONOMY};

/// Maximum characters of article text placed in a prompt
pub const MAX_ARTICLE_CHARS: usize = 15_000;

const PREAMBLE: &str = "You are an expert news summarizer.\n\
Return ONLY valid JSON. Do not wrap in markdown. Do not include backticks.";

const OBJECT_SCHEMA: &[&str] = &[
    "{",
    "  \"author\": string|null,",
    "  \"title\": string,",
    "  \"url\": string,",
    "  \"points\": [",
    "    { \"heading\": string, \"bullets\"?: string[], \"paragraph\"?: string }",
    "  ],",
    "  \"categories\": string[]",
    "}",
];

/// Hard cut to [`MAX_ARTICLE_CHARS`] characters, never splitting a char.
pub fn truncate_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_ARTICLE_CHARS) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Render the prompt for one article.
pub fn build_prompt(request: &SummaryRequest) -> String {
    let mut lines: Vec<String> = vec![PREAMBLE.to_string(), "Output schema:".to_string()];
    lines.extend(OBJECT_SCHEMA.iter().map(|l| l.to_string()));
    lines.push("Rules:".to_string());
    lines.push(format!("- points MUST contain exactly {POINTS_PER_SUMMARY} items."));
    lines.push(
        "- Each point must have a short heading and either (a) 2-5 bullets OR (b) one concise paragraph, never both."
            .to_string(),
    );
    lines.push("- Bullets must be factual, concise, and derived from the article text.".to_string());
    lines.push("- No speculation, no ads, no CTAs.".to_string());
    push_category_rules(&mut lines);
    lines.push(String::new());
    lines.push(format!("Author: {}", request.author.as_deref().unwrap_or("")));
    lines.push(format!("Title: {}", request.title));
    lines.push(format!("URL: {}", request.url));
    lines.push("Article text:".to_string());
    lines.push(truncate_text(&request.text).to_string());
    lines.join("\n")
}

/// Render one prompt covering every request, in order.
///
/// The model is asked for a JSON array with one object per article, in the
/// same order as `requests`.
pub fn build_batch_prompt(requests: &[SummaryRequest]) -> String {
    let mut lines: Vec<String> = vec![PREAMBLE.to_string(), "Output schema:".to_string()];
    lines.push("[".to_string());
    lines.extend(OBJECT_SCHEMA.iter().map(|l| format!("  {l}")));
    lines.push("]".to_string());
    lines.push("Rules:".to_string());
    lines.push("- For each article, output an object matching the schema above.".to_string());
    lines.push(format!(
        "- The array MUST contain exactly {} objects, in the same order as the articles below.",
        requests.len()
    ));
    lines.push(format!("- Each object must have exactly {POINTS_PER_SUMMARY} points."));
    lines.push(
        "- Each point must have a short heading and either (a) 2-5 bullets OR (b) one concise paragraph, never both."
            .to_string(),
    );
    lines.push("- Content must come only from the article text. No speculation, no ads, no CTAs.".to_string());
    push_category_rules(&mut lines);
    lines.push(String::new());
    lines.push("Articles:".to_string());
    for (idx, request) in requests.iter().enumerate() {
        lines.push(format!("Article #{}:", idx + 1));
        lines.push(format!("Author: {}", request.author.as_deref().unwrap_or("")));
        lines.push(format!("Title: {}", request.title));
        lines.push(format!("URL: {}", request.url));
        lines.push(format!("Text: {}", truncate_text(&request.text)));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn push_category_rules(lines: &mut Vec<String>) {
    lines.push("- Assign one or more categories from the following list that best fit the article.".to_string());
    lines.push(format!(
        "- Only use categories from this list. If none fit, use \"{MISCELLANEOUS}\"."
    ));
    lines.push("- Category list:".to_string());
    lines.extend(TAXONOMY.iter().map(|domain| domain.render()));
}
