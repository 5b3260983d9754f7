//! Prompt builders and response parsers for the AI study tools.
//!
//! Prompts are plain templates over extracted document text; parsers are
//! deliberately lenient because models decorate structured output with
//! code fences and commentary.

use serde::{Deserialize, Serialize};

use paperstack_core::{normalize_tags, year_label, Error, Result};

/// Maximum characters of document text fed into a prompt.
///
/// Keeps requests under provider context limits; study material beyond
/// this rarely changes a summary or tag set.
pub const MAX_PROMPT_TEXT: usize = 12_000;

/// Maximum number of tag suggestions kept from a response.
pub const MAX_SUGGESTED_TAGS: usize = 8;

/// Truncate text for prompt inclusion on a char boundary.
fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_PROMPT_TEXT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─── Summarization ─────────────────────────────────────────────────────────

pub const SUMMARY_SYSTEM: &str = "You are a study assistant. Summarize course material \
     concisely and factually for a student reviewing it later.";

pub fn build_summary_prompt(text: &str) -> String {
    format!(
        "Summarize the following study document in 3-5 sentences, focusing on the key \
         concepts a student should remember:\n\n{}",
        clip(text)
    )
}

// ─── Tag suggestion ────────────────────────────────────────────────────────

pub const TAG_SYSTEM: &str =
    "You label study documents with short topical tags. Respond with tags only.";

pub fn build_tag_prompt(text: &str) -> String {
    format!(
        "Suggest up to {} short topical tags for this study document. Respond with a \
         single comma-separated line, lowercase, no explanations:\n\n{}",
        MAX_SUGGESTED_TAGS,
        clip(text)
    )
}

/// Parse a tag-suggestion response: first non-empty line, split on
/// commas, normalized and deduplicated.
pub fn parse_tag_suggestions(response: &str) -> Vec<String> {
    let line = response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .unwrap_or("");

    let raw: Vec<String> = line
        .split(',')
        .map(|t| t.trim().trim_matches(['"', '\'', '#']).to_string())
        .collect();

    let mut tags = normalize_tags(&raw);
    tags.truncate(MAX_SUGGESTED_TAGS);
    tags
}

// ─── Quiz generation ───────────────────────────────────────────────────────

/// One multiple-choice question in a generated quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

pub const QUIZ_SYSTEM: &str =
    "You write multiple-choice quizzes from study material. Respond with JSON only.";

pub fn build_quiz_prompt(text: &str, num_questions: u32) -> String {
    format!(
        "Write {} multiple-choice questions testing the material below. Respond with a \
         JSON array only, each element an object with keys \"question\", \"options\" \
         (array of 4 strings), and \"answer\" (the correct option verbatim):\n\n{}",
        num_questions,
        clip(text)
    )
}

/// Parse a quiz response, tolerating code fences and surrounding prose.
pub fn parse_quiz(response: &str) -> Result<Vec<QuizQuestion>> {
    let stripped = strip_code_fences(response);

    // Fall back to the outermost bracketed region when the model added
    // commentary around the array.
    let candidate = match (stripped.find('['), stripped.rfind(']')) {
        (Some(start), Some(end)) if start < end => &stripped[start..=end],
        _ => stripped,
    };

    let questions: Vec<QuizQuestion> = serde_json::from_str(candidate)
        .map_err(|e| Error::Inference(format!("Unparseable quiz response: {}", e)))?;

    if questions.is_empty() {
        return Err(Error::Inference("Quiz response had no questions".to_string()));
    }
    Ok(questions)
}

/// Remove a surrounding ``` fence (with optional language tag) if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

// ─── Study plan ────────────────────────────────────────────────────────────

/// Document metadata handed to the study-plan prompt.
#[derive(Debug, Clone)]
pub struct DocumentBrief {
    pub filename: String,
    pub subject: String,
    pub year: i32,
    pub summary: Option<String>,
}

pub const STUDY_PLAN_SYSTEM: &str =
    "You are a study coach creating realistic day-by-day revision plans.";

pub fn build_study_plan_prompt(documents: &[DocumentBrief], days: u32) -> String {
    let mut listing = String::new();
    for doc in documents {
        listing.push_str(&format!(
            "- {} ({}, {})",
            doc.filename,
            doc.subject,
            year_label(doc.year)
        ));
        if let Some(summary) = &doc.summary {
            listing.push_str(&format!(": {}", summary));
        }
        listing.push('\n');
    }

    format!(
        "Create a {}-day study plan covering the documents below. For each day list \
         which documents to review and what to focus on. Keep it realistic for a \
         student with a few hours per day.\n\nDocuments:\n{}",
        days, listing
    )
}

// ─── Chat ──────────────────────────────────────────────────────────────────

/// System prompt for a chat session, with document context when the
/// session is scoped to one.
pub fn build_chat_system(document_text: Option<&str>) -> String {
    match document_text {
        Some(text) => format!(
            "You are a study assistant. Answer questions using the document below when \
             relevant, and say so when the answer is not in it.\n\nDocument:\n{}",
            clip(text)
        ),
        None => "You are a study assistant helping a student with their course material."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_respects_char_boundaries() {
        let text = "é".repeat(MAX_PROMPT_TEXT + 100);
        let clipped = clip(&text);
        assert_eq!(clipped.chars().count(), MAX_PROMPT_TEXT);
    }

    #[test]
    fn test_parse_tag_suggestions_plain_csv() {
        assert_eq!(
            parse_tag_suggestions("calculus, Linear Algebra, derivatives"),
            vec!["calculus", "linear algebra", "derivatives"]
        );
    }

    #[test]
    fn test_parse_tag_suggestions_skips_fences_and_quotes() {
        let response = "```\n\"physics\", 'mechanics', #kinematics\n```";
        assert_eq!(
            parse_tag_suggestions(response),
            vec!["physics", "mechanics", "kinematics"]
        );
    }

    #[test]
    fn test_parse_tag_suggestions_caps_count() {
        let many = (0..20).map(|i| format!("tag{}", i)).collect::<Vec<_>>().join(", ");
        assert_eq!(parse_tag_suggestions(&many).len(), MAX_SUGGESTED_TAGS);
    }

    #[test]
    fn test_parse_tag_suggestions_empty() {
        assert!(parse_tag_suggestions("").is_empty());
        assert!(parse_tag_suggestions("```\n```").is_empty());
    }

    #[test]
    fn test_parse_quiz_clean_json() {
        let response = r#"[{"question": "2+2?", "options": ["3", "4", "5", "6"], "answer": "4"}]"#;
        let quiz = parse_quiz(response).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].answer, "4");
        assert_eq!(quiz[0].options.len(), 4);
    }

    #[test]
    fn test_parse_quiz_with_code_fence() {
        let response = "```json\n[{\"question\": \"q\", \"options\": [\"a\",\"b\"], \"answer\": \"a\"}]\n```";
        assert_eq!(parse_quiz(response).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_quiz_with_surrounding_prose() {
        let response = "Here is your quiz:\n[{\"question\": \"q\", \"options\": [\"a\"], \"answer\": \"a\"}]\nGood luck!";
        assert_eq!(parse_quiz(response).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_quiz_rejects_garbage() {
        assert!(parse_quiz("no json here").is_err());
        assert!(parse_quiz("[]").is_err());
    }

    #[test]
    fn test_study_plan_prompt_lists_documents() {
        let docs = vec![DocumentBrief {
            filename: "mechanics.pdf".to_string(),
            subject: "Physics".to_string(),
            year: 2,
            summary: Some("Newton's laws".to_string()),
        }];
        let prompt = build_study_plan_prompt(&docs, 7);
        assert!(prompt.contains("7-day"));
        assert!(prompt.contains("mechanics.pdf"));
        assert!(prompt.contains("2nd Year"));
        assert!(prompt.contains("Newton's laws"));
    }

    #[test]
    fn test_chat_system_with_and_without_context() {
        assert!(build_chat_system(Some("The mitochondria")).contains("mitochondria"));
        assert!(!build_chat_system(None).contains("Document:"));
    }
}
