//! Prompt templates for the generative-text calls

use regex::Regex;
use std::sync::OnceLock;

/// README text beyond this many bytes is cut before prompting
const MAX_README_BYTES: usize = 12_000;

pub struct PromptTemplate;

impl PromptTemplate {
    pub fn system_prompt() -> &'static str {
        "You review machine-learning model cards and READMEs. Answer exactly in the \
         requested format with no commentary."
    }

    /// Ask for runnable snippets as a JSON array of `{code, language}`
    pub fn code_extraction(text: &str) -> String {
        format!(
            "Extract the runnable usage code examples from the document below. Return a \
             JSON array where each element is {{\"code\": \"...\", \"language\": \"python\"}}. \
             Include only complete snippets that could be executed as-is. Return [] when \
             there are none.\n\n---\n{}",
            sanitize_readme(text)
        )
    }

    /// First pass: list the performance claims in plain text
    pub fn performance_extraction(readme: &str) -> String {
        format!(
            "List every performance claim made in the README below: benchmark names, \
             datasets evaluated on, reported metrics and their values, and comparisons to \
             other models. If there are none, say \"No performance claims found\".\n\n---\n{}",
            sanitize_readme(readme)
        )
    }

    /// Second pass: convert the claim list into the scoring JSON
    pub fn performance_conversion(extracted: &str) -> String {
        format!(
            "Convert the performance claims below into a single JSON object with keys \
             \"mentions_benchmarks\" (0.0 or 1.0), \"has_metrics\" (0.0 or 1.0), \
             \"claims\" (array of short strings) and \"score\" (0.0 to 1.0). Return only \
             the JSON object.\n\n{}",
            extracted
        )
    }

    pub fn readme_clarity(readme: &str) -> String {
        format!(
            "Rate how easy it is for a new user to get started with this model from its \
             README alone: installation steps, usage examples, explanation of inputs and \
             outputs, and overall organisation. Reply with a single number between 0.0 \
             (unusable) and 1.0 (excellent).\n\n---\n{}",
            sanitize_readme(readme)
        )
    }
}

fn injection_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)ignore\s+(all\s+)?previous\s+instructions?").expect("valid regex"),
            Regex::new(r"(?i)disregard\s+(all\s+)?previous").expect("valid regex"),
            Regex::new(r"(?i)forget\s+(all\s+)?previous").expect("valid regex"),
            Regex::new(r"(?i)<\s*/?\s*system\s*>").expect("valid regex"),
            Regex::new(r"(?i)\b(rate|score)\s+this\s+(readme|model)\s+(as\s+)?1(\.0)?\b")
                .expect("valid regex"),
            Regex::new(r"(?i)reveal\s+(your\s+)?(api\s*key|secret|password|credential)")
                .expect("valid regex"),
        ]
    })
}

/// Strip prompt-injection phrases and cap the length of README text
pub fn sanitize_readme(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in injection_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").into_owned();
    }

    if result.len() > MAX_README_BYTES {
        let mut cut = MAX_README_BYTES;
        while !result.is_char_boundary(cut) {
            cut -= 1;
        }
        result.truncate(cut);
        result.push_str("\n... [truncated]");
    }
    result
}
