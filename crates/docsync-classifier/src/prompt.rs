//! Prompt construction for change analysis

use crate::classifier::ClassifierConfig;
use crate::oracle::StructuredRequest;
use crate::verdict::VerdictResponse;
use docsync_model::OnboardingStep;
use std::fmt::Write as _;

const SYSTEM_PROMPT: &str = "You are an expert at analyzing documentation changes and their impact on developer onboarding.
Your task is to determine:
1. How severe the change is (1-10)
2. Which onboarding steps are affected
3. Whether it's safe to auto-update
4. Suggested updates to affected steps";

const ANALYSIS_RULES: &str = "ANALYSIS REQUIRED:

1. **Severity** (1-10 scale):
   - 1-3: Minor (typo, formatting)
   - 4-6: Moderate (clarification, additional info)
   - 7-9: Major (process change, new requirements)
   - 10: Breaking (critical change requiring manual review)

2. **Affected Steps**: Which onboarding steps reference this content? Use the exact step titles listed above.

3. **Auto-Update Decision**:
   - Auto-update if severity < 7 AND changes are additive
   - Require manual review if severity >= 7 OR changes remove content

4. **Suggested Updates**: For each affected step, provide updated instructions";

/// Longest prefix of `text` holding at most `max_chars` characters, and
/// whether anything was cut
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// Build the structured request for one (file, step set) pair
#[must_use]
pub fn build_request(
    file_path: &str,
    old_content: &str,
    new_content: &str,
    steps: &[OnboardingStep],
    config: &ClassifierConfig,
) -> StructuredRequest {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "A documentation file has changed. Analyze the impact on onboarding.\n"
    );
    let _ = writeln!(prompt, "FILE PATH: {file_path}\n");

    push_content(&mut prompt, "OLD CONTENT", old_content, config.max_content_chars);
    push_content(&mut prompt, "NEW CONTENT", new_content, config.max_content_chars);

    let _ = writeln!(prompt, "CURRENT ONBOARDING STEPS:");
    for (i, step) in steps.iter().enumerate() {
        let (preview, _) = truncate_chars(&step.content.instructions, config.max_step_preview_chars);
        let _ = writeln!(
            prompt,
            "{}. \"{}\" ({}): {}...",
            i + 1,
            step.title,
            step.kind,
            preview
        );
    }
    prompt.push('\n');
    prompt.push_str(ANALYSIS_RULES);

    StructuredRequest::new(prompt, VerdictResponse::schema_description())
        .with_system(SYSTEM_PROMPT)
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
}

fn push_content(prompt: &mut String, label: &str, content: &str, max_chars: usize) {
    let (head, truncated) = truncate_chars(content, max_chars);
    let _ = writeln!(prompt, "{label}:\n{head}");
    if truncated {
        let _ = writeln!(prompt, "\n... (truncated)");
    }
    prompt.push('\n');
}
