use crate::pr::ChangedFile;

/// Build the single-turn review prompt for one file.
///
/// Only the patch is sent, so the model sees exactly which lines changed
/// but not the rest of the file.
pub fn build_prompt(file: &ChangedFile) -> String {
    let patch = file.patch.as_deref().unwrap_or_default();
    format!(
        r#"You are an expert code reviewer. Analyze the following file change (patch format) and provide constructive feedback.

Your answer MUST be only a JSON array of objects.
Each JSON object must have exactly these keys:
- "comment": the review comment text (200 words maximum).
- "line_number": the line number in the MODIFIED (head) file where the comment belongs.
- "is_critical": true if this is a blocking bug or a security flaw, false otherwise.

If the code needs no feedback, return an empty JSON array: [].

--- File: {filename} (Status: {status}) ---
{patch}
"#,
        filename = file.filename,
        status = file.status,
        patch = patch,
    )
}

/// Remove a markdown code fence (```` ```json ```` or bare ```` ``` ````)
/// wrapped around the model's answer.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
