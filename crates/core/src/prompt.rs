//! Prompt text
//!
//! System prompts for generation and auto-fix, the corrective instruction
//! appended when files are missing, and log previews.

use crate::manifest::CANONICAL_FILES;

/// Auto-fix request coming from the preview.
#[derive(Debug, Clone, Default)]
pub struct FixRequest {
    pub error_message: String,
    pub stack_trace: String,
    pub file_content: String,
    pub filename: String,
}

/// Build the system prompt used for application generation.
///
/// Lists every canonical file so the model knows the exact fence labels the
/// completeness check expects.
pub fn generation_system_prompt() -> String {
    let required = CANONICAL_FILES
        .iter()
        .enumerate()
        .map(|(i, path)| format!("{}. {}", i + 1, path))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\
You are an expert fullstack developer. Build the application the user describes.
Answer in two parts.

PART 1 - TEXT RESPONSE
A short plain-text message, without code blocks, that:
- summarizes the user's idea,
- describes the generated application and its key features,
- suggests how it could be customized.

PART 2 - CODE FILES
Every file in its own markdown code block whose label is the exact file path.
Required files:
{required}

Format each file like this:
```public/index.html
file content
```
```src/App.js
file content
```

Rules:
- Use the exact paths listed above as code block labels.
- Include every required file; a response missing any of them is rejected.
- The code must be complete and runnable.
- When the app would need an external API (weather, maps, products, posts,
  news), use a realistic simulated data array of 5-7 entries instead, mark it
  as simulated in a code comment and in the UI, and explain how to swap in a
  real API.
- Put modern, responsive styles in src/index.css using CSS variables, flexbox or
  grid, media queries, hover and focus states, and CSS transitions or keyframe
  animations. Make sure src/App.js imports the styles it uses."
    )
}

/// Corrective text appended to the user prompt after an incomplete answer.
///
/// Names every missing file and shows a worked example fence.
pub fn missing_files_instruction(missing: &[String]) -> String {
    let example = missing.first().map(String::as_str).unwrap_or("src/index.css");

    format!(
        "\n\nIMPORTANT: Your last response was missing these required files: {}. \
Regenerate and include ALL of these files. Each file must be in its own code block \
labelled with the EXACT filename and path. For example:\n\
```{example}\n/* file content here */\n```\n\
Make sure every missing file is included in your response.",
        missing.join(", ")
    )
}

/// Append the corrective instruction for `missing` to `prompt`.
pub fn augment_prompt(prompt: &str, missing: &[String]) -> String {
    format!("{prompt}{}", missing_files_instruction(missing))
}

/// Build the system prompt for the auto-fix flow.
pub fn fix_system_prompt(request: &FixRequest) -> String {
    format!(
        "\
You are an expert fullstack developer and code fixer. Given the error message, stack trace \
and code below, suggest a patch or fixed code that resolves the error. Return ONLY the fixed \
code, or a unified diff if appropriate. Do not include explanations.

Error message: {}
Stack trace: {}
Filename: {}
Code:
{}
---
Respond with the fixed code or a patch.",
        request.error_message, request.stack_trace, request.filename, request.file_content
    )
}

/// Build the user prompt for the auto-fix flow.
pub fn fix_user_prompt(request: &FixRequest) -> String {
    format!(
        "Error: {}\nStack trace: {}\nFilename: {}\nCode:\n{}\n",
        request.error_message, request.stack_trace, request.filename, request.file_content
    )
}

/// Shorten `text` to at most `max_chars` characters for log previews.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
