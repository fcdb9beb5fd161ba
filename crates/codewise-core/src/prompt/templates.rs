//! Built-in prompts.
//!
//! The structured prompts take a `format_instructions` slot which the
//! structured stage fills from the target schema.

use super::PromptSpec;

pub const ANALYSIS: PromptSpec = PromptSpec::new(
    "analysis",
    r#"You are an expert Python developer. Analyze the following code for optimality, readability, and best practices.

{{ code }}

{{ format_instructions }}

IMPORTANT: Receive the code, analyze it internally, but output ONLY the JSON object matching the schema. Do not output any markdown code blocks (like ```json), no headers, and no conversational text. Just the raw JSON string.
"#,
    &["code", "format_instructions"],
);

pub const TEST_GENERATION: PromptSpec = PromptSpec::new(
    "test_generation",
    r#"You are an expert QA engineer. Generate a comprehensive pytest unit test for the following function:

{{ code }}

Ensure the test covers edge cases and normal execution.

{{ format_instructions }}

IMPORTANT: Output ONLY the JSON object matching the schema. Do not output any markdown code blocks, no headers, and no conversational text.
"#,
    &["code", "format_instructions"],
);

pub const TEST_EXPLANATION: PromptSpec = PromptSpec::new(
    "test_explanation",
    r#"You are a coding instructor. Explain the following pytest code to a beginner:

{{ test_code }}

Break it down step by step, teaching what the test does.

{{ format_instructions }}

IMPORTANT: Output ONLY the JSON object. Do not output any markdown code blocks, no headers, and no conversational text.
"#,
    &["test_code", "format_instructions"],
);

/// Free-form chat. `history` is the prior conversation already rendered as
/// `role: content` lines (empty for a fresh session).
pub const CHAT: PromptSpec = PromptSpec::new(
    "chat",
    r#"system: You are a helpful AI assistant for Python developers.
{% if history %}{{ history }}
{% endif %}user: {{ input }}
assistant:"#,
    &["history", "input"],
);
