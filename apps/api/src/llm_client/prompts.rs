// Shared prompt fragments.
// Each stage that needs LLM calls defines its own prompts alongside it
// (see analysis::prompts). This file contains cross-cutting fragments.

/// Appended to every stage system prompt to enforce JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds a stage system prompt from a persona line plus the JSON-only rules.
pub fn json_only_system(persona: &str) -> String {
    format!("{persona} {JSON_ONLY_INSTRUCTION}")
}
