// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs alongside it and builds on these.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated answers tied to what the applicant actually provided.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Answer only from the applicant profile provided. \
    Do NOT invent employers, dates, degrees, or numbers. \
    If the profile does not support an answer, say so briefly instead of guessing.";
