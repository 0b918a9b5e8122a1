use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};

pub fn answer_system_prompt() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} You help a job applicant answer application form questions \
         concisely and truthfully. Return a JSON object with an `answer` string, \
         an optional `confidence` between 0 and 1, and optional `evidence` naming the \
         profile fields you relied on."
    )
}

pub fn build_answer_prompt(profile_json: &str, question: &str) -> String {
    format!(
        r#"{NO_INVENTION_INSTRUCTION}

Yes/no questions must start the answer with "Yes" or "No".
Free-text questions get one short paragraph at most.

Profile (JSON):
{profile_json}

Question:
{question}

Return ONLY a JSON object:
{{
  "answer": "...",
  "confidence": 0.0,
  "evidence": ["..."]
}}"#
    )
}
