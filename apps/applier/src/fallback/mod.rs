//! Fallback Resolver: answers for fields the profile cannot fill, from a human
//! at the terminal or from the answer service.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::models::profile::Profile;

pub mod answer;
pub mod prompts;

use answer::AnswerService;

/// Asks the operator a question and waits for a line of text.
///
/// An empty reply is a valid answer meaning "skip".
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn ask(&self, question: &str, hint: &str) -> String;
}

/// Reads answers from stdin on a blocking thread. EOF counts as an empty answer.
pub struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn ask(&self, question: &str, hint: &str) -> String {
        let prompt = if question.is_empty() {
            format!("{hint}: ")
        } else {
            format!("\n? {question}\n  {hint}: ")
        };

        let read = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
            let mut stdout = std::io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match read {
            Ok(Ok(line)) => line.trim().to_string(),
            Ok(Err(e)) => {
                warn!("Failed to read answer from stdin: {e}");
                String::new()
            }
            Err(e) => {
                warn!("Prompt task failed: {e}");
                String::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    /// Accepts exactly `yes`/`y`/`no`/`n`, any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(YesNo::Yes),
            "no" | "n" => Some(YesNo::No),
            _ => None,
        }
    }

    /// Reads the leading word of a free-text answer, e.g. "Yes, I am willing".
    pub fn from_leading_word(input: &str) -> Option<Self> {
        let word = input
            .split_whitespace()
            .next()?
            .trim_matches(|c: char| !c.is_alphanumeric());
        Self::parse(word)
    }

    /// Option text most forms use.
    pub fn option_text(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

/// Interactive mode is simply "a prompter is present".
#[derive(Default)]
pub struct FallbackResolver {
    prompter: Option<Arc<dyn Prompter>>,
    service: Option<AnswerService>,
}

impl FallbackResolver {
    pub fn new(prompter: Option<Arc<dyn Prompter>>, service: Option<AnswerService>) -> Self {
        Self { prompter, service }
    }

    pub fn is_interactive(&self) -> bool {
        self.prompter.is_some()
    }

    /// Blocks until the operator replies. `None` when not interactive or the
    /// reply is blank.
    pub async fn ask_human(&self, question: &str, yes_no: bool) -> Option<String> {
        let prompter = self.prompter.as_ref()?;
        let hint = if yes_no {
            "Your answer (yes/no, Enter to skip)"
        } else {
            "Your answer (Enter to skip)"
        };
        let reply = prompter.ask(question, hint).await;
        let reply = reply.trim();
        (!reply.is_empty()).then(|| reply.to_string())
    }

    /// Generated answer text, or `None` on any service failure.
    pub async fn generate(&self, question: &str, profile: &Profile) -> Option<String> {
        let service = self.service.as_ref()?;
        service
            .answer(question, profile)
            .await
            .map(|a| a.answer.trim().to_string())
    }
}
