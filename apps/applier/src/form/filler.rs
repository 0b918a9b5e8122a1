//! Form-Fill Orchestrator.
//!
//! Fields are processed one at a time in discovery order. Each ends in exactly
//! one `FillOutcome`. Per-field browser failures become `Unfilled`; only a
//! fatal browser error leaves `auto_fill` as `Err`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserPage, SelectBy};
use crate::fallback::{FallbackResolver, YesNo};
use crate::form::descriptor::{FieldDescriptor, FieldTag};
use crate::form::detector::FormDetector;
use crate::form::purpose::Purpose;
use crate::form::report::{FillOutcome, FillReport};
use crate::form::resolver::resolve;
use crate::models::profile::Profile;

const TRUTHY_TOKENS: &[&str] = &["true", "yes", "1"];

pub struct FormFiller<'a, P: BrowserPage> {
    page: &'a P,
    profile: &'a Profile,
    fallback: &'a FallbackResolver,
}

impl<'a, P: BrowserPage> FormFiller<'a, P> {
    pub fn new(page: &'a P, profile: &'a Profile, fallback: &'a FallbackResolver) -> Self {
        Self {
            page,
            profile,
            fallback,
        }
    }

    /// Scans the current page and fills every field it can.
    pub async fn auto_fill(&self) -> Result<FillReport, BrowserError> {
        let fields = FormDetector::new(self.page).detect_all_inputs().await?;
        self.fill_fields(&fields).await
    }

    pub async fn fill_fields(&self, fields: &[FieldDescriptor]) -> Result<FillReport, BrowserError> {
        let mut report = FillReport::new(fields.len());

        for field in fields {
            let outcome = self.process(field).await?;
            debug!(purpose = %field.purpose, name = %field.name, ?outcome, "Field processed");
            report.record(field, outcome);
        }

        info!(
            "Form pass complete: {} filled, {} answered, {} skipped, {} unfilled",
            report.filled_count,
            report.user_answered_count,
            report.skipped_count,
            report.unfilled_count
        );
        Ok(report)
    }

    async fn process(&self, field: &FieldDescriptor) -> Result<FillOutcome, BrowserError> {
        match field.purpose {
            Purpose::SkipOptional => Ok(FillOutcome::Skipped),
            Purpose::AskYesNo if self.fallback.is_interactive() => self.answer_yes_no(field).await,
            _ => self.fill_from_profile(field).await,
        }
    }

    async fn fill_from_profile(&self, field: &FieldDescriptor) -> Result<FillOutcome, BrowserError> {
        if let Some(value) = resolve(field.purpose, self.profile) {
            return self.attempt(field, &value, FillOutcome::Filled).await;
        }

        if field.purpose == Purpose::Unknown && !field.label.is_empty() {
            if let Some(answer) = self.fallback.generate(&field.label, self.profile).await {
                return self.attempt(field, &answer, FillOutcome::Filled).await;
            }
        }

        Ok(FillOutcome::Unfilled)
    }

    /// Human first; a blank reply falls through to the answer service.
    async fn answer_yes_no(&self, field: &FieldDescriptor) -> Result<FillOutcome, BrowserError> {
        let question = field.question_text();
        let human = self.fallback.ask_human(question, true).await;

        if field.is_select() {
            let choice = match human {
                Some(reply) => YesNo::parse(&reply),
                None => self
                    .fallback
                    .generate(question, self.profile)
                    .await
                    .and_then(|answer| YesNo::from_leading_word(&answer)),
            };
            let Some(choice) = choice else {
                info!("Could not choose an option for {question:?}; select it manually");
                return Ok(FillOutcome::Unfilled);
            };
            return Ok(if self.select_yes_no(field, choice).await? {
                FillOutcome::UserAnswered
            } else {
                info!("No {:?} option found for {question:?}; select it manually", choice.option_text());
                FillOutcome::Unfilled
            });
        }

        let answer = match human {
            Some(reply) => Some(reply),
            None => self.fallback.generate(question, self.profile).await,
        };
        match answer {
            Some(answer) => self.attempt(field, &answer, FillOutcome::UserAnswered).await,
            None => Ok(FillOutcome::Unfilled),
        }
    }

    /// Exact label first, then exact value.
    async fn select_yes_no(&self, field: &FieldDescriptor, choice: YesNo) -> Result<bool, BrowserError> {
        let selector = match self.visible_selector(field).await {
            Ok(selector) => selector,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Cannot answer {}: {e}", field.purpose);
                return Ok(false);
            }
        };

        let text = choice.option_text();
        for by in [SelectBy::Label(text), SelectBy::Value(text)] {
            match self.page.select_option(selector, by).await {
                Ok(()) => return Ok(true),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Select by {by} failed: {e}"),
            }
        }
        Ok(false)
    }

    /// Maps a fill result onto `success` or `Unfilled`.
    async fn attempt(
        &self,
        field: &FieldDescriptor,
        value: &str,
        success: FillOutcome,
    ) -> Result<FillOutcome, BrowserError> {
        match self.fill_field(field, value).await {
            Ok(()) => Ok(success),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Failed to fill field {}: {e}", field.purpose);
                Ok(FillOutcome::Unfilled)
            }
        }
    }

    async fn fill_field(&self, field: &FieldDescriptor, value: &str) -> Result<(), BrowserError> {
        let selector = self.visible_selector(field).await?;

        match (field.tag, field.input_type.as_str()) {
            (FieldTag::Select, _) => {
                self.page
                    .select_option(selector, SelectBy::Value(value))
                    .await
            }
            (_, "file") => {
                if value.trim().is_empty() {
                    return Ok(());
                }
                self.page.set_input_files(selector, Path::new(value)).await
            }
            (_, "checkbox") => {
                if TRUTHY_TOKENS.contains(&value.trim().to_lowercase().as_str()) {
                    self.page.check(selector).await
                } else {
                    Ok(())
                }
            }
            (_, "radio") => self.page.check(selector).await,
            _ => self.page.fill(selector, value).await,
        }
    }

    /// The field's selector, once the control is confirmed present and visible.
    async fn visible_selector<'f>(&self, field: &'f FieldDescriptor) -> Result<&'f str, BrowserError> {
        let selector = field.selector.as_deref().ok_or_else(|| {
            BrowserError::NotFound(format!("{} field has neither id nor name", field.purpose))
        })?;
        let element = self
            .page
            .query_one(selector)
            .await?
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))?;
        if !self.page.is_visible(&element).await? {
            return Err(BrowserError::NotVisible(selector.to_string()));
        }
        Ok(selector)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::browser::mock::{MockNode, MockPage};
    use crate::fallback::answer::{AnswerBackend, AnswerService, LocalQaClient};
    use crate::fallback::scripted::ScriptedPrompter;
    use crate::models::profile::EducationEntry;

    fn profile() -> Profile {
        let mut p = Profile::default();
        p.personal_info.first_name = "Ada".to_string();
        p.personal_info.last_name = "Lovelace".to_string();
        p.personal_info.email = "a@b.com".to_string();
        p.personal_info.phone = "555-0100".to_string();
        p.documents.resume_path = "/docs/resume.pdf".to_string();
        p.education.push(EducationEntry {
            school: "State University".to_string(),
            degree: "BS".to_string(),
            ..Default::default()
        });
        p
    }

    async fn service_answering(server: &MockServer, answer: &str) -> AnswerService {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": answer })))
            .mount(server)
            .await;
        let client =
            LocalQaClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        AnswerService::new(AnswerBackend::LocalQa(client), Duration::from_secs(5))
    }

    fn interactive(answers: &[&str]) -> (Arc<ScriptedPrompter>, FallbackResolver) {
        let prompter = Arc::new(ScriptedPrompter::new(answers));
        let resolver = FallbackResolver::new(Some(prompter.clone()), None);
        (prompter, resolver)
    }

    async fn run(page: &MockPage, fallback: &FallbackResolver) -> FillReport {
        let profile = profile();
        FormFiller::new(page, &profile, fallback)
            .auto_fill()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_scenario_email_type_is_filled() {
        let page = MockPage::new(vec![MockNode::input("email").name("candidate_email")]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.filled_fields, vec![Purpose::Email]);
        assert_eq!(
            page.value_of("[name=\"candidate_email\"]").as_deref(),
            Some("a@b.com")
        );
    }

    #[tokio::test]
    async fn test_scenario_how_did_you_hear_is_skipped() {
        let page = MockPage::new(vec![MockNode::input("text")
            .name("source")
            .wrapped_in_label("How did you hear about us?")]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.skipped_fields, vec!["How did you hear about us?".to_string()]);
        assert_eq!(page.value_of("[name=\"source\"]").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_scenario_relocate_dropdown_answered_yes() {
        let page = MockPage::new(vec![MockNode::select(&[("Yes", "1"), ("No", "0")])
            .id("relocate")
            .wrapped_in_label("Are you willing to relocate?")]);
        let (prompter, fallback) = interactive(&["yes"]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.user_answered_count, 1);
        assert_eq!(
            report.user_answered_fields,
            vec!["Are you willing to relocate?".to_string()]
        );
        assert_eq!(page.value_of("#relocate").as_deref(), Some("1"));
        assert_eq!(prompter.asked(), vec!["Are you willing to relocate?".to_string()]);
    }

    #[tokio::test]
    async fn test_dropdown_falls_back_to_option_value() {
        let page = MockPage::new(vec![MockNode::select(&[("Sure", "Yes"), ("Nope", "No")])
            .id("sponsor")
            .wrapped_in_label("Will you require visa sponsorship?")]);
        let (_, fallback) = interactive(&["n"]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.user_answered_count, 1);
        assert_eq!(page.value_of("#sponsor").as_deref(), Some("No"));
    }

    #[tokio::test]
    async fn test_dropdown_without_matching_option_is_unfilled() {
        let page = MockPage::new(vec![MockNode::select(&[("Absolutely", "a"), ("Never", "b")])
            .id("relocate")
            .required()
            .wrapped_in_label("Are you willing to relocate?")]);
        let (_, fallback) = interactive(&["yes"]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.unfilled_count, 1);
        assert!(report.unfilled_fields[0].required);
        assert_eq!(page.value_of("#relocate").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_dropdown_blank_reply_uses_service_leading_word() {
        let server = MockServer::start().await;
        let service = service_answering(&server, "No, I am based here.").await;
        let prompter = Arc::new(ScriptedPrompter::new(&[""]));
        let fallback = FallbackResolver::new(Some(prompter), Some(service));

        let page = MockPage::new(vec![MockNode::select(&[("Yes", "y"), ("No", "n")])
            .id("relocate")
            .wrapped_in_label("Are you willing to relocate?")]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.user_answered_count, 1);
        assert_eq!(page.value_of("#relocate").as_deref(), Some("n"));
    }

    #[tokio::test]
    async fn test_yes_no_text_field_takes_literal_reply() {
        let page = MockPage::new(vec![MockNode::input("text")
            .id("authorization")
            .wrapped_in_label("Work authorization")]);
        let (_, fallback) = interactive(&["US citizen"]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.user_answered_count, 1);
        assert_eq!(page.value_of("#authorization").as_deref(), Some("US citizen"));
    }

    #[tokio::test]
    async fn test_yes_no_blank_without_service_is_unfilled() {
        let page = MockPage::new(vec![MockNode::input("text")
            .id("authorization")
            .wrapped_in_label("Work authorization")]);
        let (_, fallback) = interactive(&[""]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.unfilled_count, 1);
        assert_eq!(report.unfilled_fields[0].purpose, Purpose::AskYesNo);
    }

    #[tokio::test]
    async fn test_non_interactive_leaves_yes_no_unfilled() {
        let page = MockPage::new(vec![MockNode::select(&[("Yes", "Yes"), ("No", "No")])
            .id("relocate")
            .wrapped_in_label("Are you willing to relocate?")]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.unfilled_count, 1);
        assert_eq!(page.value_of("#relocate").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_scenario_unknown_textarea_filled_by_service() {
        let server = MockServer::start().await;
        let service = service_answering(&server, "I am a software engineer...").await;
        let prompter = Arc::new(ScriptedPrompter::new(&[""]));
        let fallback = FallbackResolver::new(Some(prompter.clone()), Some(service));

        let page = MockPage::new(vec![MockNode::textarea()
            .id("about")
            .wrapped_in_label("Tell us about yourself")]);
        let report = run(&page, &fallback).await;

        assert_eq!(report.filled_fields, vec![Purpose::Unknown]);
        assert_eq!(
            page.value_of("#about").as_deref(),
            Some("I am a software engineer...")
        );
        assert!(prompter.asked().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_without_service_is_unfilled() {
        let page = MockPage::new(vec![MockNode::textarea()
            .id("about")
            .wrapped_in_label("Tell us about yourself")]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.unfilled_count, 1);
        assert_eq!(report.unfilled_fields[0].label, "Tell us about yourself");
    }

    #[tokio::test]
    async fn test_scenario_invisible_field_is_unfilled_with_required_flag() {
        let page = MockPage::new(vec![
            MockNode::input("text").id("phone_number").name("phone").required().hidden(),
            MockNode::input("text").name("first_name"),
        ]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.unfilled_count, 1);
        assert_eq!(report.unfilled_fields[0].purpose, Purpose::Phone);
        assert!(report.unfilled_fields[0].required);
        assert_eq!(report.required_unfilled().count(), 1);
        // the next field is still processed
        assert_eq!(report.filled_fields, vec![Purpose::FirstName]);
    }

    #[tokio::test]
    async fn test_field_without_selector_is_unfilled() {
        let page = MockPage::new(vec![MockNode::input("email")]);
        let report = run(&page, &FallbackResolver::default()).await;
        assert_eq!(report.unfilled_fields[0].purpose, Purpose::Email);
    }

    #[tokio::test]
    async fn test_control_kinds() {
        let page = MockPage::new(vec![
            MockNode::input("file").id("resume_upload"),
            MockNode::input("file").id("transcript_upload"),
            MockNode::input("text").id("school").wrapped_in_label("University"),
        ]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(
            page.files_of("#resume_upload"),
            vec![std::path::PathBuf::from("/docs/resume.pdf")]
        );
        assert!(page.files_of("#transcript_upload").is_empty());
        assert_eq!(page.value_of("#school").as_deref(), Some("State University"));
        assert_eq!(report.filled_fields, vec![Purpose::Resume, Purpose::University]);
        assert_eq!(report.unfilled_fields[0].purpose, Purpose::Transcript);
    }

    #[tokio::test]
    async fn test_checkbox_needs_truthy_token_and_radio_is_always_checked() {
        let page = MockPage::new(vec![
            MockNode::input("checkbox").id("consent"),
            MockNode::input("radio").id("option_a"),
        ]);
        let profile = profile();
        let fallback = FallbackResolver::default();
        let filler = FormFiller::new(&page, &profile, &fallback);

        let fields = FormDetector::new(&page).detect_all_inputs().await.unwrap();
        filler.fill_field(&fields[0], "Ada").await.unwrap();
        assert!(!page.is_checked("#consent"));
        filler.fill_field(&fields[0], "Yes").await.unwrap();
        assert!(page.is_checked("#consent"));

        filler.fill_field(&fields[1], "BS").await.unwrap();
        assert!(page.is_checked("#option_a"));
    }

    #[tokio::test]
    async fn test_generic_select_matches_option_value() {
        let page = MockPage::new(vec![MockNode::select(&[("Bachelor of Science", "BS")])
            .id("degree")]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.filled_fields, vec![Purpose::Degree]);
        assert_eq!(page.value_of("#degree").as_deref(), Some("BS"));
    }

    #[tokio::test]
    async fn test_first_name_round_trip() {
        let page = MockPage::new(vec![
            MockNode::label_for("fname", "Legal First Name"),
            MockNode::input("text").id("fname"),
        ]);
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.filled_fields, vec![Purpose::FirstName]);
        assert_eq!(page.value_of("#fname").as_deref(), Some("Ada"));
    }

    fn mixed_form() -> Vec<MockNode> {
        vec![
            MockNode::input("text").name("first_name").required(),
            MockNode::input("text").name("last_name").required(),
            MockNode::input("email").name("candidate_email"),
            MockNode::input("text").name("zip").required(),
            MockNode::select(&[("Male", "m"), ("Female", "f")]).name("gender"),
            MockNode::input("text").name("referral_source"),
            MockNode::textarea().name("cover").wrapped_in_label("Anything else?"),
            MockNode::input("text").name("city").hidden(),
        ]
    }

    #[tokio::test]
    async fn test_report_counts_sum_to_total() {
        let page = MockPage::new(mixed_form());
        let report = run(&page, &FallbackResolver::default()).await;

        assert_eq!(report.total_fields, 8);
        assert_eq!(report.outcome_count(), report.total_fields);
        assert_eq!(report.filled_count, 3);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.unfilled_count, 4);
        assert_eq!(
            report.filled_fields,
            vec![Purpose::FirstName, Purpose::LastName, Purpose::Email]
        );
    }

    #[tokio::test]
    async fn test_rerun_produces_identical_report() {
        let page = MockPage::new(mixed_form());
        let fallback = FallbackResolver::default();
        let first = run(&page, &fallback).await;
        let second = run(&page, &fallback).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_disconnect_is_fatal() {
        let page = MockPage::new(mixed_form());
        let profile = profile();
        let fallback = FallbackResolver::default();
        let filler = FormFiller::new(&page, &profile, &fallback);

        let fields = FormDetector::new(&page).detect_all_inputs().await.unwrap();
        page.disconnect();

        let err = filler.fill_fields(&fields).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
