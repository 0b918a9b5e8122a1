//! One application attempt end to end: track, navigate, fill, screenshot,
//! and optionally submit. Failures are recorded, never raised.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserError, BrowserPage};
use crate::errors::AppError;
use crate::fallback::{FallbackResolver, Prompter, YesNo};
use crate::form::{FillReport, FormFiller};
use crate::models::profile::Profile;
use crate::tracker::{ApplicationStatus, ApplicationTracker};

const PAGE_LOAD_WAIT_MS: u64 = 2_000;
const CLICK_SETTLE_WAIT_MS: u64 = 3_000;
const CLICKABLE_SELECTOR: &str = "button, a, [role=\"button\"]";
const SUBMIT_SELECTORS: &[&str] = &["button[type=\"submit\"]", "input[type=\"submit\"]"];
const SUBMIT_WORDS: &[&str] = &["submit", "apply", "send"];
const DEFAULT_POSITION: &str = "Internship";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    pub url: String,
}

impl JobPosting {
    /// Validates the URL and fills a missing company from its host name.
    pub fn new(url: &str, company: Option<String>, position: Option<String>) -> Result<Self, AppError> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| AppError::Validation(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "URL must start with http:// or https:// (got '{url}')"
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| AppError::Validation(format!("URL '{url}' has no host")))?;

        let company = company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| company_from_host(host));
        let position = position
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_POSITION.to_string());

        Ok(Self {
            company,
            position,
            url: parsed.to_string(),
        })
    }
}

/// `www.acme.com` → `Acme`.
fn company_from_host(host: &str) -> String {
    let label = host
        .strip_prefix("www.")
        .unwrap_or(host)
        .split('.')
        .next()
        .unwrap_or(host);
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationResult {
    pub success: bool,
    pub application_id: String,
    pub submitted: bool,
    pub fill_report: Option<FillReport>,
    pub error: Option<String>,
}

impl ApplicationResult {
    fn failed(application_id: String, error: String) -> Self {
        Self {
            success: false,
            application_id,
            submitted: false,
            fill_report: None,
            error: Some(error),
        }
    }
}

pub struct ApplicationBot<'a, P: BrowserPage> {
    page: &'a P,
    profile: Profile,
    fallback: FallbackResolver,
    prompter: Option<Arc<dyn Prompter>>,
    tracker: ApplicationTracker,
    screenshot_dir: PathBuf,
}

impl<'a, P: BrowserPage> ApplicationBot<'a, P> {
    pub fn new(
        page: &'a P,
        profile: Profile,
        fallback: FallbackResolver,
        prompter: Option<Arc<dyn Prompter>>,
        tracker: ApplicationTracker,
        screenshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            page,
            profile,
            fallback,
            prompter,
            tracker,
            screenshot_dir: screenshot_dir.into(),
        }
    }

    pub async fn apply_to_job(&self, job: &JobPosting, submit: bool) -> ApplicationResult {
        println!("\n{}", "=".repeat(60));
        println!("Applying to: {} at {}", job.position, job.company);
        println!("URL: {}", job.url);
        println!("{}\n", "=".repeat(60));

        let application_id = match self
            .tracker
            .add_application(
                &job.company,
                &job.position,
                &job.url,
                ApplicationStatus::InProgress,
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!("Could not record application: {e}");
                return ApplicationResult::failed(String::new(), e.to_string());
            }
        };

        match self.run(&application_id, job, submit).await {
            Ok((report, submitted)) => ApplicationResult {
                success: true,
                application_id,
                submitted,
                fill_report: Some(report),
                error: None,
            },
            Err(e) => {
                let message = e.to_string();
                error!("Application {application_id} failed: {message}");

                let path = self.screenshot_path(&application_id, "error");
                if let Err(se) = self.page.screenshot(&path).await {
                    debug!("Error screenshot not taken: {se}");
                }
                if let Err(te) = self.tracker.mark_failed(&application_id, &message).await {
                    warn!("Could not mark {application_id} failed: {te}");
                }
                ApplicationResult::failed(application_id, message)
            }
        }
    }

    /// Sequential; waits `delay` between jobs.
    pub async fn apply_to_many(
        &self,
        jobs: &[JobPosting],
        submit: bool,
        delay: Duration,
    ) -> Vec<ApplicationResult> {
        let mut results = Vec::with_capacity(jobs.len());

        for (i, job) in jobs.iter().enumerate() {
            info!("Processing job {}/{}", i + 1, jobs.len());
            results.push(self.apply_to_job(job, submit).await);

            if i + 1 < jobs.len() && !delay.is_zero() {
                info!("Waiting {}s before next application", delay.as_secs_f32());
                tokio::time::sleep(delay).await;
            }
        }

        let successful = results.iter().filter(|r| r.success).count();
        println!("\n{}", "=".repeat(60));
        println!("BATCH APPLICATION SUMMARY");
        println!("{}", "=".repeat(60));
        println!("Total jobs: {}", jobs.len());
        println!("Successful: {successful}");
        println!("Failed: {}", jobs.len() - successful);
        println!("{}\n", "=".repeat(60));

        results
    }

    async fn run(
        &self,
        application_id: &str,
        job: &JobPosting,
        submit: bool,
    ) -> Result<(FillReport, bool), AppError> {
        info!("Navigating to {}", job.url);
        self.page.navigate(&job.url).await?;
        self.page.wait(PAGE_LOAD_WAIT_MS).await;

        if !self.click_apply_entry().await? {
            info!("No 'Apply Now' entry point; assuming the form is already open");
        }

        self.screenshot(application_id, "initial").await?;

        let report = FormFiller::new(self.page, &self.profile, &self.fallback)
            .auto_fill()
            .await?;
        println!("\n{}", report.render());
        for field in report.required_unfilled() {
            warn!(
                purpose = %field.purpose,
                name = %field.name,
                "Required field left empty: {}",
                field.label
            );
        }

        self.screenshot(application_id, "filled").await?;
        self.tracker
            .record_fill_results(application_id, &report)
            .await?;

        if !submit {
            println!("\nPreview mode - application NOT submitted");
            return Ok((report, false));
        }
        if !self.confirm_submit().await {
            println!("\nSubmission cancelled by operator");
            return Ok((report, false));
        }

        self.submit_form().await?;
        self.tracker.mark_submitted(application_id).await?;
        println!("\nApplication submitted");
        Ok((report, true))
    }

    /// Clicks a visible "Apply Now" control, skipping LinkedIn quick-apply.
    async fn click_apply_entry(&self) -> Result<bool, BrowserError> {
        for element in self.page.query_all(CLICKABLE_SELECTOR).await? {
            let Some(text) = self.visible_text(&element).await? else {
                continue;
            };
            if text.contains("apply now") && !text.contains("linkedin") {
                info!("Clicking 'Apply Now' entry point");
                self.page.click(&element).await?;
                self.page.wait(CLICK_SETTLE_WAIT_MS).await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn confirm_submit(&self) -> bool {
        let Some(prompter) = &self.prompter else {
            return true;
        };
        let reply = prompter
            .ask("Submit this application now?", "yes/no")
            .await;
        YesNo::parse(&reply) == Some(YesNo::Yes)
    }

    async fn submit_form(&self) -> Result<(), AppError> {
        for selector in SUBMIT_SELECTORS {
            if let Some(element) = self.page.query_one(selector).await? {
                info!("Found submit button: {selector}");
                self.page.click(&element).await?;
                self.page.wait(CLICK_SETTLE_WAIT_MS).await;
                return Ok(());
            }
        }

        for element in self.page.query_all(CLICKABLE_SELECTOR).await? {
            let Some(text) = self.visible_text(&element).await? else {
                continue;
            };
            if SUBMIT_WORDS.iter().any(|w| text.contains(w)) {
                info!("Found submit control by text: {text:?}");
                self.page.click(&element).await?;
                self.page.wait(CLICK_SETTLE_WAIT_MS).await;
                return Ok(());
            }
        }

        Err(AppError::NotFound("Could not find submit button".to_string()))
    }

    /// Lower-cased text of a visible element. Non-fatal read errors hide it.
    async fn visible_text(&self, element: &P::Element) -> Result<Option<String>, BrowserError> {
        match self.read_visible_text(element).await {
            Err(e) if !e.is_fatal() => Ok(None),
            other => other,
        }
    }

    async fn read_visible_text(
        &self,
        element: &P::Element,
    ) -> Result<Option<String>, BrowserError> {
        if !self.page.is_visible(element).await? {
            return Ok(None);
        }
        let text = self.page.inner_text(element).await?;
        Ok(Some(text.trim().to_lowercase()))
    }

    async fn screenshot(&self, application_id: &str, stage: &str) -> Result<(), BrowserError> {
        let path = self.screenshot_path(application_id, stage);
        self.page.screenshot(&path).await?;
        info!("Screenshot saved: {}", path.display());
        Ok(())
    }

    fn screenshot_path(&self, application_id: &str, stage: &str) -> PathBuf {
        self.screenshot_dir
            .join(format!("{application_id}_{stage}.png"))
    }
}
