use tracing::warn;

use crate::fallback::{Prompter, YesNo};
use crate::models::profile::{EducationEntry, ExperienceEntry, Profile};

const DEFAULT_COUNTRY: &str = "USA";

/// Walks the operator through the profile sections and returns the updated
/// profile. Blank answers keep whatever the profile already had. The caller
/// persists the result.
pub async fn run_setup(prompter: &dyn Prompter, mut profile: Profile) -> Profile {
    println!("\nPersonal Information\n{}", "-".repeat(60));
    let info = &mut profile.personal_info;
    ask_into(prompter, "First Name", &mut info.first_name).await;
    ask_into(prompter, "Last Name", &mut info.last_name).await;
    ask_into(prompter, "Email", &mut info.email).await;
    ask_into(prompter, "Phone", &mut info.phone).await;
    ask_into(prompter, "LinkedIn URL (optional)", &mut info.linkedin).await;
    ask_into(prompter, "GitHub URL (optional)", &mut info.github).await;
    ask_into(prompter, "Portfolio URL (optional)", &mut info.portfolio).await;

    println!("\nAddress\n{}", "-".repeat(60));
    let address = &mut info.address;
    ask_into(prompter, "Street", &mut address.street).await;
    ask_into(prompter, "City", &mut address.city).await;
    ask_into(prompter, "State", &mut address.state).await;
    ask_into(prompter, "ZIP Code", &mut address.zip).await;
    let country = prompter
        .ask("", &format!("Country (default: {DEFAULT_COUNTRY})"))
        .await;
    address.country = Some(if country.trim().is_empty() {
        DEFAULT_COUNTRY.to_string()
    } else {
        country.trim().to_string()
    });

    println!("\nEducation\n{}", "-".repeat(60));
    let mut entries = Vec::new();
    let mut question = "Add education? (y/n)";
    while confirm(prompter, question).await {
        entries.push(EducationEntry {
            school: ask(prompter, "School/University").await,
            degree: ask(prompter, "Degree (e.g., Bachelor of Science)").await,
            major: ask(prompter, "Major").await,
            gpa: parse_gpa(&ask(prompter, "GPA").await),
            start_date: ask(prompter, "Start Date (YYYY-MM)").await,
            end_date: ask(prompter, "End Date (YYYY-MM)").await,
        });
        question = "Add another education entry? (y/n)";
    }
    // Entered most recent first; new entries go ahead of any existing ones.
    if !entries.is_empty() {
        entries.append(&mut profile.education);
        profile.education = entries;
    }

    println!("\nWork Experience\n{}", "-".repeat(60));
    let mut entries = Vec::new();
    let mut question = "Add work experience? (y/n)";
    while confirm(prompter, question).await {
        entries.push(ExperienceEntry {
            company: ask(prompter, "Company").await,
            title: ask(prompter, "Job Title").await,
            start_date: ask(prompter, "Start Date (YYYY-MM)").await,
            end_date: ask(prompter, "End Date (YYYY-MM or 'Present')").await,
            description: ask(prompter, "Brief Description").await,
        });
        question = "Add another experience entry? (y/n)";
    }
    if !entries.is_empty() {
        entries.append(&mut profile.experience);
        profile.experience = entries;
    }

    println!("\nSkills\n{}", "-".repeat(60));
    let technical = split_list(&ask(prompter, "Technical Skills (comma-separated)").await);
    if !technical.is_empty() {
        profile.skills.technical = technical;
    }
    let languages = split_list(&ask(prompter, "Languages (comma-separated)").await);
    if !languages.is_empty() {
        profile.skills.languages = languages;
    }

    println!("\nDocuments\n{}", "-".repeat(60));
    let documents = &mut profile.documents;
    ask_into(prompter, "Resume file path (leave blank if none)", &mut documents.resume_path).await;
    ask_into(
        prompter,
        "Cover letter file path (leave blank if none)",
        &mut documents.cover_letter_path,
    )
    .await;
    ask_into(
        prompter,
        "Transcript file path (leave blank if none)",
        &mut documents.transcript_path,
    )
    .await;

    profile
}

async fn ask(prompter: &dyn Prompter, label: &str) -> String {
    prompter.ask("", label).await.trim().to_string()
}

async fn ask_into(prompter: &dyn Prompter, label: &str, slot: &mut String) {
    let answer = ask(prompter, label).await;
    if !answer.is_empty() {
        *slot = answer;
    }
}

async fn confirm(prompter: &dyn Prompter, question: &str) -> bool {
    YesNo::parse(&ask(prompter, question).await) == Some(YesNo::Yes)
}

fn parse_gpa(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(gpa) => Some(gpa),
        Err(_) => {
            warn!("Ignoring GPA {raw:?}: not a number");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::scripted::ScriptedPrompter;

    #[tokio::test]
    async fn test_setup_builds_profile() {
        let prompter = ScriptedPrompter::new(&[
            // personal info
            "Ada", "Lovelace", "ada@example.com", "555-0100", "", "https://github.com/ada", "",
            // address
            "1 Main St", "London", "", "N1", "",
            // education
            "y", "State University", "BS", "Computer Science", "3.9", "2021-09", "2025-05",
            "n",
            // experience
            "n",
            // skills
            "Rust, SQL , ", "English",
            // documents
            "/docs/resume.pdf", "", "",
        ]);

        let profile = run_setup(&prompter, Profile::template()).await;

        assert!(profile.is_configured());
        assert_eq!(profile.full_name(), "Ada Lovelace");
        assert_eq!(profile.personal_info.github, "https://github.com/ada");
        assert_eq!(profile.personal_info.linkedin, "");
        assert_eq!(profile.personal_info.address.city, "London");
        assert_eq!(profile.personal_info.address.country.as_deref(), Some("USA"));
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.education[0].gpa, Some(3.9));
        assert!(profile.experience.is_empty());
        assert_eq!(profile.skills.technical, vec!["Rust", "SQL"]);
        assert_eq!(profile.documents.resume_path, "/docs/resume.pdf");
    }

    #[tokio::test]
    async fn test_blank_answers_keep_existing_values() {
        let mut existing = Profile::template();
        existing.personal_info.first_name = "Ada".to_string();
        existing.personal_info.address.country = Some("UK".to_string());

        // every answer blank (the prompter runs dry), except country
        let prompter = ScriptedPrompter::new(&[
            "", "", "", "", "", "", "", "", "", "", "", "Canada",
        ]);
        let profile = run_setup(&prompter, existing).await;

        assert_eq!(profile.personal_info.first_name, "Ada");
        assert_eq!(profile.personal_info.address.country.as_deref(), Some("Canada"));
    }

    #[test]
    fn test_parse_gpa() {
        assert_eq!(parse_gpa(""), None);
        assert_eq!(parse_gpa("3.5"), Some(3.5));
        assert_eq!(parse_gpa("A+"), None);
    }
}
