use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::deserializers::{de_option_f64_forgiving, de_string_forgiving};

/// The applicant document. Every level defaults so partially filled JSON loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    /// Most recent first. Nothing re-sorts this list; index 0 is treated as current.
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Skills,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<String>,
    pub documents: Documents,
    /// Keyed by site domain, e.g. `boards.greenhouse.io`.
    pub credentials: BTreeMap<String, SiteCredential>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    #[serde(deserialize_with = "de_string_forgiving")]
    pub first_name: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub last_name: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub email: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub phone: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub linkedin: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub github: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub portfolio: String,
    pub address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "de_string_forgiving")]
    pub street: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub city: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub state: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub zip: String,
    /// `None` only when the key is missing from the stored document.
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    #[serde(deserialize_with = "de_string_forgiving")]
    pub school: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub degree: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub major: String,
    #[serde(deserialize_with = "de_option_f64_forgiving")]
    pub gpa: Option<f64>,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub start_date: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "de_string_forgiving")]
    pub company: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub title: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub start_date: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub end_date: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub languages: Vec<String>,
    pub soft_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Documents {
    #[serde(deserialize_with = "de_string_forgiving")]
    pub resume_path: String,
    #[serde(alias = "cover_letter_template", deserialize_with = "de_string_forgiving")]
    pub cover_letter_path: String,
    #[serde(deserialize_with = "de_string_forgiving")]
    pub transcript_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteCredential {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl Profile {
    /// Template written by `profile init`: empty strings everywhere, country key present.
    pub fn template() -> Self {
        let mut profile = Profile::default();
        profile.personal_info.address.country = Some(String::new());
        profile
    }

    /// A profile is usable once it carries at least a first name.
    pub fn is_configured(&self) -> bool {
        !self.personal_info.first_name.trim().is_empty()
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.personal_info.first_name, self.personal_info.last_name
        )
        .trim()
        .to_string()
    }

    /// Most recent education entry, by list position.
    pub fn latest_education(&self) -> Option<&EducationEntry> {
        self.education.first()
    }

    pub fn summary(&self) -> String {
        let technical = &self.skills.technical;
        let mut skills = technical
            .iter()
            .take(5)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if technical.len() > 5 {
            skills.push_str("...");
        }

        format!(
            "Profile Summary:\n\
             ----------------\n\
             Name: {}\n\
             Email: {}\n\
             Phone: {}\n\n\
             Education: {} entries\n\
             Experience: {} entries\n\
             Projects: {} entries\n\
             Skills: {}",
            self.full_name(),
            self.personal_info.email,
            self.personal_info.phone,
            self.education.len(),
            self.experience.len(),
            self.projects.len(),
            skills
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_deserializes_with_defaults() {
        let json = r#"{"personal_info": {"first_name": "Ada", "email": "ada@example.com"}}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.personal_info.first_name, "Ada");
        assert!(profile.education.is_empty());
        assert!(profile.personal_info.address.country.is_none());
        assert!(profile.credentials.is_empty());
    }

    #[test]
    fn test_hand_edited_numbers_load() {
        let json = r#"{
            "personal_info": {
                "first_name": "Ada",
                "phone": 5550100,
                "address": {"zip": 30602}
            },
            "education": [{"school": "State", "gpa": "3.8", "end_date": 2025}]
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.personal_info.phone, "5550100");
        assert_eq!(profile.personal_info.address.zip, "30602");
        assert_eq!(profile.education[0].gpa, Some(3.8));
        assert_eq!(profile.education[0].end_date, "2025");
    }

    #[test]
    fn test_cover_letter_template_alias() {
        let json = r#"{"documents": {"cover_letter_template": "/tmp/cl.pdf"}}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.documents.cover_letter_path, "/tmp/cl.pdf");
    }

    #[test]
    fn test_template_has_country_key() {
        let profile = Profile::template();
        assert_eq!(profile.personal_info.address.country.as_deref(), Some(""));
        assert!(!profile.is_configured());
    }

    #[test]
    fn test_full_name_trims_missing_last_name() {
        let mut profile = Profile::default();
        profile.personal_info.first_name = "Ada".to_string();
        assert_eq!(profile.full_name(), "Ada");
    }

    #[test]
    fn test_summary_truncates_skills_list() {
        let mut profile = Profile::default();
        profile.personal_info.first_name = "Ada".to_string();
        profile.personal_info.last_name = "Lovelace".to_string();
        profile.skills.technical = ["Rust", "Go", "SQL", "C", "Python", "Zig"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let summary = profile.summary();
        assert!(summary.contains("Name: Ada Lovelace"));
        assert!(summary.contains("Skills: Rust, Go, SQL, C, Python..."));
        assert!(!summary.contains("Zig"));
    }
}
