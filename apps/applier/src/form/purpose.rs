use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic tag assigned to a single form control. Exactly one per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Factual yes/no question only the applicant can answer.
    AskYesNo,
    /// Demographic or referral question that is never auto-filled.
    SkipOptional,
    FirstName,
    LastName,
    MiddleName,
    PreferredName,
    FullName,
    Email,
    Phone,
    Address,
    City,
    State,
    Zip,
    Country,
    Linkedin,
    Github,
    Portfolio,
    University,
    Degree,
    Major,
    Gpa,
    Graduation,
    Resume,
    CoverLetter,
    Transcript,
    FileUpload,
    StartDate,
    EndDate,
    Password,
    Unknown,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::AskYesNo => "ask_yes_no",
            Purpose::SkipOptional => "skip_optional",
            Purpose::FirstName => "first_name",
            Purpose::LastName => "last_name",
            Purpose::MiddleName => "middle_name",
            Purpose::PreferredName => "preferred_name",
            Purpose::FullName => "full_name",
            Purpose::Email => "email",
            Purpose::Phone => "phone",
            Purpose::Address => "address",
            Purpose::City => "city",
            Purpose::State => "state",
            Purpose::Zip => "zip",
            Purpose::Country => "country",
            Purpose::Linkedin => "linkedin",
            Purpose::Github => "github",
            Purpose::Portfolio => "portfolio",
            Purpose::University => "university",
            Purpose::Degree => "degree",
            Purpose::Major => "major",
            Purpose::Gpa => "gpa",
            Purpose::Graduation => "graduation",
            Purpose::Resume => "resume",
            Purpose::CoverLetter => "cover_letter",
            Purpose::Transcript => "transcript",
            Purpose::FileUpload => "file_upload",
            Purpose::StartDate => "start_date",
            Purpose::EndDate => "end_date",
            Purpose::Password => "password",
            Purpose::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
