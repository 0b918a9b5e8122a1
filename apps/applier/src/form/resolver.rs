//! Value Resolver: static purpose → profile lookup. No I/O, never fails.

use crate::form::purpose::Purpose;
use crate::models::profile::Profile;

const DEFAULT_COUNTRY: &str = "USA";

/// Returns the fill value for `purpose`, or `None` when the profile has nothing
/// usable. Empty strings count as absent.
pub fn resolve(purpose: Purpose, profile: &Profile) -> Option<String> {
    let info = &profile.personal_info;
    let address = &info.address;
    let education = profile.latest_education();
    let documents = &profile.documents;

    let value = match purpose {
        Purpose::FirstName | Purpose::PreferredName => info.first_name.clone(),
        Purpose::LastName => info.last_name.clone(),
        Purpose::FullName => profile.full_name(),
        Purpose::Email => info.email.clone(),
        Purpose::Phone => info.phone.clone(),
        Purpose::Address => address.street.clone(),
        Purpose::City => address.city.clone(),
        Purpose::State => address.state.clone(),
        Purpose::Zip => address.zip.clone(),
        Purpose::Country => address
            .country
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        Purpose::Linkedin => info.linkedin.clone(),
        Purpose::Github => info.github.clone(),
        Purpose::Portfolio => info.portfolio.clone(),
        Purpose::University => education?.school.clone(),
        Purpose::Degree => education?.degree.clone(),
        Purpose::Major => education?.major.clone(),
        Purpose::Gpa => education?.gpa.map(format_gpa)?,
        Purpose::Graduation => education?.end_date.clone(),
        Purpose::Resume => documents.resume_path.clone(),
        Purpose::CoverLetter => documents.cover_letter_path.clone(),
        Purpose::Transcript => documents.transcript_path.clone(),
        Purpose::AskYesNo
        | Purpose::SkipOptional
        | Purpose::MiddleName
        | Purpose::FileUpload
        | Purpose::StartDate
        | Purpose::EndDate
        | Purpose::Password
        | Purpose::Unknown => return None,
    };

    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Whole-number GPAs keep one decimal (`4.0`, not `4`).
fn format_gpa(gpa: f64) -> String {
    if gpa.fract() == 0.0 {
        format!("{gpa:.1}")
    } else {
        gpa.to_string()
    }
}
