//! Field Classifier: maps a control's text attributes to a `Purpose`.
//!
//! Rule groups are evaluated strictly in order and the first hit wins:
//! 1. yes/no questions needing a human judgment
//! 2. demographic / referral questions that are always left blank
//! 3. input-type shortcuts (`email`, `tel`, `file`)
//! 4. named profile fields, most specific first
//! 5. `Unknown`
//!
//! Table order is load-bearing: later rules are deliberately shadowed by earlier ones.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::form::purpose::Purpose;

/// One row of an ordered rule table.
struct Rule {
    pattern: Regex,
    /// Reject a match when this word appears later on the same line.
    unless_followed_by: Option<&'static str>,
    purpose: Purpose,
}

impl Rule {
    fn new(pattern: &str, purpose: Purpose) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("classifier pattern must compile"),
            unless_followed_by: None,
            purpose,
        }
    }

    fn unless_followed_by(mut self, word: &'static str) -> Self {
        self.unless_followed_by = Some(word);
        self
    }

    fn matches(&self, haystack: &str) -> bool {
        match self.unless_followed_by {
            None => self.pattern.is_match(haystack),
            Some(word) => self.pattern.find_iter(haystack).any(|m| {
                let rest_of_line = haystack[m.end()..].split('\n').next().unwrap_or("");
                !rest_of_line.contains(word)
            }),
        }
    }
}

static YES_NO_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            r"\bpreviously[\s_-]?worked\b|\bworked[\s_-]?for\b|\bformer[\s_-]?employee\b",
            Purpose::AskYesNo,
        ),
        Rule::new(
            r"\brelocate\b|\brelocation\b|\bwilling[\s_-]?to[\s_-]?relocate\b",
            Purpose::AskYesNo,
        ),
        Rule::new(
            r"\bsponsor\b|\bsponsorship\b|\bwork[\s_-]?authorization\b|\bvisa\b",
            Purpose::AskYesNo,
        ),
        Rule::new(
            r"\beligible[\s_-]?to[\s_-]?work\b|\blegal[\s_-]?to[\s_-]?work\b",
            Purpose::AskYesNo,
        ),
    ]
});

static SKIP_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    [
        r"\breferral\b",
        r"\brefer\b",
        r"\bemployee[\s_-]?referral\b",
        r"\bhow[\s_-]?did[\s_-]?you[\s_-]?hear\b",
        r"\bveteran\b",
        r"\bdisability\b",
        r"\bethnicity\b",
        r"\brace\b",
        r"\bgender\b",
    ]
    .iter()
    .map(|p| Rule::new(p, Purpose::SkipOptional))
    .collect()
});

static PROFILE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(r"\blegal[\s_-]?first\b", Purpose::FirstName),
        Rule::new(r"\bfirst[\s_-]?name\b", Purpose::FirstName).unless_followed_by("refer"),
        Rule::new(r"\blegal[\s_-]?last\b", Purpose::LastName),
        Rule::new(r"\blast[\s_-]?name\b", Purpose::LastName).unless_followed_by("refer"),
        Rule::new(r"\bmiddle[\s_-]?name\b", Purpose::MiddleName),
        Rule::new(r"\bpreferred[\s_-]?name\b", Purpose::PreferredName),
        Rule::new(r"\bfull[\s_-]?name\b", Purpose::FullName),
        Rule::new(r"\bemail\b", Purpose::Email),
        Rule::new(r"\bphone\b|\btel\b|\bmobile\b", Purpose::Phone),
        Rule::new(
            r"\baddress\b|\bstreet\b|\baddress[\s_-]?line\b",
            Purpose::Address,
        ),
        Rule::new(r"\bcity\b", Purpose::City),
        Rule::new(r"\bstate\b|\bprovince\b", Purpose::State),
        Rule::new(r"\bzip\b|\bpostal\b", Purpose::Zip),
        Rule::new(r"\bcountry\b", Purpose::Country),
        Rule::new(r"\blinkedin\b", Purpose::Linkedin),
        Rule::new(r"\bgithub\b", Purpose::Github),
        Rule::new(r"\bportfolio\b|\bwebsite\b", Purpose::Portfolio),
        Rule::new(r"\buniversity\b|\bcollege\b|\bschool\b", Purpose::University),
        Rule::new(r"\bdegree\b", Purpose::Degree),
        Rule::new(r"\bmajor\b|\bfield[\s_-]?of[\s_-]?study\b", Purpose::Major),
        Rule::new(r"\bgpa\b", Purpose::Gpa),
        Rule::new(r"\bgraduation\b|\bgrad[\s_-]?date\b", Purpose::Graduation),
        Rule::new(r"\bresume\b|\bcv\b", Purpose::Resume),
        Rule::new(r"\bcover[\s_-]?letter\b", Purpose::CoverLetter),
        Rule::new(r"\btranscript\b", Purpose::Transcript),
        Rule::new(r"\bstart[\s_-]?date\b", Purpose::StartDate),
        Rule::new(r"\bend[\s_-]?date\b", Purpose::EndDate),
        Rule::new(r"\bpassword\b", Purpose::Password),
    ]
});

/// Classifies a field from its text attributes. Pure: the same inputs always
/// produce the same `Purpose`.
pub fn classify(
    name: &str,
    id: &str,
    placeholder: &str,
    label: &str,
    input_type: &str,
) -> Purpose {
    let haystack = format!("{name} {id} {placeholder} {label}").to_lowercase();

    if let Some(purpose) = first_match(&YES_NO_RULES, &haystack) {
        return purpose;
    }
    if let Some(purpose) = first_match(&SKIP_RULES, &haystack) {
        return purpose;
    }
    if let Some(purpose) = classify_by_input_type(&input_type.to_lowercase(), &haystack) {
        return purpose;
    }
    first_match(&PROFILE_RULES, &haystack).unwrap_or(Purpose::Unknown)
}

fn first_match(rules: &[Rule], haystack: &str) -> Option<Purpose> {
    rules.iter().find(|r| r.matches(haystack)).map(|r| r.purpose)
}

fn classify_by_input_type(input_type: &str, haystack: &str) -> Option<Purpose> {
    match input_type {
        "email" => Some(Purpose::Email),
        "tel" => Some(Purpose::Phone),
        "file" => Some(if haystack.contains("resume") || haystack.contains("cv") {
            Purpose::Resume
        } else if haystack.contains("cover") {
            Purpose::CoverLetter
        } else if haystack.contains("transcript") {
            Purpose::Transcript
        } else {
            Purpose::FileUpload
        }),
        _ => None,
    }
}
