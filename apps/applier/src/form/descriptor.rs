use serde::Serialize;

use crate::form::classifier::classify;
use crate::form::purpose::Purpose;

/// Kind of form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldTag {
    Input,
    Textarea,
    Select,
}

impl FieldTag {
    pub fn from_tag_name(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "input" => Some(FieldTag::Input),
            "textarea" => Some(FieldTag::Textarea),
            "select" => Some(FieldTag::Select),
            _ => None,
        }
    }
}

/// One discovered form control, classified at construction.
///
/// Produced fresh on every scan; nothing holds on to descriptors across
/// navigations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub tag: FieldTag,
    pub input_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub label: String,
    pub required: bool,
    /// CSS selector that re-finds this control; `None` when it has neither id nor name.
    pub selector: Option<String>,
    pub purpose: Purpose,
}

impl FieldDescriptor {
    pub fn new(
        tag: FieldTag,
        input_type: impl Into<String>,
        name: impl Into<String>,
        id: impl Into<String>,
        placeholder: impl Into<String>,
        label: impl Into<String>,
        required: bool,
    ) -> Self {
        let input_type = input_type.into().to_lowercase();
        let name = name.into();
        let id = id.into();
        let placeholder = placeholder.into();
        let label = label.into().trim().to_string();

        let purpose = classify(&name, &id, &placeholder, &label, &input_type);
        let selector = build_selector(&id, &name);

        Self {
            tag,
            input_type,
            name,
            id,
            placeholder,
            label,
            required,
            selector,
            purpose,
        }
    }

    /// Text shown to a human or an answer service when asking about this field.
    pub fn question_text(&self) -> &str {
        [&self.label, &self.placeholder, &self.name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// How a skipped field is listed in the report.
    pub fn display_label(&self) -> &str {
        [&self.label, &self.name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("unknown")
    }

    pub fn is_select(&self) -> bool {
        self.tag == FieldTag::Select
    }
}

fn build_selector(id: &str, name: &str) -> Option<String> {
    if !id.is_empty() {
        if is_css_identifier(id) {
            return Some(format!("#{id}"));
        }
        return Some(format!("[id=\"{}\"]", escape_attr(id)));
    }
    if !name.is_empty() {
        return Some(format!("[name=\"{}\"]", escape_attr(name)));
    }
    None
}

/// Conservative check: ASCII letter or `_` first, then letters, digits, `-`, `_`.
fn is_css_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn escape_attr(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
