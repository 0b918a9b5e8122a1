use serde::{Deserialize, Serialize};

use crate::form::descriptor::FieldDescriptor;
use crate::form::purpose::Purpose;

/// Terminal state of one field after a fill pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOutcome {
    Filled,
    UserAnswered,
    Skipped,
    Unfilled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfilledField {
    pub purpose: Purpose,
    pub label: String,
    pub name: String,
    pub required: bool,
}

/// Outcome of one form-fill pass. Lists keep page discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub total_fields: usize,
    pub filled_count: usize,
    pub unfilled_count: usize,
    pub skipped_count: usize,
    pub user_answered_count: usize,
    pub filled_fields: Vec<Purpose>,
    pub unfilled_fields: Vec<UnfilledField>,
    pub skipped_fields: Vec<String>,
    pub user_answered_fields: Vec<String>,
}

impl FillReport {
    pub fn new(total_fields: usize) -> Self {
        Self {
            total_fields,
            ..Default::default()
        }
    }

    pub fn record(&mut self, field: &FieldDescriptor, outcome: FillOutcome) {
        match outcome {
            FillOutcome::Filled => self.record_filled(field),
            FillOutcome::UserAnswered => self.record_user_answered(field),
            FillOutcome::Skipped => self.record_skipped(field),
            FillOutcome::Unfilled => self.record_unfilled(field),
        }
    }

    pub fn record_filled(&mut self, field: &FieldDescriptor) {
        self.filled_count += 1;
        self.filled_fields.push(field.purpose);
    }

    pub fn record_unfilled(&mut self, field: &FieldDescriptor) {
        self.unfilled_count += 1;
        self.unfilled_fields.push(UnfilledField {
            purpose: field.purpose,
            label: field.label.clone(),
            name: field.name.clone(),
            required: field.required,
        });
    }

    pub fn record_skipped(&mut self, field: &FieldDescriptor) {
        self.skipped_count += 1;
        self.skipped_fields.push(field.display_label().to_string());
    }

    pub fn record_user_answered(&mut self, field: &FieldDescriptor) {
        self.user_answered_count += 1;
        self.user_answered_fields
            .push(field.question_text().to_string());
    }

    /// Sum of the four buckets. Equals `total_fields` for a completed pass.
    pub fn outcome_count(&self) -> usize {
        self.filled_count + self.unfilled_count + self.skipped_count + self.user_answered_count
    }

    /// Unfilled fields the form marks as required; these need a human before submission.
    pub fn required_unfilled(&self) -> impl Iterator<Item = &UnfilledField> {
        self.unfilled_fields.iter().filter(|f| f.required)
    }

    /// Multi-line operator summary.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Fields detected: {}\n  Filled: {}\n  User answered: {}\n  Skipped: {}\n  Unfilled: {}",
            self.total_fields,
            self.filled_count,
            self.user_answered_count,
            self.skipped_count,
            self.unfilled_count
        );

        let required: Vec<&UnfilledField> = self.required_unfilled().collect();
        if !required.is_empty() {
            out.push_str("\nRequired fields still empty:");
            for field in required {
                let label = if field.label.is_empty() {
                    &field.name
                } else {
                    &field.label
                };
                out.push_str(&format!("\n  - {label} ({})", field.purpose));
            }
        }
        out
    }
}
