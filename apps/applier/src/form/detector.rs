use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::{BrowserError, BrowserPage};
use crate::form::descriptor::{FieldDescriptor, FieldTag};

const FIELD_SELECTOR: &str = "input, textarea, select";

/// Control types that never carry applicant data.
const IGNORED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Enumerates the form controls on the current page, in document order.
pub struct FormDetector<'a, P: BrowserPage> {
    page: &'a P,
}

impl<'a, P: BrowserPage> FormDetector<'a, P> {
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    /// Scans the page and classifies every control.
    ///
    /// A control whose attributes cannot be read is dropped from the batch;
    /// only a fatal browser error aborts the scan.
    pub async fn detect_all_inputs(&self) -> Result<Vec<FieldDescriptor>, BrowserError> {
        let elements = self.page.query_all(FIELD_SELECTOR).await?;
        let mut fields = Vec::with_capacity(elements.len());

        for (index, element) in elements.iter().enumerate() {
            match self.describe(element).await {
                Ok(Some(field)) => {
                    debug!(
                        purpose = %field.purpose,
                        name = %field.name,
                        id = %field.id,
                        label = %field.label,
                        "Detected field"
                    );
                    fields.push(field);
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Skipping field #{index}: {e}"),
            }
        }

        debug!("Detected {} fields", fields.len());
        Ok(fields)
    }

    async fn describe(&self, element: &P::Element) -> Result<Option<FieldDescriptor>, BrowserError> {
        let Some(tag) = FieldTag::from_tag_name(&self.page.tag_name(element).await?) else {
            return Ok(None);
        };

        let input_type = match self.page.property(element, "type").await? {
            Some(Value::String(t)) => t.to_lowercase(),
            _ => match tag {
                FieldTag::Input => "text".to_string(),
                FieldTag::Textarea => "textarea".to_string(),
                FieldTag::Select => "select-one".to_string(),
            },
        };
        if IGNORED_INPUT_TYPES.contains(&input_type.as_str()) {
            return Ok(None);
        }

        let name = self.attribute(element, "name").await?;
        let id = self.attribute(element, "id").await?;
        let placeholder = self.attribute(element, "placeholder").await?;
        let required = matches!(
            self.page.property(element, "required").await?,
            Some(Value::Bool(true))
        );
        let label = self.label_for(element, &id).await?;

        Ok(Some(FieldDescriptor::new(
            tag,
            input_type,
            name,
            id,
            placeholder,
            label,
            required,
        )))
    }

    async fn attribute(&self, element: &P::Element, name: &str) -> Result<String, BrowserError> {
        Ok(self
            .page
            .get_attribute(element, name)
            .await?
            .unwrap_or_default())
    }

    /// `<label for=id>` first, then an enclosing `<label>`.
    async fn label_for(&self, element: &P::Element, id: &str) -> Result<String, BrowserError> {
        if !id.is_empty() {
            let selector = format!("label[for=\"{}\"]", id.replace('"', "\\\""));
            if let Some(label) = self.page.query_one(&selector).await? {
                let text = self.page.inner_text(&label).await?;
                if !text.trim().is_empty() {
                    return Ok(text.trim().to_string());
                }
            }
        }
        Ok(self
            .page
            .enclosing_label_text(element)
            .await?
            .map(|t| t.trim().to_string())
            .unwrap_or_default())
    }
}
