use serde::{Deserialize, Serialize};

use crate::{FormDefinition, FormValues};

/// The body POSTed to the submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Slug of the form title, e.g. `weekly-report`.
    pub form_type: String,

    /// The human-readable form title.
    pub form_title: String,

    /// Every entered value, keyed by field key.
    pub submission_data: FormValues,
}

impl SubmissionPayload {
    /// Build the payload for `definition` from the entered values.
    pub fn new(definition: &FormDefinition, values: &FormValues) -> Self {
        Self {
            form_type: definition.form_type(),
            form_title: definition.title().to_string(),
            submission_data: values.clone(),
        }
    }
}

/// What the backend acknowledges a successful submission with.
///
/// Every field is optional; an unexpected success body yields an empty receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub submitted_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldKind, FormItem};

    #[test]
    fn payload_shape() {
        let def = FormDefinition::from_items(
            "Weekly Report",
            vec![FormItem::new("Your Name", FieldKind::Text)],
        )
        .unwrap();
        let mut values = FormValues::new();
        values.insert("Your Name", "Ada");

        let payload = SubmissionPayload::new(&def, &values);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "form_type": "weekly-report",
                "form_title": "Weekly Report",
                "submission_data": { "Your Name": "Ada" }
            })
        );
    }

    #[test]
    fn receipt_tolerates_missing_fields() {
        let receipt: SubmissionReceipt = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert_eq!(receipt.id, None);
        assert_eq!(receipt.message.as_deref(), Some("ok"));
    }
}
