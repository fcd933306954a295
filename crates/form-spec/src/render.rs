use serde::Serialize;

use crate::spec::field::{FieldOption, FieldType};
use crate::spec::form::FormDefinition;
use crate::validate::ValidationErrors;
use crate::values::{FieldValue, ValueStore};

/// Everything a frontend needs to draw one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub required: bool,
    pub order: i32,
    pub value: FieldValue,
    pub touched: bool,
    /// Only reported once the field has been touched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    pub multiple: bool,
}

/// Builds the ordered render view of a session's fields.
pub fn render_fields(
    definition: &FormDefinition,
    store: &ValueStore,
    errors: &ValidationErrors,
) -> Vec<RenderField> {
    definition
        .ordered_fields()
        .into_iter()
        .map(|field| {
            let touched = store.is_touched(&field.id);
            let has_options = field.kind.has_options();
            let is_number = field.kind == FieldType::Number;
            let is_file = field.kind == FieldType::File;
            RenderField {
                id: field.id.clone(),
                label: field.label.clone(),
                kind: field.kind,
                required: field.required,
                order: field.order,
                value: store.get(&field.id).cloned().unwrap_or_default(),
                touched,
                error: touched.then(|| errors.get(&field.id).cloned()).flatten(),
                options: if has_options {
                    field.options.clone()
                } else {
                    Vec::new()
                },
                placeholder: field.placeholder.clone(),
                min: field.min.filter(|_| is_number),
                max: field.max.filter(|_| is_number),
                step: field.step.filter(|_| is_number),
                accept: field.accept.clone().filter(|_| is_file),
                multiple: is_file && field.multiple,
            }
        })
        .collect()
}
