use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::validation::ValidationRule;
use crate::values::FieldValue;

/// Supported input types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Password,
    Select,
    Checkbox,
    Radio,
    Date,
    File,
    Tel,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::Number,
        FieldType::Email,
        FieldType::Password,
        FieldType::Select,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Date,
        FieldType::File,
        FieldType::Tel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Password => "password",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Tel => "tel",
        }
    }

    /// Types whose values must come from the attached option list.
    pub fn has_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choice offered by `select` and `radio` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Declarative description of a single form input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub order: i32,
    pub db_field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub has_data: bool,
}

impl FieldSchema {
    /// Creates a field whose backing column shares its id.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldType) -> Self {
        let id = id.into();
        Self {
            db_field: id.clone(),
            id,
            label: label.into(),
            kind,
            required: false,
            order: 0,
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            accept: None,
            multiple: false,
            default: None,
            placeholder: None,
            validation: None,
            is_system: false,
            has_data: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_db_field(mut self, column: impl Into<String>) -> Self {
        self.db_field = column.into();
        self
    }

    pub fn with_options<I, V, L>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(value, label)| FieldOption::new(value, label))
            .collect();
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>, multiple: bool) -> Self {
        self.accept = Some(accept.into());
        self.multiple = multiple;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    /// Value used when neither an initial value nor a default is available.
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldType::Checkbox => FieldValue::Bool(false),
            FieldType::Select | FieldType::Radio => self
                .options
                .first()
                .map(|option| FieldValue::Text(option.value.clone()))
                .unwrap_or_else(|| FieldValue::Text(String::new())),
            FieldType::File if self.multiple => FieldValue::Files(Vec::new()),
            FieldType::File => FieldValue::Null,
            _ => FieldValue::Text(String::new()),
        }
    }

    /// Schema default, falling back to [`FieldSchema::empty_value`].
    pub fn initial_value(&self) -> FieldValue {
        self.default.clone().unwrap_or_else(|| self.empty_value())
    }
}
