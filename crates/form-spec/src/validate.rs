use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use time::Date;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::spec::field::{FieldSchema, FieldType};
use crate::spec::form::FormDefinition;
use crate::values::{FieldValue, FormValues, format_number};

/// Field id -> message for every field that currently fails.
pub type ValidationErrors = BTreeMap<String, String>;

/// Built-in check for one field type; only called with non-empty values.
pub type TypeCheck = fn(&FieldSchema, &FieldValue) -> Option<String>;

/// Operator-registered check referenced by `validation.custom`.
pub type CustomCheck = Arc<dyn Fn(&FieldValue) -> CustomOutcome + Send + Sync>;

/// Result of a custom check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomOutcome {
    Pass,
    /// Fails with this message.
    Message(String),
    /// Fails with the generated "Invalid value for <label>" message.
    Fail,
}

impl From<bool> for CustomOutcome {
    fn from(value: bool) -> Self {
        if value {
            CustomOutcome::Pass
        } else {
            CustomOutcome::Fail
        }
    }
}

impl From<Result<(), String>> for CustomOutcome {
    fn from(value: Result<(), String>) -> Self {
        match value {
            Ok(()) => CustomOutcome::Pass,
            Err(message) => CustomOutcome::Message(message),
        }
    }
}

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static DEFAULT_VALIDATOR: Lazy<Validator> = Lazy::new(Validator::new);

/// Validates field values against their schema.
///
/// Checks run in a fixed order and stop at the first failure: required,
/// type-specific, pattern, custom.
#[derive(Clone)]
pub struct Validator {
    type_checks: BTreeMap<FieldType, TypeCheck>,
    custom: BTreeMap<String, CustomCheck>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("type_checks", &self.type_checks.keys().collect::<Vec<_>>())
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Validator {
    pub fn new() -> Self {
        let mut type_checks: BTreeMap<FieldType, TypeCheck> = BTreeMap::new();
        type_checks.insert(FieldType::Email, check_email);
        type_checks.insert(FieldType::Number, check_number);
        type_checks.insert(FieldType::Select, check_option);
        type_checks.insert(FieldType::Radio, check_option);
        type_checks.insert(FieldType::Tel, check_tel);
        type_checks.insert(FieldType::Date, check_date);
        Self {
            type_checks,
            custom: BTreeMap::new(),
        }
    }

    pub fn with_custom<F, O>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FieldValue) -> O + Send + Sync + 'static,
        O: Into<CustomOutcome>,
    {
        self.register_custom(name, check);
        self
    }

    pub fn register_custom<F, O>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&FieldValue) -> O + Send + Sync + 'static,
        O: Into<CustomOutcome>,
    {
        let check: CustomCheck =
            Arc::new(move |value: &FieldValue| -> CustomOutcome { check(value).into() });
        self.custom.insert(name.into(), check);
    }

    /// Returns the first failing message for `value`, or `None` if it passes.
    pub fn validate_field(&self, schema: &FieldSchema, value: &FieldValue) -> Option<String> {
        if schema.required && value.is_empty() {
            return Some(format!("{} is required", schema.label));
        }
        if value.is_empty() {
            return None;
        }

        if let Some(check) = self.type_checks.get(&schema.kind)
            && let Some(message) = check(schema, value)
        {
            return Some(message);
        }

        let rule = schema.validation.as_ref()?;

        if let Some(pattern) = &rule.pattern
            && let Some(text) = value.text_form()
        {
            match Regex::new(pattern) {
                Ok(regex) if !regex.is_match(&text) => {
                    return Some(
                        rule.message
                            .clone()
                            .unwrap_or_else(|| format!("Invalid format for {}", schema.label)),
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(field = %schema.id, error = %err, "skipping unparsable pattern");
                }
            }
        }

        if let Some(name) = &rule.custom {
            match self.custom.get(name) {
                Some(check) => match check(value) {
                    CustomOutcome::Pass => {}
                    CustomOutcome::Message(message) => return Some(message),
                    CustomOutcome::Fail => {
                        return Some(format!("Invalid value for {}", schema.label));
                    }
                },
                None => {
                    warn!(field = %schema.id, check = %name, "custom check is not registered");
                }
            }
        }

        None
    }

    /// Validates every field of `definition`; missing values count as null.
    pub fn validate_form(
        &self,
        definition: &FormDefinition,
        values: &FormValues,
    ) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in &definition.fields {
            let value = values.get(&field.id).unwrap_or(&FieldValue::Null);
            if let Some(message) = self.validate_field(field, value) {
                errors.insert(field.id.clone(), message);
            }
        }
        debug!(form = %definition.id, failing = errors.len(), "form validated");
        errors
    }
}

/// [`Validator::validate_field`] without custom checks registered.
pub fn validate_field(schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    DEFAULT_VALIDATOR.validate_field(schema, value)
}

/// [`Validator::validate_form`] without custom checks registered.
pub fn validate_form(definition: &FormDefinition, values: &FormValues) -> ValidationErrors {
    DEFAULT_VALIDATOR.validate_form(definition, values)
}

fn check_email(_schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    match value.as_str() {
        Some(text) if EMAIL.is_match(text) => None,
        _ => Some("Please enter a valid email address".into()),
    }
}

fn check_number(schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    let Some(number) = value.as_number() else {
        return Some("Please enter a valid number".into());
    };
    if let Some(min) = schema.min
        && number < min
    {
        return Some(format!("Value must be at least {}", format_number(min)));
    }
    if let Some(max) = schema.max
        && number > max
    {
        return Some(format!("Value must be at most {}", format_number(max)));
    }
    None
}

fn check_option(schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    if schema.options.is_empty() {
        return None;
    }
    let valid = value
        .as_str()
        .is_some_and(|text| schema.options.iter().any(|option| option.value == text));
    if valid {
        None
    } else {
        Some("Please select a valid option".into())
    }
}

fn check_tel(_schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    let valid = value.as_str().is_some_and(|text| {
        text.chars().any(|c| c.is_ascii_digit())
            && text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')' | '.'))
    });
    if valid {
        None
    } else {
        Some("Please enter a valid phone number".into())
    }
}

fn check_date(_schema: &FieldSchema, value: &FieldValue) -> Option<String> {
    let format = format_description!("[year]-[month]-[day]");
    match value.as_str().map(|text| Date::parse(text, &format)) {
        Some(Ok(_)) => None,
        _ => Some("Please enter a valid date".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::validation::ValidationRule;

    #[test]
    fn type_table_covers_checked_types_only() {
        let validator = Validator::new();
        assert!(validator.type_checks.contains_key(&FieldType::Email));
        assert!(!validator.type_checks.contains_key(&FieldType::Checkbox));
    }

    #[test]
    fn pattern_applies_to_numbers_as_text() {
        let field = FieldSchema::new("qty", "Quantity", FieldType::Number)
            .with_validation(ValidationRule::pattern(r"^\d+$"));
        assert_eq!(validate_field(&field, &FieldValue::Number(4.0)), None);
        assert_eq!(
            validate_field(&field, &FieldValue::Number(4.5)),
            Some("Invalid format for Quantity".into())
        );
    }

    #[test]
    fn unregistered_custom_check_passes() {
        let field = FieldSchema::new("sku", "SKU", FieldType::Text)
            .with_validation(ValidationRule::custom("sku_exists"));
        assert_eq!(validate_field(&field, &"ABC".into()), None);
    }

    #[test]
    fn date_rejects_impossible_day() {
        let field = FieldSchema::new("installed", "Installed", FieldType::Date);
        assert_eq!(validate_field(&field, &"2024-02-29".into()), None);
        assert_eq!(
            validate_field(&field, &"2023-02-29".into()),
            Some("Please enter a valid date".into())
        );
    }
}
