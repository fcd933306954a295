use form_spec::{
    CustomOutcome, FieldSchema, FieldType, FieldValue, FormDefinition, FormValues,
    ValidationRule, Validator, validate_field, validate_form,
};

fn age_field() -> FieldSchema {
    FieldSchema::new("age", "Age", FieldType::Number).with_bounds(Some(18.0), Some(100.0))
}

fn contact_form() -> FormDefinition {
    FormDefinition::new("contacts", "Contacts", "contacts").with_fields([
        FieldSchema::new("name", "Name", FieldType::Text).required(),
        FieldSchema::new("email", "Email", FieldType::Email).required(),
        age_field(),
    ])
}

#[test]
fn required_text_rejects_empty_string() {
    let field = FieldSchema::new("name", "Name", FieldType::Text).required();
    assert_eq!(
        validate_field(&field, &FieldValue::Text(String::new())),
        Some("Name is required".into())
    );
    assert_eq!(
        validate_field(&field, &FieldValue::Null),
        Some("Name is required".into())
    );
}

#[test]
fn unchecked_required_checkbox_passes() {
    let field = FieldSchema::new("terms", "Terms", FieldType::Checkbox).required();
    assert_eq!(validate_field(&field, &FieldValue::Bool(false)), None);
}

#[test]
fn number_bounds_are_checked_in_priority_order() {
    let field = age_field();
    assert_eq!(validate_field(&field, &FieldValue::Number(25.0)), None);
    assert_eq!(
        validate_field(&field, &FieldValue::Number(17.0)),
        Some("Value must be at least 18".into())
    );
    assert_eq!(
        validate_field(&field, &FieldValue::Number(101.0)),
        Some("Value must be at most 100".into())
    );
    assert_eq!(
        validate_field(&field, &"abc".into()),
        Some("Please enter a valid number".into())
    );
}

#[test]
fn numeric_text_is_accepted_for_number_fields() {
    let field = age_field();
    assert_eq!(validate_field(&field, &"42".into()), None);
    assert_eq!(
        validate_field(&field, &"12".into()),
        Some("Value must be at least 18".into())
    );
}

#[test]
fn bounds_are_inclusive() {
    let field = age_field();
    assert_eq!(validate_field(&field, &FieldValue::Number(18.0)), None);
    assert_eq!(validate_field(&field, &FieldValue::Number(100.0)), None);
}

#[test]
fn optional_empty_values_skip_type_checks() {
    let field = FieldSchema::new("email", "Email", FieldType::Email);
    assert_eq!(validate_field(&field, &"".into()), None);
    assert_eq!(validate_field(&age_field(), &"".into()), None);
}

#[test]
fn email_shape_is_checked() {
    let field = FieldSchema::new("email", "Email", FieldType::Email);
    assert_eq!(validate_field(&field, &"a@b.com".into()), None);
    for bad in ["not-an-email", "a@b", "a@@b.com", "a b@c.com"] {
        assert_eq!(
            validate_field(&field, &bad.into()),
            Some("Please enter a valid email address".into()),
            "{bad}"
        );
    }
}

#[test]
fn pattern_failure_uses_rule_message_or_generated_one() {
    let sku = FieldSchema::new("sku", "SKU", FieldType::Text)
        .with_validation(ValidationRule::pattern(r"^CAB-\d{4}$"));
    assert_eq!(validate_field(&sku, &"CAB-0042".into()), None);
    assert_eq!(
        validate_field(&sku, &"cab-42".into()),
        Some("Invalid format for SKU".into())
    );

    let with_message = sku.with_validation(
        ValidationRule::pattern(r"^CAB-\d{4}$").with_message("Use CAB-0000 format"),
    );
    assert_eq!(
        validate_field(&with_message, &"cab-42".into()),
        Some("Use CAB-0000 format".into())
    );
}

#[test]
fn type_check_runs_before_pattern() {
    let field = FieldSchema::new("email", "Email", FieldType::Email)
        .with_validation(ValidationRule::pattern(r"@example\.com$"));
    assert_eq!(
        validate_field(&field, &"nope".into()),
        Some("Please enter a valid email address".into())
    );
    assert_eq!(
        validate_field(&field, &"a@other.org".into()),
        Some("Invalid format for Email".into())
    );
}

#[test]
fn custom_checks_map_outcomes_to_messages() {
    let validator = Validator::new()
        .with_custom("even", |value: &FieldValue| {
            value.as_number().is_some_and(|n| n % 2.0 == 0.0)
        })
        .with_custom("no_spaces", |value: &FieldValue| {
            if value.as_str().is_some_and(|text| text.contains(' ')) {
                CustomOutcome::Message("Spaces are not allowed".into())
            } else {
                CustomOutcome::Pass
            }
        });

    let even = FieldSchema::new("count", "Count", FieldType::Number)
        .with_validation(ValidationRule::custom("even"));
    assert_eq!(validator.validate_field(&even, &FieldValue::Number(4.0)), None);
    assert_eq!(
        validator.validate_field(&even, &FieldValue::Number(3.0)),
        Some("Invalid value for Count".into())
    );

    let code = FieldSchema::new("code", "Code", FieldType::Text)
        .with_validation(ValidationRule::custom("no_spaces"));
    assert_eq!(
        validator.validate_field(&code, &"a b".into()),
        Some("Spaces are not allowed".into())
    );
}

#[test]
fn custom_check_is_skipped_for_empty_values() {
    let validator = Validator::new().with_custom("never", |_: &FieldValue| false);
    let field = FieldSchema::new("note", "Note", FieldType::Text)
        .with_validation(ValidationRule::custom("never"));
    assert_eq!(validator.validate_field(&field, &"".into()), None);
}

#[test]
fn select_value_must_be_an_option() {
    let field = FieldSchema::new("finish", "Finish", FieldType::Select)
        .with_options([("oak", "Oak"), ("walnut", "Walnut")]);
    assert_eq!(validate_field(&field, &"oak".into()), None);
    assert_eq!(
        validate_field(&field, &"pine".into()),
        Some("Please select a valid option".into())
    );
}

#[test]
fn tel_accepts_common_punctuation() {
    let field = FieldSchema::new("phone", "Phone", FieldType::Tel);
    assert_eq!(validate_field(&field, &"+1 (555) 010-2030".into()), None);
    assert_eq!(
        validate_field(&field, &"call me".into()),
        Some("Please enter a valid phone number".into())
    );
}

#[test]
fn validate_form_collects_every_failure() {
    let form = contact_form();
    let mut values = FormValues::new();
    values.insert("name".into(), "".into());
    values.insert("email".into(), "bad".into());
    values.insert("age".into(), FieldValue::Number(5.0));

    let errors = validate_form(&form, &values);
    assert_eq!(errors.len(), 3);
    assert_eq!(errors["name"], "Name is required");
    assert_eq!(errors["email"], "Please enter a valid email address");
    assert_eq!(errors["age"], "Value must be at least 18");
}

#[test]
fn validate_form_treats_missing_values_as_null() {
    let form = contact_form();
    let errors = validate_form(&form, &FormValues::new());
    assert_eq!(errors["name"], "Name is required");
    assert_eq!(errors["email"], "Email is required");
    assert!(!errors.contains_key("age"));
}

#[test]
fn validate_form_is_empty_for_valid_values() {
    let form = contact_form();
    let mut values = FormValues::new();
    values.insert("name".into(), "Ada".into());
    values.insert("email".into(), "ada@example.com".into());
    values.insert("age".into(), FieldValue::Number(36.0));
    assert!(validate_form(&form, &values).is_empty());
}
