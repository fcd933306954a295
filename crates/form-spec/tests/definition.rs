use form_spec::{
    FieldSchema, FieldType, FieldValue, FormDefinition, SchemaIntegrityError, ValidationRule,
    payload_schema,
};
use serde_json::json;

fn cabinet_form() -> FormDefinition {
    FormDefinition::new("cabinets", "Cabinets", "cabinet_components").with_fields([
        FieldSchema::new("name", "Name", FieldType::Text)
            .required()
            .system(),
        FieldSchema::new("finish", "Finish", FieldType::Select)
            .with_options([("oak", "Oak"), ("walnut", "Walnut")])
            .with_order(1),
        FieldSchema::new("height", "Height", FieldType::Number)
            .with_bounds(Some(200.0), None)
            .with_order(1),
        FieldSchema::new("notes", "Notes", FieldType::Textarea).with_order(-1),
    ])
}

#[test]
fn ordering_is_stable_for_equal_keys() {
    let form = cabinet_form();
    let ids = form
        .ordered_fields()
        .into_iter()
        .map(|field| field.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["notes", "name", "finish", "height"]);
}

#[test]
fn definition_json_uses_stored_key_names() {
    let raw = json!({
        "id": "suppliers",
        "name": "Suppliers",
        "table_name": "suppliers",
        "is_system": true,
        "fields": [
            {
                "id": "contact",
                "label": "Contact email",
                "type": "email",
                "required": true,
                "order": 2,
                "dbField": "contact_email",
                "isSystem": true
            },
            {
                "id": "rating",
                "label": "Rating",
                "type": "radio",
                "dbField": "rating",
                "options": [
                    { "value": "a", "label": "A" },
                    { "value": "b", "label": "B" }
                ],
                "default": "b"
            }
        ]
    });
    let form: FormDefinition = serde_json::from_value(raw).expect("definition");
    assert!(form.is_system);
    assert_eq!(form.fields[0].db_field, "contact_email");
    assert_eq!(form.fields[0].kind, FieldType::Email);
    assert!(form.fields[0].is_system);
    assert!(!form.fields[1].required);
    assert_eq!(form.fields[1].default, Some(FieldValue::Text("b".into())));
    assert!(form.check_integrity().is_ok());

    let back = serde_json::to_value(&form).expect("json");
    assert_eq!(back["fields"][0]["dbField"], "contact_email");
    assert_eq!(back["fields"][0]["type"], "email");
    assert!(back["fields"][0].get("options").is_none());

    let again: FormDefinition = serde_json::from_value(back).expect("round trip");
    assert_eq!(again, form);
}

#[test]
fn integrity_rejects_missing_table_and_duplicate_columns() {
    let no_table = FormDefinition::new("x", "X", " ");
    assert_eq!(
        no_table.check_integrity(),
        Err(SchemaIntegrityError::MissingTableName("x".into()))
    );

    let clash = FormDefinition::new("x", "X", "x").with_fields([
        FieldSchema::new("a", "A", FieldType::Text).with_db_field("col"),
        FieldSchema::new("b", "B", FieldType::Text).with_db_field("col"),
    ]);
    assert_eq!(
        clash.check_integrity(),
        Err(SchemaIntegrityError::DuplicateColumn("col".into()))
    );
}

#[test]
fn integrity_rejects_bad_patterns() {
    let form = FormDefinition::new("x", "X", "x").with_fields([FieldSchema::new(
        "code",
        "Code",
        FieldType::Text,
    )
    .with_validation(ValidationRule::pattern("(unclosed"))]);
    assert!(matches!(
        form.check_integrity(),
        Err(SchemaIntegrityError::InvalidPattern { field_id, .. }) if field_id == "code"
    ));
}

#[test]
fn system_fields_cannot_be_removed() {
    let mut form = cabinet_form();
    let before = form.clone();
    assert_eq!(
        form.remove_field("name"),
        Err(SchemaIntegrityError::SystemField("name".into()))
    );
    assert_eq!(form, before);

    let removed = form.remove_field("notes").expect("remove");
    assert_eq!(removed.id, "notes");
    assert!(form.field("notes").is_none());
}

#[test]
fn rejected_edit_leaves_definition_untouched() {
    let mut form = cabinet_form();
    let before = form.clone();
    let err = form
        .add_field(FieldSchema::new("height", "Height again", FieldType::Number))
        .unwrap_err();
    assert_eq!(err, SchemaIntegrityError::DuplicateFieldId("height".into()));
    assert_eq!(form, before);

    let err = form
        .update_field("missing", FieldSchema::new("missing", "M", FieldType::Text))
        .unwrap_err();
    assert_eq!(err, SchemaIntegrityError::UnknownField("missing".into()));
}

#[test]
fn added_fields_start_without_data() {
    let mut form = cabinet_form();
    let mut field = FieldSchema::new("depth", "Depth", FieldType::Number);
    field.has_data = true;
    form.add_field(field).expect("add");
    assert!(!form.field("depth").expect("depth").has_data);
}

#[test]
fn payload_schema_is_keyed_by_column() {
    let form = FormDefinition::new("components", "Components", "cabinet_components")
        .with_fields([
            FieldSchema::new("name", "Name", FieldType::Text)
                .required()
                .with_db_field("component_name"),
            FieldSchema::new("width", "Width", FieldType::Number)
                .with_bounds(Some(100.0), Some(1200.0)),
            FieldSchema::new("finish", "Finish", FieldType::Select)
                .with_options([("oak", "Oak"), ("walnut", "Walnut")]),
            FieldSchema::new("photos", "Photos", FieldType::File).with_accept("image/*", true),
        ]);
    let schema = payload_schema(&form);
    assert_eq!(schema["title"], "Components");
    assert_eq!(schema["required"], json!(["component_name"]));
    assert_eq!(schema["properties"]["component_name"]["type"], "string");
    assert_eq!(schema["properties"]["width"]["minimum"], 100.0);
    assert_eq!(schema["properties"]["width"]["maximum"], 1200.0);
    assert_eq!(schema["properties"]["finish"]["enum"], json!(["oak", "walnut"]));
    assert_eq!(schema["properties"]["photos"]["type"], "array");
}
