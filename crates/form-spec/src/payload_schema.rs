use serde_json::{Map, Value};

use crate::spec::field::{FieldSchema, FieldType};
use crate::spec::form::FormDefinition;

/// JSON Schema of the payload a definition submits, keyed by backing column.
pub fn generate(definition: &FormDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in definition.ordered_fields() {
        properties.insert(field.db_field.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.db_field.clone()));
        }
    }

    let mut root = Map::new();
    root.insert("title".into(), Value::String(definition.name.clone()));
    root.insert("type".into(), Value::String("object".into()));
    root.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        root.insert("required".into(), Value::Array(required));
    }
    Value::Object(root)
}

/// Schema of [`FormDefinition`] records themselves.
pub fn definition_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FormDefinition)).unwrap_or(Value::Null)
}

fn field_schema(field: &FieldSchema) -> Value {
    let mut schema = Map::new();
    schema.insert("title".into(), Value::String(field.label.clone()));
    match field.kind {
        FieldType::Number => {
            schema.insert("type".into(), Value::String("number".into()));
            if let Some(min) = field.min.and_then(number) {
                schema.insert("minimum".into(), min);
            }
            if let Some(max) = field.max.and_then(number) {
                schema.insert("maximum".into(), max);
            }
        }
        FieldType::Checkbox => {
            schema.insert("type".into(), Value::String("boolean".into()));
        }
        FieldType::Select | FieldType::Radio => {
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert(
                "enum".into(),
                Value::Array(
                    field
                        .options
                        .iter()
                        .map(|option| Value::String(option.value.clone()))
                        .collect(),
                ),
            );
        }
        FieldType::Email => {
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert("format".into(), Value::String("email".into()));
        }
        FieldType::Date => {
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert("format".into(), Value::String("date".into()));
        }
        FieldType::File if field.multiple => {
            schema.insert("type".into(), Value::String("array".into()));
            schema.insert(
                "items".into(),
                Value::Object(Map::from_iter([(
                    "type".to_string(),
                    Value::String("string".into()),
                )])),
            );
        }
        FieldType::Password => {
            schema.insert("type".into(), Value::String("string".into()));
            schema.insert("writeOnly".into(), Value::Bool(true));
        }
        FieldType::Text | FieldType::Textarea | FieldType::Tel | FieldType::File => {
            schema.insert("type".into(), Value::String("string".into()));
        }
    }

    if let Some(pattern) = field
        .validation
        .as_ref()
        .and_then(|rule| rule.pattern.as_ref())
    {
        schema.insert("pattern".into(), Value::String(pattern.clone()));
    }
    if let Some(default) = &field.default {
        schema.insert("default".into(), default.to_json());
    }

    Value::Object(schema)
}

fn number(value: f64) -> Option<Value> {
    serde_json::Number::from_f64(value).map(Value::Number)
}
