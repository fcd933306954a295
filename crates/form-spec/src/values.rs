use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::spec::field::{FieldSchema, FieldType};

/// Current candidate value for every field id in a session.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Handle to a file picked for a `file` field.
///
/// Only the metadata is serialized; the content travels with the handle
/// until the submission adapter uploads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FileHandle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type,
            size: bytes.len() as u64,
            bytes,
        }
    }
}

/// A field's value: `null | string | number | boolean | File | File[]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    File(FileHandle),
    Files(Vec<FileHandle>),
}

impl FieldValue {
    /// Empty string, null, or an empty file selection. `false` is a value.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) | FieldValue::File(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric reading of the value; text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            FieldValue::Number(number) => Some(*number),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|number| number.is_finite())
    }

    /// Textual form used by pattern checks; files have none.
    pub fn text_form(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Number(number) => Some(format_number(*number)),
            FieldValue::Bool(flag) => Some(flag.to_string()),
            FieldValue::Null | FieldValue::File(_) | FieldValue::Files(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(flag) => Value::Bool(*flag),
            FieldValue::Number(number) => Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::File(file) => file_json(file),
            FieldValue::Files(files) => Value::Array(files.iter().map(file_json).collect()),
        }
    }

    /// Reads a stored column value back into a field value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(flag) => FieldValue::Bool(*flag),
            Value::Number(number) => number
                .as_f64()
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
            Value::String(text) => FieldValue::Text(text.clone()),
            other => serde_json::from_value(other.clone())
                .unwrap_or_else(|_| FieldValue::Text(other.to_string())),
        }
    }
}

fn file_json(file: &FileHandle) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(file.name.clone()));
    if let Some(content_type) = &file.content_type {
        map.insert("content_type".into(), Value::String(content_type.clone()));
    }
    map.insert("size".into(), Value::Number(file.size.into()));
    Value::Object(map)
}

/// Renders whole numbers without a fractional part.
pub(crate) fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(value: FileHandle) -> Self {
        FieldValue::File(value)
    }
}

/// Edit addressed a field id the store was not initialized with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);

/// Rejected file selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSelectionError {
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error("field '{0}' does not accept files")]
    NotAFileField(String),
}

/// Session-local map from field id to value, with touched tracking.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: FormValues,
    seeded: FormValues,
    touched: BTreeSet<String>,
    file_fields: BTreeMap<String, bool>,
}

impl ValueStore {
    /// Seeds one value per field: initial value, else schema default, else
    /// the type's empty value.
    pub fn initialize(fields: &[FieldSchema], initial_values: &FormValues) -> Self {
        let mut values = FormValues::new();
        let mut file_fields = BTreeMap::new();
        for field in fields {
            let value = initial_values
                .get(&field.id)
                .cloned()
                .unwrap_or_else(|| field.initial_value());
            values.insert(field.id.clone(), value);
            if field.kind == FieldType::File {
                file_fields.insert(field.id.clone(), field.multiple);
            }
        }
        Self {
            seeded: values.clone(),
            values,
            touched: BTreeSet::new(),
            file_fields,
        }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn into_values(self) -> FormValues {
        self.values
    }

    /// Replaces the value and marks the field touched.
    pub fn set(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), UnknownField> {
        let slot = self
            .values
            .get_mut(field_id)
            .ok_or_else(|| UnknownField(field_id.to_string()))?;
        *slot = value.into();
        self.touched.insert(field_id.to_string());
        debug!(field = field_id, "value set");
        Ok(())
    }

    /// Stores a file selection: the whole list for `multiple` fields,
    /// otherwise the first handle or null.
    pub fn set_files(
        &mut self,
        field_id: &str,
        files: Vec<FileHandle>,
    ) -> Result<(), FileSelectionError> {
        let Some(&multiple) = self.file_fields.get(field_id) else {
            if !self.values.contains_key(field_id) {
                return Err(UnknownField(field_id.to_string()).into());
            }
            return Err(FileSelectionError::NotAFileField(field_id.to_string()));
        };
        let value = if multiple {
            FieldValue::Files(files)
        } else {
            files
                .into_iter()
                .next()
                .map(FieldValue::File)
                .unwrap_or(FieldValue::Null)
        };
        Ok(self.set(field_id, value)?)
    }

    pub fn touch(&mut self, field_id: &str) -> Result<(), UnknownField> {
        if !self.values.contains_key(field_id) {
            return Err(UnknownField(field_id.to_string()));
        }
        self.touched.insert(field_id.to_string());
        Ok(())
    }

    pub fn touch_all(&mut self) {
        self.touched.extend(self.values.keys().cloned());
    }

    pub fn is_touched(&self, field_id: &str) -> bool {
        self.touched.contains(field_id)
    }

    pub fn touched(&self) -> impl Iterator<Item = &str> {
        self.touched.iter().map(String::as_str)
    }

    /// True when any value differs from what the store was seeded with.
    pub fn is_dirty(&self) -> bool {
        self.values != self.seeded
    }

    /// Restores the seeded values and forgets touched state.
    pub fn reset(&mut self) {
        self.values = self.seeded.clone();
        self.touched.clear();
    }
}
