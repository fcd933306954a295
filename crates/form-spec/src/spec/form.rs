use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SchemaIntegrityError;
use crate::spec::field::FieldSchema;

/// Named, ordered set of fields bound to one backing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub table_name: String,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl FormDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            table_name: table_name.into(),
            is_system: false,
            fields: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub(crate) fn field_index(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    /// Fields sorted by `order`; equal keys keep declaration order.
    pub fn ordered_fields(&self) -> Vec<&FieldSchema> {
        let mut fields = self.fields.iter().collect::<Vec<_>>();
        fields.sort_by_key(|field| field.order);
        fields
    }

    /// Rejects definitions the engine cannot render or submit consistently.
    pub fn check_integrity(&self) -> Result<(), SchemaIntegrityError> {
        if self.table_name.trim().is_empty() {
            return Err(SchemaIntegrityError::MissingTableName(self.id.clone()));
        }

        let mut ids = BTreeSet::new();
        let mut columns = BTreeSet::new();
        for field in &self.fields {
            if field.id.trim().is_empty() {
                return Err(SchemaIntegrityError::EmptyFieldId);
            }
            if !ids.insert(field.id.as_str()) {
                return Err(SchemaIntegrityError::DuplicateFieldId(field.id.clone()));
            }
            if field.db_field.trim().is_empty() {
                return Err(SchemaIntegrityError::MissingColumn(field.id.clone()));
            }
            if !columns.insert(field.db_field.as_str()) {
                return Err(SchemaIntegrityError::DuplicateColumn(field.db_field.clone()));
            }
            if field.kind.has_options() && field.options.is_empty() {
                return Err(SchemaIntegrityError::MissingOptions(field.id.clone()));
            }
            if let Some(pattern) = field
                .validation
                .as_ref()
                .and_then(|rule| rule.pattern.as_deref())
                && let Err(err) = Regex::new(pattern)
            {
                return Err(SchemaIntegrityError::InvalidPattern {
                    field_id: field.id.clone(),
                    message: err.to_string(),
                });
            }
        }
        Ok(())
    }
}
