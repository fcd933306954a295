//! Operator edits on a form definition.
//!
//! Every edit is applied to a copy, integrity-checked, and only then
//! committed, so a rejected edit leaves the definition untouched.

use tracing::debug;

use crate::error::SchemaIntegrityError;
use crate::spec::field::FieldSchema;
use crate::spec::form::FormDefinition;

impl FormDefinition {
    /// Appends a field. New fields never start out holding data.
    pub fn add_field(&mut self, mut field: FieldSchema) -> Result<(), SchemaIntegrityError> {
        field.has_data = false;
        let mut candidate = self.fields.clone();
        candidate.push(field);
        self.commit_fields(candidate)?;
        debug!(form = %self.id, fields = self.fields.len(), "field added");
        Ok(())
    }

    /// Replaces the field `id`. Bookkeeping flags are carried over from the
    /// existing field; type and column are frozen once the column holds data.
    pub fn update_field(
        &mut self,
        id: &str,
        mut field: FieldSchema,
    ) -> Result<(), SchemaIntegrityError> {
        let idx = self
            .field_index(id)
            .ok_or_else(|| SchemaIntegrityError::UnknownField(id.to_string()))?;
        let current = &self.fields[idx];
        if current.has_data && (current.kind != field.kind || current.db_field != field.db_field)
        {
            return Err(SchemaIntegrityError::FieldHasData(id.to_string()));
        }
        field.is_system = current.is_system;
        field.has_data = current.has_data;

        let mut candidate = self.fields.clone();
        candidate[idx] = field;
        self.commit_fields(candidate)?;
        debug!(form = %self.id, field = id, "field updated");
        Ok(())
    }

    /// Sets the sort key of field `id`.
    pub fn move_field(&mut self, id: &str, order: i32) -> Result<(), SchemaIntegrityError> {
        let idx = self
            .field_index(id)
            .ok_or_else(|| SchemaIntegrityError::UnknownField(id.to_string()))?;
        let mut candidate = self.fields.clone();
        candidate[idx].order = order;
        self.commit_fields(candidate)?;
        debug!(form = %self.id, field = id, order, "field moved");
        Ok(())
    }

    /// Removes field `id` unless it is system-owned or backed by data.
    pub fn remove_field(&mut self, id: &str) -> Result<FieldSchema, SchemaIntegrityError> {
        let idx = self
            .field_index(id)
            .ok_or_else(|| SchemaIntegrityError::UnknownField(id.to_string()))?;
        let field = &self.fields[idx];
        if field.is_system {
            return Err(SchemaIntegrityError::SystemField(id.to_string()));
        }
        if field.has_data {
            return Err(SchemaIntegrityError::FieldHasData(id.to_string()));
        }
        let removed = self.fields.remove(idx);
        debug!(form = %self.id, field = id, "field removed");
        Ok(removed)
    }

    fn commit_fields(&mut self, fields: Vec<FieldSchema>) -> Result<(), SchemaIntegrityError> {
        let candidate = FormDefinition {
            fields,
            ..self.clone()
        };
        candidate.check_integrity()?;
        self.fields = candidate.fields;
        Ok(())
    }
}
