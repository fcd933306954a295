use std::sync::Arc;

use form_spec::{FormDefinition, SchemaIntegrityError};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::crud::{CrudStore, Filter, Row};
use crate::defaults::default_forms;
use crate::error::StoreError;

/// Reserved table holding form definitions.
pub const FORM_DEFINITIONS_TABLE: &str = "form_definitions";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("form definition '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Integrity(#[from] SchemaIntegrityError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored form definition '{id}' is malformed: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode form definition '{id}': {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Form definitions persisted as rows of [`FORM_DEFINITIONS_TABLE`].
#[derive(Clone)]
pub struct FormRepository {
    store: Arc<dyn CrudStore>,
}

impl FormRepository {
    pub fn new(store: Arc<dyn CrudStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CrudStore> {
        &self.store
    }

    /// All definitions, sorted by name.
    pub async fn list(&self) -> Result<Vec<FormDefinition>, RepositoryError> {
        let rows = self.store.get(FORM_DEFINITIONS_TABLE, None).await?;
        let mut definitions = rows
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        definitions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(definitions)
    }

    pub async fn get(&self, id: &str) -> Result<FormDefinition, RepositoryError> {
        decode(self.get_row(id).await?)
    }

    async fn get_row(&self, id: &str) -> Result<Row, RepositoryError> {
        let filter = Filter::eq("id", id);
        self.store
            .get(FORM_DEFINITIONS_TABLE, Some(&filter))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    /// Stores a new definition after checking its integrity.
    pub async fn create(
        &self,
        mut definition: FormDefinition,
    ) -> Result<FormDefinition, RepositoryError> {
        definition.check_integrity()?;
        let now = now_rfc3339()?;
        definition.created_at = Some(now.clone());
        definition.updated_at = Some(now);
        let row = self
            .store
            .insert(FORM_DEFINITIONS_TABLE, encode(&definition)?)
            .await?;
        info!(form = %definition.id, table = %definition.table_name, "form definition created");
        decode(row)
    }

    /// Replaces an existing definition. Its system flag and creation time
    /// are kept, and system fields cannot be dropped. Keys the new
    /// definition leaves out are cleared in the stored row.
    pub async fn save(
        &self,
        mut definition: FormDefinition,
    ) -> Result<FormDefinition, RepositoryError> {
        definition.check_integrity()?;
        let current_row = self.get_row(&definition.id).await?;
        let cleared = current_row.keys().cloned().collect::<Vec<_>>();
        let current = decode(current_row)?;
        if let Some(missing) = current
            .fields
            .iter()
            .find(|field| field.is_system && definition.field(&field.id).is_none())
        {
            warn!(form = %definition.id, field = %missing.id, "save would drop a system field");
            return Err(SchemaIntegrityError::SystemField(missing.id.clone()).into());
        }
        definition.is_system = current.is_system;
        definition.created_at = current.created_at;
        definition.updated_at = Some(now_rfc3339()?);

        let mut patch = encode(&definition)?;
        for column in cleared {
            patch.entry(column).or_insert(Value::Null);
        }
        let row = self
            .store
            .update(FORM_DEFINITIONS_TABLE, &definition.id, patch)
            .await?;
        debug!(form = %definition.id, "form definition saved");
        decode(row)
    }

    /// Deletes a definition; system definitions are refused.
    pub async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let definition = self.get(id).await?;
        if definition.is_system {
            warn!(form = id, "refusing to delete system form definition");
            return Err(SchemaIntegrityError::SystemForm(id.to_string()).into());
        }
        self.store.delete(FORM_DEFINITIONS_TABLE, id).await?;
        info!(form = id, "form definition deleted");
        Ok(())
    }

    /// Inserts every built-in definition that is not present yet and
    /// returns the ids it inserted. Safe to run concurrently and repeatedly.
    pub async fn ensure_defaults(&self) -> Result<Vec<String>, RepositoryError> {
        let mut inserted = Vec::new();
        for definition in default_forms() {
            let id = definition.id.clone();
            match self.create(definition).await {
                Ok(_) => inserted.push(id),
                Err(RepositoryError::Store(err)) if err.is_conflict() => {
                    debug!(form = %id, "default form already present");
                }
                Err(err) => return Err(err),
            }
        }
        if !inserted.is_empty() {
            info!(forms = ?inserted, "seeded default form definitions");
        }
        Ok(inserted)
    }

    /// Recomputes `has_data` for every field from the rows of the
    /// definition's backing table. Returns whether any flag changed.
    pub async fn refresh_has_data(
        &self,
        definition: &mut FormDefinition,
    ) -> Result<bool, RepositoryError> {
        let rows = self.store.get(&definition.table_name, None).await?;
        let mut changed = false;
        for field in &mut definition.fields {
            let has_data = rows
                .iter()
                .any(|row| row.get(&field.db_field).is_some_and(holds_data));
            changed |= field.has_data != has_data;
            field.has_data = has_data;
        }
        Ok(changed)
    }
}

fn holds_data(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn now_rfc3339() -> Result<String, RepositoryError> {
    Ok(OffsetDateTime::now_utc().format(&Rfc3339)?)
}

fn encode(definition: &FormDefinition) -> Result<Row, RepositoryError> {
    let encode_err = |source| RepositoryError::Encode {
        id: definition.id.clone(),
        source,
    };
    match serde_json::to_value(definition).map_err(encode_err)? {
        Value::Object(row) => Ok(row),
        _ => Err(RepositoryError::Encode {
            id: definition.id.clone(),
            source: serde::ser::Error::custom("definition did not encode to an object"),
        }),
    }
}

fn decode(row: Row) -> Result<FormDefinition, RepositoryError> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    serde_json::from_value(Value::Object(row)).map_err(|source| RepositoryError::Decode { id, source })
}
