//! The CRUD store seam and the row bookkeeping shared by its backends.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;

/// One record, column name -> JSON value.
pub type Row = Map<String, Value>;

/// Column equality filter; every listed column must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    columns: BTreeMap<String, Value>,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and_eq(column, value)
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.columns
            .iter()
            .all(|(column, expected)| row.get(column).unwrap_or(&Value::Null) == expected)
    }
}

/// Table-oriented record store.
#[async_trait]
pub trait CrudStore: Send + Sync {
    /// Rows of `table` in insertion order, optionally filtered.
    async fn get(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row`, assigning an `id` when it has none, and returns the
    /// stored row.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Merges `patch` into the row `id` and returns the result.
    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

/// Reads a row's `id` as text.
pub fn row_id(row: &Row) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub(crate) fn check_table(table: &str) -> Result<(), StoreError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::invalid_table(table))
    }
}

pub(crate) fn select(rows: &[Row], filter: Option<&Filter>) -> Vec<Row> {
    rows.iter()
        .filter(|row| filter.is_none_or(|filter| filter.matches(row)))
        .cloned()
        .collect()
}

pub(crate) fn insert_row(table: &str, rows: &mut Vec<Row>, mut row: Row) -> Result<Row, StoreError> {
    let id = match row_id(&row) {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            row.insert("id".into(), Value::String(id.clone()));
            id
        }
    };
    if rows.iter().any(|existing| row_id(existing).as_deref() == Some(id.as_str())) {
        return Err(StoreError::conflict(table, &id));
    }
    rows.push(row.clone());
    Ok(row)
}

pub(crate) fn update_row(
    table: &str,
    rows: &mut [Row],
    id: &str,
    patch: Row,
) -> Result<Row, StoreError> {
    let row = rows
        .iter_mut()
        .find(|row| row_id(row).as_deref() == Some(id))
        .ok_or_else(|| StoreError::not_found(table, id))?;
    for (column, value) in patch {
        if column == "id" {
            continue;
        }
        row.insert(column, value);
    }
    Ok(row.clone())
}

pub(crate) fn delete_row(table: &str, rows: &mut Vec<Row>, id: &str) -> Result<(), StoreError> {
    let idx = rows
        .iter()
        .position(|row| row_id(row).as_deref() == Some(id))
        .ok_or_else(|| StoreError::not_found(table, id))?;
    rows.remove(idx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    #[test]
    fn insert_assigns_uuid_and_rejects_duplicates() {
        let mut rows = Vec::new();
        let stored = insert_row("t", &mut rows, row(json!({ "name": "a" }))).unwrap();
        let id = row_id(&stored).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let err = insert_row("t", &mut rows, row(json!({ "id": id, "name": "b" }))).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn update_keeps_id_and_merges_columns() {
        let mut rows = vec![row(json!({ "id": "1", "name": "a", "qty": 1 }))];
        let updated = update_row("t", &mut rows, "1", row(json!({ "id": "2", "qty": 5 }))).unwrap();
        assert_eq!(Value::Object(updated), json!({ "id": "1", "name": "a", "qty": 5 }));
    }

    #[test]
    fn missing_rows_report_not_found() {
        let mut rows = Vec::new();
        assert!(delete_row("t", &mut rows, "x").unwrap_err().is_not_found());
        assert!(update_row("t", &mut rows, "x", Row::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn filter_treats_missing_columns_as_null() {
        let r = row(json!({ "id": "1", "kind": "base" }));
        assert!(Filter::eq("kind", "base").matches(&r));
        assert!(Filter::eq("color", Value::Null).matches(&r));
        assert!(!Filter::eq("kind", "base").and_eq("id", "2").matches(&r));
    }

    #[test]
    fn table_names_are_plain_identifiers() {
        assert!(check_table("cabinet_components").is_ok());
        assert!(check_table("../etc").is_err());
        assert!(check_table("").is_err());
    }
}
