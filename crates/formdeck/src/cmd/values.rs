//! Values files: a JSON object keyed by field id. File fields take a path or
//! a list of paths, relative to the values file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use form_spec::{
    FieldType, FieldValue, FileHandle, FormDefinition, FormSession, ValidationMode,
    values_from_record,
};
use formdeck_store::Filter;
use serde_json::{Map, Value};

use crate::app::App;

/// One entry of a values file, resolved against its field.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Value(FieldValue),
    Files(Vec<FileHandle>),
}

pub fn load(definition: &FormDefinition, path: &Path) -> Result<Vec<(String, Input)>> {
    let raw: Map<String, Value> = super::read_json(path)?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    raw.into_iter()
        .map(|(field_id, value)| {
            let input = match definition.field(&field_id) {
                Some(field) if field.kind == FieldType::File => {
                    Input::Files(read_files(&base, &field_id, &value)?)
                }
                _ => Input::Value(FieldValue::from_json(&value)),
            };
            Ok::<_, anyhow::Error>((field_id, input))
        })
        .collect()
}

fn read_files(base: &Path, field_id: &str, value: &Value) -> Result<Vec<FileHandle>> {
    let paths = match value {
        Value::Null => Vec::new(),
        Value::String(path) => vec![path.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .with_context(|| format!("field '{field_id}' expects file paths"))
            })
            .collect::<Result<Vec<_>>>()?,
        _ => bail!("field '{field_id}' expects a file path or a list of file paths"),
    };
    paths
        .into_iter()
        .map(|path| read_file(&base.join(path)))
        .collect()
}

pub fn read_file(path: &Path) -> Result<FileHandle> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok(FileHandle::new(name, content_type(path), Bytes::from(bytes)))
}

/// Content type guessed from the extension.
pub fn content_type(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        "dxf" => "image/vnd.dxf",
        "dwg" => "image/vnd.dwg",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Starts a session for `form_id`, editing `record` when given, and applies
/// the values file to it.
pub async fn prepare_session(
    app: &App,
    form_id: &str,
    values_path: &Path,
    record: Option<&str>,
) -> Result<FormSession> {
    let definition = Arc::new(app.form(form_id).await?);
    let inputs = load(&definition, values_path)?;
    let mode: ValidationMode = app.settings.validation_mode;
    let mut session = FormSession::new(definition.clone()).with_mode(mode);

    match record {
        Some(id) => {
            let filter = Filter::eq("id", id);
            let row = app
                .store
                .get(&definition.table_name, Some(&filter))
                .await?
                .into_iter()
                .next()
                .with_context(|| {
                    format!("no record '{id}' in table '{}'", definition.table_name)
                })?;
            session.start_editing(id, &values_from_record(&definition, &row))?;
        }
        None => session.start()?,
    }

    for (field_id, input) in inputs {
        let applied = match input {
            Input::Value(value) => session.set_value(&field_id, value),
            Input::Files(files) => session.set_files(&field_id, files),
        };
        applied.with_context(|| format!("cannot apply value for '{field_id}'"))?;
    }
    Ok(session)
}
