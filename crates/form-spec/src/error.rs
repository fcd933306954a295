use thiserror::Error;

/// Structural problems with a form definition or a rejected schema edit.
///
/// Raised before anything is written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIntegrityError {
    #[error("form '{0}' has no backing table")]
    MissingTableName(String),
    #[error("field id must not be empty")]
    EmptyFieldId,
    #[error("duplicate field id '{0}'")]
    DuplicateFieldId(String),
    #[error("field '{0}' has no backing column")]
    MissingColumn(String),
    #[error("column '{0}' is mapped by more than one field")]
    DuplicateColumn(String),
    #[error("field '{0}' needs at least one option")]
    MissingOptions(String),
    #[error("field '{field_id}' has an invalid pattern: {message}")]
    InvalidPattern { field_id: String, message: String },
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is a system field and cannot be removed")]
    SystemField(String),
    #[error("field '{0}' already holds data in its backing column")]
    FieldHasData(String),
    #[error("form '{0}' is a system form and cannot be deleted")]
    SystemForm(String),
}
