#![allow(missing_docs)]

pub mod engine;
pub mod error;
pub mod payload_schema;
pub mod render;
pub mod spec;
pub mod validate;
pub mod values;

pub use engine::{
    FormSession, Payload, Record, SUBMIT_FAILED_MESSAGE, SessionError, SessionState,
    SubmissionAdapter, SubmissionError, SubmissionPlan, SubmitOutcome, ValidationMode,
    build_payload, values_from_record,
};
pub use error::SchemaIntegrityError;
pub use payload_schema::{definition_schema, generate as payload_schema};
pub use render::{RenderField, render_fields};
pub use spec::{FieldOption, FieldSchema, FieldType, FormDefinition, ValidationRule};
pub use validate::{
    CustomCheck, CustomOutcome, TypeCheck, ValidationErrors, Validator, validate_field,
    validate_form,
};
pub use values::{
    FieldValue, FileHandle, FileSelectionError, FormValues, UnknownField, ValueStore,
};
