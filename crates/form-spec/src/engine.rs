//! Per-session form engine.
//!
//! A [`FormSession`] owns its value store and error map. Submission is split
//! into a synchronous planning step ([`FormSession::plan_submit`]) and a
//! completion step ([`FormSession::complete_submit`]) so callers can keep
//! editing while the adapter call is in flight; [`FormSession::submit`]
//! runs both around a [`SubmissionAdapter`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SchemaIntegrityError;
use crate::render::{RenderField, render_fields};
use crate::spec::form::FormDefinition;
use crate::validate::{ValidationErrors, Validator};
use crate::values::{
    FieldValue, FileHandle, FileSelectionError, FormValues, UnknownField, ValueStore,
};

/// A row as returned by the backing store.
pub type Record = Map<String, Value>;

/// Column name -> value, built from a validated session.
pub type Payload = BTreeMap<String, FieldValue>;

/// Message surfaced when the adapter rejects a submission.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to save the form. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Editing,
    Validating,
    Invalid,
    Submitting,
    Submitted,
    SubmitFailed,
    Cancelled,
}

impl SessionState {
    /// States in which field edits are accepted.
    pub fn accepts_edits(&self) -> bool {
        matches!(
            self,
            SessionState::Editing
                | SessionState::Invalid
                | SessionState::Submitting
                | SessionState::SubmitFailed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Submitted | SessionState::Cancelled)
    }
}

/// When field errors are recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Errors are only computed on submit.
    #[default]
    OnSubmit,
    /// Each edit re-validates the edited field.
    OnChange,
}

/// Rejection reported by the submission adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
    pub message: String,
    pub code: Option<String>,
    pub hint: Option<String>,
}

impl SubmissionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            hint: None,
        }
    }
}

/// Writes a validated payload to the backing table.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync {
    /// Updates `record_id` when given, inserts otherwise.
    async fn submit(
        &self,
        table_name: &str,
        payload: Payload,
        record_id: Option<&str>,
    ) -> Result<Record, SubmissionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session is {0:?} and no longer accepts changes")]
    Closed(SessionState),
    #[error("a submission is already in flight")]
    SubmitInFlight,
    #[error("no submission is in flight")]
    NotSubmitting,
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error("field '{0}' does not accept files")]
    NotAFileField(String),
    #[error(transparent)]
    Integrity(#[from] SchemaIntegrityError),
}

impl From<FileSelectionError> for SessionError {
    fn from(err: FileSelectionError) -> Self {
        match err {
            FileSelectionError::UnknownField(field) => SessionError::UnknownField(field),
            FileSelectionError::NotAFileField(id) => SessionError::NotAFileField(id),
        }
    }
}

/// Outcome of validating a session for submission.
///
/// The payload is only populated when the plan is valid.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPlan {
    pub form_id: String,
    pub table_name: String,
    pub record_id: Option<String>,
    pub payload: Payload,
    pub errors: ValidationErrors,
}

impl SubmissionPlan {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What a submit attempt ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Record),
    Invalid(ValidationErrors),
    Failed(SubmissionError),
    /// A submission was already in flight.
    Ignored,
}

/// Maps `values[field.id]` to `payload[field.db_field]` for each field
/// present in `values`.
pub fn build_payload(definition: &FormDefinition, values: &FormValues) -> Payload {
    definition
        .fields
        .iter()
        .filter_map(|field| {
            values
                .get(&field.id)
                .map(|value| (field.db_field.clone(), value.clone()))
        })
        .collect()
}

/// Reads an existing row back into field values, keyed by field id.
pub fn values_from_record(definition: &FormDefinition, record: &Record) -> FormValues {
    definition
        .fields
        .iter()
        .filter_map(|field| {
            record
                .get(&field.db_field)
                .map(|value| (field.id.clone(), FieldValue::from_json(value)))
        })
        .collect()
}

/// One editing session over a form definition.
#[derive(Debug, Clone)]
pub struct FormSession {
    definition: Arc<FormDefinition>,
    validator: Validator,
    mode: ValidationMode,
    state: SessionState,
    store: Option<ValueStore>,
    errors: ValidationErrors,
    record_id: Option<String>,
    record: Option<Record>,
    failure: Option<SubmissionError>,
}

impl FormSession {
    pub fn new(definition: Arc<FormDefinition>) -> Self {
        Self {
            definition,
            validator: Validator::new(),
            mode: ValidationMode::default(),
            state: SessionState::Idle,
            store: None,
            errors: ValidationErrors::new(),
            record_id: None,
            record: None,
            failure: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Starts editing a new record seeded from field defaults.
    ///
    /// Fails with [`SessionError::Integrity`] when the definition does not
    /// pass [`FormDefinition::check_integrity`]; the session stays `Idle`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.begin(None, &FormValues::new())
    }

    /// Starts editing an existing record.
    pub fn start_editing(
        &mut self,
        record_id: impl Into<String>,
        initial_values: &FormValues,
    ) -> Result<(), SessionError> {
        self.begin(Some(record_id.into()), initial_values)
    }

    fn begin(
        &mut self,
        record_id: Option<String>,
        initial_values: &FormValues,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Closed(self.state));
        }
        if let Err(err) = self.definition.check_integrity() {
            warn!(form = %self.definition.id, error = %err, "refusing to start session");
            return Err(err.into());
        }
        self.store = Some(ValueStore::initialize(
            &self.definition.fields,
            initial_values,
        ));
        self.record_id = record_id;
        self.state = SessionState::Editing;
        debug!(form = %self.definition.id, record = ?self.record_id, "session started");
        Ok(())
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn values(&self) -> Option<&FormValues> {
        self.store.as_ref().map(ValueStore::values)
    }

    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.store.as_ref().and_then(|store| store.get(field_id))
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_touched(&self, field_id: &str) -> bool {
        self.store
            .as_ref()
            .is_some_and(|store| store.is_touched(field_id))
    }

    pub fn is_dirty(&self) -> bool {
        self.store.as_ref().is_some_and(ValueStore::is_dirty)
    }

    /// Record returned by the adapter once submitted.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    /// Session-level message after a failed submission.
    pub fn failure_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|_| SUBMIT_FAILED_MESSAGE)
    }

    /// Underlying adapter error of the last failed submission.
    pub fn last_failure(&self) -> Option<&SubmissionError> {
        self.failure.as_ref()
    }

    pub fn set_value(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), SessionError> {
        self.edit_store()?.set(field_id, value)?;
        self.after_edit(field_id);
        Ok(())
    }

    pub fn set_files(
        &mut self,
        field_id: &str,
        files: Vec<FileHandle>,
    ) -> Result<(), SessionError> {
        self.edit_store()?.set_files(field_id, files)?;
        self.after_edit(field_id);
        Ok(())
    }

    /// Marks a field visited without changing it (blur).
    pub fn touch(&mut self, field_id: &str) -> Result<(), SessionError> {
        self.edit_store()?.touch(field_id)?;
        Ok(())
    }

    fn edit_store(&mut self) -> Result<&mut ValueStore, SessionError> {
        if !self.state.accepts_edits() {
            return Err(match self.state {
                SessionState::Idle => SessionError::NotStarted,
                state => SessionError::Closed(state),
            });
        }
        self.store.as_mut().ok_or(SessionError::NotStarted)
    }

    fn after_edit(&mut self, field_id: &str) {
        if matches!(
            self.state,
            SessionState::Invalid | SessionState::SubmitFailed
        ) {
            self.state = SessionState::Editing;
        }
        if self.mode == ValidationMode::OnChange {
            self.revalidate_field(field_id);
        }
    }

    fn revalidate_field(&mut self, field_id: &str) {
        let Some(field) = self.definition.field(field_id) else {
            return;
        };
        let value = self
            .value(field_id)
            .cloned()
            .unwrap_or(FieldValue::Null);
        match self.validator.validate_field(field, &value) {
            Some(message) => {
                self.errors.insert(field_id.to_string(), message);
            }
            None => {
                self.errors.remove(field_id);
            }
        }
    }

    /// Validates the whole form and marks every field touched.
    ///
    /// A valid plan moves the session to `Submitting` and carries the
    /// payload for the adapter; an invalid one leaves it `Invalid`.
    pub fn plan_submit(&mut self) -> Result<SubmissionPlan, SessionError> {
        match self.state {
            SessionState::Submitting => return Err(SessionError::SubmitInFlight),
            SessionState::Idle => return Err(SessionError::NotStarted),
            state if state.is_terminal() => return Err(SessionError::Closed(state)),
            _ => {}
        }
        let store = self.store.as_mut().ok_or(SessionError::NotStarted)?;

        self.state = SessionState::Validating;
        store.touch_all();
        self.errors = self.validator.validate_form(&self.definition, store.values());

        let mut plan = SubmissionPlan {
            form_id: self.definition.id.clone(),
            table_name: self.definition.table_name.clone(),
            record_id: self.record_id.clone(),
            payload: Payload::new(),
            errors: self.errors.clone(),
        };
        if !plan.is_valid() {
            self.state = SessionState::Invalid;
            debug!(
                form = %self.definition.id,
                failing = plan.errors.len(),
                "submission blocked by validation"
            );
            return Ok(plan);
        }

        plan.payload = build_payload(&self.definition, store.values());
        self.failure = None;
        self.state = SessionState::Submitting;
        Ok(plan)
    }

    /// Applies the adapter result of an in-flight submission.
    pub fn complete_submit(
        &mut self,
        result: Result<Record, SubmissionError>,
    ) -> Result<SubmitOutcome, SessionError> {
        if self.state != SessionState::Submitting {
            return Err(SessionError::NotSubmitting);
        }
        match result {
            Ok(record) => {
                info!(
                    form = %self.definition.id,
                    table = %self.definition.table_name,
                    "form submitted"
                );
                self.state = SessionState::Submitted;
                self.record = Some(record.clone());
                Ok(SubmitOutcome::Submitted(record))
            }
            Err(err) => {
                warn!(
                    form = %self.definition.id,
                    table = %self.definition.table_name,
                    error = %err,
                    "form submission failed"
                );
                self.state = SessionState::SubmitFailed;
                self.failure = Some(err.clone());
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    /// Validates and submits through `adapter`. A submit while another is in
    /// flight yields [`SubmitOutcome::Ignored`].
    pub async fn submit(
        &mut self,
        adapter: &dyn SubmissionAdapter,
    ) -> Result<SubmitOutcome, SessionError> {
        let plan = match self.plan_submit() {
            Ok(plan) if plan.is_valid() => plan,
            Ok(plan) => return Ok(SubmitOutcome::Invalid(plan.errors)),
            Err(SessionError::SubmitInFlight) => {
                debug!(form = %self.definition.id, "submit ignored while in flight");
                return Ok(SubmitOutcome::Ignored);
            }
            Err(err) => return Err(err),
        };
        let result = adapter
            .submit(&plan.table_name, plan.payload, plan.record_id.as_deref())
            .await;
        self.complete_submit(result)
    }

    /// Ends the session and drops its values.
    pub fn cancel(&mut self) {
        self.store = None;
        self.errors.clear();
        self.state = SessionState::Cancelled;
        debug!(form = %self.definition.id, "session cancelled");
    }

    /// Ordered view of every field with its value and visible error.
    pub fn render(&self) -> Vec<RenderField> {
        match &self.store {
            Some(store) => render_fields(&self.definition, store, &self.errors),
            None => Vec::new(),
        }
    }
}
