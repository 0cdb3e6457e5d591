//! Create/update form screens.
//!
//! Every form follows the same shape: raw text inputs are parsed into a typed
//! form, the form is checked with its `validator` rules, submit stays disabled
//! while any issue remains, and a valid form is dispatched as exactly one
//! mutation. Server rejections are surfaced verbatim; nothing is retried.
//!
//! A UI that must keep drawing while the request is in flight calls
//! [`FormState::begin_submit`], sends the [`Submission`] from a task of its own
//! and hands the answer to [`FormState::finish_submit`].
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    marker::PhantomData,
    str::FromStr,
};

use api_types::{mutation::MutationResponse, reference::ReferenceKind};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::RemoteError;

mod entities;

pub use entities::{
    AdjustmentForm, AdminForm, AgentForm, CryptoFeeForm, CustomerForm, OutageForm,
    PaymentTypeForm, RoleForm, ServiceStationForm, VendorForm,
};

/// Key under which `validator` reports struct level (schema) errors.
const FORM_LEVEL_KEY: &str = "__all__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Email,
    Date,
    Choice(&'static [&'static str]),
    Reference(ReferenceKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
        }
    }
}

/// A form bound to one entity endpoint.
pub trait EntityForm: Validate + Serialize + Sized {
    const TITLE: &'static str;
    /// Path of the create mutation, relative to the API base URL. Updates and
    /// deletes go to `{ENDPOINT}/{id}`.
    const ENDPOINT: &'static str;

    fn fields() -> &'static [FormField];

    /// Parses raw inputs. Missing required values and malformed numbers or
    /// dates are reported as field issues.
    fn from_inputs(inputs: &FormInputs) -> Result<Self, ValidationIssues>;
}

/// A list row that can seed the edit form of its entity.
///
/// Reference columns come back as display names, so reference fields are
/// seeded blank and picked again by the operator.
pub trait EditSource {
    type Form: EntityForm;

    fn id(&self) -> i64;
    fn form_inputs(&self) -> FormInputs;
}

/// Raw text typed into a form, keyed by field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInputs(BTreeMap<String, String>);

impl FormInputs {
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Trimmed value, empty when never set.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(|value| value.trim()).unwrap_or("")
    }

    pub fn raw(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Per-field messages plus form level messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationIssues {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationIssues {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn push(&mut self, key: &str, message: impl Into<String>) {
        self.fields
            .entry(key.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn for_field(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn form_level(&self) -> &[String] {
        self.for_field(FORM_LEVEL_KEY)
    }

    /// Flattened `label: message` lines for the issues panel.
    pub fn summary(&self, fields: &[FormField]) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(key, messages)| {
                let label = fields
                    .iter()
                    .find(|field| field.key == key)
                    .map(|field| field.label);
                messages.iter().map(move |message| match label {
                    Some(label) => format!("{label}: {message}"),
                    None => message.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count: usize = self.fields.values().map(Vec::len).sum();
        write!(f, "{count} validation issue(s)")
    }
}

impl From<&ValidationErrors> for ValidationIssues {
    fn from(errors: &ValidationErrors) -> Self {
        let mut issues = Self::default();
        for (key, kind) in errors.errors() {
            if let ValidationErrorsKind::Field(field_errors) = kind {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| default_message(&error.code));
                    issues.push(key, message);
                }
            }
        }
        issues
    }
}

fn default_message(code: &str) -> String {
    match code {
        "length" => "has an invalid length".to_string(),
        "range" => "is out of range".to_string(),
        "email" => "must be a valid email address".to_string(),
        other => format!("is invalid ({other})"),
    }
}

/// Parses raw inputs into typed values, collecting issues as it goes.
pub struct InputParser<'a> {
    inputs: &'a FormInputs,
    issues: ValidationIssues,
}

impl<'a> InputParser<'a> {
    pub fn new(inputs: &'a FormInputs) -> Self {
        Self {
            inputs,
            issues: ValidationIssues::default(),
        }
    }

    pub fn text(&mut self, key: &str) -> String {
        let value = self.inputs.get(key);
        if value.is_empty() {
            self.issues.push(key, "is required");
        }
        value.to_string()
    }

    pub fn optional_text(&mut self, key: &str) -> Option<String> {
        let value = self.inputs.get(key);
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn number<T: FromStr + Default>(&mut self, key: &str) -> T {
        match self.optional_number(key) {
            Some(value) => value,
            None => {
                if self.inputs.get(key).is_empty() {
                    self.issues.push(key, "is required");
                }
                T::default()
            }
        }
    }

    pub fn optional_number<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.inputs.get(key);
        if raw.is_empty() {
            return None;
        }
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.issues.push(key, "must be a number");
                None
            }
        }
    }

    /// Like [`number`](Self::number) for floats; NaN and infinities are
    /// rejected since range rules cannot see them.
    pub fn decimal(&mut self, key: &str) -> f64 {
        match self.optional_decimal(key) {
            Some(value) => value,
            None => {
                if self.inputs.get(key).is_empty() {
                    self.issues.push(key, "is required");
                }
                0.0
            }
        }
    }

    pub fn optional_decimal(&mut self, key: &str) -> Option<f64> {
        let value = self.optional_number::<f64>(key)?;
        if value.is_finite() {
            Some(value)
        } else {
            self.issues.push(key, "must be a number");
            None
        }
    }

    pub fn date(&mut self, key: &str) -> NaiveDate {
        match self.optional_date(key) {
            Some(date) => date,
            None => {
                if self.inputs.get(key).is_empty() {
                    self.issues.push(key, "is required");
                }
                NaiveDate::default()
            }
        }
    }

    pub fn optional_date(&mut self, key: &str) -> Option<NaiveDate> {
        let raw = self.inputs.get(key);
        if raw.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.issues.push(key, "must be a YYYY-MM-DD date");
                None
            }
        }
    }

    pub fn choice<T>(&mut self, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.inputs.get(key);
        if raw.is_empty() {
            self.issues.push(key, "is required");
            return None;
        }
        let parsed = parse(&raw.to_ascii_lowercase());
        if parsed.is_none() {
            self.issues.push(key, format!("\"{raw}\" is not a valid option"));
        }
        parsed
    }

    /// Comma separated list, blanks dropped.
    pub fn list(&mut self, key: &str) -> Vec<String> {
        self.inputs
            .get(key)
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn finish<F>(self, form: Option<F>) -> Result<F, ValidationIssues> {
        match form {
            Some(form) if self.issues.is_empty() => Ok(form),
            _ => Err(self.issues),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("{0}")]
    Validation(ValidationIssues),
    /// `isSuccess: false`; the message is the server's, verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("cannot encode form: {0}")]
    Encode(String),
    #[error("a submission is already in progress")]
    Busy,
}

impl FormError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Receives entity mutations.
#[async_trait]
pub trait MutationSink: Send + Sync {
    async fn create(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<MutationResponse<Value>, RemoteError>;

    async fn update(
        &self,
        endpoint: &str,
        id: i64,
        body: Value,
    ) -> Result<MutationResponse<Value>, RemoteError>;

    async fn delete(
        &self,
        endpoint: &str,
        id: i64,
    ) -> Result<MutationResponse<Value>, RemoteError>;
}

/// Whether a form creates a new record or edits record `id`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    Edit(i64),
}

/// A validated mutation, detached from the form that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub mode: FormMode,
    pub endpoint: &'static str,
    pub body: Value,
}

impl Submission {
    pub async fn send(
        &self,
        sink: &dyn MutationSink,
    ) -> Result<MutationResponse<Value>, RemoteError> {
        match self.mode {
            FormMode::Create => sink.create(self.endpoint, self.body.clone()).await,
            FormMode::Edit(id) => sink.update(self.endpoint, id, self.body.clone()).await,
        }
    }
}

/// Outcome of an accepted mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct Submitted {
    pub message: String,
    pub data: Option<Value>,
}

/// Deletes record `id` under `endpoint`, reading the envelope like a submit.
pub async fn delete_record(
    sink: &dyn MutationSink,
    endpoint: &str,
    id: i64,
) -> Result<Submitted, FormError> {
    let response = sink.delete(endpoint, id).await.inspect_err(|err| {
        tracing::warn!(endpoint, id, "delete failed: {err}");
    })?;
    if !response.is_success {
        let message = response
            .message
            .unwrap_or_else(|| format!("record {id} could not be deleted"));
        return Err(FormError::Rejected(message));
    }
    tracing::info!(endpoint, id, "record deleted");
    Ok(Submitted {
        message: response
            .message
            .unwrap_or_else(|| format!("record {id} deleted")),
        data: response.data,
    })
}

/// Input, validation and submission state of one form screen.
#[derive(Debug)]
pub struct FormState<F> {
    mode: FormMode,
    inputs: FormInputs,
    issues: ValidationIssues,
    touched: BTreeSet<String>,
    submitting: bool,
    _form: PhantomData<F>,
}

impl<F: EntityForm> Default for FormState<F> {
    fn default() -> Self {
        Self::new(FormInputs::default())
    }
}

impl<F: EntityForm> FormState<F> {
    pub fn new(inputs: FormInputs) -> Self {
        Self::with_mode(FormMode::Create, inputs)
    }

    /// Edit form for record `id`, prefilled with `inputs`.
    pub fn edit(id: i64, inputs: FormInputs) -> Self {
        Self::with_mode(FormMode::Edit(id), inputs)
    }

    pub fn edit_from<R: EditSource<Form = F>>(row: &R) -> Self {
        Self::edit(row.id(), row.form_inputs())
    }

    fn with_mode(mode: FormMode, inputs: FormInputs) -> Self {
        let mut state = Self {
            mode,
            inputs,
            issues: ValidationIssues::default(),
            touched: BTreeSet::new(),
            submitting: false,
            _form: PhantomData,
        };
        state.revalidate();
        state
    }

    pub fn fields(&self) -> &'static [FormField] {
        F::fields()
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn inputs(&self) -> &FormInputs {
        &self.inputs
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inputs.set(key, value);
        self.touched.insert(key.to_string());
        self.revalidate();
    }

    pub fn issues(&self) -> &ValidationIssues {
        &self.issues
    }

    /// Inline messages, shown only once the field was edited.
    pub fn field_issues(&self, key: &str) -> &[String] {
        if self.touched.contains(key) {
            self.issues.for_field(key)
        } else {
            &[]
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        self.issues.is_empty() && !self.submitting
    }

    /// Parses and validates the current inputs.
    pub fn validate(&self) -> Result<F, ValidationIssues> {
        let form = F::from_inputs(&self.inputs)?;
        match form.validate() {
            Ok(()) => Ok(form),
            Err(errors) => Err(ValidationIssues::from(&errors)),
        }
    }

    /// Validates and locks the form; the returned submission is the one
    /// mutation to send. Invalid inputs flag every field inline.
    pub fn begin_submit(&mut self) -> Result<Submission, FormError> {
        if self.submitting {
            return Err(FormError::Busy);
        }
        let form = match self.validate() {
            Ok(form) => form,
            Err(issues) => {
                self.touched.extend(F::fields().iter().map(|f| f.key.to_string()));
                self.issues = issues.clone();
                return Err(FormError::Validation(issues));
            }
        };
        let body = serde_json::to_value(&form).map_err(|err| FormError::Encode(err.to_string()))?;

        self.submitting = true;
        Ok(Submission {
            mode: self.mode,
            endpoint: F::ENDPOINT,
            body,
        })
    }

    /// Unlocks the form and reads the server's answer.
    pub fn finish_submit(
        &mut self,
        result: Result<MutationResponse<Value>, RemoteError>,
    ) -> Result<Submitted, FormError> {
        self.submitting = false;

        let response = result.inspect_err(|err| {
            tracing::warn!(endpoint = F::ENDPOINT, "form submission failed: {err}");
        })?;

        if !response.is_success {
            let message = response
                .message
                .unwrap_or_else(|| format!("{} was rejected", F::TITLE));
            tracing::info!(endpoint = F::ENDPOINT, %message, "form rejected by server");
            return Err(FormError::Rejected(message));
        }

        tracing::info!(endpoint = F::ENDPOINT, mode = ?self.mode, "form submitted");
        Ok(Submitted {
            message: response
                .message
                .unwrap_or_else(|| format!("{} saved", F::TITLE)),
            data: response.data,
        })
    }

    /// Validates and dispatches exactly one mutation.
    pub async fn submit(&mut self, sink: &dyn MutationSink) -> Result<Submitted, FormError> {
        let submission = self.begin_submit()?;
        let result = submission.send(sink).await;
        self.finish_submit(result)
    }

    fn revalidate(&mut self) {
        self.issues = match self.validate() {
            Ok(_) => ValidationIssues::default(),
            Err(issues) => issues,
        };
    }
}
