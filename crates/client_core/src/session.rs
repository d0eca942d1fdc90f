//! Create/edit form state machine.
//!
//! A session is opened from the list ("add" or "edit" on a row), validates
//! the raw form strings against the entity's [`FieldSpec`]s, coerces them to
//! JSON and hands the payload to the [`ResourceController`]. It only closes
//! once the controller reports success, so a failed write can be retried or
//! cancelled from the still-open form.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, PoisonError},
};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Number, Value};
use shared::{
    domain::{EntityDescriptor, FieldKind, FieldSpec, Record, RecordKey},
    error::{FieldViolation, ValidationErrors},
};
use tracing::{debug, warn};

use crate::{controller::ResourceController, error::AdminError};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("email regex");
    static ref FIELD_PATTERNS: Mutex<HashMap<&'static str, Option<Regex>>> =
        Mutex::new(HashMap::new());
}

/// Raw string values of a submitted form, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput(BTreeMap<String, String>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    /// Missing fields read as empty, like an untouched input.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlays `other` on top of these values.
    pub fn merged(mut self, other: &FormInput) -> Self {
        for (field, value) in other.iter() {
            self.set(field, value);
        }
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Viewing(Record),
    Editing(Record),
    Creating,
}

pub struct FormSession {
    descriptor: &'static EntityDescriptor,
    state: SessionState,
}

impl FormSession {
    pub fn new(descriptor: &'static EntityDescriptor) -> Self {
        Self {
            descriptor,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// A create or edit form is open.
    pub fn is_form_open(&self) -> bool {
        matches!(self.state, SessionState::Creating | SessionState::Editing(_))
    }

    pub fn open_create(&mut self) {
        self.state = SessionState::Creating;
    }

    pub fn open_edit(
        &mut self,
        controller: &ResourceController,
        key: &RecordKey,
    ) -> Result<(), AdminError> {
        let record = self.current_row(controller, key)?;
        self.state = SessionState::Editing(record);
        Ok(())
    }

    pub fn open_view(
        &mut self,
        controller: &ResourceController,
        key: &RecordKey,
    ) -> Result<(), AdminError> {
        let record = self.current_row(controller, key)?;
        self.state = SessionState::Viewing(record);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
    }

    fn current_row(
        &self,
        controller: &ResourceController,
        key: &RecordKey,
    ) -> Result<Record, AdminError> {
        controller
            .find(key)
            .cloned()
            .ok_or_else(|| AdminError::UnknownRecord {
                entity: self.descriptor.name.to_string(),
                key: key.clone(),
            })
    }

    pub fn title(&self) -> Option<String> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Creating => Some(self.descriptor.form_title(true)),
            SessionState::Editing(_) => Some(self.descriptor.form_title(false)),
            SessionState::Viewing(_) => Some(self.descriptor.labels.title.to_string()),
        }
    }

    /// Initial form values: field defaults when creating, the row when editing.
    pub fn defaults(&self) -> FormInput {
        match &self.state {
            SessionState::Creating => self
                .descriptor
                .form_fields(true)
                .into_iter()
                .map(|field| (field.name, field.default.unwrap_or("")))
                .collect(),
            SessionState::Editing(record) => self
                .descriptor
                .form_fields(false)
                .into_iter()
                .map(|field| {
                    let value = match field.kind {
                        FieldKind::Password => String::new(),
                        _ => record.display(field.name),
                    };
                    (field.name, value)
                })
                .collect(),
            SessionState::Idle | SessionState::Viewing(_) => FormInput::new(),
        }
    }

    /// Validates every field and builds the JSON payload; no network access.
    pub fn prepare(&self, input: &FormInput) -> Result<Record, AdminError> {
        let creating = match &self.state {
            SessionState::Creating => true,
            SessionState::Editing(_) => false,
            SessionState::Idle | SessionState::Viewing(_) => return Err(AdminError::NoActiveForm),
        };

        let mut violations = ValidationErrors::new();
        let mut payload = Record::new();
        for field in self.descriptor.form_fields(creating) {
            match coerce_field(field, input.get(field.name), creating) {
                // A blank password on edit keeps the stored one.
                Ok(Value::Null) if field.kind == FieldKind::Password && !creating => {}
                Ok(value) => {
                    payload.insert(field.name, value);
                }
                Err(violation) => violations.push(violation),
            }
        }

        if let Err(errors) = violations.into_result() {
            debug!(entity = self.descriptor.name, %errors, "form rejected");
            return Err(errors.into());
        }
        Ok(payload)
    }

    /// Sends the form through the controller and closes only on success.
    pub async fn submit(
        &mut self,
        input: &FormInput,
        controller: &mut ResourceController,
    ) -> Result<(), AdminError> {
        let payload = self.prepare(input)?;
        let target = match &self.state {
            SessionState::Editing(record) => Some(
                record
                    .key(self.descriptor.id_field)
                    .ok_or(AdminError::NoActiveForm)?,
            ),
            _ => None,
        };

        match target {
            Some(key) => controller.update(&key, &payload).await?,
            None => controller.create(&payload).await?,
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Refreshes the held row from a new snapshot, closing the session if it vanished.
    pub fn retain_current(&mut self, controller: &ResourceController) {
        let id_field = self.descriptor.id_field;
        let refreshed = match &self.state {
            SessionState::Editing(record) | SessionState::Viewing(record) => record
                .key(id_field)
                .and_then(|key| controller.find(&key).cloned()),
            SessionState::Idle | SessionState::Creating => return,
        };

        self.state = match (refreshed, &self.state) {
            (Some(record), SessionState::Editing(_)) => SessionState::Editing(record),
            (Some(record), _) => SessionState::Viewing(record),
            (None, _) => {
                debug!(entity = self.descriptor.name, "open row disappeared; closing form");
                SessionState::Idle
            }
        };
    }
}

fn coerce_field(field: &FieldSpec, raw: &str, creating: bool) -> Result<Value, FieldViolation> {
    if raw.is_empty() {
        if field.is_required(creating) {
            return Err(FieldViolation::new(field.name, "campo obligatorio"));
        }
        return Ok(Value::Null);
    }

    match field.kind {
        FieldKind::Number => {
            let parsed: i64 = raw
                .trim()
                .parse()
                .map_err(|_| FieldViolation::new(field.name, "debe ser un número entero"))?;
            check_bounds(field, parsed as f64)?;
            Ok(Value::from(parsed))
        }
        FieldKind::Decimal => {
            let parsed = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|value| Number::from_f64(value).map(|n| (value, n)));
            let (value, number) =
                parsed.ok_or_else(|| FieldViolation::new(field.name, "debe ser un número"))?;
            check_bounds(field, value)?;
            Ok(Value::Number(number))
        }
        FieldKind::Reference => match raw.trim().parse::<i64>() {
            Ok(id) => Ok(Value::from(id)),
            Err(_) => Ok(Value::String(raw.to_string())),
        },
        FieldKind::Email => {
            if !EMAIL_RE.is_match(raw) {
                return Err(FieldViolation::new(
                    field.name,
                    "correo electrónico inválido",
                ));
            }
            check_pattern(field, raw)?;
            Ok(Value::String(raw.to_string()))
        }
        FieldKind::Text | FieldKind::Password => {
            check_pattern(field, raw)?;
            Ok(Value::String(raw.to_string()))
        }
    }
}

fn check_bounds(field: &FieldSpec, value: f64) -> Result<(), FieldViolation> {
    if let Some(min) = field.min {
        if value < min {
            return Err(FieldViolation::new(
                field.name,
                format!("debe ser mayor o igual a {min}"),
            ));
        }
    }
    if let Some(max) = field.max {
        if value > max {
            return Err(FieldViolation::new(
                field.name,
                format!("debe ser menor o igual a {max}"),
            ));
        }
    }
    Ok(())
}

fn check_pattern(field: &FieldSpec, raw: &str) -> Result<(), FieldViolation> {
    let Some(pattern) = field.pattern else {
        return Ok(());
    };
    match anchored_pattern(pattern) {
        Some(re) if !re.is_match(raw) => Err(FieldViolation::new(
            field.name,
            "no coincide con el formato requerido",
        )),
        _ => Ok(()),
    }
}

/// Compiled once per pattern, anchored like an HTML `pattern` attribute.
/// Invalid patterns are cached as `None` and never enforced.
fn anchored_pattern(pattern: &'static str) -> Option<Regex> {
    let mut cache = FIELD_PATTERNS
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    cache
        .entry(pattern)
        .or_insert_with(|| match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern, error = %err, "ignoring invalid field pattern");
                None
            }
        })
        .clone()
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
