use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Decimal,
    Email,
    Password,
    /// Identifier of a record in another entity, rendered through a lookup.
    Reference,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Decimal | Self::Reference)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Mandatory when creating, may be left blank when editing.
    RequiredOnCreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Raw,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<&'static str>,
    /// Table header; `None` keeps the field out of the list.
    pub column: Option<&'static str>,
    pub format: CellFormat,
    /// Prefill used when creating.
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            presence: Presence::Required,
            min: None,
            max: None,
            pattern: None,
            column: None,
            format: CellFormat::Raw,
            default: None,
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub const fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub const fn decimal(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Decimal)
    }

    pub const fn email(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub const fn password(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Password)
    }

    pub const fn reference(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Reference)
    }

    pub const fn optional(self) -> Self {
        Self {
            presence: Presence::Optional,
            ..self
        }
    }

    pub const fn required_on_create(self) -> Self {
        Self {
            presence: Presence::RequiredOnCreate,
            ..self
        }
    }

    pub const fn min(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }

    pub const fn max(self, max: f64) -> Self {
        Self {
            max: Some(max),
            ..self
        }
    }

    pub const fn pattern(self, pattern: &'static str) -> Self {
        Self {
            pattern: Some(pattern),
            ..self
        }
    }

    pub const fn column(self, header: &'static str) -> Self {
        Self {
            column: Some(header),
            ..self
        }
    }

    pub const fn currency(self) -> Self {
        Self {
            format: CellFormat::Currency,
            ..self
        }
    }

    pub const fn default_value(self, value: &'static str) -> Self {
        Self {
            default: Some(value),
            ..self
        }
    }

    pub fn is_required(&self, creating: bool) -> bool {
        match self.presence {
            Presence::Required => true,
            Presence::Optional => false,
            Presence::RequiredOnCreate => creating,
        }
    }
}

/// Display-only link from a local field to a record of another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub local_field: &'static str,
    pub target_entity: &'static str,
    pub target_id_field: &'static str,
    pub target_label_field: &'static str,
}

impl ForeignKeyRef {
    pub const fn new(
        local_field: &'static str,
        target_entity: &'static str,
        target_id_field: &'static str,
        target_label_field: &'static str,
    ) -> Self {
        Self {
            local_field,
            target_entity,
            target_id_field,
            target_label_field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdSource {
    Server,
    /// The identifier is typed by the user when creating and immutable afterwards.
    UserSupplied(FieldSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLabels {
    pub singular: &'static str,
    pub plural: &'static str,
    pub title: &'static str,
    pub id_header: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub resource_path: &'static str,
    pub id_field: &'static str,
    pub id_source: IdSource,
    pub labels: EntityLabels,
    pub fields: &'static [FieldSpec],
    pub references: &'static [ForeignKeyRef],
    /// `{field}` placeholders are filled from the record being deleted.
    pub delete_prompt: &'static str,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn reference_for(&self, local_field: &str) -> Option<&ForeignKeyRef> {
        self.references
            .iter()
            .find(|reference| reference.local_field == local_field)
    }

    pub fn listed_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| field.column.is_some())
    }

    /// Fields shown in the form. A user-supplied identifier only appears when creating.
    pub fn form_fields(&self, creating: bool) -> Vec<&FieldSpec> {
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        if let (true, IdSource::UserSupplied(id_field)) = (creating, &self.id_source) {
            fields.push(id_field);
        }
        fields.extend(self.fields.iter());
        fields
    }

    pub fn loading_message(&self) -> String {
        format!("Cargando {}...", self.labels.plural)
    }

    pub fn load_failure_message(&self) -> String {
        format!("Error al cargar {}", self.labels.plural)
    }

    pub fn save_failure_message(&self) -> String {
        format!("No se pudo guardar el {}", self.labels.singular)
    }

    pub fn delete_failure_message(&self) -> String {
        format!("No se pudo eliminar el {}", self.labels.singular)
    }

    pub fn empty_message(&self) -> String {
        format!("No hay {} disponibles.", self.labels.plural)
    }

    pub fn form_title(&self, creating: bool) -> String {
        if creating {
            format!("Agregar {}", self.labels.title)
        } else {
            format!("Editar {}", self.labels.title)
        }
    }

    pub fn delete_prompt_for(&self, record: &Record) -> String {
        fill_template(self.delete_prompt, record)
    }
}

fn fill_template(template: &str, record: &Record) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&record.display(&after[..end]));
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Normalised identifier used in URLs and for lookup equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Strings are taken verbatim, integral numbers lose any `.0` suffix.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => Some(Self(raw.clone())),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Some(Self(int.to_string()));
                }
                if let Some(int) = number.as_u64() {
                    return Some(Self(int.to_string()));
                }
                match number.as_f64() {
                    Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                        Some(Self((float as i64).to_string()))
                    }
                    _ => Some(Self(number.to_string())),
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    pub fn key(&self, id_field: &str) -> Option<RecordKey> {
        self.0.get(id_field).and_then(RecordKey::from_value)
    }

    /// Field rendered as text; absent and null values are blank.
    pub fn display(&self, field: &str) -> String {
        self.0.get(field).map(display_value).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(raw) => raw.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSnapshot {
    pub records: Vec<Record>,
    /// Set after a successful write until the next successful load.
    pub stale: bool,
}

impl CollectionSnapshot {
    pub fn loaded(records: Vec<Record>) -> Self {
        Self {
            records,
            stale: false,
        }
    }

    pub fn find(&self, id_field: &str, key: &RecordKey) -> Option<&Record> {
        self.records
            .iter()
            .find(|record| record.key(id_field).as_ref() == Some(key))
    }

    pub fn contains(&self, id_field: &str, key: &RecordKey) -> bool {
        self.find(id_field, key).is_some()
    }
}
