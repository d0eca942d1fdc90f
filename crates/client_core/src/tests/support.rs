use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::RecordKey;

use crate::{error::TransportError, interaction::Interaction, transport::CollectionTransport};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(String),
    Create(String, Value),
    Update(String, RecordKey, Value),
    Remove(String, RecordKey),
}

impl Call {
    pub fn is_write(&self) -> bool {
        !matches!(self, Call::Fetch(_))
    }
}

#[derive(Default)]
struct FakeState {
    rows: HashMap<String, Vec<Value>>,
    id_fields: HashMap<String, String>,
    next_id: i64,
    calls: Vec<Call>,
    failing: HashSet<(&'static str, String)>,
    enveloped: bool,
}

/// In-memory collections behind the transport seam, assigning ids like a server would.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let transport = Self::default();
        transport.state.lock().expect("state").next_id = 100;
        Arc::new(transport)
    }

    pub fn seed(&self, path: &str, id_field: &str, rows: Vec<Value>) {
        let mut state = self.state.lock().expect("state");
        state.rows.insert(path.to_string(), rows);
        state
            .id_fields
            .insert(path.to_string(), id_field.to_string());
    }

    /// Serve reads as `{ "data": [...] }`.
    pub fn use_envelope(&self) {
        self.state.lock().expect("state").enveloped = true;
    }

    pub fn fail(&self, op: &'static str, path: &str) {
        self.state
            .lock()
            .expect("state")
            .failing
            .insert((op, path.to_string()));
    }

    pub fn recover(&self, op: &'static str, path: &str) {
        self.state
            .lock()
            .expect("state")
            .failing
            .remove(&(op, path.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().expect("state").calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn rows(&self, path: &str) -> Vec<Value> {
        self.state
            .lock()
            .expect("state")
            .rows
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, op: &'static str, path: &str, call: Call) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("state");
        state.calls.push(call);
        if state.failing.contains(&(op, path.to_string())) {
            return Err(TransportError::Status(500));
        }
        Ok(())
    }

    fn id_field(state: &FakeState, path: &str) -> String {
        state
            .id_fields
            .get(path)
            .cloned()
            .unwrap_or_else(|| "id".to_string())
    }
}

#[async_trait]
impl CollectionTransport for FakeTransport {
    async fn fetch(&self, path: &str) -> Result<Value, TransportError> {
        self.begin("fetch", path, Call::Fetch(path.to_string()))?;
        let state = self.state.lock().expect("state");
        let rows = Value::Array(state.rows.get(path).cloned().unwrap_or_default());
        if state.enveloped {
            Ok(json!({ "data": rows }))
        } else {
            Ok(rows)
        }
    }

    async fn create(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.begin("create", path, Call::Create(path.to_string(), body.clone()))?;
        let mut state = self.state.lock().expect("state");
        let id_field = Self::id_field(&state, path);
        let mut row = body.clone();
        if row.get(&id_field).map_or(true, Value::is_null) {
            state.next_id += 1;
            row[id_field.as_str()] = json!(state.next_id);
        }
        state.rows.entry(path.to_string()).or_default().push(row);
        Ok(())
    }

    async fn update(
        &self,
        path: &str,
        key: &RecordKey,
        body: &Value,
    ) -> Result<(), TransportError> {
        self.begin(
            "update",
            path,
            Call::Update(path.to_string(), key.clone(), body.clone()),
        )?;
        let mut state = self.state.lock().expect("state");
        let id_field = Self::id_field(&state, path);
        let row = state
            .rows
            .get_mut(path)
            .and_then(|rows| {
                rows.iter_mut().find(|row| {
                    row.get(&id_field).and_then(RecordKey::from_value).as_ref() == Some(key)
                })
            })
            .ok_or(TransportError::Status(404))?;
        if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
            for (field, value) in patch {
                target.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str, key: &RecordKey) -> Result<(), TransportError> {
        self.begin("remove", path, Call::Remove(path.to_string(), key.clone()))?;
        let mut state = self.state.lock().expect("state");
        let id_field = Self::id_field(&state, path);
        let rows = state.rows.entry(path.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| row.get(&id_field).and_then(RecordKey::from_value).as_ref() != Some(key));
        if rows.len() == before {
            return Err(TransportError::Status(404));
        }
        Ok(())
    }
}

/// Answers confirmations with a fixed reply and records everything shown.
pub struct RecordingInteraction {
    answer: bool,
    prompts: Mutex<Vec<String>>,
    notifications: Mutex<Vec<String>>,
}

impl RecordingInteraction {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts").clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().expect("notifications").clone()
    }
}

impl Interaction for RecordingInteraction {
    fn confirm(&self, message: &str) -> bool {
        self.prompts
            .lock()
            .expect("prompts")
            .push(message.to_string());
        self.answer
    }

    fn notify(&self, message: &str) {
        self.notifications
            .lock()
            .expect("notifications")
            .push(message.to_string());
    }
}

pub fn departments() -> Vec<Value> {
    vec![
        json!({ "id": 1, "departamento": "Managua" }),
        json!({ "id": 2, "departamento": "Masaya" }),
    ]
}

pub fn users() -> Vec<Value> {
    vec![
        json!({ "id": 3, "email": "ana@tienda.com", "rolId": 1 }),
        json!({ "id": 4, "email": "luis@tienda.com", "rolId": 2 }),
    ]
}

pub fn clients() -> Vec<Value> {
    vec![
        json!({ "id": 10, "nombres": "Ana", "apellidos": "Ruiz", "telefono": "88887777", "usuarioId": 3 }),
        json!({ "id": 11, "nombres": "Pedro", "apellidos": "López", "telefono": "55554444", "usuarioId": 7 }),
    ]
}
