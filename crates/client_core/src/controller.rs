use std::sync::Arc;

use shared::domain::{CollectionSnapshot, EntityDescriptor, Record, RecordKey};
use tracing::{debug, info, warn};

use crate::{
    envelope::decode_collection,
    error::{AdminError, TransportError},
    interaction::Interaction,
    transport::CollectionTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
}

/// Owns the in-memory snapshot of one entity's REST collection.
pub struct ResourceController {
    descriptor: &'static EntityDescriptor,
    transport: Arc<dyn CollectionTransport>,
    interaction: Arc<dyn Interaction>,
    snapshot: CollectionSnapshot,
    error: Option<String>,
    loading: bool,
    loaded: bool,
}

impl ResourceController {
    pub fn new(
        descriptor: &'static EntityDescriptor,
        transport: Arc<dyn CollectionTransport>,
        interaction: Arc<dyn Interaction>,
    ) -> Self {
        Self {
            descriptor,
            transport,
            interaction,
            snapshot: CollectionSnapshot::default(),
            error: None,
            loading: false,
            loaded: false,
        }
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn snapshot(&self) -> &CollectionSnapshot {
        &self.snapshot
    }

    pub fn records(&self) -> &[Record] {
        &self.snapshot.records
    }

    pub fn find(&self, key: &RecordKey) -> Option<&Record> {
        self.snapshot.find(self.descriptor.id_field, key)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_stale(&self) -> bool {
        self.snapshot.stale
    }

    /// True once any load has completed successfully.
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// Replaces the snapshot on success; keeps it and records a message on failure.
    pub async fn load(&mut self) -> Result<(), AdminError> {
        let entity = self.descriptor.name;
        self.loading = true;
        debug!(entity, "loading collection");

        let result = self
            .transport
            .fetch(self.descriptor.resource_path)
            .await
            .and_then(decode_collection);
        self.loading = false;

        match result {
            Ok(records) => {
                info!(entity, count = records.len(), "collection loaded");
                self.snapshot = CollectionSnapshot::loaded(records);
                self.error = None;
                self.loaded = true;
                Ok(())
            }
            Err(source) => {
                let message = self.descriptor.load_failure_message();
                warn!(entity, error = %source, "collection load failed");
                self.error = Some(message.clone());
                Err(AdminError::Load { message, source })
            }
        }
    }

    pub async fn create(&mut self, payload: &Record) -> Result<(), AdminError> {
        let body = payload.clone().into_value();
        let result = self
            .transport
            .create(self.descriptor.resource_path, &body)
            .await;
        match result {
            Ok(()) => {
                info!(entity = self.descriptor.name, "record created");
                self.resync().await;
                Ok(())
            }
            Err(source) => Err(self.write_failure(self.descriptor.save_failure_message(), source)),
        }
    }

    pub async fn update(&mut self, key: &RecordKey, payload: &Record) -> Result<(), AdminError> {
        let body = payload.clone().into_value();
        let result = self
            .transport
            .update(self.descriptor.resource_path, key, &body)
            .await;
        match result {
            Ok(()) => {
                info!(entity = self.descriptor.name, %key, "record updated");
                self.resync().await;
                Ok(())
            }
            Err(source) => Err(self.write_failure(self.descriptor.save_failure_message(), source)),
        }
    }

    /// Asks for confirmation before issuing the delete.
    pub async fn remove(&mut self, key: &RecordKey) -> Result<RemoveOutcome, AdminError> {
        let prompt = match self.find(key) {
            Some(record) => self.descriptor.delete_prompt_for(record),
            None => {
                return Err(AdminError::UnknownRecord {
                    entity: self.descriptor.name.to_string(),
                    key: key.clone(),
                })
            }
        };

        if !self.interaction.confirm(&prompt) {
            debug!(entity = self.descriptor.name, %key, "delete cancelled");
            return Ok(RemoveOutcome::Cancelled);
        }

        let result = self
            .transport
            .remove(self.descriptor.resource_path, key)
            .await;
        match result {
            Ok(()) => {
                info!(entity = self.descriptor.name, %key, "record deleted");
                self.resync().await;
                Ok(RemoveOutcome::Removed)
            }
            Err(source) => Err(self.write_failure(
                self.descriptor.delete_failure_message(),
                source,
            )),
        }
    }

    // The write already succeeded; a failed reload only surfaces as the inline load error.
    async fn resync(&mut self) {
        self.snapshot.stale = true;
        if let Err(err) = self.load().await {
            debug!(entity = self.descriptor.name, error = %err, "reload after write failed");
        }
    }

    fn write_failure(&self, message: String, source: TransportError) -> AdminError {
        warn!(entity = self.descriptor.name, error = %source, "write failed");
        self.interaction.notify(&message);
        AdminError::Write { message, source }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
