use std::{collections::HashMap, sync::Arc};

use futures::future::join_all;
use serde_json::Value;
use shared::domain::{display_value, EntityDescriptor, ForeignKeyRef, RecordKey};
use tracing::warn;

use crate::{
    controller::ResourceController, interaction::Interaction, transport::CollectionTransport,
};

/// Resolves one foreign-key field to a label from an independently loaded collection.
pub struct LookupResolver {
    reference: ForeignKeyRef,
    controller: ResourceController,
    labels: HashMap<RecordKey, String>,
}

impl LookupResolver {
    pub fn new(reference: ForeignKeyRef, controller: ResourceController) -> Self {
        Self {
            reference,
            controller,
            labels: HashMap::new(),
        }
    }

    pub fn reference(&self) -> &ForeignKeyRef {
        &self.reference
    }

    pub fn controller(&self) -> &ResourceController {
        &self.controller
    }

    /// Failures are logged and leave the previous index in place.
    pub async fn load(&mut self) {
        if let Err(err) = self.controller.load().await {
            warn!(
                field = self.reference.local_field,
                target = self.reference.target_entity,
                error = %err,
                "lookup collection unavailable; showing raw values"
            );
            return;
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        let mut labels = HashMap::with_capacity(self.controller.records().len());
        for record in self.controller.records() {
            if let Some(key) = record.key(self.reference.target_id_field) {
                labels
                    .entry(key)
                    .or_insert_with(|| record.display(self.reference.target_label_field));
            }
        }
        self.labels = labels;
    }

    /// Label of the matching target record, or the raw value when there is none.
    pub fn resolve(&self, value: &Value) -> String {
        RecordKey::from_value(value)
            .and_then(|key| self.labels.get(&key).cloned())
            .unwrap_or_else(|| display_value(value))
    }

    /// Choices for a select input, in collection order.
    pub fn options(&self) -> Vec<(RecordKey, String)> {
        self.controller
            .records()
            .iter()
            .filter_map(|record| {
                record.key(self.reference.target_id_field).map(|key| {
                    (key, record.display(self.reference.target_label_field))
                })
            })
            .collect()
    }
}

/// Every lookup of one screen, keyed by the local field name.
#[derive(Default)]
pub struct LookupSet {
    resolvers: Vec<LookupResolver>,
}

impl LookupSet {
    pub fn new(resolvers: Vec<LookupResolver>) -> Self {
        Self { resolvers }
    }

    /// One resolver per reference, each with its own controller for the target entity.
    pub fn for_references<'a>(
        references: impl IntoIterator<Item = (&'a ForeignKeyRef, &'static EntityDescriptor)>,
        transport: &Arc<dyn CollectionTransport>,
        interaction: &Arc<dyn Interaction>,
    ) -> Self {
        let resolvers = references
            .into_iter()
            .map(|(reference, target)| {
                LookupResolver::new(
                    *reference,
                    ResourceController::new(target, Arc::clone(transport), Arc::clone(interaction)),
                )
            })
            .collect();
        Self { resolvers }
    }

    pub async fn load_all(&mut self) {
        join_all(self.resolvers.iter_mut().map(|resolver| resolver.load())).await;
    }

    pub fn get(&self, local_field: &str) -> Option<&LookupResolver> {
        self.resolvers
            .iter()
            .find(|resolver| resolver.reference.local_field == local_field)
    }

    /// Raw display when the field has no lookup.
    pub fn resolve(&self, local_field: &str, value: &Value) -> String {
        match self.get(local_field) {
            Some(resolver) => resolver.resolve(value),
            None => display_value(value),
        }
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
