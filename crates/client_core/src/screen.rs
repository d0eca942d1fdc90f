use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::{EntityDescriptor, FieldSpec, RecordKey},
    registry::EntityRegistry,
};

use crate::{
    controller::{RemoveOutcome, ResourceController},
    error::AdminError,
    interaction::Interaction,
    lookup::LookupSet,
    presenter::{render_catalog_records, CatalogView, ListPresenter, ListView},
    session::{FormInput, FormSession, SessionState},
    transport::CollectionTransport,
};

const CATALOG_ENTITY: &str = "productos";

/// Builds management screens for any registered entity.
pub struct ScreenBuilder {
    registry: EntityRegistry,
    transport: Arc<dyn CollectionTransport>,
    interaction: Arc<dyn Interaction>,
}

impl ScreenBuilder {
    pub fn new(
        registry: EntityRegistry,
        transport: Arc<dyn CollectionTransport>,
        interaction: Arc<dyn Interaction>,
    ) -> Self {
        Self {
            registry,
            transport,
            interaction,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn build(&self, entity: &str) -> Result<AdminScreen, AdminError> {
        let descriptor = self.descriptor(entity)?;

        let mut references = Vec::with_capacity(descriptor.references.len());
        for reference in descriptor.references {
            let target = self
                .registry
                .target_of(reference)
                .ok_or_else(|| AdminError::UnknownEntity(reference.target_entity.to_string()))?;
            references.push((reference, target));
        }

        Ok(AdminScreen {
            descriptor,
            controller: self.controller_for(descriptor),
            lookups: LookupSet::for_references(references, &self.transport, &self.interaction),
            session: FormSession::new(descriptor),
            presenter: ListPresenter::new(descriptor),
        })
    }

    pub fn catalog(&self) -> Result<CatalogScreen, AdminError> {
        let descriptor = self.descriptor(CATALOG_ENTITY)?;
        Ok(CatalogScreen {
            controller: self.controller_for(descriptor),
        })
    }

    fn descriptor(&self, entity: &str) -> Result<&'static EntityDescriptor, AdminError> {
        self.registry
            .get(entity)
            .ok_or_else(|| AdminError::UnknownEntity(entity.to_string()))
    }

    fn controller_for(&self, descriptor: &'static EntityDescriptor) -> ResourceController {
        ResourceController::new(
            descriptor,
            Arc::clone(&self.transport),
            Arc::clone(&self.interaction),
        )
    }
}

/// One entity's management screen: list, lookups and the modal form.
pub struct AdminScreen {
    descriptor: &'static EntityDescriptor,
    controller: ResourceController,
    lookups: LookupSet,
    session: FormSession,
    presenter: ListPresenter,
}

impl AdminScreen {
    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.descriptor
    }

    pub fn controller(&self) -> &ResourceController {
        &self.controller
    }

    pub fn lookups(&self) -> &LookupSet {
        &self.lookups
    }

    pub fn session(&self) -> &SessionState {
        self.session.state()
    }

    pub fn heading(&self) -> String {
        self.presenter.heading()
    }

    /// Loads the list and every lookup collection concurrently.
    pub async fn mount(&mut self) -> Result<(), AdminError> {
        let (primary, ()) = tokio::join!(self.controller.load(), self.lookups.load_all());
        self.session.retain_current(&self.controller);
        primary
    }

    pub async fn reload(&mut self) -> Result<(), AdminError> {
        let result = self.controller.load().await;
        self.session.retain_current(&self.controller);
        result
    }

    pub fn render(&self) -> ListView {
        self.presenter.render(&self.controller, &self.lookups)
    }

    pub fn resolve(&self, field: &str, value: &Value) -> String {
        self.lookups.resolve(field, value)
    }

    pub fn reference_options(&self, field: &str) -> Option<Vec<(RecordKey, String)>> {
        self.lookups.get(field).map(|resolver| resolver.options())
    }

    pub fn open_create(&mut self) {
        self.session.open_create();
    }

    pub fn open_edit(&mut self, key: &RecordKey) -> Result<(), AdminError> {
        self.session.open_edit(&self.controller, key)
    }

    pub fn open_view(&mut self, key: &RecordKey) -> Result<(), AdminError> {
        self.session.open_view(&self.controller, key)
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    pub fn form_title(&self) -> Option<String> {
        self.session.title()
    }

    pub fn form_fields(&self) -> Vec<&'static FieldSpec> {
        match self.session.state() {
            SessionState::Creating => self.descriptor.form_fields(true),
            SessionState::Editing(_) => self.descriptor.form_fields(false),
            SessionState::Idle | SessionState::Viewing(_) => Vec::new(),
        }
    }

    pub fn form_defaults(&self) -> FormInput {
        self.session.defaults()
    }

    pub async fn submit(&mut self, input: &FormInput) -> Result<(), AdminError> {
        self.session.submit(input, &mut self.controller).await
    }

    pub async fn delete(&mut self, key: &RecordKey) -> Result<RemoveOutcome, AdminError> {
        let outcome = self.controller.remove(key).await?;
        self.session.retain_current(&self.controller);
        Ok(outcome)
    }
}

/// Public product listing.
pub struct CatalogScreen {
    controller: ResourceController,
}

impl CatalogScreen {
    pub async fn load(&mut self) -> Result<(), AdminError> {
        self.controller.load().await
    }

    pub fn controller(&self) -> &ResourceController {
        &self.controller
    }

    pub fn render(&self) -> CatalogView {
        let descriptor = self.controller.descriptor();
        if self.controller.is_loading()
            || (!self.controller.has_loaded() && self.controller.error().is_none())
        {
            return CatalogView::Loading(descriptor.loading_message());
        }
        if let Some(error) = self.controller.error() {
            return CatalogView::Failed(error.to_string());
        }
        render_catalog_records(self.controller.records())
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
