//! Read-only lookups for semantic models and connectors, keyed by id/scope.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::model::SemanticModel;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no semantic model registered for scope: {0}")]
    ModelNotFound(String),

    #[error("no connector registered for id: {0}")]
    ConnectorNotFound(String),
}

#[async_trait]
pub trait SemanticModelStore: Send + Sync {
    /// Look up the model active for `organisation_id` (and, when present,
    /// a named model within that organisation's catalog).
    async fn get(&self, organisation_id: &str, model_name: Option<&str>) -> Result<SemanticModel, StoreError>;
}

#[async_trait]
pub trait ConnectorStore: Send + Sync {
    async fn get(&self, connector_id: &str) -> Result<ConnectionConfig, StoreError>;

    /// Connectors an organisation is permitted to query, for the data
    /// access policy enforced before dispatch.
    async fn allowed_for_organisation(&self, organisation_id: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySemanticModelStore {
    models: Mutex<HashMap<String, SemanticModel>>,
}

impl InMemorySemanticModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(self, scope: impl Into<String>, model: SemanticModel) -> Self {
        self.models.lock().expect("model store mutex poisoned").insert(scope.into(), model);
        self
    }
}

#[async_trait]
impl SemanticModelStore for InMemorySemanticModelStore {
    async fn get(&self, organisation_id: &str, model_name: Option<&str>) -> Result<SemanticModel, StoreError> {
        let scope = match model_name {
            Some(name) => format!("{organisation_id}:{name}"),
            None => organisation_id.to_string(),
        };
        let models = self.models.lock().expect("model store mutex poisoned");
        models
            .get(&scope)
            .cloned()
            .ok_or(StoreError::ModelNotFound(scope))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryConnectorStore {
    connectors: Mutex<HashMap<String, ConnectionConfig>>,
    allowlists: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryConnectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(self, id: impl Into<String>, config: ConnectionConfig) -> Self {
        self.connectors.lock().expect("connector store mutex poisoned").insert(id.into(), config);
        self
    }

    pub fn with_allowlist(self, organisation_id: impl Into<String>, connector_ids: Vec<String>) -> Self {
        self.allowlists
            .lock()
            .expect("connector store mutex poisoned")
            .insert(organisation_id.into(), connector_ids);
        self
    }
}

#[async_trait]
impl ConnectorStore for InMemoryConnectorStore {
    async fn get(&self, connector_id: &str) -> Result<ConnectionConfig, StoreError> {
        let connectors = self.connectors.lock().expect("connector store mutex poisoned");
        connectors
            .get(connector_id)
            .cloned()
            .ok_or_else(|| StoreError::ConnectorNotFound(connector_id.to_string()))
    }

    async fn allowed_for_organisation(&self, organisation_id: &str) -> Result<Vec<String>, StoreError> {
        let allowlists = self.allowlists.lock().expect("connector store mutex poisoned");
        Ok(allowlists.get(organisation_id).cloned().unwrap_or_default())
    }
}
