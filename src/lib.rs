pub mod core;
pub mod firestore;

pub use yup_oauth2;

use crate::core::middleware::AuthMiddleware;
use crate::firestore::blocking::BlockingFirestoreResource;
use crate::firestore::config::FirestoreConfig;
use crate::firestore::paginator::PaginationOptions;
use crate::firestore::transport::{FirestoreApiClient, Transport};
use crate::firestore::{FirestoreError, FirestoreResource};
use std::sync::Arc;
use yup_oauth2::ServiceAccountKey;

/// Owns the configuration and the shared transport, and hands out document
/// façades bound to them.
pub struct FirestoreApp {
    config: FirestoreConfig,
    transport: Arc<dyn Transport>,
}

impl FirestoreApp {
    /// Creates an app for the project named in `service_account_key`.
    pub fn new(service_account_key: ServiceAccountKey) -> Result<Self, FirestoreError> {
        let config = FirestoreConfig::from_key(&service_account_key)?;
        Self::with_config(service_account_key, config)
    }

    /// Creates an app that signs with `service_account_key` and otherwise follows `config`.
    pub fn with_config(
        service_account_key: ServiceAccountKey,
        config: FirestoreConfig,
    ) -> Result<Self, FirestoreError> {
        let transport = FirestoreApiClient::new(AuthMiddleware::new(service_account_key), &config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates an app around any transport, e.g. an unsigned client for the emulator.
    pub fn with_transport(config: FirestoreConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    pub fn firestore(&self) -> FirestoreResource {
        FirestoreResource::new(self.transport.clone(), PaginationOptions::from(&self.config))
    }

    /// A direct-call façade running on its own current-thread runtime.
    pub fn blocking(&self) -> Result<BlockingFirestoreResource, FirestoreError> {
        BlockingFirestoreResource::new(self.firestore())
    }
}
