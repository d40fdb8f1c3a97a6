use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handler;
pub mod id;
pub mod logger;
pub mod modules;
pub mod services;
pub mod validation;

use crate::logger::Logger;
use crate::services::extraction::PersonaExtractor;
use crate::services::storage::BlobStore;

/// Dependency context constructed once at process start. Collaborator clients
/// are immutable handles, cloned cheaply into each handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn PersonaExtractor>,
    pub logger: Logger,
}
