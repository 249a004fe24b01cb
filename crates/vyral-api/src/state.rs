//! Application state.

use std::sync::Arc;

use vyral_orchestrator::Orchestrator;

use crate::catalog::OperationCatalog;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Orchestrator,
    pub catalog: Arc<OperationCatalog>,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: Orchestrator, catalog: OperationCatalog) -> Self {
        Self {
            config,
            orchestrator,
            catalog: Arc::new(catalog),
        }
    }
}
