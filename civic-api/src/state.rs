//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use civic_storage::ComplaintRepository;

use crate::config::ApiConfig;
use crate::notifications::NotificationDispatcher;
use crate::services::{CategoryService, ComplaintService, ServiceClock};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub complaints: ComplaintService,
    pub categories: CategoryService,
    /// Used for readiness checks.
    pub repo: Arc<dyn ComplaintRepository>,
    pub api_config: Arc<ApiConfig>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn ComplaintRepository>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn ServiceClock>,
        api_config: ApiConfig,
    ) -> Self {
        Self {
            complaints: ComplaintService::new(repo.clone(), dispatcher, clock.clone()),
            categories: CategoryService::new(repo.clone(), clock),
            repo,
            api_config: Arc::new(api_config),
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(ComplaintService, complaints);
crate::impl_from_ref!(CategoryService, categories);
crate::impl_from_ref!(Arc<dyn ComplaintRepository>, repo);
crate::impl_from_ref!(Arc<ApiConfig>, api_config);
crate::impl_from_ref!(Instant, start_time);
