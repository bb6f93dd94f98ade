use std::sync::Arc;

use shelf_db::{
    query::{FilterBuilder, PaginationDefaults},
    DocumentStore,
};
use shelf_kernel::Settings;

use crate::utils::password::PasswordHasher;

/// Shared handles and configuration passed to every service at construction
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn DocumentStore>,
    pub pagination: PaginationDefaults,
    pub filters: FilterBuilder,
    pub hasher: PasswordHasher,
}

impl AppContext {
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            pagination: PaginationDefaults {
                default_limit: settings.pagination.default_limit,
                max_limit: settings.pagination.max_limit,
            },
            filters: FilterBuilder::new(settings.query.filter_mode),
            hasher: PasswordHasher::new(settings.auth.password_hash_cost)?,
        })
    }
}
