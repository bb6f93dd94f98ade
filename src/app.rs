//! Application assembly: store, modules and HTTP server wired from settings.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use shelf_db::{DocumentStore, MemoryStore};
use shelf_kernel::{settings::DatabaseEngine, InitCtx, ModuleRegistry, Settings};

use crate::context::AppContext;
use crate::modules;

pub struct App {
    settings: Settings,
    store: Arc<dyn DocumentStore>,
    registry: ModuleRegistry,
}

impl App {
    /// Open the configured store, register every module, define their
    /// collections and run module initialization
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = match settings.database.engine {
            DatabaseEngine::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::info!(engine = ?settings.database.engine, "document store ready");

        let ctx = AppContext::from_settings(&settings, Arc::clone(&store))
            .context("failed to build application context")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &ctx);

        registry
            .define_collections(&store)
            .await
            .context("failed to define collections")?;

        registry
            .init_modules(&InitCtx {
                settings: &settings,
                store: &store,
            })
            .await
            .context("failed to initialize modules")?;

        Ok(Self {
            settings,
            store,
            registry,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The fully layered HTTP router
    pub fn router(&self) -> Router {
        shelf_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve until shutdown, then stop modules
    pub async fn serve(self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
            store: &self.store,
        };
        self.registry
            .start_modules(&ctx)
            .await
            .context("failed to start modules")?;

        let served = shelf_http::start_server(&self.registry, &self.settings).await;

        self.registry
            .stop_modules()
            .await
            .context("failed to stop modules")?;
        served
    }
}
