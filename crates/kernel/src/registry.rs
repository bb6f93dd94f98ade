use anyhow::Context;
use std::sync::Arc;

use shelf_db::{CollectionSpec, DocumentStore};

use crate::module::{InitCtx, Module};

/// Module registry driving the lifecycle of every registered module
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Get the number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Collect all collection specs from all modules
    pub fn collect_collections(&self) -> Vec<(String, CollectionSpec)> {
        let mut collections = Vec::new();

        for module in &self.modules {
            for collection in module.collections() {
                collections.push((module.name().to_string(), collection));
            }
        }

        // Sort by module name and collection name for deterministic ordering
        collections.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.name.cmp(b.1.name)));

        collections
    }

    /// Define every module collection (and its unique indexes) on the store
    pub async fn define_collections(&self, store: &Arc<dyn DocumentStore>) -> anyhow::Result<()> {
        for (module_name, collection) in self.collect_collections() {
            tracing::info!(
                module = %module_name,
                collection = collection.name,
                "defining collection"
            );

            store.define_collection(collection.clone()).await.with_context(|| {
                format!(
                    "failed to define collection '{}' for module '{}'",
                    collection.name, module_name
                )
            })?;
        }

        Ok(())
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use shelf_db::MemoryStore;

    struct TestModule {
        name: &'static str,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn collections(&self) -> Vec<CollectionSpec> {
            vec![CollectionSpec::new("things").unique("slug")]
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_collections().is_empty());
    }

    #[test]
    fn test_get_module_by_name() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule { name: "alpha" }));
        registry.register(Arc::new(TestModule { name: "beta" }));

        assert_eq!(registry.module_count(), 2);
        assert!(registry.get_module("beta").is_some());
        assert!(registry.get_module("gamma").is_none());
    }

    #[test]
    fn test_collections_sorted_by_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(TestModule { name: "zeta" }));
        registry.register(Arc::new(TestModule { name: "alpha" }));

        let collections = registry.collect_collections();
        let owners: Vec<&str> = collections.iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(owners, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        registry.register(Arc::new(TestModule { name: "test" }));

        registry.define_collections(&store).await.unwrap();
        registry.init_modules(&ctx).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();
    }
}
