pub mod books;
pub mod users;

use shelf_kernel::ModuleRegistry;

use crate::context::AppContext;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, ctx: &AppContext) {
    registry.register(books::create_module(ctx));
    registry.register(users::create_module(ctx));
}
