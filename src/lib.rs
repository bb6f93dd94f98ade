//! Shelf application library
//!
//! Book catalogue, wishlists and readlists built as kernel modules on top of
//! the shelf HTTP and document-store crates.

pub mod app;
pub mod context;
pub mod modules;
pub mod utils;

pub use app::App;
pub use context::AppContext;
