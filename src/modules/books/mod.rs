pub mod handlers;
pub mod models;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use serde_json::json;
use shelf_db::CollectionSpec;
use shelf_kernel::{InitCtx, Module};

use crate::context::AppContext;
use service::BookService;

/// Book catalogue: create, list and fetch books
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/",
                get(handlers::list_books).post(handlers::create_book),
            )
            .route("/health", get(handlers::health_check))
            .route("/{id}", get(handlers::get_book))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": list_parameters(),
                        "responses": {
                            "200": { "description": "Page of books" },
                            "400": error_response("Unknown filter field")
                        }
                    },
                    "post": {
                        "summary": "Add a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Book added" },
                            "401": error_response("Missing identity"),
                            "422": error_response("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": { "description": "The book" },
                            "404": error_response("Book not found")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" },
                            "publicationYear": { "type": "integer" },
                            "description": { "type": "string" },
                            "ownerId": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "genre", "ownerId", "createdAt"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" },
                            "publicationYear": { "type": "integer" },
                            "description": { "type": "string" }
                        },
                        "required": ["title", "author", "genre"]
                    }
                }
            }
        }))
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(service::COLLECTION)]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Query parameters shared by list endpoints
pub(crate) fn list_parameters() -> serde_json::Value {
    let query = |name: &str, kind: &str| {
        json!({ "name": name, "in": "query", "required": false, "schema": { "type": kind } })
    };
    json!([
        query("page", "integer"),
        query("limit", "integer"),
        query("sortBy", "string"),
        query("sortOrder", "string"),
        query("searchTerm", "string")
    ])
}

pub(crate) fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

/// Create the books module over the shared context
pub fn create_module(ctx: &AppContext) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(BookService::new(ctx.clone())))
}
