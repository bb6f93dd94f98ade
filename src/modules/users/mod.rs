pub mod handlers;
pub mod models;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::json;
use shelf_db::CollectionSpec;
use shelf_kernel::{InitCtx, Module};

use crate::context::AppContext;
use crate::modules::books::{error_response, list_parameters, service::BookService};
use service::UserService;

/// Accounts, wishlists and readlists
pub struct UsersModule {
    service: UserService,
}

impl UsersModule {
    pub fn new(service: UserService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            hash_cost = ctx.settings.auth.password_hash_cost,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_users).post(handlers::create_user))
            .route("/health", get(handlers::health_check))
            .route("/me", get(handlers::get_profile))
            .route("/me/wishlist", post(handlers::add_to_wishlist))
            .route("/me/wishlist/{book_id}", delete(handlers::remove_from_wishlist))
            .route("/me/readlist", post(handlers::add_to_readlist))
            .route("/me/readlist/finished", patch(handlers::mark_finished))
            .route(
                "/{id}",
                get(handlers::get_user)
                    .patch(handlers::update_user)
                    .delete(handlers::delete_user),
            )
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let identity = json!([
            {
                "name": "x-user-id",
                "in": "header",
                "required": true,
                "schema": { "type": "string" }
            },
            {
                "name": "x-user-role",
                "in": "header",
                "required": false,
                "schema": { "type": "string", "enum": ["user", "admin"] }
            }
        ]);
        let with_identity = |extra: serde_json::Value| {
            let mut params = identity.as_array().cloned().unwrap_or_default();
            if let Some(extra) = extra.as_array() {
                params.extend(extra.iter().cloned());
            }
            serde_json::Value::Array(params)
        };
        let id_param = |name: &str| {
            json!([{
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            }])
        };
        let body = |schema: &str| {
            let reference = format!("#/components/schemas/{}", schema);
            json!({
                "required": true,
                "content": { "application/json": { "schema": { "$ref": reference } } }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List users (admin)",
                        "tags": ["Users"],
                        "parameters": with_identity(list_parameters()),
                        "responses": {
                            "200": { "description": "Page of users" },
                            "400": error_response("Unknown filter field"),
                            "403": error_response("Admin role required")
                        }
                    },
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": body("CreateUser"),
                        "responses": {
                            "201": { "description": "User registered" },
                            "409": error_response("Email already registered"),
                            "422": error_response("Validation error")
                        }
                    }
                },
                "/me": {
                    "get": {
                        "summary": "Current user's profile with wishlist and readlist resolved",
                        "tags": ["Users"],
                        "parameters": with_identity(json!([])),
                        "responses": {
                            "200": { "description": "Profile" },
                            "404": error_response("User not found")
                        }
                    }
                },
                "/me/wishlist": {
                    "post": {
                        "summary": "Add a book to the wishlist",
                        "tags": ["Wishlist"],
                        "parameters": with_identity(json!([])),
                        "requestBody": body("BookRef"),
                        "responses": {
                            "200": { "description": "Updated profile" },
                            "404": error_response("User or book not found"),
                            "409": error_response("Book already in wishlist")
                        }
                    }
                },
                "/me/wishlist/{book_id}": {
                    "delete": {
                        "summary": "Remove a book from the wishlist",
                        "tags": ["Wishlist"],
                        "parameters": with_identity(id_param("book_id")),
                        "responses": {
                            "200": { "description": "Updated profile" },
                            "409": error_response("Book already removed from wishlist")
                        }
                    }
                },
                "/me/readlist": {
                    "post": {
                        "summary": "Start tracking a book",
                        "tags": ["Readlist"],
                        "parameters": with_identity(json!([])),
                        "requestBody": body("ReadlistRequest"),
                        "responses": {
                            "200": { "description": "Updated profile" },
                            "409": error_response("Book already in readlist")
                        }
                    }
                },
                "/me/readlist/finished": {
                    "patch": {
                        "summary": "Mark a tracked book finished",
                        "tags": ["Readlist"],
                        "parameters": with_identity(json!([])),
                        "requestBody": body("ReadlistRequest"),
                        "responses": {
                            "200": { "description": "Updated profile" },
                            "404": error_response("Book not in readlist")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a user (self or admin)",
                        "tags": ["Users"],
                        "parameters": with_identity(id_param("id")),
                        "responses": {
                            "200": { "description": "User" },
                            "403": error_response("Forbidden"),
                            "404": error_response("User not found")
                        }
                    },
                    "patch": {
                        "summary": "Update a user (self or admin)",
                        "tags": ["Users"],
                        "parameters": with_identity(id_param("id")),
                        "requestBody": body("UpdateUser"),
                        "responses": {
                            "200": { "description": "Updated user" },
                            "404": error_response("User not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a user (self or admin)",
                        "tags": ["Users"],
                        "parameters": with_identity(id_param("id")),
                        "responses": {
                            "200": { "description": "Deleted user" },
                            "404": error_response("User not found")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Users health check",
                        "tags": ["Users"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "role": { "type": "string", "enum": ["user", "admin"] },
                            "bio": { "type": "string" },
                            "wishlist": { "type": "array", "items": { "type": "string" } },
                            "readlist": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/ReadlistEntry" }
                            },
                            "createdAt": { "type": "string", "format": "date-time" }
                        },
                        "required": [
                            "id", "name", "email", "role", "wishlist", "readlist", "createdAt"
                        ]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "password": { "type": "string" },
                            "bio": { "type": "string" }
                        },
                        "required": ["name", "email", "password"]
                    },
                    "UpdateUser": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "email": { "type": "string" },
                            "password": { "type": "string" },
                            "bio": { "type": "string" }
                        }
                    },
                    "BookRef": {
                        "type": "object",
                        "properties": { "bookId": { "type": "string" } },
                        "required": ["bookId"]
                    },
                    "ReadlistEntry": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string" },
                            "status": { "type": "string", "enum": ["reading", "finished"] },
                            "progress": { "type": "integer", "minimum": 0, "maximum": 100 },
                            "note": { "type": "string" }
                        },
                        "required": ["bookId"]
                    },
                    "ReadlistRequest": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string" },
                            "progress": { "type": "integer", "minimum": 0, "maximum": 100 },
                            "note": { "type": "string" }
                        },
                        "required": ["bookId"]
                    }
                }
            }
        }))
    }

    fn collections(&self) -> Vec<CollectionSpec> {
        vec![CollectionSpec::new(service::COLLECTION).unique("email")]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create the users module over the shared context
pub fn create_module(ctx: &AppContext) -> Arc<dyn Module> {
    let books = BookService::new(ctx.clone());
    Arc::new(UsersModule::new(UserService::new(ctx.clone(), books)))
}
