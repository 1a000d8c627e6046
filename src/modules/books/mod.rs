pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

mod openapi;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use catalog_kernel::{InitCtx, Module};

use handlers::BooksState;
use repository::{BookRepository, ViewLimits};

/// Book catalog: CRUD plus the search, category, featured, new and
/// discounted views.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>, limits: ViewLimits) -> Self {
        Self {
            state: BooksState { repository, limits },
        }
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
            featured_limit = self.state.limits.featured,
            new_limit = self.state.limits.newest,
            discounted_limit = self.state.limits.discounted,
            row_decode_policy = ?ctx.settings.catalog.row_decode_policy,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/books",
                get(handlers::list_books).post(handlers::create_book),
            )
            .route("/books/search", get(handlers::search_books))
            .route("/books/featured", get(handlers::featured_books))
            .route("/books/new", get(handlers::new_books))
            .route("/books/discounted", get(handlers::discounted_books))
            .route(
                "/books/{id}",
                get(handlers::get_book)
                    .put(handlers::update_book)
                    .delete(handlers::delete_book),
            )
            .route("/categories", get(handlers::list_categories))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over `repository`
pub fn create_module(repository: Arc<dyn BookRepository>, limits: ViewLimits) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository, limits))
}
