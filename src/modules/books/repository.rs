use async_trait::async_trait;
use catalog_db::DbError;
use catalog_http::error::AppError;
use catalog_kernel::settings::CatalogSettings;
use thiserror::Error;

use super::models::{Book, BookPayload};

/// Lowest rating that qualifies a book for the featured view.
pub const FEATURED_MIN_RATING: f64 = 4.5;

#[derive(Debug, Error)]
pub enum BookRepositoryError {
    #[error("book {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Storage(#[from] DbError),
}

pub type RepositoryResult<T> = Result<T, BookRepositoryError>;

impl From<BookRepositoryError> for AppError {
    fn from(err: BookRepositoryError) -> Self {
        match err {
            BookRepositoryError::NotFound(_) | BookRepositoryError::Storage(DbError::NotFound) => {
                AppError::not_found("book not found")
            }
            BookRepositoryError::Storage(err) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

/// Maximum entries returned by each derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLimits {
    pub featured: i64,
    pub newest: i64,
    pub discounted: i64,
}

impl From<&CatalogSettings> for ViewLimits {
    fn from(settings: &CatalogSettings) -> Self {
        Self {
            featured: settings.featured_limit.max(0),
            newest: settings.new_limit.max(0),
            discounted: settings.discounted_limit.max(0),
        }
    }
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self::from(&CatalogSettings::default())
    }
}

/// Persistence operations behind the book handlers.
///
/// Update replaces title, author, isbn, year and price unconditionally;
/// optional fields are replaced when present in the payload and retained
/// otherwise. Every successful update moves `updated_at` strictly forward.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Every book, ordered by id
    async fn list(&self) -> RepositoryResult<Vec<Book>>;

    async fn get(&self, id: i64) -> RepositoryResult<Book>;

    /// Insert a new book; `created_at == updated_at` on the result
    async fn create(&self, payload: &BookPayload) -> RepositoryResult<Book>;

    async fn update(&self, id: i64, payload: &BookPayload) -> RepositoryResult<Book>;

    /// Physically remove a book
    async fn delete(&self, id: i64) -> RepositoryResult<()>;

    /// Case-insensitive substring match on title or author
    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Book>>;

    /// Distinct non-empty categories, sorted
    async fn categories(&self) -> RepositoryResult<Vec<String>>;

    /// Rating at least [`FEATURED_MIN_RATING`], highest first
    async fn featured(&self, limit: i64) -> RepositoryResult<Vec<Book>>;

    /// Flagged `is_new`, most recently created first
    async fn newest(&self, limit: i64) -> RepositoryResult<Vec<Book>>;

    /// Discount above zero, largest first
    async fn discounted(&self, limit: i64) -> RepositoryResult<Vec<Book>>;
}
