//! PostgreSQL-backed book repository.
//!
//! Every read selects the same projection. Explicit casts and `COALESCE`
//! defaults keep decoding stable whether the pre-existing `books` table uses
//! `numeric` or `double precision`, `timestamp` or `timestamptz`.

use async_trait::async_trait;
use catalog_db::{Database, DbError};
use catalog_kernel::settings::RowDecodePolicy;

use super::models::{Book, BookPayload};
use super::repository::{
    BookRepository, BookRepositoryError, RepositoryResult, FEATURED_MIN_RATING,
};

macro_rules! book_columns {
    () => {
        "id::int8 AS id, title, author, isbn, year::int4 AS year, price::float8 AS price, \
         category, original_price::float8 AS original_price, \
         COALESCE(discount, 0)::int4 AS discount, cover_image, \
         COALESCE(rating, 0)::float8 AS rating, \
         COALESCE(reviews_count, 0)::int4 AS reviews_count, \
         COALESCE(is_new, false) AS is_new, pages::int4 AS pages, \
         language, publisher, description, \
         created_at::timestamptz AS created_at, updated_at::timestamptz AS updated_at"
    };
}

const LIST_SQL: &str = concat!("SELECT ", book_columns!(), " FROM books ORDER BY id");

const GET_SQL: &str = concat!("SELECT ", book_columns!(), " FROM books WHERE id = $1");

const INSERT_SQL: &str = concat!(
    "INSERT INTO books (title, author, isbn, year, price, category, original_price, \
     discount, cover_image, rating, reviews_count, is_new, pages, language, publisher, \
     description, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW(), NOW()) \
     RETURNING ",
    book_columns!()
);

// updated_at must move strictly forward even if the clock has not.
const UPDATE_SQL: &str = concat!(
    "UPDATE books SET title = $1, author = $2, isbn = $3, year = $4, price = $5, \
     category = COALESCE($6, category), \
     original_price = COALESCE($7, original_price), \
     discount = COALESCE($8, discount), \
     cover_image = COALESCE($9, cover_image), \
     rating = COALESCE($10, rating), \
     reviews_count = COALESCE($11, reviews_count), \
     is_new = COALESCE($12, is_new), \
     pages = COALESCE($13, pages), \
     language = COALESCE($14, language), \
     publisher = COALESCE($15, publisher), \
     description = COALESCE($16, description), \
     updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond') \
     WHERE id = $17 RETURNING ",
    book_columns!()
);

const DELETE_SQL: &str = "DELETE FROM books WHERE id = $1";

const SEARCH_SQL: &str = concat!(
    "SELECT ",
    book_columns!(),
    r" FROM books WHERE title ILIKE $1 ESCAPE '\' OR author ILIKE $1 ESCAPE '\' ORDER BY id"
);

const CATEGORIES_SQL: &str = "SELECT DISTINCT category FROM books \
     WHERE category IS NOT NULL AND category <> '' ORDER BY category";

const FEATURED_SQL: &str = concat!(
    "SELECT ",
    book_columns!(),
    " FROM books WHERE rating >= $1 ORDER BY rating DESC, id LIMIT $2"
);

const NEWEST_SQL: &str = concat!(
    "SELECT ",
    book_columns!(),
    " FROM books WHERE is_new = true ORDER BY created_at DESC, id DESC LIMIT $1"
);

const DISCOUNTED_SQL: &str = concat!(
    "SELECT ",
    book_columns!(),
    " FROM books WHERE discount > 0 ORDER BY discount DESC, id LIMIT $1"
);

/// Book repository over the storage gateway.
pub struct PgBookRepository {
    database: Database,
    decode_policy: RowDecodePolicy,
}

impl PgBookRepository {
    pub fn new(database: Database, decode_policy: RowDecodePolicy) -> Self {
        Self {
            database,
            decode_policy,
        }
    }
}

/// Turn a missing row into a not-found for `id`.
fn not_found_as(id: i64) -> impl FnOnce(DbError) -> BookRepositoryError {
    move |err| match err {
        DbError::NotFound => BookRepositoryError::NotFound(id),
        other => BookRepositoryError::Storage(other),
    }
}

/// Build an `ILIKE` pattern matching `keyword` literally anywhere.
pub(crate) fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let books = self
            .database
            .fetch_all(sqlx::query(LIST_SQL), self.decode_policy)
            .await?;
        Ok(books)
    }

    async fn get(&self, id: i64) -> RepositoryResult<Book> {
        self.database
            .fetch_one(sqlx::query(GET_SQL).bind(id))
            .await
            .map_err(not_found_as(id))
    }

    async fn create(&self, payload: &BookPayload) -> RepositoryResult<Book> {
        let statement = sqlx::query(INSERT_SQL)
            .bind(&payload.title)
            .bind(&payload.author)
            .bind(&payload.isbn)
            .bind(payload.year)
            .bind(payload.price)
            .bind(&payload.category)
            .bind(payload.original_price)
            .bind(payload.discount_or_default())
            .bind(&payload.cover_image)
            .bind(payload.rating_or_default())
            .bind(payload.reviews_count_or_default())
            .bind(payload.is_new_or_default())
            .bind(payload.pages)
            .bind(&payload.language)
            .bind(&payload.publisher)
            .bind(&payload.description);

        let book: Book = self.database.fetch_one(statement).await?;
        tracing::info!(book_id = book.id, "book created");
        Ok(book)
    }

    async fn update(&self, id: i64, payload: &BookPayload) -> RepositoryResult<Book> {
        let statement = sqlx::query(UPDATE_SQL)
            .bind(&payload.title)
            .bind(&payload.author)
            .bind(&payload.isbn)
            .bind(payload.year)
            .bind(payload.price)
            .bind(&payload.category)
            .bind(payload.original_price)
            .bind(payload.discount)
            .bind(&payload.cover_image)
            .bind(payload.rating)
            .bind(payload.reviews_count)
            .bind(payload.is_new)
            .bind(payload.pages)
            .bind(&payload.language)
            .bind(&payload.publisher)
            .bind(&payload.description)
            .bind(id);

        let book: Book = self
            .database
            .fetch_one(statement)
            .await
            .map_err(not_found_as(id))?;
        tracing::info!(book_id = book.id, "book updated");
        Ok(book)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let affected = self
            .database
            .execute(sqlx::query(DELETE_SQL).bind(id))
            .await?;

        if affected == 0 {
            return Err(BookRepositoryError::NotFound(id));
        }
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }

    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Book>> {
        let statement = sqlx::query(SEARCH_SQL).bind(contains_pattern(keyword));
        Ok(self
            .database
            .fetch_all(statement, self.decode_policy)
            .await?)
    }

    async fn categories(&self) -> RepositoryResult<Vec<String>> {
        let rows: Vec<(String,)> = self
            .database
            .fetch_all(sqlx::query(CATEGORIES_SQL), self.decode_policy)
            .await?;
        Ok(rows.into_iter().map(|(category,)| category).collect())
    }

    async fn featured(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let statement = sqlx::query(FEATURED_SQL)
            .bind(FEATURED_MIN_RATING)
            .bind(limit);
        Ok(self
            .database
            .fetch_all(statement, self.decode_policy)
            .await?)
    }

    async fn newest(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let statement = sqlx::query(NEWEST_SQL).bind(limit);
        Ok(self
            .database
            .fetch_all(statement, self.decode_policy)
            .await?)
    }

    async fn discounted(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let statement = sqlx::query(DISCOUNTED_SQL).bind(limit);
        Ok(self
            .database
            .fetch_all(statement, self.decode_policy)
            .await?)
    }
}
