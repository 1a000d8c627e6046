//! In-process book repository backing the router tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::models::{Book, BookPayload};
use super::repository::{
    BookRepository, BookRepositoryError, RepositoryResult, FEATURED_MIN_RATING,
};

#[derive(Default)]
struct Shelf {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

#[derive(Default)]
pub struct InMemoryBookRepository {
    shelf: RwLock<Shelf>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn view<F, C>(books: &BTreeMap<i64, Book>, keep: F, order: C, limit: i64) -> Vec<Book>
where
    F: Fn(&Book) -> bool,
    C: Fn(&Book, &Book) -> Ordering,
{
    let mut selected: Vec<Book> = books.values().filter(|b| keep(b)).cloned().collect();
    selected.sort_by(|a, b| order(a, b));
    selected.truncate(usize::try_from(limit).unwrap_or(0));
    selected
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(shelf.books.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> RepositoryResult<Book> {
        let shelf = self.shelf.read().await;
        shelf
            .books
            .get(&id)
            .cloned()
            .ok_or(BookRepositoryError::NotFound(id))
    }

    async fn create(&self, payload: &BookPayload) -> RepositoryResult<Book> {
        let mut shelf = self.shelf.write().await;
        shelf.last_id += 1;
        let now = OffsetDateTime::now_utc();

        let book = Book {
            id: shelf.last_id,
            title: payload.title.clone(),
            author: payload.author.clone(),
            isbn: payload.isbn.clone(),
            year: payload.year,
            price: payload.price,
            category: payload.category.clone(),
            original_price: payload.original_price,
            discount: payload.discount_or_default(),
            cover_image: payload.cover_image.clone(),
            rating: payload.rating_or_default(),
            reviews_count: payload.reviews_count_or_default(),
            is_new: payload.is_new_or_default(),
            pages: payload.pages,
            language: payload.language.clone(),
            publisher: payload.publisher.clone(),
            description: payload.description.clone(),
            created_at: now,
            updated_at: now,
        };

        shelf.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i64, payload: &BookPayload) -> RepositoryResult<Book> {
        let mut shelf = self.shelf.write().await;
        let book = shelf
            .books
            .get_mut(&id)
            .ok_or(BookRepositoryError::NotFound(id))?;

        book.title = payload.title.clone();
        book.author = payload.author.clone();
        book.isbn = payload.isbn.clone();
        book.year = payload.year;
        book.price = payload.price;

        if let Some(category) = &payload.category {
            book.category = Some(category.clone());
        }
        if let Some(original_price) = payload.original_price {
            book.original_price = Some(original_price);
        }
        if let Some(discount) = payload.discount {
            book.discount = discount;
        }
        if let Some(cover_image) = &payload.cover_image {
            book.cover_image = Some(cover_image.clone());
        }
        if let Some(rating) = payload.rating {
            book.rating = rating;
        }
        if let Some(reviews_count) = payload.reviews_count {
            book.reviews_count = reviews_count;
        }
        if let Some(is_new) = payload.is_new {
            book.is_new = is_new;
        }
        if let Some(pages) = payload.pages {
            book.pages = Some(pages);
        }
        if let Some(language) = &payload.language {
            book.language = Some(language.clone());
        }
        if let Some(publisher) = &payload.publisher {
            book.publisher = Some(publisher.clone());
        }
        if let Some(description) = &payload.description {
            book.description = Some(description.clone());
        }

        book.updated_at = OffsetDateTime::now_utc().max(book.updated_at + Duration::MICROSECOND);
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let mut shelf = self.shelf.write().await;
        shelf
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(BookRepositoryError::NotFound(id))
    }

    async fn search(&self, keyword: &str) -> RepositoryResult<Vec<Book>> {
        let needle = keyword.to_lowercase();
        let shelf = self.shelf.read().await;
        Ok(shelf
            .books
            .values()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.author.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn categories(&self) -> RepositoryResult<Vec<String>> {
        let shelf = self.shelf.read().await;
        let categories: BTreeSet<String> = shelf
            .books
            .values()
            .filter_map(|b| b.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn featured(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(view(
            &shelf.books,
            |b| b.rating >= FEATURED_MIN_RATING,
            |a, b| b.rating.total_cmp(&a.rating).then(a.id.cmp(&b.id)),
            limit,
        ))
    }

    async fn newest(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(view(
            &shelf.books,
            |b| b.is_new,
            |a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
            limit,
        ))
    }

    async fn discounted(&self, limit: i64) -> RepositoryResult<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(view(
            &shelf.books,
            |b| b.discount > 0,
            |a, b| b.discount.cmp(&a.discount).then(a.id.cmp(&b.id)),
            limit,
        ))
    }
}
