use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A catalog entry as stored and returned to clients.
///
/// Nullable columns are `Option`s and are omitted from JSON when null, so an
/// absent field is distinguishable from a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Store-assigned identifier, never reused
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Not checksum-validated
    pub isbn: String,
    pub year: i32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Price before `discount` was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    /// Percentage, 0 when not discounted
    pub discount: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub rating: f64,
    pub reviews_count: i32,
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Client-submitted body for create and update.
///
/// `id`, `created_at` and `updated_at` are store-assigned; if a client sends
/// them they are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub year: i32,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub discount: Option<i32>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: Option<i32>,
    #[serde(default)]
    pub is_new: Option<bool>,
    #[serde(default)]
    pub pages: Option<i32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One rejected payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldError {
    const fn new(field: &'static str, error: &'static str) -> Self {
        Self { field, error }
    }
}

impl BookPayload {
    /// Check field ranges, reporting every offending field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("isbn", &self.isbn),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "cannot be empty"));
            }
        }

        if !self.price.is_finite() || self.price < 0.0 {
            errors.push(FieldError::new("price", "must be a non-negative number"));
        }
        if let Some(original_price) = self.original_price {
            if !original_price.is_finite() || original_price < 0.0 {
                errors.push(FieldError::new(
                    "original_price",
                    "must be a non-negative number",
                ));
            }
        }
        if let Some(discount) = self.discount {
            if !(0..=100).contains(&discount) {
                errors.push(FieldError::new("discount", "must be between 0 and 100"));
            }
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                errors.push(FieldError::new("rating", "must be between 0 and 5"));
            }
        }
        if let Some(reviews_count) = self.reviews_count {
            if reviews_count < 0 {
                errors.push(FieldError::new("reviews_count", "must not be negative"));
            }
        }
        if let Some(pages) = self.pages {
            if pages <= 0 {
                errors.push(FieldError::new("pages", "must be positive"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn discount_or_default(&self) -> i32 {
        self.discount.unwrap_or(0)
    }

    pub fn rating_or_default(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn reviews_count_or_default(&self) -> i32 {
        self.reviews_count.unwrap_or(0)
    }

    /// Books enter the catalog flagged as new unless the client says otherwise.
    pub fn is_new_or_default(&self) -> bool {
        self.is_new.unwrap_or(true)
    }
}

/// Confirmation returned by delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
