use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use catalog_app::books::{self, memory::InMemoryBookRepository, repository::ViewLimits};
use catalog_kernel::{settings::Settings, HealthCheck, ModuleRegistry};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixedProbe(bool);

#[async_trait]
impl HealthCheck for FixedProbe {
    async fn is_healthy(&self) -> bool {
        self.0
    }
}

fn app_with(healthy: bool) -> Router {
    let mut registry = ModuleRegistry::new();
    registry.register_custom(books::create_module(
        Arc::new(InMemoryBookRepository::new()),
        ViewLimits::default(),
    ));
    let probe: Arc<dyn HealthCheck> = Arc::new(FixedProbe(healthy));
    catalog_http::build_router(&registry, &Settings::default(), probe)
}

fn app() -> Router {
    app_with(true)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: &'static str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request");
    app.clone().oneshot(request).await.expect("response").status()
}

fn book(title: &str, author: &str) -> Value {
    json!({
        "title": title,
        "author": author,
        "isbn": "978-0000000000",
        "year": 2020,
        "price": 100.0
    })
}

fn with(mut payload: Value, extra: Value) -> Value {
    if let (Some(target), Some(source)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    payload
}

async fn create(app: &Router, payload: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/v1/books", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

fn titles(books: &Value) -> Vec<&str> {
    books
        .as_array()
        .expect("array")
        .iter()
        .map(|b| b["title"].as_str().expect("title"))
        .collect()
}

#[tokio::test]
async fn book_lifecycle() {
    let app = app();

    let created = create(
        &app,
        with(book("Test Book", "Author"), json!({ "category": "Cake" })),
    )
    .await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["is_new"], true);
    assert_eq!(created["created_at"], created["updated_at"]);

    let (status, fetched) = send(&app, Method::GET, "/api/v1/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/api/v1/books/1",
        Some(with(book("Test Book", "Author"), json!({ "price": 150.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 150.0);
    assert_eq!(updated["category"], "Cake");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_ne!(updated["updated_at"], created["updated_at"]);

    let (status, body) = send(&app, Method::DELETE, "/api/v1/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "book deleted successfully" }));

    let (status, body) = send(&app, Method::GET, "/api/v1/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send(&app, Method::DELETE, "/api/v1/books/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_catalog_lists_empty_array() {
    let app = app();

    for uri in [
        "/api/v1/books",
        "/api/v1/categories",
        "/api/v1/books/featured",
        "/api/v1/books/new",
        "/api/v1/books/discounted",
        "/api/v1/books/search?q=anything",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn search_matches_title_or_author_case_insensitively() {
    let app = app();
    create(&app, book("Rust in Action", "Tim McNamara")).await;
    create(&app, book("Dune", "Frank Herbert")).await;
    create(&app, book("100% Pure", "Nobody")).await;

    let (_, found) = send(&app, Method::GET, "/api/v1/books/search?q=rust", None).await;
    assert_eq!(titles(&found), vec!["Rust in Action"]);

    let (_, found) = send(&app, Method::GET, "/api/v1/books/search?q=HERB", None).await;
    assert_eq!(titles(&found), vec!["Dune"]);

    let (_, found) = send(&app, Method::GET, "/api/v1/books/search?q=100%25", None).await;
    assert_eq!(titles(&found), vec!["100% Pure"]);

    let (status, found) = send(&app, Method::GET, "/api/v1/books/search?q=tolkien", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, json!([]));
}

#[tokio::test]
async fn search_without_keyword_is_rejected() {
    let app = app();

    for uri in ["/api/v1/books/search", "/api/v1/books/search?q=", "/api/v1/books/search?q=%20"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn duplicated_search_keyword_uses_error_envelope() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/books/search?q=a&q=b", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["trace_id"].is_string());
}

#[tokio::test]
async fn categories_are_distinct_sorted_and_non_empty() {
    let app = app();
    create(&app, with(book("A", "X"), json!({ "category": "Muffin" }))).await;
    create(&app, with(book("B", "X"), json!({ "category": "Cake" }))).await;
    create(&app, with(book("C", "X"), json!({ "category": "Cake" }))).await;
    create(&app, with(book("D", "X"), json!({ "category": "" }))).await;
    create(&app, book("E", "X")).await;

    let (status, categories) = send(&app, Method::GET, "/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories, json!(["Cake", "Muffin"]));
}

#[tokio::test]
async fn featured_keeps_highly_rated_best_first() {
    let app = app();
    create(&app, with(book("Good", "X"), json!({ "rating": 4.5 }))).await;
    create(&app, with(book("Okay", "X"), json!({ "rating": 4.4 }))).await;
    create(&app, with(book("Best", "X"), json!({ "rating": 4.9 }))).await;

    let (_, featured) = send(&app, Method::GET, "/api/v1/books/featured", None).await;
    assert_eq!(titles(&featured), vec!["Best", "Good"]);
}

#[tokio::test]
async fn featured_caps_at_ten_best_rated() {
    let app = app();
    for i in 0..12 {
        let rating = 4.5 + f64::from(i) / 100.0;
        create(&app, with(book(&format!("F{i}"), "X"), json!({ "rating": rating }))).await;
    }

    let (_, featured) = send(&app, Method::GET, "/api/v1/books/featured", None).await;
    let expected: Vec<String> = (2..12).rev().map(|i| format!("F{i}")).collect();
    assert_eq!(titles(&featured), expected);
}

#[tokio::test]
async fn discounted_orders_by_discount_and_caps_at_ten() {
    let app = app();
    for discount in 1..=12 {
        create(
            &app,
            with(book(&format!("D{discount}"), "X"), json!({ "discount": discount })),
        )
        .await;
    }
    create(&app, book("Full price", "X")).await;

    let (_, discounted) = send(&app, Method::GET, "/api/v1/books/discounted", None).await;
    let discounts: Vec<i64> = discounted
        .as_array()
        .expect("array")
        .iter()
        .map(|b| b["discount"].as_i64().expect("discount"))
        .collect();
    assert_eq!(discounts, (3..=12).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn new_view_lists_most_recent_new_books() {
    let app = app();
    create(&app, book("First", "X")).await;
    create(&app, with(book("Backlist", "X"), json!({ "is_new": false }))).await;
    create(&app, book("Second", "X")).await;

    let (_, newest) = send(&app, Method::GET, "/api/v1/books/new", None).await;
    assert_eq!(titles(&newest), vec!["Second", "First"]);
}

#[tokio::test]
async fn new_view_caps_at_ten_most_recent() {
    let app = app();
    for i in 1..=12 {
        create(&app, book(&format!("N{i}"), "X")).await;
    }

    let (_, newest) = send(&app, Method::GET, "/api/v1/books/new", None).await;
    let expected: Vec<String> = (3..=12).rev().map(|i| format!("N{i}")).collect();
    assert_eq!(titles(&newest), expected);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/api/v1/books/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/api/v1/books/42", Some(book("A", "B"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/books/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = app();

    assert_eq!(
        send_raw(&app, Method::POST, "/api/v1/books", "{not json").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send_raw(&app, Method::POST, "/api/v1/books", r#"{"title":"Only title"}"#).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send_raw(&app, Method::POST, "/api/v1/books", r#"{"title":"A","author":"B","isbn":"C","year":"soon","price":1}"#).await,
        StatusCode::BAD_REQUEST
    );

    let (status, _) = send(&app, Method::GET, "/api/v1/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_fields_are_reported() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(with(book(" ", "B"), json!({ "discount": 101, "price": -1.0 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");

    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .expect("details")
        .iter()
        .map(|d| d["field"].as_str().expect("field"))
        .collect();
    assert_eq!(fields, vec!["title", "price", "discount"]);

    let (_, all) = send(&app, Method::GET, "/api/v1/books", None).await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn absent_optional_fields_are_omitted() {
    let app = app();
    let created = create(&app, book("Plain", "X")).await;

    let object = created.as_object().expect("object");
    for field in ["category", "original_price", "cover_image", "pages", "language", "publisher", "description"] {
        assert!(!object.contains_key(field), "{field} should be omitted");
    }
    assert_eq!(created["discount"], 0);
    assert_eq!(created["rating"], 0.0);
    assert_eq!(created["reviews_count"], 0);
}

#[tokio::test]
async fn client_supplied_identity_is_ignored() {
    let app = app();
    let created = create(
        &app,
        with(
            book("A", "B"),
            json!({ "id": 99, "created_at": "2001-01-01T00:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(created["id"], 1);
    assert_ne!(created["created_at"], "2001-01-01T00:00:00Z");
}

#[tokio::test]
async fn health_reflects_storage_reachability() {
    let (status, body) = send(&app_with(true), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "healthy" }));

    let (status, body) = send(&app_with(false), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "message": "unhealthy" }));
}

#[tokio::test]
async fn openapi_document_lists_catalog_paths() {
    let (status, doc) = send(&app(), Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/api/v1/books", "/api/v1/books/{id}", "/api/v1/categories", "/health"] {
        assert!(doc["paths"].get(path).is_some(), "{path} missing");
    }
    assert!(doc["components"]["schemas"].get("Book").is_some());
}
