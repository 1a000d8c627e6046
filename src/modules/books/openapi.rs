use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_array(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "array",
                    "items": { "$ref": "#/components/schemas/Book" }
                }
            }
        }
    })
}

fn single_book(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn payload_body() -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookPayload" }
            }
        }
    })
}

fn derived_view(summary: &str) -> Value {
    json!({
        "get": {
            "summary": summary,
            "tags": ["Books"],
            "responses": {
                "200": book_array("At most the configured limit of books"),
                "500": error_response("Storage failure")
            }
        }
    })
}

/// OpenAPI paths and schemas for the books module, relative to the API prefix.
pub(super) fn fragment() -> Value {
    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List all books",
                    "tags": ["Books"],
                    "responses": {
                        "200": book_array("Every book, empty array when none"),
                        "500": error_response("Storage failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": payload_body(),
                    "responses": {
                        "201": single_book("Created book with store-assigned id and timestamps"),
                        "400": error_response("Malformed or invalid payload"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": single_book("The book"),
                        "400": error_response("Non-numeric id"),
                        "404": error_response("No book with this id"),
                        "500": error_response("Storage failure")
                    }
                },
                "put": {
                    "summary": "Update a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": payload_body(),
                    "responses": {
                        "200": single_book("Updated book"),
                        "400": error_response("Malformed or invalid payload"),
                        "404": error_response("No book with this id"),
                        "500": error_response("Storage failure")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": {
                            "description": "Deletion confirmation",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "message": { "type": "string" } }
                                    }
                                }
                            }
                        },
                        "404": error_response("No book with this id"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/books/search": {
                "get": {
                    "summary": "Search by title or author",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "q",
                        "in": "query",
                        "required": true,
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": book_array("Case-insensitive substring matches"),
                        "400": error_response("Missing q"),
                        "500": error_response("Storage failure")
                    }
                }
            },
            "/books/featured": derived_view("Books rated 4.5 or higher, best first"),
            "/books/new": derived_view("Books flagged new, most recent first"),
            "/books/discounted": derived_view("Discounted books, largest discount first"),
            "/categories": {
                "get": {
                    "summary": "List categories",
                    "tags": ["Categories"],
                    "responses": {
                        "200": {
                            "description": "Distinct non-empty categories, sorted",
                            "content": {
                                "application/json": {
                                    "schema": { "type": "array", "items": { "type": "string" } }
                                }
                            }
                        },
                        "500": error_response("Storage failure")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "year": { "type": "integer" },
                        "price": { "type": "number" },
                        "category": { "type": "string" },
                        "original_price": { "type": "number" },
                        "discount": { "type": "integer" },
                        "cover_image": { "type": "string", "format": "uri" },
                        "rating": { "type": "number" },
                        "reviews_count": { "type": "integer" },
                        "is_new": { "type": "boolean" },
                        "pages": { "type": "integer" },
                        "language": { "type": "string" },
                        "publisher": { "type": "string" },
                        "description": { "type": "string" },
                        "created_at": { "type": "string", "format": "date-time" },
                        "updated_at": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "isbn", "year", "price", "discount",
                        "rating", "reviews_count", "is_new", "created_at", "updated_at"
                    ]
                },
                "BookPayload": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string" },
                        "year": { "type": "integer" },
                        "price": { "type": "number", "minimum": 0 },
                        "category": { "type": "string" },
                        "original_price": { "type": "number", "minimum": 0 },
                        "discount": { "type": "integer", "minimum": 0, "maximum": 100 },
                        "cover_image": { "type": "string" },
                        "rating": { "type": "number", "minimum": 0, "maximum": 5 },
                        "reviews_count": { "type": "integer", "minimum": 0 },
                        "is_new": { "type": "boolean" },
                        "pages": { "type": "integer", "minimum": 1 },
                        "language": { "type": "string" },
                        "publisher": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["title", "author", "isbn", "year", "price"]
                }
            }
        }
    })
}
