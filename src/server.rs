//! HTTP surface.
//!
//! Thin axum layer over the resolver and stores. Every failure path maps
//! to a JSON error body with a distinct message per error class; no query
//! failure can crash the process, and degraded mode (no provider) still
//! accepts and acknowledges every request.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::error::Error;
use crate::pipeline::QueryResolver;
use crate::store::CsvStore;

/// Placeholder page served at the root.
const INDEX_HTML: &str = r"<!doctype html>
<html>
<head><title>refdesk</title></head>
<body>
<h1>refdesk</h1>
<p>POST /search-book or /research with {&quot;query&quot;: &quot;...&quot;};
GET /data.csv for saved results.</p>
</body>
</html>";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The query resolver, shared across requests.
    pub resolver: Arc<QueryResolver>,
    /// Book-mode store.
    pub books: Arc<CsvStore>,
    /// Research-mode store.
    pub research: Arc<CsvStore>,
}

/// Request body for the search and research routes.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
    /// The query text; absent or blank is a 400.
    pub query: Option<String>,
    /// Optional source URL steering research toward one page.
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/data.csv", get(serve_csv))
        .route("/search-book", post(search_book))
        .route("/research", post(research))
        .route("/clear", post(clear_all))
        .route("/clear/{query}", post(clear_query))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn serve_csv(State(state): State<AppState>) -> Response {
    match state.books.read_raw() {
        Ok(Some(raw)) => ([(header::CONTENT_TYPE, "text/csv")], raw).into_response(),
        Ok(None) => {
            warn!("data file not found");
            error_response(StatusCode::NOT_FOUND, "CSV file not found")
        }
        Err(e) => {
            error!(error = %e, "failed to read data file");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn search_book(State(state): State<AppState>, body: Option<axum::Json<QueryBody>>) -> Response {
    let Some(query) = extract_query(body) else {
        warn!("no query provided in request");
        return error_response(StatusCode::BAD_REQUEST, "No query provided");
    };

    let outcomes = state.resolver.resolve_book_lines(&query).await;
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(record) => {
                if let Err(e) = state.books.append(&record.to_row()) {
                    error!(error = %e, "failed to persist book record");
                    failures.push((outcome.query, e));
                    continue;
                }
                results.push(record);
            }
            Err(e) => {
                error!(query = outcome.query, error = %e, "book resolution failed");
                failures.push((outcome.query, e));
            }
        }
    }

    if results.is_empty() {
        let (status, message) = failures
            .first()
            .map_or((StatusCode::BAD_REQUEST, "No query provided".to_string()), |(_, e)| {
                book_failure(e)
            });
        return error_response(status, &message);
    }

    // Single-line queries keep the original flat response shape.
    if results.len() == 1 && failures.is_empty() {
        let record = &results[0];
        return axum::Json(json!({
            "status": "Book search completed successfully",
            "title": record.title,
            "author": record.author,
            "first_year_published": record.first_year_published,
            "search_query": record.search_query,
        }))
        .into_response();
    }

    axum::Json(json!({
        "status": "Book search completed",
        "results": results,
        "errors": failures
            .iter()
            .map(|(q, e)| json!({"query": q, "error": e.to_string()}))
            .collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn research(State(state): State<AppState>, body: Option<axum::Json<QueryBody>>) -> Response {
    let source_hint = body
        .as_ref()
        .and_then(|axum::Json(b)| b.source_url.clone())
        .filter(|u| !u.trim().is_empty());
    let Some(topic) = extract_query(body) else {
        warn!("no query provided in request");
        return error_response(StatusCode::BAD_REQUEST, "No query provided");
    };

    match state.resolver.resolve_research(&topic, source_hint.as_deref()).await {
        Ok(record) => {
            if let Err(e) = state.research.append(&record.to_row()) {
                error!(error = %e, "failed to persist research record");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
            }
            axum::Json(json!({
                "status": "Research completed successfully",
                "topic": record.topic,
                "summary": record.summary,
                "sources": record.sources,
                "tools_used": record.tools_used,
            }))
            .into_response()
        }
        Err(e) => {
            error!(topic, error = %e, "research failed");
            let (status, message) = research_failure(&e);
            error_response(status, &message)
        }
    }
}

async fn clear_all(State(state): State<AppState>) -> Response {
    for store in [&state.books, &state.research] {
        if let Err(e) = store.clear_all() {
            error!(error = %e, "failed to clear data");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to clear data: {e}"),
            );
        }
    }
    axum::Json(json!({"status": "All research data cleared successfully"})).into_response()
}

async fn clear_query(State(state): State<AppState>, Path(query): Path<String>) -> Response {
    if !state.books.has_data() && !state.research.has_data() {
        warn!("no data file found for clearing search");
        return axum::Json(json!({"status": "No data to clear"})).into_response();
    }
    for store in [&state.books, &state.research] {
        if let Err(e) = store.clear_query(&query) {
            error!(query, error = %e, "failed to clear search");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to clear search: {e}"),
            );
        }
    }
    axum::Json(json!({"status": format!("Search '{query}' cleared successfully")})).into_response()
}

fn extract_query(body: Option<axum::Json<QueryBody>>) -> Option<String> {
    body.and_then(|axum::Json(b)| b.query)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({"error": message}))).into_response()
}

/// Maps a book-mode failure to its status and user-visible message.
fn book_failure(e: &Error) -> (StatusCode, String) {
    match e {
        Error::NoProviderAvailable => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Book search agent not initialized. Please check your API keys.".to_string(),
        ),
        Error::Parse { reason, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to parse book search results: {reason}"),
        ),
        Error::NotFound { query } => (
            StatusCode::NOT_FOUND,
            format!("No book information found for '{query}'"),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Book search failed: {other}"),
        ),
    }
}

/// Maps a research-mode failure to its status and user-visible message.
fn research_failure(e: &Error) -> (StatusCode, String) {
    match e {
        Error::NoProviderAvailable => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Research agent not initialized. Please check your API keys.".to_string(),
        ),
        Error::Parse { reason, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to parse research results: {reason}"),
        ),
        Error::NotFound { query } => (
            StatusCode::NOT_FOUND,
            format!("No research results found for '{query}'"),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Research failed: {other}"),
        ),
    }
}
