use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::Html,
    routing::{get, post},
};
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::{Error, Summarizer};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(summarizer: Summarizer) -> Self {
        AppState {
            summarizer: Arc::new(summarizer),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Creates the router: the form page, the summarize endpoint and a health check.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/summarize", post(summarize_handler))
        .with_state(app_state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Pull the `url` field out of a raw request body.
///
/// Only an absent or empty string counts as missing. A blank one is trimmed
/// and left for the extractor to reject as an invalid URL.
///
/// The body is parsed by hand so a non-string `url` is a client error with
/// the same JSON error shape as every other failure.
fn request_url(body: &[u8]) -> Result<String, Error> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| Error::Unexpected(format!("unparseable request body: {e}")))?;

    payload
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(|url| url.trim().to_string())
        .ok_or_else(|| Error::InvalidInput("Please provide a YouTube URL".to_string()))
}

async fn summarize_handler(State(app_state): State<AppState>, body: Bytes) -> Result<Json<SummaryResponse>, Error> {
    let url = request_url(&body)?;
    info!("Received summarize request for URL: {url}");

    let summary = app_state.summarizer.summarize_url(&url).await?;
    debug!("Summary is {} characters", summary.len());

    Ok(Json(SummaryResponse { summary }))
}

/// Serve the app on an already-bound listener until the process exits
pub async fn serve(listener: TcpListener, app_state: AppState) -> eyre::Result<()> {
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
