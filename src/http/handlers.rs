//! Proxy registry endpoints.
//!
//! | Method | Path                 | Handler          |
//! |--------|----------------------|------------------|
//! | POST   | `/proxies`           | `register_proxy` |
//! | GET    | `/proxies`           | `list_proxies`   |
//! | PUT    | `/proxies/{hostname}`| `update_proxy`   |
//! | GET    | `/proxies/{hostname}`| `get_proxy`      |
//!
//! Any other method on these paths gets 405 from the method router.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};

use crate::http::response::{ApiError, Rejection};
use crate::observability::metrics;
use crate::store::{normalize_hostname, ProxyStore, ProxyUrl, StoreError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProxyStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProxyStore>) -> Self {
        Self { store }
    }
}

/// Routes for the registry API, without middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/proxies", get(list_proxies).post(register_proxy))
        .route("/proxies/", get(list_proxies).post(register_proxy))
        .route("/proxies/{hostname}", get(get_proxy).put(update_proxy))
        .route("/health", get(health))
        .with_state(state)
}

/// Register a new proxy. The body is the proxy URL.
pub async fn register_proxy(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let proxy = parse_body(&body)?;
    let hostname = proxy.hostname().to_owned();

    let key = hostname.clone();
    let inserted =
        with_store(&state, "insert_new", move |store| store.insert_new(&key, proxy)).await?;

    if !inserted {
        tracing::info!(hostname = %hostname, "Proxy already listed");
        return Err(Rejection::AlreadyListed.into());
    }

    tracing::info!(hostname = %hostname, "Proxy registered");
    Ok(StatusCode::ACCEPTED)
}

/// Replace (or create) the proxy at `hostname`. The body's host must match.
pub async fn update_proxy(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let proxy = parse_body(&body)?;
    let hostname = normalize_hostname(&hostname);

    if proxy.hostname() != hostname {
        tracing::info!(
            path_hostname = %hostname,
            body_hostname = %proxy.hostname(),
            "Proxy update rejected: hostname mismatch"
        );
        return Err(Rejection::PathMismatch.into());
    }

    let key = hostname.clone();
    with_store(&state, "set", move |store| store.set(&key, proxy)).await?;

    tracing::info!(hostname = %hostname, "Proxy updated");
    Ok(StatusCode::ACCEPTED)
}

/// Canonical URL of the proxy at `hostname`.
pub async fn get_proxy(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
) -> Result<String, ApiError> {
    let hostname = normalize_hostname(&hostname);

    with_store(&state, "get", move |store| store.get(&hostname))
        .await?
        .map(|proxy| proxy.to_string())
        .ok_or(ApiError::NotFound)
}

/// All proxies, one canonical URL per line.
pub async fn list_proxies(State(state): State<AppState>) -> Result<String, ApiError> {
    let proxies = with_store(&state, "get_all", |store| store.get_all()).await?;
    metrics::record_records(proxies.len());

    Ok(proxies
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Run a store operation on the blocking pool. Store calls may wait on a
/// mutex or on SQLite I/O and must not stall the runtime workers.
async fn with_store<T, F>(state: &AppState, op: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProxyStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(StoreError::from)
        .and_then(|result| result)
        .map_err(store_failure(op))
}

async fn health() -> &'static str {
    "ok"
}

fn parse_body(body: &[u8]) -> Result<ProxyUrl, Rejection> {
    let text = std::str::from_utf8(body).map_err(|_| Rejection::MalformedUrl)?;
    ProxyUrl::parse(text).map_err(|e| {
        tracing::debug!(error = %e, "Malformed proxy URL");
        Rejection::MalformedUrl
    })
}

fn store_failure(op: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |e| {
        tracing::error!(op, error = %e, "Proxy store failure");
        metrics::record_store_error(op);
        ApiError::Backend(e)
    }
}
