//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, timeout, request ID, metrics)
//! - Serve on a bound listener until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers::{self, AppState};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::observability::metrics;
use crate::store::ProxyStore;

/// HTTP server for the proxy registry.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `store`.
    pub fn new(config: ServiceConfig, store: Arc<dyn ProxyStore>) -> Self {
        let router = Self::build_router(&config, AppState::new(store));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added last run first: the request ID is set before the trace
    /// span opens, so every log line of a request carries it.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        handlers::routes(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "request",
                        request_id = %request_id(request),
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use axum::body::Body;
    use axum::http::{self, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(ServiceConfig::default(), Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_assigns_request_id() {
        let response = server()
            .router()
            .oneshot(http::Request::get("/proxies").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(&X_REQUEST_ID).unwrap();
        assert!(uuid::Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_keeps_client_request_id() {
        let request = http::Request::get("/proxies/missing")
            .header("x-request-id", "client-chosen")
            .body(Body::empty())
            .unwrap();
        let response = server().router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(&X_REQUEST_ID).unwrap(), "client-chosen");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut config = ServiceConfig::default();
        config.limits.max_body_size = 32;
        let server = HttpServer::new(config, Arc::new(InMemoryStore::new()));

        let long = format!("http://proxy0:1000/{}", "a".repeat(64));
        let response = server
            .router()
            .oneshot(http::Request::post("/proxies").body(Body::from(long)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
