//! Proxy registry: an HTTP service for registering, updating, and looking
//! up proxy-server URLs keyed by hostname.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{ProxyStore, ProxyUrl};
