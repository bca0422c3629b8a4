//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned and echoed back)
//!     → handlers.rs (validate, call the ProxyStore)
//!     → response.rs (ApiError → status + text body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::AppState;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{ApiError, Rejection};
pub use server::HttpServer;
