//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → command-line overrides applied in main
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty (or absent) file is valid
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, StorageBackend,
    StorageConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
