//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, StorageBackend};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("storage.path must not be empty for the sqlite backend")]
    EmptyStoragePath,

    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::Zero("limits.max_body_size"));
    }

    if config.storage.open_timeout_secs == 0 {
        errors.push(ValidationError::Zero("storage.open_timeout_secs"));
    }

    if config.storage.backend == StorageBackend::Sqlite && config.storage.path.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyStoragePath);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
