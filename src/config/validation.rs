//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sizes > 0, intervals > 0, delays ordered)
//! - Check addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pool.size must be greater than 0")]
    ZeroPoolSize,

    #[error("pool.max_size ({max}) is smaller than pool.size ({size})")]
    MaxBelowSize { size: usize, max: usize },

    #[error("pool.data_source must not be empty")]
    EmptyDataSource,

    #[error("pool.sweep_interval_secs must be greater than 0")]
    ZeroSweepInterval,

    #[error("pool.retry.base_delay_ms ({base}) exceeds max_delay_ms ({max})")]
    DelayOrder { base: u64, max: u64 },

    #[error("invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check every semantic constraint and report all violations.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let pool = &config.pool;

    if pool.size == Some(0) {
        errors.push(ValidationError::ZeroPoolSize);
    }

    if let Some(max) = pool.max_size {
        let size = pool.size.unwrap_or_else(num_cpus::get);
        if max < size {
            errors.push(ValidationError::MaxBelowSize { size, max });
        }
    }

    if pool.data_source.trim().is_empty() {
        errors.push(ValidationError::EmptyDataSource);
    }

    if pool.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if pool.retry.base_delay_ms > pool.retry.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: pool.retry.base_delay_ms,
            max: pool.retry.max_delay_ms,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
