//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the control-plane base URL parses and uses an http scheme
//! - Validate value ranges (timeouts > 0, retry caps ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PanelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::PanelConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &PanelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.control_plane.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field: "control_plane.base_url",
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field: "control_plane.base_url",
            message: format!("invalid URL: {}", e),
        }),
    }

    if config.control_plane.probe_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "control_plane.probe_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.control_plane.request_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "control_plane.request_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.retry.max_delay_ms < config.retry.initial_delay_ms {
        errors.push(ValidationError {
            field: "retry.max_delay_ms",
            message: "must be at least retry.initial_delay_ms".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
