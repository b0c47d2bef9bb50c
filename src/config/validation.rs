//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses parse and built-in handler settings are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: &ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field} `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("static_files.prefix `{0}` must start with `/`")]
    InvalidPrefix(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

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
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }
    if config.sessions.cookie_name.is_empty() {
        errors.push(ValidationError::Empty("sessions.cookie_name"));
    }
    if let Some(auth) = &config.auth {
        if auth.realm.is_empty() {
            errors.push(ValidationError::Empty("auth.realm"));
        }
        if auth.username.is_empty() {
            errors.push(ValidationError::Empty("auth.username"));
        }
    }
    if let Some(files) = &config.static_files {
        if !files.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(files.prefix.clone()));
        }
        if files.dir.is_empty() {
            errors.push(ValidationError::Empty("static_files.dir"));
        }
        if files.max_file_bytes == 0 {
            errors.push(ValidationError::Zero("static_files.max_file_bytes"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, StaticFilesConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.request_secs = 0;
        config.auth = Some(AuthConfig {
            realm: String::new(),
            username: "user".to_string(),
            password: "secret".to_string(),
        });
        config.static_files = Some(StaticFilesConfig {
            prefix: "static".to_string(),
            dir: ".".to_string(),
            max_file_bytes: 0,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "not-an-address".to_string(),
                },
                ValidationError::Zero("timeouts.request_secs"),
                ValidationError::Empty("auth.realm"),
                ValidationError::InvalidPrefix("static".to_string()),
                ValidationError::Zero("static_files.max_file_bytes"),
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
