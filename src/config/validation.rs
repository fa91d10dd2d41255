//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Minimum HS256 secret length accepted without the override.
pub const MIN_SECRET_BYTES: usize = 16;

/// Environment variable that allows a short `auth.jwt_secret` (local development).
pub const ALLOW_INSECURE_SECRET_ENV: &str = "CHATTERD_ALLOW_INSECURE_SECRET";

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("auth.jwt_secret must be at least {MIN_SECRET_BYTES} bytes, got {0}")]
    WeakJwtSecret(usize),
    #[error("auth.token_ttl_minutes must be greater than zero")]
    ZeroTokenTtl,
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let allow_insecure = std::env::var_os(ALLOW_INSECURE_SECRET_ENV).is_some();
    validate_with(config, allow_insecure)
}

fn validate_with(config: &Config, allow_insecure_secret: bool) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let secret_len = config.auth.jwt_secret.len();
    if secret_len < MIN_SECRET_BYTES && !allow_insecure_secret {
        errors.push(ValidationError::WeakJwtSecret(secret_len));
    }
    if config.auth.token_ttl_minutes == 0 {
        errors.push(ValidationError::ZeroTokenTtl);
    }

    if config.limits.send_queue == 0 {
        errors.push(ValidationError::ZeroLimit("send_queue"));
    }
    if config.limits.max_frame_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_frame_bytes"));
    }

    // Database path validation
    let db_path = Path::new(&config.database.path);
    if config.database.path != ":memory:"
        && let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(config.database.path.clone()));
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

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "chat.test"

[listen]
address = "127.0.0.1:8000"

[database]
path = ":memory:"

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"
"#
        .to_string()
    }

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = parse(&minimal_valid_config());
        assert!(validate_with(&config, false).is_ok());
    }

    #[test]
    fn test_empty_server_name_fails() {
        let config = parse(&minimal_valid_config().replace(r#"name = "chat.test""#, r#"name = """#));
        let errors = validate_with(&config, false).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServerName)));
    }

    #[test]
    fn test_short_secret_fails_unless_allowed() {
        let toml = minimal_valid_config()
            .replace("0123456789abcdef0123456789abcdef", "short");
        let config = parse(&toml);

        let errors = validate_with(&config, false).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::WeakJwtSecret(5))));

        assert!(validate_with(&config, true).is_ok());
    }

    #[test]
    fn test_zero_limits_fail() {
        let toml = format!(
            "{}\n[limits]\nsend_queue = 0\nmax_frame_bytes = 0\n",
            minimal_valid_config()
        );
        let errors = validate_with(&parse(&toml), false).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::ZeroLimit(_)))
                .count(),
            2
        );
    }

    #[test]
    fn test_missing_database_dir_fails() {
        let toml = minimal_valid_config().replace(":memory:", "/nonexistent/dir/chat.db");
        let errors = validate_with(&parse(&toml), false).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DatabasePathInvalid(_))));
    }

    #[test]
    fn test_relative_database_path_passes() {
        let toml = minimal_valid_config().replace(":memory:", "chat.db");
        assert!(validate_with(&parse(&toml), false).is_ok());
    }

    #[test]
    fn test_errors_are_collected() {
        let toml = minimal_valid_config()
            .replace(r#"name = "chat.test""#, r#"name = """#)
            .replace("0123456789abcdef0123456789abcdef", "x");
        let errors = validate_with(&parse(&toml), false).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
