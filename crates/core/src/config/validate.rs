use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - API base URL is set and the request timeout is non-zero
/// - Limits and polling schedule are non-zero
/// - Allowed extension is a non-empty `.ext` and the media type is set
/// - Server port is not 0
/// - Signed links have a lifetime
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "api.base_url cannot be empty".to_string(),
        ));
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs cannot be 0".to_string(),
        ));
    }

    let extension = config.limits.allowed_extension.as_str();
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(ConfigError::ValidationError(format!(
            "limits.allowed_extension must look like \".json\", got {:?}",
            config.limits.allowed_extension
        )));
    }

    if config.limits.allowed_media_type.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "limits.allowed_media_type cannot be empty".to_string(),
        ));
    }

    if config.limits.max_files_per_batch == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_files_per_batch cannot be 0".to_string(),
        ));
    }

    if config.limits.max_file_size == 0 {
        return Err(ConfigError::ValidationError(
            "limits.max_file_size cannot be 0".to_string(),
        ));
    }

    if config.polling.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "polling.max_attempts cannot be 0".to_string(),
        ));
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval_ms cannot be 0".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.signed_url_ttl_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "storage.signed_url_ttl_minutes cannot be 0".to_string(),
        ));
    }

    Ok(())
}
