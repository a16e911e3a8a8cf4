use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Endpoints section exists (enforced by serde)
/// - Server port and upload cap are not 0
/// - Endpoint URLs are http(s)
/// - Size limits and concurrency are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_upload_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_mb cannot be 0".to_string(),
        ));
    }

    for (key, url) in [
        ("endpoints.audio_url", &config.endpoints.audio_url),
        ("endpoints.image_url", &config.endpoints.image_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got '{}'",
                key, url
            )));
        }
    }

    if config.endpoints.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "endpoints.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.batch.max_audio_size_mb == 0 || config.batch.max_image_size_mb == 0 {
        return Err(ConfigError::ValidationError(
            "batch size limits must be greater than 0".to_string(),
        ));
    }

    if config.batch.max_concurrent_files == 0 {
        return Err(ConfigError::ValidationError(
            "batch.max_concurrent_files must be at least 1".to_string(),
        ));
    }

    Ok(())
}
