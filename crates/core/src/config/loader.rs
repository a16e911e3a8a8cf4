//! Config loading.
//!
//! The TOML file is the base layer. `RELEASEKIT_*` environment variables sit
//! on top, with `__` separating nested keys so snake_case names survive:
//! `RELEASEKIT_ENDPOINTS__TIMEOUT_SECS=60` sets `endpoints.timeout_secs`.

use figment::{
    providers::{Env, Format, Toml},
    Figment, Provider,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides (`RELEASEKIT_BATCH__MAX_CONCURRENT_FILES=2`)
pub const ENV_PREFIX: &str = "RELEASEKIT_";

/// Load the config file at `path`, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_layered(path, Env::prefixed(ENV_PREFIX).split("__"))
}

/// Parse a config from TOML text alone, with no environment layer.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn load_layered(path: &Path, overrides: impl Provider) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Toml::file(path))
        .merge(overrides)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENDPOINTS: &str = r#"
[endpoints]
audio_url = "http://localhost:9001/audio"
image_url = "http://localhost:9001/image"
"#;

    fn config_file(extra: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}{}", ENDPOINTS, extra).unwrap();
        file
    }

    #[test]
    fn test_endpoints_only_uses_batch_defaults() {
        let config = load_config_from_str(ENDPOINTS).unwrap();
        assert_eq!(config.endpoints.audio_url, "http://localhost:9001/audio");
        assert_eq!(config.batch.max_audio_size_mb, 50);
        assert_eq!(config.batch.max_image_size_mb, 10);
    }

    #[test]
    fn test_config_without_endpoints_is_a_parse_error() {
        let err = load_config_from_str("[batch]\nmax_concurrent_files = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let err = load_config(Path::new("/nonexistent/releasekit.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(ref p) if p.ends_with("releasekit.toml")));
    }

    #[test]
    fn test_directory_is_not_a_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_file_sections_are_read() {
        let file = config_file(
            r#"
[server]
host = "127.0.0.1"
port = 3000

[batch]
max_image_size_mb = 12

[export]
dir = "/srv/releases"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.batch.max_image_size_mb, 12);
        assert_eq!(config.export.dir.to_str(), Some("/srv/releases"));
    }

    #[test]
    fn test_override_layer_wins_over_file() {
        let file = config_file("[batch]\nmax_concurrent_files = 1\n");

        let overrides = Serialized::default("batch.max_concurrent_files", 4);
        let config = load_layered(file.path(), overrides).unwrap();
        assert_eq!(config.batch.max_concurrent_files, 4);
        assert_eq!(config.endpoints.image_url, "http://localhost:9001/image");
    }

    #[test]
    fn test_bad_override_is_a_parse_error() {
        let file = config_file("");

        let overrides = Serialized::default("server.port", "not-a-port");
        let err = load_layered(file.path(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
