//! Configuration for the remote conversion endpoints.

use serde::{Deserialize, Serialize};

use super::types::FileKind;

/// Where and how to reach the conversion endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Audio transcoder URL.
    pub audio_url: String,

    /// Image resizer URL.
    pub image_url: String,

    /// Timeout for one conversion request in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    300
}

impl EndpointConfig {
    /// Creates a config for the two endpoint URLs with the default timeout.
    pub fn new(audio_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
            image_url: image_url.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// URL of the endpoint that handles `kind`.
    pub fn url_for(&self, kind: FileKind) -> &str {
        match kind {
            FileKind::Audio => &self.audio_url,
            FileKind::Image => &self.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_kind() {
        let config = EndpointConfig::new("http://audio.local/convert", "http://image.local/resize");
        assert_eq!(config.url_for(FileKind::Audio), "http://audio.local/convert");
        assert_eq!(config.url_for(FileKind::Image), "http://image.local/resize");
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_timeout_defaults_when_missing() {
        let toml = r#"
audio_url = "http://a"
image_url = "http://i"
"#;
        let config: EndpointConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.with_timeout(30).timeout_secs, 30);
    }
}
