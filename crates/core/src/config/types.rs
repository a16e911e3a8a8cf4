use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::batch::BatchConfig;
use crate::converter::{EndpointConfig, BYTES_PER_MB};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body cap for uploads, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ServerConfig {
    /// Upload cap in bytes, clamped to what the platform can address.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_mb() -> u64 {
    512
}

/// Export configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Directory that "download all" writes into, one subdirectory per batch
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("exports")
}

/// Sanitized config for API responses (endpoint query strings removed,
/// since hosted functions often carry tokens there)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub endpoints: SanitizedEndpointConfig,
    pub batch: BatchConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEndpointConfig {
    pub audio_url: String,
    pub image_url: String,
    pub timeout_secs: u64,
    pub query_redacted: bool,
}

fn strip_query(url: &str) -> (String, bool) {
    match url.split_once('?') {
        Some((base, _)) => (base.to_string(), true),
        None => (url.to_string(), false),
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let (audio_url, audio_redacted) = strip_query(&config.endpoints.audio_url);
        let (image_url, image_redacted) = strip_query(&config.endpoints.image_url);

        Self {
            server: config.server.clone(),
            endpoints: SanitizedEndpointConfig {
                audio_url,
                image_url,
                timeout_secs: config.endpoints.timeout_secs,
                query_redacted: audio_redacted || image_redacted,
            },
            batch: config.batch.clone(),
            export: config.export.clone(),
        }
    }
}
