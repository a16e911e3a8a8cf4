pub mod batch;
pub mod config;
pub mod converter;
pub mod encoder;
pub mod metrics;
pub mod testing;

pub use batch::{
    BatchConfig, BatchError, BatchEvent, BatchPipeline, BatchSummary, ConversionArtifact,
    DirectoryExportSink, ExportError, ExportSink, FileConversionState, FileError, FileStatus,
    InputFile,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use converter::{
    ConversionClient, ConversionError, EndpointConfig, ErrorCategory, FileKind,
    HttpConversionClient, RemoteArtifact,
};
pub use encoder::{decode_payload, encode_payload, EncodingError};
