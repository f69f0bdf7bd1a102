use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported format '{tag}'. Choose from: {valid}")]
    UnsupportedFormat { tag: String, valid: String },

    #[error("Failed to read source {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compression failed ({format}): {message}")]
    Compression { format: String, message: String },

    #[error("Corrupt or mismatched {format} data: {message}")]
    CorruptData { format: String, message: String },

    #[error("Temporary file error: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote store {operation} failed for '{key}': {source}")]
    RemoteStore {
        operation: &'static str,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to persist transfer record for '{key}': {source}")]
    MetadataPersist {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl TransferError {
    /// Stable code for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Configuration(_) => "CONFIGURATION_ERROR",
            TransferError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            TransferError::SourceRead { .. } => "SOURCE_READ_ERROR",
            TransferError::Compression { .. } => "COMPRESSION_ERROR",
            TransferError::CorruptData { .. } => "CORRUPT_DATA",
            TransferError::TempFile(_) => "TEMP_FILE_ERROR",
            TransferError::DestinationWrite { .. } => "DESTINATION_WRITE_ERROR",
            TransferError::RemoteStore { .. } => "REMOTE_STORE_ERROR",
            TransferError::MetadataPersist { .. } => "METADATA_PERSIST_ERROR",
        }
    }

    /// Construction-time errors. Everything else is scoped to a single transfer.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TransferError::Configuration(_) | TransferError::UnsupportedFormat { .. }
        )
    }

    pub(crate) fn remote(operation: &'static str, key: &str, source: anyhow::Error) -> Self {
        TransferError::RemoteStore {
            operation,
            key: key.to_string(),
            source,
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
