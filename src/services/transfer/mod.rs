use crate::config::StorageConfig;
use crate::error::TransferResult;
use crate::services::compression::{CompressionFormat, CompressionRegistry};
use crate::services::{records::RecordSink, storage::BlobStore};
use std::path::PathBuf;
use std::sync::Arc;

pub mod artifact;
pub mod batch;
pub mod download;
pub mod list;
pub mod upload;

pub use artifact::{CompressedArtifact, ScopedTempFile};

/// Per-service defaults applied to requests that leave them unset.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub public_access: bool,
    pub default_format: CompressionFormat,
    pub temp_dir: Option<PathBuf>,
    pub max_concurrency: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            public_access: false,
            default_format: CompressionFormat::Zstd,
            temp_dir: None,
            max_concurrency: 16,
        }
    }
}

impl From<&StorageConfig> for TransferOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            public_access: config.public_access,
            default_format: config.default_format,
            temp_dir: config.temp_dir.clone(),
            max_concurrency: config.max_concurrency,
        }
    }
}

/// Compress-upload and download-decompress pipeline.
///
/// Holds only shared, read-only collaborators; every call owns its own
/// temporary artifact, so any number of transfers can run on one instance.
pub struct TransferService {
    registry: Arc<CompressionRegistry>,
    store: Arc<dyn BlobStore>,
    records: Arc<dyn RecordSink>,
    options: TransferOptions,
}

impl TransferService {
    /// Fails with a configuration error before anything is built.
    pub fn new(
        config: &StorageConfig,
        store: Arc<dyn BlobStore>,
        records: Arc<dyn RecordSink>,
    ) -> TransferResult<Self> {
        let registry = CompressionRegistry::new(config.compression_level)?;
        config.check()?;

        Ok(Self::with_registry(
            Arc::new(registry),
            store,
            records,
            TransferOptions::from(config),
        ))
    }

    pub fn with_registry(
        registry: Arc<CompressionRegistry>,
        store: Arc<dyn BlobStore>,
        records: Arc<dyn RecordSink>,
        options: TransferOptions,
    ) -> Self {
        Self {
            registry,
            store,
            records,
            options,
        }
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn registry(&self) -> &CompressionRegistry {
        &self.registry
    }

    fn resolve_format(&self, format: Option<CompressionFormat>) -> CompressionFormat {
        format.unwrap_or(self.options.default_format)
    }

    fn create_temp(&self, format: CompressionFormat) -> TransferResult<ScopedTempFile> {
        ScopedTempFile::create(self.options.temp_dir.as_deref(), format)
            .map_err(crate::error::TransferError::TempFile)
    }
}
