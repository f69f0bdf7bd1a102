pub mod config;
pub mod entities;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::StorageConfig;
pub use crate::error::{TransferError, TransferResult};
pub use crate::models::{DownloadRequest, TransferRecord, TransferRequest};
pub use crate::services::blocking::BlockingTransferService;
pub use crate::services::compression::{CompressionFormat, CompressionRegistry};
pub use crate::services::records::{DatabaseRecordSink, RecordSink};
pub use crate::services::storage::{BlobStore, S3BlobStore};
pub use crate::services::transfer::{TransferOptions, TransferService};

use crate::infrastructure::{database, storage};
use std::sync::Arc;

/// Wires the S3 store and the database record sink into a [`TransferService`].
pub async fn connect(config: &StorageConfig) -> anyhow::Result<TransferService> {
    config.check()?;

    let store = storage::setup_storage(config).await?;
    let db = database::setup_database(&config.database_url).await?;
    let records = Arc::new(DatabaseRecordSink::new(db));

    Ok(TransferService::new(config, store, records)?)
}
