use crate::config::StorageConfig;
use crate::error::{TransferError, TransferResult};
use crate::models::{DownloadRequest, TransferRecord, TransferRequest};
use crate::services::transfer::TransferService;
use tokio::runtime::Runtime;

/// Synchronous front for [`TransferService`]: one request at a time, run to
/// completion on an owned single-threaded runtime.
///
/// Must not be created or used from inside another tokio runtime.
pub struct BlockingTransferService {
    runtime: Runtime,
    inner: TransferService,
}

impl BlockingTransferService {
    pub fn new(inner: TransferService) -> TransferResult<Self> {
        Ok(Self {
            runtime: build_runtime()?,
            inner,
        })
    }

    /// Builds the S3 client and record database on the owned runtime.
    pub fn connect(config: &StorageConfig) -> anyhow::Result<Self> {
        let runtime = build_runtime()?;
        let inner = runtime.block_on(crate::connect(config))?;
        Ok(Self { runtime, inner })
    }

    pub fn compress_and_upload(&self, request: TransferRequest) -> Option<String> {
        self.runtime.block_on(self.inner.compress_and_upload(request))
    }

    pub fn upload(&self, request: &TransferRequest) -> TransferResult<TransferRecord> {
        self.runtime.block_on(self.inner.upload(request))
    }

    pub fn download_and_decompress(&self, request: DownloadRequest) -> bool {
        self.runtime.block_on(self.inner.download_and_decompress(request))
    }

    pub fn download(&self, request: &DownloadRequest) -> TransferResult<u64> {
        self.runtime.block_on(self.inner.download(request))
    }

    pub fn list_objects(&self, prefix: &str) -> TransferResult<Vec<String>> {
        self.runtime.block_on(self.inner.list_objects(prefix))
    }

    pub fn inner(&self) -> &TransferService {
        &self.inner
    }
}

fn build_runtime() -> TransferResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TransferError::Configuration(format!("Failed to start runtime: {}", e)))
}
