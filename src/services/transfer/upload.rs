use crate::error::{TransferError, TransferResult};
use crate::models::{TransferRecord, TransferRequest};
use crate::utils::keys;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use super::{CompressedArtifact, TransferService};

impl TransferService {
    /// Compresses `request.source`, uploads it and records the transfer.
    ///
    /// Returns the public URL, or `None` after logging the failure. The
    /// temporary artifact is gone by the time this returns either way.
    pub async fn compress_and_upload(&self, request: TransferRequest) -> Option<String> {
        match self.upload(&request).await {
            Ok(record) => Some(record.file_url),
            Err(e) => {
                tracing::error!(
                    error_kind = e.kind(),
                    "❌ Compress and upload failed for {}: {}",
                    request.source.display(),
                    e
                );
                None
            }
        }
    }

    /// Same pipeline as [`TransferService::compress_and_upload`] with the typed
    /// error preserved.
    pub async fn upload(&self, request: &TransferRequest) -> TransferResult<TransferRecord> {
        let format = self.resolve_format(request.format);
        let is_public = request.public_access.unwrap_or(self.options.public_access);

        // 1. Scoped temp file; removed on drop from here on
        let temp = self.create_temp(format)?;

        // 2. Read and compress
        let data = tokio::fs::read(&request.source)
            .await
            .map_err(|source| TransferError::SourceRead {
                path: request.source.clone(),
                source,
            })?;

        // 3. Original size
        let original_size = data.len() as u64;

        let registry = self.registry.clone();
        let compressed = tokio::task::spawn_blocking(move || registry.compress(format, &data))
            .await
            .map_err(|e| TransferError::Compression {
                format: format.to_string(),
                message: format!("compression task failed: {}", e),
            })??;

        let mut writer = temp.writer().map_err(TransferError::TempFile)?;
        writer
            .write_all(&compressed)
            .await
            .map_err(TransferError::TempFile)?;
        writer.flush().await.map_err(TransferError::TempFile)?;
        drop(writer);

        let artifact = CompressedArtifact::new(temp, compressed.len() as u64, format);
        drop(compressed);

        tracing::debug!(
            "📦 Compressed {} with {} ({} -> {} bytes)",
            request.source.display(),
            format,
            original_size,
            artifact.size()
        );

        // 4. Derived key
        let key = keys::object_key(request.folder_path.as_deref(), &request.object_name, format);

        // 5. Upload
        let file_url = self
            .store
            .store(artifact.path(), &key, is_public)
            .await
            .map_err(|e| TransferError::remote("store", &key, e))?;

        // 6. Release the artifact, then record the transfer
        let compressed_size = artifact.size();
        artifact.delete();

        let record = TransferRecord {
            file_name: keys::file_name(&request.source),
            file_type: keys::file_type(&request.source),
            original_file_size: original_size,
            compressed_file_size: compressed_size,
            file_compression_type: format,
            key: key.clone(),
            file_url,
            created_at: Utc::now(),
        };

        self.records
            .persist(&record)
            .await
            .map_err(|source| TransferError::MetadataPersist {
                key: key.clone(),
                source,
            })?;

        tracing::info!(
            "☁️  Uploaded {} -> {} (public: {})",
            request.source.display(),
            key,
            is_public
        );

        Ok(record)
    }
}
