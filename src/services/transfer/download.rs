use crate::error::{TransferError, TransferResult};
use crate::models::DownloadRequest;
use crate::utils::keys;
use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::TransferService;

impl TransferService {
    /// Fetches an object and writes its decompressed contents to
    /// `request.destination`. Returns `false` after logging on any failure;
    /// a failed call leaves neither a temp file nor a destination file.
    pub async fn download_and_decompress(&self, request: DownloadRequest) -> bool {
        match self.download(&request).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    error_kind = e.kind(),
                    "❌ Download and decompress failed for {}: {}",
                    request.object_name,
                    e
                );
                false
            }
        }
    }

    /// Returns the number of decompressed bytes written.
    pub async fn download(&self, request: &DownloadRequest) -> TransferResult<u64> {
        let format = self.resolve_format(request.format);
        let key = keys::source_key(request.folder_path.as_deref(), &request.object_name);

        let temp = self.create_temp(format)?;

        self.store
            .fetch(&key, temp.path())
            .await
            .map_err(|e| TransferError::remote("fetch", &key, e))?;

        let compressed = tokio::fs::read(temp.path())
            .await
            .map_err(TransferError::TempFile)?;

        let registry = self.registry.clone();
        let data = tokio::task::spawn_blocking(move || registry.decompress(format, &compressed))
            .await
            .map_err(|e| TransferError::CorruptData {
                format: format.to_string(),
                message: format!("decompression task failed: {}", e),
            })??;

        write_destination(&request.destination, &data).await?;
        temp.delete();

        tracing::info!(
            "📥 Downloaded {} -> {} ({} bytes)",
            key,
            request.destination.display(),
            data.len()
        );

        Ok(data.len() as u64)
    }
}

/// Stages the output next to `path` and renames it into place, so a failed
/// write neither leaves a partial file nor touches an existing one.
async fn write_destination(path: &Path, data: &[u8]) -> TransferResult<()> {
    let failed = |source: io::Error| TransferError::DestinationWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".download-")
        .tempfile_in(parent)
        .map_err(failed)?;

    let mut file = tokio::fs::File::from_std(staged.reopen().map_err(failed)?);
    file.write_all(data).await.map_err(failed)?;
    file.flush().await.map_err(failed)?;
    drop(file);

    staged.persist(path).map_err(|e| failed(e.error))?;
    Ok(())
}
