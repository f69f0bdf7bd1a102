use crate::error::TransferResult;
use crate::models::{DownloadRequest, TransferRecord, TransferRequest};
use futures::StreamExt;

use super::TransferService;

/// Outcome counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results<T, E>(results: &[Result<T, E>]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

impl TransferService {
    /// Runs at most `width` uploads at a time. Results keep input order and a
    /// failed transfer never stops its siblings.
    pub async fn upload_batch(
        &self,
        requests: Vec<TransferRequest>,
        width: usize,
    ) -> Vec<TransferResult<TransferRecord>> {
        let width = width.max(1);
        tracing::info!("🚀 Uploading {} files ({} at a time)", requests.len(), width);

        let results: Vec<_> = futures::stream::iter(requests)
            .map(|request| async move {
                let result = self.upload(&request).await;
                if let Err(e) = &result {
                    tracing::error!(
                        error_kind = e.kind(),
                        "❌ Compress and upload failed for {}: {}",
                        request.source.display(),
                        e
                    );
                }
                result
            })
            .buffered(width)
            .collect()
            .await;

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            "✅ Upload batch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed
        );
        results
    }

    /// URL per request, `None` where the transfer failed.
    pub async fn compress_and_upload_batch(
        &self,
        requests: Vec<TransferRequest>,
        width: usize,
    ) -> Vec<Option<String>> {
        self.upload_batch(requests, width)
            .await
            .into_iter()
            .map(|result| result.ok().map(|record| record.file_url))
            .collect()
    }

    pub async fn download_batch(
        &self,
        requests: Vec<DownloadRequest>,
        width: usize,
    ) -> Vec<TransferResult<u64>> {
        let width = width.max(1);
        tracing::info!("🚀 Downloading {} objects ({} at a time)", requests.len(), width);

        futures::stream::iter(requests)
            .map(|request| async move {
                let result = self.download(&request).await;
                if let Err(e) = &result {
                    tracing::error!(
                        error_kind = e.kind(),
                        "❌ Download and decompress failed for {}: {}",
                        request.object_name,
                        e
                    );
                }
                result
            })
            .buffered(width)
            .collect()
            .await
    }

    pub async fn download_and_decompress_batch(
        &self,
        requests: Vec<DownloadRequest>,
        width: usize,
    ) -> Vec<bool> {
        self.download_batch(requests, width)
            .await
            .into_iter()
            .map(|result| result.is_ok())
            .collect()
    }

    /// Uses the configured width.
    pub async fn upload_all(&self, requests: Vec<TransferRequest>) -> Vec<TransferResult<TransferRecord>> {
        self.upload_batch(requests, self.options.max_concurrency).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary() {
        let results: Vec<Result<u8, ()>> = vec![Ok(1), Err(()), Ok(2)];
        assert_eq!(
            BatchSummary::from_results(&results),
            BatchSummary {
                succeeded: 2,
                failed: 1
            }
        );
    }
}
