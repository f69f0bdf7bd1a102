use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use bytes::Bytes;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Remote bucket primitives used by the transfer pipeline.
///
/// Every call is a potentially failing remote operation; implementations
/// report failures instead of swallowing them and do not retry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `local_path` under `key` and returns the object's public URL.
    async fn store(&self, local_path: &Path, key: &str, is_public: bool) -> Result<String>;
    /// Downloads `key` into `local_path`, replacing its contents. The file
    /// must already exist; it is never created here.
    async fn fetch(&self, key: &str, local_path: &Path) -> Result<()>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
    async fn bucket_exists(&self, name: &str) -> Result<bool>;
    async fn create_bucket(&self, name: &str) -> Result<()>;
    fn object_url(&self, key: &str) -> String;
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    region_host: String,
    multipart_threshold: u64,
    chunk_size: usize,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String, region_host: String) -> Self {
        Self {
            client,
            bucket,
            region_host,
            multipart_threshold: 16 * 1024 * 1024,
            chunk_size: 8 * 1024 * 1024,
        }
    }

    pub fn with_multipart(mut self, threshold: u64, chunk_size: usize) -> Self {
        self.multipart_threshold = threshold;
        self.chunk_size = chunk_size;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn acl(is_public: bool) -> Option<ObjectCannedAcl> {
        is_public.then_some(ObjectCannedAcl::PublicRead)
    }

    async fn put_single(&self, local_path: &Path, key: &str, is_public: bool) -> Result<()> {
        let body = ByteStream::from_path(local_path).await?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_acl(Self::acl(is_public))
            .content_type("application/octet-stream")
            .body(body)
            .send()
            .await?;
        Ok(())
    }

    async fn put_multipart(&self, local_path: &Path, key: &str, is_public: bool) -> Result<()> {
        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .set_acl(Self::acl(is_public))
            .content_type("application/octet-stream")
            .send()
            .await?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow!("No upload ID"))?
            .to_string();

        match self.upload_parts(local_path, key, &upload_id).await {
            Ok(completed_parts) => {
                let completed_multipart_upload = CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build();

                self.client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed_multipart_upload)
                    .send()
                    .await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!("Failed to abort multipart upload for {}: {}", key, abort_err);
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        local_path: &Path,
        key: &str,
        upload_id: &str,
    ) -> Result<Vec<CompletedPart>> {
        let mut reader = tokio::fs::File::open(local_path).await?;
        let mut chunk_index = 1;
        let mut completed_parts = Vec::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let n = read_chunk(&mut reader, &mut buffer).await?;
            if n == 0 {
                break;
            }

            let body = ByteStream::from(Bytes::copy_from_slice(&buffer[..n]));
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(body)
                .part_number(chunk_index)
                .send()
                .await?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(chunk_index)
                    .build(),
            );

            chunk_index += 1;
        }

        Ok(completed_parts)
    }
}

/// Fills `buffer` from `reader`, stopping early only at end of input. Every
/// multipart part except the last is exactly `buffer.len()` bytes.
pub(crate) async fn read_chunk<R>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut n = 0;
    while n < buffer.len() {
        let read = reader.read(&mut buffer[n..]).await?;
        if read == 0 {
            break;
        }
        n += read;
    }
    Ok(n)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, local_path: &Path, key: &str, is_public: bool) -> Result<String> {
        let size = tokio::fs::metadata(local_path).await?.len();

        if size > self.multipart_threshold {
            tracing::debug!("Multipart upload of {} ({} bytes)", key, size);
            self.put_multipart(local_path, key, is_public).await?;
        } else {
            self.put_single(local_path, key, is_public).await?;
        }

        Ok(self.object_url(key))
    }

    async fn fetch(&self, key: &str, local_path: &Path) -> Result<()> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let mut body_reader = output.body.into_async_read();
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(local_path)
            .await?;
        tokio::io::copy(&mut body_reader, &mut file).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await?;

            if let Some(contents) = res.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        objects.push(key);
                    }
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let res = self.client.head_bucket().bucket(name).send().await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!(service_error))
                }
            }
        }
    }

    async fn create_bucket(&self, name: &str) -> Result<()> {
        self.client.create_bucket().bucket(name).send().await?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        crate::utils::keys::public_url(&self.bucket, &self.region_host, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn chunk_sizes(data: &[u8], chunk_size: usize) -> Vec<usize> {
        let mut reader = data;
        let mut buffer = vec![0u8; chunk_size];
        let mut sizes = Vec::new();
        loop {
            let n = read_chunk(&mut reader, &mut buffer).await.unwrap();
            if n == 0 {
                break;
            }
            sizes.push(n);
        }
        sizes
    }

    #[tokio::test]
    async fn test_chunks_are_full_except_last() {
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(chunk_sizes(&data, 1000).await, vec![1000, 1000, 500]);
        assert_eq!(chunk_sizes(&data, 2500).await, vec![2500]);
        assert!(chunk_sizes(&[], 1000).await.is_empty());
    }

    #[tokio::test]
    async fn test_chunks_from_file_reassemble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.zstd");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();

        let mut reader = tokio::fs::File::open(&path).await.unwrap();
        let mut buffer = vec![0u8; 4096];
        let mut rebuilt = Vec::new();
        let mut parts = 0;
        loop {
            let n = read_chunk(&mut reader, &mut buffer).await.unwrap();
            if n == 0 {
                break;
            }
            rebuilt.extend_from_slice(&buffer[..n]);
            parts += 1;
        }
        assert_eq!(parts, 3);
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn test_public_reads_get_acl() {
        assert_eq!(S3BlobStore::acl(true), Some(ObjectCannedAcl::PublicRead));
        assert_eq!(S3BlobStore::acl(false), None);
    }
}
