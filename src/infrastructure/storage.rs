use crate::config::StorageConfig;
use crate::services::storage::{BlobStore, S3BlobStore};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &StorageConfig) -> anyhow::Result<Arc<S3BlobStore>> {
    info!(
        "☁️  Object Storage: {} (Bucket: {})",
        config.endpoint.as_deref().unwrap_or("default endpoint"),
        config.bucket
    );

    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));
    if let Some(endpoint_url) = &config.endpoint {
        loader = loader.endpoint_url(endpoint_url);
    }
    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    let store = S3BlobStore::new(s3_client, config.bucket.clone(), config.region_host.clone())
        .with_multipart(config.multipart_threshold, config.chunk_size);

    ensure_bucket(&store, &config.bucket).await?;

    Ok(Arc::new(store))
}

/// Creates the bucket when it is missing.
pub async fn ensure_bucket(store: &dyn BlobStore, bucket: &str) -> anyhow::Result<()> {
    if store.bucket_exists(bucket).await? {
        info!("✅ Bucket '{}' is ready", bucket);
        return Ok(());
    }

    info!("🪣 Bucket '{}' not found, creating...", bucket);
    store.create_bucket(bucket).await.map_err(|e| {
        tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
        e
    })?;
    info!("✅ Bucket '{}' created successfully", bucket);
    Ok(())
}
