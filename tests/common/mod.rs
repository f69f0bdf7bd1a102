#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use rust_compressed_storage::services::compression::CompressionRegistry;
use rust_compressed_storage::{
    BlobStore, CompressionFormat, RecordSink, TransferOptions, TransferRecord, TransferService,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const BUCKET_URL: &str = "https://test-bucket.blr1.digitaloceanspaces.com";

#[derive(Default)]
pub struct MockBlobStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub acl: Mutex<HashMap<String, bool>>,
    pub buckets: Mutex<HashSet<String>>,
    /// Temp paths handed to `store`, in call order.
    pub seen_paths: Mutex<Vec<PathBuf>>,
    pub fail_store: AtomicBool,
    pub fail_list: AtomicBool,
    pub store_delay: Option<Duration>,
    pub fetch_delay: Option<Duration>,
    /// Calls to `store` or `fetch` running right now, and the peak seen.
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store_delay(delay: Duration) -> Self {
        Self {
            store_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn peak_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    pub fn put(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn store(&self, local_path: &Path, key: &str, is_public: bool) -> anyhow::Result<String> {
        self.seen_paths.lock().unwrap().push(local_path.to_path_buf());
        let _in_flight = self.enter();

        if let Some(delay) = self.store_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated upload failure"));
        }

        let data = tokio::fs::read(local_path).await?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        self.acl.lock().unwrap().insert(key.to_string(), is_public);
        Ok(self.object_url(key))
    }

    async fn fetch(&self, key: &str, local_path: &Path) -> anyhow::Result<()> {
        let _in_flight = self.enter();
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let data = self
            .get(key)
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(local_path)
            .await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &data).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated listing failure"));
        }
        Ok(self
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }

    async fn bucket_exists(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.buckets.lock().unwrap().contains(name))
    }

    async fn create_bucket(&self, name: &str) -> anyhow::Result<()> {
        self.buckets.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", BUCKET_URL, key)
    }
}

#[derive(Default)]
pub struct MockRecordSink {
    pub records: Mutex<Vec<TransferRecord>>,
    pub fail: AtomicBool,
}

impl MockRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for MockRecordSink {
    async fn persist(&self, record: &TransferRecord) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated database failure"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Service plus the directories it works in. `temp` is where scoped
/// artifacts live, so it must be empty whenever no transfer is running.
pub struct Harness {
    pub service: TransferService,
    pub store: Arc<MockBlobStore>,
    pub sink: Arc<MockRecordSink>,
    pub temp: TempDir,
    pub files: TempDir,
}

impl Harness {
    pub fn new(store: MockBlobStore, sink: MockRecordSink) -> Self {
        let registry = CompressionRegistry::new(6).unwrap();
        Self::with_registry(registry, store, sink)
    }

    pub fn with_registry(
        registry: CompressionRegistry,
        store: MockBlobStore,
        sink: MockRecordSink,
    ) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let temp_dir = temp.path().to_path_buf();
        Self::build(registry, store, sink, temp, Some(temp_dir))
    }

    /// Points the service at `temp_dir` instead of the harness's own temp dir.
    pub fn with_temp_dir(store: MockBlobStore, sink: MockRecordSink, temp_dir: PathBuf) -> Self {
        let registry = CompressionRegistry::new(6).unwrap();
        let temp = tempfile::tempdir().unwrap();
        Self::build(registry, store, sink, temp, Some(temp_dir))
    }

    fn build(
        registry: CompressionRegistry,
        store: MockBlobStore,
        sink: MockRecordSink,
        temp: TempDir,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        let files = tempfile::tempdir().unwrap();
        let store = Arc::new(store);
        let sink = Arc::new(sink);

        let options = TransferOptions {
            public_access: false,
            default_format: CompressionFormat::Zstd,
            temp_dir,
            max_concurrency: 4,
        };
        let service = TransferService::with_registry(
            Arc::new(registry),
            store.clone(),
            sink.clone(),
            options,
        );

        Self {
            service,
            store,
            sink,
            temp,
            files,
        }
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.files.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn temp_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}

pub fn html_page(n: usize) -> Vec<u8> {
    format!(
        "<html><head><title>Page {n}</title></head><body>{}</body></html>",
        "<p>product listing row</p>".repeat(50 + n)
    )
    .into_bytes()
}
