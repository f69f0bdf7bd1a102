use crate::services::compression::CompressionFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One compress-and-upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: PathBuf,
    pub object_name: String,
    pub folder_path: Option<String>,
    /// `None` falls back to the service's configured default format.
    pub format: Option<CompressionFormat>,
    /// `None` falls back to the service's configured ACL.
    pub public_access: Option<bool>,
}

impl TransferRequest {
    pub fn new(source: impl Into<PathBuf>, object_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            object_name: object_name.into(),
            folder_path: None,
            format: None,
            public_access: None,
        }
    }

    /// Uses the file name of `source` as the object name.
    pub fn from_path(source: impl AsRef<Path>) -> Self {
        let source = source.as_ref();
        Self::new(source, crate::utils::keys::file_name(source))
    }

    pub fn folder(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn format(mut self, format: CompressionFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn public(mut self, public_access: bool) -> Self {
        self.public_access = Some(public_access);
        self
    }
}

/// One download-and-decompress call. `object_name` is the stored name,
/// format suffix included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub object_name: String,
    pub destination: PathBuf,
    pub folder_path: Option<String>,
    pub format: Option<CompressionFormat>,
}

impl DownloadRequest {
    pub fn new(object_name: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            object_name: object_name.into(),
            destination: destination.into(),
            folder_path: None,
            format: None,
        }
    }

    pub fn folder(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn format(mut self, format: CompressionFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Metadata written once per successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub file_name: String,
    pub file_type: String,
    pub original_file_size: u64,
    pub compressed_file_size: u64,
    pub file_compression_type: CompressionFormat,
    pub key: String,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn compression_ratio(&self) -> Option<f64> {
        crate::services::compression::compression_ratio(
            self.original_file_size,
            self.compressed_file_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = TransferRequest::from_path("/data/pages/report.html")
            .folder("data/html")
            .format(CompressionFormat::Gz)
            .public(true);
        assert_eq!(request.object_name, "report.html");
        assert_eq!(request.folder_path.as_deref(), Some("data/html"));
        assert_eq!(request.format, Some(CompressionFormat::Gz));
        assert_eq!(request.public_access, Some(true));

        let download = DownloadRequest::new("report.html.gz", "/tmp/report.html").folder("data");
        assert_eq!(download.format, None);
        assert_eq!(download.folder_path.as_deref(), Some("data"));
    }

    #[test]
    fn test_record_serializes_format_tag() {
        let record = TransferRecord {
            file_name: "report.html".to_string(),
            file_type: "html".to_string(),
            original_file_size: 400,
            compressed_file_size: 100,
            file_compression_type: CompressionFormat::Zstd,
            key: "data/report.html.zstd".to_string(),
            file_url: "https://b.host/data/report.html.zstd".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["file_compression_type"], "zstd");
        assert_eq!(record.compression_ratio(), Some(4.0));
    }
}
