use crate::error::{TransferError, TransferResult};
use crate::services::compression::{CompressionFormat, DEFAULT_COMPRESSION_LEVEL};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

/// Configuration for compressed transfers to an S3-compatible store
#[derive(Debug, Clone, Validate)]
pub struct StorageConfig {
    /// Bucket (Space) name
    #[validate(length(min = 3, max = 63))]
    pub bucket: String,

    /// Signing region (default: "blr1")
    pub region: String,

    /// Endpoint URL, e.g. "https://blr1.digitaloceanspaces.com"
    pub endpoint: Option<String>,

    pub access_key: Option<String>,
    pub secret_key: Option<String>,

    /// Host used to build public URLs (default: "blr1.digitaloceanspaces.com")
    pub region_host: String,

    /// Default ACL for uploads when a request does not override it (default: false)
    pub public_access: bool,

    /// Compression level 1-9 (default: 6)
    #[validate(range(min = 1, max = 9))]
    pub compression_level: u32,

    /// Format used when a caller does not pick one (default: zstd)
    pub default_format: CompressionFormat,

    /// Concurrent transfers in a batch (default: 16)
    #[validate(range(min = 1, max = 1024))]
    pub max_concurrency: usize,

    /// Directory for scoped temporary artifacts (default: OS temp dir)
    pub temp_dir: Option<PathBuf>,

    /// Artifacts above this size use multipart upload (default: 16 MB)
    pub multipart_threshold: u64,

    /// Multipart part size in bytes (default: 8 MB, S3 minimum is 5 MB)
    #[validate(range(min = 5242880))]
    pub chunk_size: usize,

    /// Record sink database (default: "sqlite://transfers.db?mode=rwc")
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "compressed-storage".to_string(),
            region: "blr1".to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            region_host: "blr1.digitaloceanspaces.com".to_string(),
            public_access: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            default_format: CompressionFormat::Zstd,
            max_concurrency: 16,
            temp_dir: None,
            multipart_threshold: 16 * 1024 * 1024, // 16 MB
            chunk_size: 8 * 1024 * 1024,           // 8 MB
            database_url: "sqlite://transfers.db?mode=rwc".to_string(),
        }
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults; a variable that is set but does
    /// not parse is a configuration error.
    pub fn from_env() -> TransferResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StorageConfig::from_env`] over any key lookup.
    pub fn from_lookup<F>(lookup: F) -> TransferResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let default_format = match lookup("COMPRESSION_FORMAT") {
            Some(tag) => tag.parse::<CompressionFormat>()?,
            None => default.default_format,
        };

        Ok(Self {
            bucket: lookup("STORAGE_BUCKET").unwrap_or(default.bucket),

            region: lookup("DO_SPACES_REGION").unwrap_or(default.region),

            endpoint: lookup("DO_SPACES_ENDPOINT"),
            access_key: lookup("DO_SPACES_KEY"),
            secret_key: lookup("DO_SPACES_SECRET"),

            region_host: lookup("STORAGE_REGION_HOST").unwrap_or(default.region_host),

            public_access: lookup("PUBLIC_ACCESS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.public_access),

            compression_level: parse_var(&lookup, "COMPRESSION_LEVEL", default.compression_level)?,

            default_format,

            max_concurrency: parse_var(&lookup, "TRANSFER_CONCURRENCY", default.max_concurrency)?,

            temp_dir: lookup("TRANSFER_TEMP_DIR").map(PathBuf::from),

            multipart_threshold: parse_var(
                &lookup,
                "MULTIPART_THRESHOLD",
                default.multipart_threshold,
            )?,

            chunk_size: parse_var(&lookup, "CHUNK_SIZE", default.chunk_size)?,

            database_url: lookup("DATABASE_URL").unwrap_or(default.database_url),
        })
    }

    /// Config for local runs and tests (MinIO endpoint, in-memory records)
    pub fn development() -> Self {
        Self {
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            region_host: "127.0.0.1:9000".to_string(),
            max_concurrency: 4,
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    /// Runs the field checks; a failure here is fatal before anything is built.
    pub fn check(&self) -> TransferResult<()> {
        self.validate()
            .map_err(|e| TransferError::Configuration(e.to_string()))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> TransferResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            TransferError::Configuration(format!("Invalid {}='{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.default_format, CompressionFormat::Zstd);
        assert!(!config.public_access);
        assert_eq!(config.region_host, "blr1.digitaloceanspaces.com");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = StorageConfig::development();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        for level in [0, 10] {
            let config = StorageConfig {
                compression_level: level,
                ..StorageConfig::default()
            };
            let err = config.check().unwrap_err();
            assert_eq!(err.kind(), "CONFIGURATION_ERROR");
        }
    }

    #[test]
    fn test_small_chunk_size_rejected() {
        let config = StorageConfig {
            chunk_size: 1024,
            ..StorageConfig::default()
        };
        assert!(config.check().is_err());
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_lookup_reads_values() {
        let config = StorageConfig::from_lookup(lookup_from(&[
            ("STORAGE_BUCKET", "pages"),
            ("COMPRESSION_FORMAT", "XZ"),
            ("COMPRESSION_LEVEL", "9"),
            ("TRANSFER_CONCURRENCY", " 8 "),
            ("PUBLIC_ACCESS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.bucket, "pages");
        assert_eq!(config.default_format, CompressionFormat::Xz);
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.max_concurrency, 8);
        assert!(config.public_access);
        assert_eq!(config.chunk_size, StorageConfig::default().chunk_size);
    }

    #[test]
    fn test_lookup_empty_uses_defaults() {
        let config = StorageConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.default_format, CompressionFormat::Zstd);
        assert_eq!(config.compression_level, DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = StorageConfig::from_lookup(lookup_from(&[("COMPRESSION_FORMAT", "rar")]))
            .unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedFormat { .. }));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("zstd"));
    }

    #[test]
    fn test_unparsable_level_rejected() {
        let err = StorageConfig::from_lookup(lookup_from(&[("COMPRESSION_LEVEL", "eleven")]))
            .unwrap_err();
        assert_eq!(err.kind(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("COMPRESSION_LEVEL"));

        let err = StorageConfig::from_lookup(lookup_from(&[("CHUNK_SIZE", "8MB")])).unwrap_err();
        assert!(err.is_configuration());
    }
}
