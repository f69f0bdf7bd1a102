use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;

pub const MIN_COMPRESSION_LEVEL: u32 = 1;
pub const MAX_COMPRESSION_LEVEL: u32 = 9;
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compression formats understood by the registry, named by their tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    Gz,
    Bz2,
    Xz,
    Lzma,
    Zlib,
    #[default]
    Zstd,
}

impl CompressionFormat {
    pub const ALL: [CompressionFormat; 6] = [
        CompressionFormat::Gz,
        CompressionFormat::Bz2,
        CompressionFormat::Xz,
        CompressionFormat::Lzma,
        CompressionFormat::Zlib,
        CompressionFormat::Zstd,
    ];

    /// Tag used in object keys and temp-file suffixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionFormat::Gz => "gz",
            CompressionFormat::Bz2 => "bz2",
            CompressionFormat::Xz => "xz",
            CompressionFormat::Lzma => "lzma",
            CompressionFormat::Zlib => "zlib",
            CompressionFormat::Zstd => "zstd",
        }
    }

    pub fn valid_tags() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionFormat {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == tag)
            .ok_or_else(|| TransferError::UnsupportedFormat {
                tag: s.to_string(),
                valid: Self::valid_tags(),
            })
    }
}

/// A single codec behind the registry. Implementations hold no per-call state.
pub trait CompressionStrategy: Send + Sync {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>>;
}

pub struct GzipStrategy;

impl CompressionStrategy for GzipStrategy {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level));
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        flate2::read::MultiGzDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

pub struct ZlibStrategy;

impl CompressionStrategy for ZlibStrategy {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(level));
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

pub struct Bzip2Strategy;

impl CompressionStrategy for Bzip2Strategy {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(level));
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        bzip2::read::MultiBzDecoder::new(data).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Writes the xz container; reads both xz and legacy `.lzma` streams.
pub struct LzmaStrategy;

impl CompressionStrategy for LzmaStrategy {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let stream = xz2::stream::Stream::new_auto_decoder(u64::MAX, 0)
            .map_err(std::io::Error::other)?;
        let mut out = Vec::new();
        xz2::read::XzDecoder::new_stream(data, stream).read_to_end(&mut out)?;
        Ok(out)
    }
}

pub struct ZstdStrategy;

impl CompressionStrategy for ZstdStrategy {
    fn compress(&self, data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
        zstd::encode_all(data, level as i32)
    }

    fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        zstd::decode_all(data)
    }
}

/// Maps each format tag to its strategy and carries the configured level.
///
/// The registry is immutable after construction, so one instance can be shared
/// behind an `Arc` by any number of concurrent transfers.
#[derive(Clone)]
pub struct CompressionRegistry {
    level: u32,
    strategies: HashMap<CompressionFormat, Arc<dyn CompressionStrategy>>,
}

impl CompressionRegistry {
    pub fn new(level: u32) -> TransferResult<Self> {
        if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&level) {
            return Err(TransferError::Configuration(format!(
                "Compression level must be between {} and {}, got {}",
                MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL, level
            )));
        }

        let lzma: Arc<dyn CompressionStrategy> = Arc::new(LzmaStrategy);
        let mut strategies: HashMap<CompressionFormat, Arc<dyn CompressionStrategy>> =
            HashMap::new();
        strategies.insert(CompressionFormat::Gz, Arc::new(GzipStrategy));
        strategies.insert(CompressionFormat::Bz2, Arc::new(Bzip2Strategy));
        strategies.insert(CompressionFormat::Xz, lzma.clone());
        strategies.insert(CompressionFormat::Lzma, lzma);
        strategies.insert(CompressionFormat::Zlib, Arc::new(ZlibStrategy));
        strategies.insert(CompressionFormat::Zstd, Arc::new(ZstdStrategy));

        Ok(Self { level, strategies })
    }

    /// Replaces the strategy behind one tag.
    pub fn with_strategy(
        mut self,
        format: CompressionFormat,
        strategy: Arc<dyn CompressionStrategy>,
    ) -> Self {
        self.strategies.insert(format, strategy);
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn supported_formats(&self) -> Vec<CompressionFormat> {
        CompressionFormat::ALL
            .iter()
            .copied()
            .filter(|f| self.strategies.contains_key(f))
            .collect()
    }

    fn strategy(&self, format: CompressionFormat) -> TransferResult<&dyn CompressionStrategy> {
        self.strategies
            .get(&format)
            .map(|s| s.as_ref())
            .ok_or_else(|| TransferError::UnsupportedFormat {
                tag: format.to_string(),
                valid: CompressionFormat::valid_tags(),
            })
    }

    pub fn compress(&self, format: CompressionFormat, data: &[u8]) -> TransferResult<Vec<u8>> {
        self.strategy(format)?
            .compress(data, self.level)
            .map_err(|e| TransferError::Compression {
                format: format.to_string(),
                message: e.to_string(),
            })
    }

    pub fn decompress(&self, format: CompressionFormat, data: &[u8]) -> TransferResult<Vec<u8>> {
        self.strategy(format)?
            .decompress(data)
            .map_err(|e| TransferError::CorruptData {
                format: format.to_string(),
                message: e.to_string(),
            })
    }
}

impl fmt::Debug for CompressionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionRegistry")
            .field("level", &self.level)
            .field("formats", &self.supported_formats())
            .finish()
    }
}

/// Original size divided by compressed size. `None` when nothing was written.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> Option<f64> {
    if compressed_size == 0 {
        return None;
    }
    Some(original_size as f64 / compressed_size as f64)
}
