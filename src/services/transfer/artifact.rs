use crate::services::compression::CompressionFormat;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// A temporary file owned by exactly one transfer.
///
/// The file is removed by [`ScopedTempFile::delete`] on the success path and by
/// `Drop` on every other path, including when the owning future is cancelled.
/// A guard only exists once the file was created, so there is never anything to
/// clean up for a transfer that failed before this point.
#[derive(Debug)]
pub struct ScopedTempFile {
    file: NamedTempFile,
}

impl ScopedTempFile {
    pub fn create(dir: Option<&Path>, format: CompressionFormat) -> io::Result<Self> {
        let suffix = format!(".{}", format);
        let mut builder = tempfile::Builder::new();
        builder.prefix("transfer-").suffix(&suffix);

        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Async handle to the already-open file. Writes through this handle never
    /// recreate the path once the guard has removed it.
    pub fn writer(&self) -> io::Result<tokio::fs::File> {
        Ok(tokio::fs::File::from_std(self.file.reopen()?))
    }

    /// Removes the file now. Consumes the guard, so it cannot run twice.
    pub fn delete(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }
    }
}

/// Compressed bytes staged on disk, waiting for upload.
#[derive(Debug)]
pub struct CompressedArtifact {
    temp: ScopedTempFile,
    size: u64,
    format: CompressionFormat,
}

impl CompressedArtifact {
    pub fn new(temp: ScopedTempFile, size: u64, format: CompressionFormat) -> Self {
        Self { temp, size, format }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn format(&self) -> CompressionFormat {
        self.format
    }

    pub fn delete(self) {
        self.temp.delete();
    }
}
