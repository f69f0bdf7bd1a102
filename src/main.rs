use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rust_compressed_storage::services::transfer::batch::BatchSummary;
use rust_compressed_storage::{CompressionFormat, DownloadRequest, StorageConfig, TransferRequest};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress files and upload them
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Folder in the bucket (e.g. "data/html")
        #[arg(short, long)]
        folder: Option<String>,

        /// Compression format: gz, bz2, xz, lzma, zlib, zstd
        #[arg(long)]
        format: Option<CompressionFormat>,

        /// Make uploads publicly readable
        #[arg(long, conflicts_with = "private")]
        public: bool,

        /// Keep uploads private
        #[arg(long)]
        private: bool,

        /// Transfers in flight at once
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Download an object and decompress it
    Download {
        /// Stored object name, e.g. "report.html.zstd"
        object: String,

        /// Where to write the decompressed file
        destination: PathBuf,

        #[arg(short, long)]
        folder: Option<String>,

        #[arg(long)]
        format: Option<CompressionFormat>,
    },
    /// List object keys under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_compressed_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StorageConfig::from_env()?;
    info!(
        "🛠️  Config: Bucket={}, Level={}, Format={}, Public={}",
        config.bucket, config.compression_level, config.default_format, config.public_access
    );

    let service = rust_compressed_storage::connect(&config).await?;
    let started = Instant::now();

    match args.command {
        Command::Upload {
            files,
            folder,
            format,
            public,
            private,
            concurrency,
        } => {
            let public_access = if public {
                Some(true)
            } else if private {
                Some(false)
            } else {
                None
            };

            let requests: Vec<TransferRequest> = files
                .iter()
                .filter(|path| {
                    let is_file = path.is_file();
                    if !is_file {
                        tracing::warn!("⚠️  Skipping {}: not a file", path.display());
                    }
                    is_file
                })
                .map(|path| {
                    let mut request = TransferRequest::from_path(path);
                    request.folder_path = folder.clone();
                    request.format = format;
                    request.public_access = public_access;
                    request
                })
                .collect();

            let width = concurrency.unwrap_or(config.max_concurrency);
            let results = service.upload_batch(requests, width).await;
            for record in results.iter().flatten() {
                println!("{}", serde_json::to_string(record)?);
            }

            let summary = BatchSummary::from_results(&results);
            info!(
                "⏱️  Compression and upload time: {:.2?} ({} ok, {} failed)",
                started.elapsed(),
                summary.succeeded,
                summary.failed
            );
            if summary.failed > 0 {
                std::process::exit(1);
            }
        }
        Command::Download {
            object,
            destination,
            folder,
            format,
        } => {
            let mut request = DownloadRequest::new(object, destination);
            request.folder_path = folder;
            request.format = format;

            let bytes = service.download(&request).await?;
            info!(
                "⏱️  Download and decompress time: {:.2?} ({} bytes)",
                started.elapsed(),
                bytes
            );
        }
        Command::List { prefix } => {
            let objects = service.list_objects(&prefix).await?;
            for key in &objects {
                println!("{}", key);
            }
            info!(
                "⏱️  List objects time: {:.2?} ({} objects)",
                started.elapsed(),
                objects.len()
            );
        }
    }

    Ok(())
}
