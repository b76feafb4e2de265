//! Command line tool for blob-backed attachments.
//!
//! Configuration comes from the `BLOB_*` environment variables (a `.env`
//! file is honored). The bucket key never appears in any output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use tb_attachments::{AttachmentService, BlobObjectStorage, MimeValidator, ObjectStorage};
use tb_blob_client::BlobClient;
use tb_core::BlobStorageConfig;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "taskboard-blob",
    version,
    about = "Manage Taskboard attachments in blob storage"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved storage configuration
    Status,
    /// Download an attachment into a local file
    Get {
        /// Storage key of the attachment
        key: String,
        /// Local file to write
        output: PathBuf,
    },
    /// Upload a local file under a destination prefix
    Put {
        /// Local file to upload
        source: PathBuf,
        /// Destination prefix, e.g. "tasks/42"
        destination: String,
    },
    /// Remove an attachment and its thumbnail
    Remove {
        /// Storage key of the attachment
        key: String,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,tb_attachments=debug,tb_blob_client=debug")
        }))
        .with(fmt::layer())
        .init();
}

async fn connect(
    config: &BlobStorageConfig,
) -> anyhow::Result<(Arc<dyn ObjectStorage>, AttachmentService)> {
    if !config.is_configured() {
        anyhow::bail!(
            "blob storage is not configured; set BLOB_BUCKET_KEY, BLOB_BUCKET_ID and BLOB_API_BASE_URL"
        );
    }

    let client = BlobClient::from_config(config)
        .await
        .context("failed to connect to the blob service")?;
    let validator = MimeValidator::new(config.uploads.allowed_mime_types.as_str());
    let storage: Arc<dyn ObjectStorage> =
        Arc::new(BlobObjectStorage::new(Arc::new(client), validator));
    let service = AttachmentService::new(storage.clone(), config.uploads.clone());
    Ok((storage, service))
}

fn value_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

fn print_status(config: &BlobStorageConfig) {
    let key_state = if config.bucket.key.is_empty() {
        "(unset)"
    } else {
        "(set)"
    };
    let oidc_state = if config.oidc.is_some() {
        "configured"
    } else {
        "not configured"
    };
    let allowed_types = if config.uploads.allowed_mime_types.trim().is_empty() {
        "(default list)"
    } else {
        config.uploads.allowed_mime_types.as_str()
    };

    println!("bucket id:     {}", value_or_unset(&config.bucket.id));
    println!("service url:   {}", value_or_unset(&config.bucket.base_url));
    println!("bucket key:    {key_state}");
    println!("oidc:          {oidc_state}");
    println!("allowed types: {allowed_types}");
    if config.uploads.max_upload_size_mb == 0 {
        println!("max size:      unlimited");
    } else {
        println!("max size:      {} MB", config.uploads.max_upload_size_mb);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = BlobStorageConfig::from_env().unwrap_or_else(|e| {
        warn!("Failed to load configuration from environment: {e}, using defaults");
        BlobStorageConfig::default()
    });

    match cli.command {
        Commands::Status => {
            print_status(&config);
        }
        Commands::Get { key, output } => {
            let (storage, _service) = connect(&config).await?;
            let mut file = tokio::fs::File::create(&output)
                .await
                .with_context(|| format!("failed to create {}", output.display()))?;
            storage.output(&key, &mut file).await?;
            println!("Wrote {} to {}", key, output.display());
        }
        Commands::Put {
            source,
            destination,
        } => {
            let (_storage, service) = connect(&config).await?;
            let filename = source
                .file_name()
                .and_then(|name| name.to_str())
                .context("source path has no usable filename")?
                .to_string();
            let content = tokio::fs::read(&source)
                .await
                .with_context(|| format!("failed to read {}", source.display()))?;
            let record = service
                .upload(&destination, &filename, Bytes::from(content))
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Remove { key } => {
            let (_storage, service) = connect(&config).await?;
            service.delete(&key).await?;
            println!("Removed {key}");
        }
    }

    Ok(())
}
