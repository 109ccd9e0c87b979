#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Uploads a local dataset file to blob storage and lists the container.
//!
//! Exits 1 if the file is missing or the upload fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use diet_insights_cli_utils::{banner, init_logger};
use diet_insights_pipeline::config::{self, DEFAULT_BLOB};
use diet_insights_pipeline::report;
use diet_insights_pipeline::upload::{UploadReport, upload_dataset};
use diet_insights_pipeline::{ErrorKind, PipelineError};
use diet_insights_storage::StorageClient;

#[derive(Parser)]
#[command(
    name = "diet_insights_upload",
    about = "Upload a dataset file to blob storage"
)]
struct Cli {
    /// File to upload; the blob takes its file name
    #[arg(default_value = DEFAULT_BLOB)]
    file: PathBuf,
    /// Target container (overrides `DIET_INSIGHTS_CONTAINER`)
    #[arg(long)]
    container: Option<String>,
}

async fn execute(file: &std::path::Path, container: &str) -> Result<UploadReport, PipelineError> {
    if let Ok(meta) = std::fs::metadata(file) {
        log::info!("File size: {} bytes", meta.len());
    }
    let storage = StorageClient::connect_from_env().await?;
    upload_dataset(&storage, file, container).await
}

fn print_report(report: &UploadReport) {
    println!();
    println!("Verification:");
    println!("  Blob size: {} bytes", report.properties.size);
    println!(
        "  Content type: {}",
        report.properties.content_type.as_deref().unwrap_or("-")
    );
    println!("  Last modified: {}", report.properties.last_modified);
    println!();
    println!("Blobs in container '{}':", report.reference.container);
    print!("{}", report::blob_listing(&report.blobs));
    println!();
    println!("{}", banner("UPLOAD COMPLETED SUCCESSFULLY"));
    println!("Container: {}", report.reference.container);
    println!("Blob name: {}", report.reference.blob);
    println!("Uploaded: {} bytes", report.bytes);
    println!("URL: {}", report.url);
}

#[tokio::main]
async fn main() -> ExitCode {
    let _multi = init_logger();
    let cli = Cli::parse();
    let container = config::container(cli.container);

    println!("{}", banner("BLOB UPLOAD UTILITY"));
    println!("File to upload: {}", cli.file.display());
    println!("Container: {container}");
    println!();

    match execute(&cli.file, &container).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Upload failed: {e}");
            if matches!(e.kind(), ErrorKind::Connection | ErrorKind::Config) {
                eprintln!();
                eprintln!("Troubleshooting tips:");
                eprintln!("  1. Ensure the blob service (or its emulator) is running");
                eprintln!("  2. Check AZURE_STORAGE_CONNECTION_STRING or AZURE_STORAGE_ENDPOINT/ACCOUNT/KEY");
                eprintln!("  3. Confirm AZURE_STORAGE_USE_HTTPS matches the endpoint scheme");
            }
            ExitCode::FAILURE
        }
    }
}
