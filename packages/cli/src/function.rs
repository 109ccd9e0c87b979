#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Triggered run: download the dataset blob, analyze it, and store the
//! result document. Prints a JSON outcome and exits non-zero on failure.
//!
//! Storage settings come from the environment; see
//! [`diet_insights_storage`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use diet_insights_cli_utils::{IndicatifProgress, banner, init_logger};
use diet_insights_document_store::DEFAULT_DOCUMENT;
use diet_insights_pipeline::PipelineError;
use diet_insights_pipeline::config;
use diet_insights_pipeline::function::{
    FunctionOutcome, FunctionRequest, FunctionSuccess, run_function,
};
use diet_insights_pipeline::report;
use diet_insights_storage::{BlobReference, StorageClient};

#[derive(Parser)]
#[command(
    name = "diet_insights_function",
    about = "Process the dataset blob and store the result document"
)]
struct Cli {
    /// Container holding the dataset (overrides `DIET_INSIGHTS_CONTAINER`)
    #[arg(long)]
    container: Option<String>,
    /// Dataset blob name (overrides `DIET_INSIGHTS_BLOB`)
    #[arg(long)]
    blob: Option<String>,
    /// Document store directory (overrides `DIET_INSIGHTS_OUTPUT_DIR`)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Result document name
    #[arg(long, default_value = DEFAULT_DOCUMENT)]
    document: String,
}

async fn execute(
    request: &FunctionRequest,
    multi: &diet_insights_cli_utils::MultiProgress,
) -> Result<FunctionSuccess, PipelineError> {
    let storage = StorageClient::connect_from_env().await?;
    let steps = IndicatifProgress::steps_bar(multi, "Processing");
    let result = run_function(&storage, request, steps.as_ref()).await;
    if result.is_err() {
        steps.finish_and_clear();
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let multi = init_logger();
    let cli = Cli::parse();

    println!("{}", banner("SERVERLESS FUNCTION: Nutritional Data Processor"));

    let request = FunctionRequest {
        blob: BlobReference::new(config::container(cli.container), config::blob(cli.blob)),
        store: config::document_store(cli.output_dir),
        document: cli.document,
    };
    log::info!("Starting function run for {}", request.blob);

    let result = execute(&request, &multi).await;
    let outcome = match &result {
        Ok(run) => FunctionOutcome::success(run),
        Err(e) => {
            log::error!("Function execution failed: {e}");
            FunctionOutcome::failure(e)
        }
    };

    if let Ok(run) = &result {
        println!();
        println!("{}", banner("PROCESSING SUMMARY"));
        print!("{}", report::processing_summary(&run.document));
    }

    println!();
    println!("{}", banner("FUNCTION EXECUTION RESULT"));
    match outcome.to_json() {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Cannot render outcome: {e}"),
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
