//! The triggered run: fetch the dataset blob, analyze it, and store the
//! result document.

use std::path::PathBuf;

use chrono::Utc;
use diet_insights_analytics_models::ResultDocument;
use diet_insights_document_store::DocumentStore;
use diet_insights_source::CsvRecordSource;
use diet_insights_source::progress::ProgressCallback;
use diet_insights_storage::{BlobReference, StorageClient};
use serde::Serialize;

use crate::{ErrorKind, PipelineError};

/// Stages reported to the step progress callback.
const STAGES: u64 = 4;

/// What a triggered run reads and where it writes.
#[derive(Debug, Clone)]
pub struct FunctionRequest {
    /// Dataset blob to download.
    pub blob: BlobReference,
    /// Where the result document goes.
    pub store: DocumentStore,
    /// Result document name inside `store`.
    pub document: String,
}

/// What a successful triggered run produced.
#[derive(Debug)]
pub struct FunctionSuccess {
    /// The persisted aggregate.
    pub document: ResultDocument,
    /// Final path of the written document.
    pub output_file: PathBuf,
    /// Size of the downloaded dataset.
    pub bytes_downloaded: usize,
}

/// Runs download, parse, analysis, and sink strictly in sequence.
///
/// The document is written only after every earlier stage succeeded.
/// `steps` advances once per stage.
///
/// # Errors
///
/// Returns the first failing stage's error; see [`PipelineError::kind`]
/// for the classification.
pub async fn run_function(
    storage: &StorageClient,
    request: &FunctionRequest,
    steps: &dyn ProgressCallback,
) -> Result<FunctionSuccess, PipelineError> {
    steps.set_total(STAGES);

    steps.set_message(format!("Downloading {}", request.blob));
    let bytes = storage.download(&request.blob).await?;
    steps.inc(1);

    steps.set_message("Parsing".to_string());
    let table = CsvRecordSource::new().read_bytes(&bytes)?;
    log::info!("Loaded {} rows from {}", table.len(), request.blob);
    log::info!("Columns: {}", table.columns().join(", "));
    steps.inc(1);

    steps.set_message("Analyzing".to_string());
    let analysis = diet_insights_analytics::analyze(&table)?;
    let document = ResultDocument::new(request.blob.blob.clone(), &analysis, Utc::now());
    steps.inc(1);

    steps.set_message(format!("Writing {}", request.document));
    let output_file = request.store.write(&request.document, &document)?;
    steps.inc(1);
    steps.finish(format!("Stored {}", output_file.display()));

    Ok(FunctionSuccess {
        document,
        output_file,
        bytes_downloaded: bytes.len(),
    })
}

/// Top-level result of a triggered run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Every stage succeeded.
    Success,
    /// A stage failed; see [`FunctionOutcome::error_kind`].
    Error,
}

/// The structured report printed at the end of a triggered run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionOutcome {
    /// `"success"` or `"error"`.
    pub status: OutcomeStatus,
    /// Human-readable summary, the error text on failure.
    pub message: String,
    /// Rows analyzed. Success only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_processed: Option<u64>,
    /// Path of the written document. Success only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Error classification. Failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl FunctionOutcome {
    #[must_use]
    pub fn success(run: &FunctionSuccess) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: "Data processed and stored successfully".to_string(),
            records_processed: Some(run.document.total_records_processed),
            output_file: Some(run.output_file.display().to_string()),
            error_kind: None,
        }
    }

    #[must_use]
    pub fn failure(error: &PipelineError) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: format!("Function execution failed: {error}"),
            records_processed: None,
            output_file: None,
            error_kind: Some(error.kind()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }

    /// Pretty JSON rendering.
    ///
    /// # Errors
    ///
    /// Only fails if serialization itself fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
