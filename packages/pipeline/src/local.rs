//! Analysis of a dataset file already on disk.

use std::path::{Path, PathBuf};

use chrono::Utc;
use diet_insights_analytics_models::{DietAnalysis, ResultDocument};
use diet_insights_document_store::DocumentStore;
use diet_insights_source::CsvRecordSource;
use diet_insights_source::progress::ProgressCallback;

use crate::PipelineError;

/// Inputs of a local run.
#[derive(Debug, Clone)]
pub struct LocalOptions {
    pub input: PathBuf,
    pub delimiter: u8,
    /// Render charts into this directory; `None` skips rendering.
    pub charts_dir: Option<PathBuf>,
    /// Persist the result document as `(store, name)`.
    pub output: Option<(DocumentStore, String)>,
}

impl LocalOptions {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            delimiter: b',',
            charts_dir: None,
            output: None,
        }
    }
}

#[derive(Debug)]
pub struct LocalRun {
    pub analysis: DietAnalysis,
    pub document: ResultDocument,
    pub charts: Vec<PathBuf>,
    pub output_file: Option<PathBuf>,
}

/// Loads, analyzes, and optionally charts and persists a local file.
///
/// `rows` ticks once per parsed row.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the file does not exist,
/// and the load, analysis, chart, or sink failure otherwise. Nothing is
/// persisted unless the analysis succeeds.
pub fn run_local(
    options: &LocalOptions,
    rows: &dyn ProgressCallback,
) -> Result<LocalRun, PipelineError> {
    let input = options.input.as_path();
    if !input.is_file() {
        return Err(PipelineError::MissingInput {
            path: input.to_path_buf(),
        });
    }

    log::info!("Loading {}", input.display());
    let bytes = std::fs::read(input).map_err(diet_insights_source::SourceError::from)?;
    let table = CsvRecordSource::new()
        .with_delimiter(options.delimiter)
        .read_with_progress(bytes.as_slice(), rows)?;
    log::info!("Loaded {} rows", table.len());

    let analysis = diet_insights_analytics::analyze(&table)?;
    let document = ResultDocument::new(source_identifier(input), &analysis, Utc::now());

    let charts = match &options.charts_dir {
        Some(dir) => diet_insights_charts::render_all(dir, &analysis)?,
        None => Vec::new(),
    };

    let output_file = match &options.output {
        Some((store, name)) => Some(store.write(name, &document)?),
        None => None,
    };

    Ok(LocalRun {
        analysis,
        document,
        charts,
        output_file,
    })
}

fn source_identifier(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}
