#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local batch analysis of a dataset file, with SVG charts.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use diet_insights_cli_utils::{IndicatifProgress, banner, init_logger};
use diet_insights_document_store::DEFAULT_DOCUMENT;
use diet_insights_pipeline::config::{self, DEFAULT_BLOB};
use diet_insights_pipeline::local::{LocalOptions, run_local};
use diet_insights_pipeline::report;

#[derive(Parser)]
#[command(
    name = "diet_insights_analyze",
    about = "Analyze a local recipe dataset and render charts"
)]
struct Cli {
    /// Dataset file (CSV with a header row)
    #[arg(default_value = DEFAULT_BLOB)]
    input: PathBuf,
    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Directory the SVG charts are written to
    #[arg(long, default_value = "charts")]
    charts_dir: PathBuf,
    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
    /// Also store the result document in this directory
    #[arg(long)]
    output: Option<PathBuf>,
    /// Result document name inside `--output`
    #[arg(long, default_value = DEFAULT_DOCUMENT)]
    document: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let delimiter = u8::try_from(cli.delimiter)
        .map_err(|_| format!("delimiter must be a single-byte character, got '{}'", cli.delimiter))?;

    let mut options = LocalOptions::new(cli.input);
    options.delimiter = delimiter;
    options.charts_dir = (!cli.no_charts).then_some(cli.charts_dir);
    options.output = cli
        .output
        .map(|dir| (config::document_store(Some(dir)), cli.document));

    let start = Instant::now();
    let rows = IndicatifProgress::rows_spinner(&multi, "Loading");
    let run = match run_local(&options, rows.as_ref()) {
        Ok(run) => run,
        Err(e) => {
            rows.finish_and_clear();
            log::error!("Analysis failed ({}): {e}", e.kind());
            return Err(e.into());
        }
    };

    println!("{}", banner("AVERAGE MACRONUTRIENTS BY DIET TYPE"));
    print!("{}", report::averages_table(&run.analysis.aggregates));
    println!();

    println!("{}", banner("TOP 5 PROTEIN-RICH RECIPES PER DIET TYPE"));
    print!("{}", report::top_protein_table(&run.analysis));
    println!();

    if let Some(diet) = &run.analysis.highest_protein_diet {
        println!("Diet type with the highest average protein: {diet}");
        println!();
    }

    println!("{}", banner("MOST COMMON CUISINE PER DIET TYPE"));
    print!("{}", report::cuisine_modes(&run.analysis.aggregates));
    println!();

    println!("{}", banner("DERIVED RATIOS (SAMPLE)"));
    print!(
        "{}",
        report::ratio_sample(&run.analysis.ratios, report::RATIO_SAMPLE_ROWS)
    );
    println!();

    for chart in &run.charts {
        println!("Chart: {}", chart.display());
    }
    if let Some(path) = &run.output_file {
        println!("Result document: {}", path.display());
    }

    log::info!(
        "Analyzed {} records in {:.1}s",
        run.analysis.total_records,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
