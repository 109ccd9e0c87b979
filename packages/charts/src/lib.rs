#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! SVG charts for a finished [`DietAnalysis`].
//!
//! Three charts are produced, each into its own file:
//!
//! | File | Content |
//! |---|---|
//! | [`PROTEIN_BAR_FILE`] | mean protein per diet type |
//! | [`MACRO_HEATMAP_FILE`] | mean protein/carbs/fat per diet type, annotated |
//! | [`TOP_PROTEIN_SCATTER_FILE`] | protein vs carbs for the top-protein recipes |

use std::path::{Path, PathBuf};

use diet_insights_analytics_models::{DietAggregate, DietAnalysis, TopProteinEntry};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub const PROTEIN_BAR_FILE: &str = "avg_protein_by_diet_type.svg";
pub const MACRO_HEATMAP_FILE: &str = "avg_macros_heatmap.svg";
pub const TOP_PROTEIN_SCATTER_FILE: &str = "top_protein_recipes_scatter.svg";

const SIZE: (u32, u32) = (1024, 640);
const FONT: &str = "sans-serif";
const MACRO_LABELS: [&str; 3] = ["Protein (g)", "Carbs (g)", "Fat (g)"];

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// Output directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing to plot.
    #[error("No data for chart {chart}")]
    NoData {
        /// Chart file name.
        chart: &'static str,
    },

    /// Plotting or writing the SVG failed.
    #[error("Failed to render {}: {message}", path.display())]
    Render {
        /// Output file.
        path: PathBuf,
        /// Backend error text.
        message: String,
    },
}

/// Renders all three charts into `dir`, creating it if needed.
///
/// Returns the written paths in table order.
///
/// # Errors
///
/// Returns [`ChartError::Io`] if `dir` cannot be created, otherwise the
/// first chart failure.
pub fn render_all(dir: &Path, analysis: &DietAnalysis) -> Result<Vec<PathBuf>, ChartError> {
    std::fs::create_dir_all(dir)?;

    let bar = dir.join(PROTEIN_BAR_FILE);
    render_protein_bar(&bar, &analysis.aggregates)?;

    let heatmap = dir.join(MACRO_HEATMAP_FILE);
    render_macro_heatmap(&heatmap, &analysis.aggregates)?;

    let scatter = dir.join(TOP_PROTEIN_SCATTER_FILE);
    render_top_protein_scatter(&scatter, &analysis.top_protein)?;

    Ok(vec![bar, heatmap, scatter])
}

/// Bar chart of mean protein per diet type.
///
/// # Errors
///
/// Returns [`ChartError::NoData`] for an empty slice and
/// [`ChartError::Render`] if drawing or writing fails.
pub fn render_protein_bar(path: &Path, aggregates: &[DietAggregate]) -> Result<(), ChartError> {
    if aggregates.is_empty() {
        return Err(ChartError::NoData {
            chart: PROTEIN_BAR_FILE,
        });
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    draw_protein_bar(&root, aggregates)
        .and_then(|()| root.present())
        .map_err(|e| render_error(path, &e))?;
    log::info!("Rendered {}", path.display());
    Ok(())
}

/// Annotated heatmap of mean protein, carbs, and fat per diet type.
///
/// # Errors
///
/// Returns [`ChartError::NoData`] for an empty slice and
/// [`ChartError::Render`] if drawing or writing fails.
pub fn render_macro_heatmap(path: &Path, aggregates: &[DietAggregate]) -> Result<(), ChartError> {
    if aggregates.is_empty() {
        return Err(ChartError::NoData {
            chart: MACRO_HEATMAP_FILE,
        });
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    draw_macro_heatmap(&root, aggregates)
        .and_then(|()| root.present())
        .map_err(|e| render_error(path, &e))?;
    log::info!("Rendered {}", path.display());
    Ok(())
}

/// Scatter of protein against carbs for the top-protein recipes, one
/// colour per diet type.
///
/// # Errors
///
/// Returns [`ChartError::NoData`] for an empty slice and
/// [`ChartError::Render`] if drawing or writing fails.
pub fn render_top_protein_scatter(
    path: &Path,
    entries: &[TopProteinEntry],
) -> Result<(), ChartError> {
    if entries.is_empty() {
        return Err(ChartError::NoData {
            chart: TOP_PROTEIN_SCATTER_FILE,
        });
    }
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    draw_top_protein_scatter(&root, entries)
        .and_then(|()| root.present())
        .map_err(|e| render_error(path, &e))?;
    log::info!("Rendered {}", path.display());
    Ok(())
}

fn render_error(path: &Path, e: &dyn std::fmt::Display) -> ChartError {
    ChartError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn draw_protein_bar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    aggregates: &[DietAggregate],
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let labels: Vec<String> = aggregates.iter().map(|a| a.diet_type.clone()).collect();
    let max = aggregates
        .iter()
        .map(|a| a.mean_protein_g)
        .fold(0.0_f64, f64::max);
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption("Average Protein by Diet Type", (FONT, 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d((0..segment_count(labels.len())).into_segmented(), 0.0..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(v, &labels))
        .x_desc("Diet type")
        .y_desc("Average protein (g)")
        .draw()?;

    chart.draw_series(aggregates.iter().zip(0u32..).map(|(a, i)| {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), a.mean_protein_g),
            ],
            BLUE.mix(0.7).filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    Ok(())
}

fn draw_macro_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    aggregates: &[DietAggregate],
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let diets: Vec<String> = aggregates.iter().map(|a| a.diet_type.clone()).collect();
    let macros: Vec<String> = MACRO_LABELS.iter().map(ToString::to_string).collect();
    let cells: Vec<(u32, u32, f64)> = aggregates
        .iter()
        .zip(0u32..)
        .flat_map(|(a, row)| {
            [a.mean_protein_g, a.mean_carbs_g, a.mean_fat_g]
                .into_iter()
                .zip(0u32..)
                .map(move |(value, col)| (col, row, value))
        })
        .collect();
    let max = cells.iter().map(|c| c.2).fold(0.0_f64, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption("Average Macronutrients by Diet Type", (FONT, 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(120)
        .build_cartesian_2d(
            (0..segment_count(macros.len())).into_segmented(),
            (0..segment_count(diets.len())).into_segmented(),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(macros.len())
        .y_labels(diets.len())
        .x_label_formatter(&|v| segment_label(v, &macros))
        .y_label_formatter(&|v| segment_label(v, &diets))
        .draw()?;

    chart.draw_series(cells.iter().map(|&(col, row, value)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(col), SegmentValue::Exact(row)),
                (SegmentValue::Exact(col + 1), SegmentValue::Exact(row + 1)),
            ],
            heat_color(value, max).filled(),
        )
    }))?;

    let annotation = TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(cells.iter().map(|&(col, row, value)| {
        Text::new(
            format!("{value:.1}"),
            (SegmentValue::CenterOf(col), SegmentValue::CenterOf(row)),
            annotation.clone(),
        )
    }))?;

    Ok(())
}

fn draw_top_protein_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    entries: &[TopProteinEntry],
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let x_max = entries.iter().map(|e| e.carbs_g).fold(0.0_f64, f64::max);
    let y_max = entries.iter().map(|e| e.protein_g).fold(0.0_f64, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption("Top Protein Recipes: Protein vs Carbs", (FONT, 28))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(0.0..padded(x_max), 0.0..padded(y_max))?;

    chart
        .configure_mesh()
        .x_desc("Carbs (g)")
        .y_desc("Protein (g)")
        .draw()?;

    let mut diets: Vec<&str> = Vec::new();
    for entry in entries {
        if !diets.contains(&entry.diet_type.as_str()) {
            diets.push(&entry.diet_type);
        }
    }

    for (idx, diet) in diets.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(
                entries
                    .iter()
                    .filter(|e| e.diet_type == *diet)
                    .map(|e| Circle::new((e.carbs_g, e.protein_g), 6, color.filled())),
            )?
            .label(*diet)
            .legend(move |(x, y)| Circle::new((x, y), 6, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    Ok(())
}

fn segment_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn segment_label(value: &SegmentValue<u32>, labels: &[String]) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| labels.get(i))
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

fn padded(max: f64) -> f64 {
    if max > 0.0 { max * 1.15 } else { 1.0 }
}

/// White for zero, deep blue at `max`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
fn heat_color(value: f64, max: f64) -> RGBColor {
    let t = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    let channel = |from: f64, to: f64| (from + (to - from) * t).round() as u8;
    RGBColor(channel(255.0, 8.0), channel(255.0, 69.0), channel(255.0, 148.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(diet_type: &str, protein: f64, carbs: f64, fat: f64) -> DietAggregate {
        DietAggregate {
            diet_type: diet_type.to_string(),
            mean_protein_g: protein,
            mean_carbs_g: carbs,
            mean_fat_g: fat,
            most_common_cuisine: None,
            record_count: 1,
            mean_calories: None,
        }
    }

    fn entry(diet_type: &str, protein: f64, carbs: f64) -> TopProteinEntry {
        TopProteinEntry {
            diet_type: diet_type.to_string(),
            recipe_name: None,
            protein_g: protein,
            carbs_g: carbs,
            cuisine_type: None,
        }
    }

    fn analysis() -> DietAnalysis {
        DietAnalysis {
            total_records: 4,
            aggregates: vec![
                aggregate("vegan", 25.0, 60.0, 10.0),
                aggregate("keto", 55.0, 5.0, 70.0),
            ],
            top_protein: vec![
                entry("vegan", 30.0, 50.0),
                entry("vegan", 20.0, 70.0),
                entry("keto", 55.0, 5.0),
            ],
            highest_protein_diet: Some("keto".to_string()),
            ratios: Vec::new(),
        }
    }

    #[test]
    fn render_all_writes_three_svgs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts");

        let paths = render_all(&out, &analysis()).unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            [PROTEIN_BAR_FILE, MACRO_HEATMAP_FILE, TOP_PROTEIN_SCATTER_FILE]
        );
        for path in &paths {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"), "{}", path.display());
        }
    }

    #[test]
    fn bar_chart_labels_diet_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROTEIN_BAR_FILE);
        render_protein_bar(&path, &analysis().aggregates).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("vegan"));
        assert!(svg.contains("keto"));
    }

    #[test]
    fn heatmap_annotates_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MACRO_HEATMAP_FILE);
        render_macro_heatmap(&path, &analysis().aggregates).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("55.0"));
        assert!(svg.contains("70.0"));
    }

    #[test]
    fn empty_input_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_top_protein_scatter(&dir.path().join("x.svg"), &[]).unwrap_err();
        assert!(matches!(err, ChartError::NoData { .. }));
    }

    #[test]
    fn render_error_names_the_file() {
        let err = ChartError::Render {
            path: PathBuf::from("charts/avg_macros_heatmap.svg"),
            message: "backend closed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to render charts/avg_macros_heatmap.svg: backend closed"
        );
    }

    #[test]
    fn heat_color_spans_white_to_blue() {
        assert_eq!(heat_color(0.0, 10.0), RGBColor(255, 255, 255));
        assert_eq!(heat_color(10.0, 10.0), RGBColor(8, 69, 148));
        assert_eq!(heat_color(5.0, 0.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn segment_labels_fall_back_to_empty() {
        let labels = vec!["a".to_string()];
        assert_eq!(segment_label(&SegmentValue::CenterOf(0), &labels), "a");
        assert_eq!(segment_label(&SegmentValue::CenterOf(3), &labels), "");
        assert_eq!(segment_label(&SegmentValue::Last, &labels), "");
    }
}
