//! Plain-text tables printed by the binaries.

use std::fmt::Write as _;

use diet_insights_analytics_models::{DietAggregate, DietAnalysis, RecipeRatios, ResultDocument};
use diet_insights_storage::BlobMetadata;

/// Rows of the ratio sample shown after a local run.
pub const RATIO_SAMPLE_ROWS: usize = 5;

/// Mean protein, carbs, and fat per diet type.
#[must_use]
pub fn averages_table(aggregates: &[DietAggregate]) -> String {
    let width = diet_column_width(aggregates.iter().map(|a| a.diet_type.as_str()));
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$} {:>12} {:>12} {:>12} {:>8}",
        "Diet type", "Protein(g)", "Carbs(g)", "Fat(g)", "Records"
    );
    let _ = writeln!(out, "{}", "-".repeat(width + 48));
    for a in aggregates {
        let _ = writeln!(
            out,
            "{:<width$} {:>12.2} {:>12.2} {:>12.2} {:>8}",
            a.diet_type, a.mean_protein_g, a.mean_carbs_g, a.mean_fat_g, a.record_count
        );
    }
    out
}

/// Top-protein recipes, grouped by diet type.
#[must_use]
pub fn top_protein_table(analysis: &DietAnalysis) -> String {
    let mut out = String::new();
    for a in &analysis.aggregates {
        let _ = writeln!(out, "{}:", a.diet_type);
        for (rank, entry) in analysis.top_protein_for(&a.diet_type).enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({:.2} g protein, {})",
                rank + 1,
                entry.recipe_name.as_deref().unwrap_or("<unnamed>"),
                entry.protein_g,
                entry.cuisine_type.as_deref().unwrap_or("unknown cuisine")
            );
        }
    }
    out
}

/// Most common cuisine per diet type.
#[must_use]
pub fn cuisine_modes(aggregates: &[DietAggregate]) -> String {
    let width = diet_column_width(aggregates.iter().map(|a| a.diet_type.as_str()));
    let mut out = String::new();
    for a in aggregates {
        let _ = writeln!(
            out,
            "{:<width$} {}",
            a.diet_type,
            a.most_common_cuisine.as_deref().unwrap_or("-")
        );
    }
    out
}

/// The first `rows` derived ratios.
#[must_use]
pub fn ratio_sample(ratios: &[RecipeRatios], rows: usize) -> String {
    let sample = &ratios[..rows.min(ratios.len())];
    let width = diet_column_width(sample.iter().map(|r| r.diet_type.as_str()));
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$} {:<32} {:>16} {:>14}",
        "Diet type", "Recipe", "Protein/Carbs", "Carbs/Fat"
    );
    for r in sample {
        let _ = writeln!(
            out,
            "{:<width$} {:<32} {:>16} {:>14}",
            r.diet_type,
            truncate(r.recipe_name.as_deref().unwrap_or("<unnamed>"), 32),
            r.protein_to_carbs_ratio.to_string(),
            r.carbs_to_fat_ratio.to_string()
        );
    }
    out
}

/// Summary block printed after a triggered run.
#[must_use]
pub fn processing_summary(document: &ResultDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Total records processed: {}",
        document.total_records_processed
    );
    let _ = writeln!(out, "Diet types analyzed: {}", document.diet_types_analyzed);
    let _ = writeln!(out);
    let _ = writeln!(out, "Average Macronutrients by Diet Type:");
    out.push_str(&averages_table(&document.average_macros));
    out
}

/// Numbered container listing.
#[must_use]
pub fn blob_listing(blobs: &[BlobMetadata]) -> String {
    let mut out = String::new();
    for (i, blob) in blobs.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} ({} bytes)", i + 1, blob.name, blob.size);
    }
    if blobs.is_empty() {
        out.push_str("  (empty)\n");
    }
    out
}

fn diet_column_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Diet type".len())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}
