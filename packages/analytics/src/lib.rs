#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for the nutrition dataset.
//!
//! A run is a single pass over an already-materialized table:
//!
//! 1. [`impute::impute`] fills missing numeric cells with their column mean.
//! 2. [`aggregate::group_by_diet`] partitions the rows by diet type.
//! 3. Group means, mode cuisine, top-protein ranking, and per-row ratios are
//!    computed from the partitions.
//!
//! Every step takes its input by reference and returns new values; nothing
//! is mutated in place.

pub mod aggregate;
pub mod impute;
pub mod ratios;

use diet_insights_analytics_models::DietAnalysis;
use diet_insights_recipe_models::{NumericColumn, RecipeTable};
use thiserror::Error;

/// Number of recipes kept per diet type in the protein ranking.
pub const TOP_PROTEIN_LIMIT: usize = 5;

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A numeric column has no values to average, so its missing cells
    /// cannot be imputed.
    #[error("Column '{column}' has no non-missing values to compute a mean from")]
    EmptyColumn {
        /// The column with nothing to average.
        column: NumericColumn,
    },
}

/// Runs the full analysis over a parsed table.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyColumn`] if a numeric column present in
/// the table has no non-missing values.
pub fn analyze(table: &RecipeTable) -> Result<DietAnalysis, AnalyticsError> {
    let imputed = impute::impute(table)?;
    let groups = aggregate::group_by_diet(&imputed);

    let aggregates = aggregate::diet_aggregates(&groups);
    let highest_protein_diet =
        aggregate::highest_protein_diet(&aggregates).map(|a| a.diet_type.clone());
    let top_protein = aggregate::top_protein(&groups, TOP_PROTEIN_LIMIT);
    let ratios = ratios::recipe_ratios(&imputed);

    log::info!(
        "Analyzed {} records across {} diet types",
        imputed.len(),
        aggregates.len()
    );

    Ok(DietAnalysis {
        total_records: imputed.len() as u64,
        aggregates,
        top_protein,
        highest_protein_diet,
        ratios,
    })
}

#[cfg(test)]
mod tests {
    use diet_insights_analytics_models::Ratio;
    use diet_insights_recipe_models::{
        CALORIES, CARBS, CUISINE_TYPE, DIET_TYPE, FAT, PROTEIN, RECIPE_NAME, RecipeRecord,
    };

    use super::*;

    fn record(diet: &str, name: &str, protein: f64, cuisine: &str) -> RecipeRecord {
        RecipeRecord {
            diet_type: diet.to_string(),
            recipe_name: Some(name.to_string()),
            protein_g: Some(protein),
            carbs_g: Some(10.0),
            fat_g: Some(5.0),
            calories: Some(protein * 10.0),
            cuisine_type: Some(cuisine.to_string()),
        }
    }

    fn table(records: Vec<RecipeRecord>) -> RecipeTable {
        let columns = [DIET_TYPE, RECIPE_NAME, CUISINE_TYPE, PROTEIN, CARBS, FAT, CALORIES]
            .iter()
            .map(ToString::to_string)
            .collect();
        RecipeTable::new(columns, records)
    }

    fn six_rows() -> RecipeTable {
        table(vec![
            record("vegan", "a", 10.0, "indian"),
            record("vegan", "b", 20.0, "thai"),
            record("keto", "c", 50.0, "american"),
            record("vegan", "d", 30.0, "indian"),
            record("keto", "e", 60.0, "french"),
            record("vegan", "f", 40.0, "thai"),
        ])
    }

    #[test]
    fn end_to_end_six_rows() {
        let analysis = analyze(&six_rows()).unwrap();

        let vegan = analysis.aggregate("vegan").unwrap();
        let keto = analysis.aggregate("keto").unwrap();
        assert!((vegan.mean_protein_g - 25.0).abs() < f64::EPSILON);
        assert!((keto.mean_protein_g - 55.0).abs() < f64::EPSILON);
        assert_eq!(vegan.record_count, 4);
        assert_eq!(keto.record_count, 2);
        assert_eq!(analysis.highest_protein_diet.as_deref(), Some("keto"));
        assert_eq!(analysis.total_records, 6);
    }

    #[test]
    fn aggregates_follow_first_seen_order() {
        let analysis = analyze(&six_rows()).unwrap();
        let order: Vec<_> = analysis
            .aggregates
            .iter()
            .map(|a| a.diet_type.as_str())
            .collect();
        assert_eq!(order, vec!["vegan", "keto"]);
    }

    #[test]
    fn record_counts_sum_to_total() {
        let analysis = analyze(&six_rows()).unwrap();
        let sum: u64 = analysis.aggregates.iter().map(|a| a.record_count).sum();
        assert_eq!(sum, analysis.total_records);
    }

    #[test]
    fn top_protein_sizes_are_bounded() {
        let analysis = analyze(&six_rows()).unwrap();
        for aggregate in &analysis.aggregates {
            let entries: Vec<_> = analysis.top_protein_for(&aggregate.diet_type).collect();
            let expected = usize::try_from(aggregate.record_count)
                .unwrap()
                .min(TOP_PROTEIN_LIMIT);
            assert_eq!(entries.len(), expected);
            assert!(
                entries
                    .windows(2)
                    .all(|w| w[0].protein_g >= w[1].protein_g)
            );
        }
    }

    #[test]
    fn ratios_cover_every_row() {
        let analysis = analyze(&six_rows()).unwrap();
        assert_eq!(analysis.ratios.len(), 6);
        assert_eq!(analysis.ratios[0].protein_to_carbs_ratio, Ratio::Defined(1.0));
        assert_eq!(analysis.ratios[0].carbs_to_fat_ratio, Ratio::Defined(2.0));
    }

    #[test]
    fn empty_table_is_a_data_error() {
        let err = analyze(&table(vec![])).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptyColumn { .. }));
    }
}
