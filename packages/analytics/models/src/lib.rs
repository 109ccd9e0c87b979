#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate result types for the per-diet-type analysis.
//!
//! The aggregation engine produces a [`DietAnalysis`]; the persisted form of
//! a run is a [`ResultDocument`] built from it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group-level statistics for one diet type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietAggregate {
    /// Partition key.
    pub diet_type: String,
    /// Mean protein (g).
    pub mean_protein_g: f64,
    /// Mean carbohydrates (g).
    pub mean_carbs_g: f64,
    /// Mean fat (g).
    pub mean_fat_g: f64,
    /// Most frequent cuisine; `None` if no row in the group has one.
    pub most_common_cuisine: Option<String>,
    /// Rows in the group.
    pub record_count: u64,
    /// Mean calories; `None` if the dataset has no calories column.
    pub mean_calories: Option<f64>,
}

/// One of the highest-protein recipes of a diet type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProteinEntry {
    /// Diet type the recipe belongs to.
    pub diet_type: String,
    /// Recipe name.
    pub recipe_name: Option<String>,
    /// Protein (g).
    pub protein_g: f64,
    /// Carbohydrates (g), kept for the protein/carbs scatter chart.
    pub carbs_g: f64,
    /// Cuisine type.
    pub cuisine_type: Option<String>,
}

/// Result of a division whose denominator may be zero.
///
/// A zero denominator (either sign) produces [`Ratio::Undefined`], which
/// serializes as `null`. `Defined` values are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ratio {
    /// `numerator / denominator`.
    Defined(f64),
    /// The denominator was zero.
    Undefined,
}

impl Ratio {
    /// Divides, returning [`Ratio::Undefined`] for a zero denominator.
    #[must_use]
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Self::Undefined;
        }
        let value = numerator / denominator;
        if value.is_finite() {
            Self::Defined(value)
        } else {
            Self::Undefined
        }
    }
}

impl std::fmt::Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.4}"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// Derived per-row ratio metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRatios {
    /// Diet type of the row.
    pub diet_type: String,
    /// Recipe name of the row.
    pub recipe_name: Option<String>,
    /// `protein_g / carbs_g`.
    pub protein_to_carbs_ratio: Ratio,
    /// `carbs_g / fat_g`.
    pub carbs_to_fat_ratio: Ratio,
}

/// Everything the aggregation engine computes for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietAnalysis {
    /// Rows in the (imputed) dataset.
    pub total_records: u64,
    /// One aggregate per diet type, in first-seen order.
    pub aggregates: Vec<DietAggregate>,
    /// Up to five entries per diet type, grouped in first-seen order and
    /// sorted by descending protein within each group.
    pub top_protein: Vec<TopProteinEntry>,
    /// Diet type with the highest mean protein.
    pub highest_protein_diet: Option<String>,
    /// Per-row ratios, in input order.
    pub ratios: Vec<RecipeRatios>,
}

impl DietAnalysis {
    /// Looks up the aggregate for a diet type.
    #[must_use]
    pub fn aggregate(&self, diet_type: &str) -> Option<&DietAggregate> {
        self.aggregates.iter().find(|a| a.diet_type == diet_type)
    }

    /// Top-protein entries belonging to one diet type.
    pub fn top_protein_for<'a>(
        &'a self,
        diet_type: &'a str,
    ) -> impl Iterator<Item = &'a TopProteinEntry> + 'a {
        self.top_protein
            .iter()
            .filter(move |e| e.diet_type == diet_type)
    }
}

/// The persisted aggregate of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDocument {
    /// When the document was built.
    pub timestamp: DateTime<Utc>,
    /// File or blob the dataset came from.
    pub source_identifier: String,
    /// Rows processed.
    pub total_records_processed: u64,
    /// Distinct diet types.
    pub diet_types_analyzed: u64,
    /// One aggregate per diet type.
    pub average_macros: Vec<DietAggregate>,
    /// Diet type to row count.
    pub diet_type_counts: BTreeMap<String, u64>,
    /// Diet type to mean calories. Empty without a calories column.
    pub average_calories_per_diet: BTreeMap<String, f64>,
}

impl ResultDocument {
    /// Builds the document for a finished analysis.
    #[must_use]
    pub fn new(
        source_identifier: impl Into<String>,
        analysis: &DietAnalysis,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let diet_type_counts = analysis
            .aggregates
            .iter()
            .map(|a| (a.diet_type.clone(), a.record_count))
            .collect();
        let average_calories_per_diet = analysis
            .aggregates
            .iter()
            .filter_map(|a| a.mean_calories.map(|c| (a.diet_type.clone(), c)))
            .collect();

        Self {
            timestamp,
            source_identifier: source_identifier.into(),
            total_records_processed: analysis.total_records,
            diet_types_analyzed: analysis.aggregates.len() as u64,
            average_macros: analysis.aggregates.clone(),
            diet_type_counts,
            average_calories_per_diet,
        }
    }
}
