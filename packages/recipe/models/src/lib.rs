#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Recipe row types for the nutrition dataset.
//!
//! A dataset is one row per recipe. Rows come out of the record source as
//! [`RecipeRecord`]s, where every numeric column may be missing, and leave
//! the imputer as [`ImputedRecipe`]s, where the macronutrient columns are
//! guaranteed to be present.

use serde::{Deserialize, Serialize};

/// Header of the diet type column (the grouping key).
pub const DIET_TYPE: &str = "diet_type";
/// Header of the recipe name column.
pub const RECIPE_NAME: &str = "recipe_name";
/// Header of the cuisine type column.
pub const CUISINE_TYPE: &str = "cuisine_type";
/// Header of the protein column (grams).
pub const PROTEIN: &str = "protein_g";
/// Header of the carbohydrate column (grams).
pub const CARBS: &str = "carbs_g";
/// Header of the fat column (grams).
pub const FAT: &str = "fat_g";
/// Header of the calories column.
pub const CALORIES: &str = "calories";

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[DIET_TYPE, PROTEIN, CARBS, FAT, CUISINE_TYPE];

/// Second accepted spelling of each column: the headers of the published
/// `All_Diets.csv` dataset.
pub const HEADER_ALIASES: &[(&str, &str)] = &[
    (DIET_TYPE, "Diet_type"),
    (RECIPE_NAME, "Recipe_name"),
    (CUISINE_TYPE, "Cuisine_type"),
    (PROTEIN, "Protein(g)"),
    (CARBS, "Carbs(g)"),
    (FAT, "Fat(g)"),
    (CALORIES, "Calories"),
];

/// Whether the header cell `header` names `column`, either by its own
/// name or by its dataset alias. Both comparisons are exact byte matches.
#[must_use]
pub fn header_matches(column: &str, header: &str) -> bool {
    header == column
        || HEADER_ALIASES
            .iter()
            .any(|&(name, alias)| name == column && alias == header)
}

/// Cell values treated as missing.
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
];

/// Returns `true` if a raw cell value denotes a missing value.
#[must_use]
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// A numeric column of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    /// `protein_g`.
    Protein,
    /// `carbs_g`.
    Carbs,
    /// `fat_g`.
    Fat,
    /// `calories`.
    Calories,
}

impl NumericColumn {
    /// Every numeric column, in header order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Protein, Self::Carbs, Self::Fat, Self::Calories]
    }

    /// The canonical header string for this column.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Protein => PROTEIN,
            Self::Carbs => CARBS,
            Self::Fat => FAT,
            Self::Calories => CALORIES,
        }
    }

    /// Whether the column must be present in the header row.
    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Calories)
    }

    /// Reads this column's value from a raw record.
    #[must_use]
    pub const fn value(self, record: &RecipeRecord) -> Option<f64> {
        match self {
            Self::Protein => record.protein_g,
            Self::Carbs => record.carbs_g,
            Self::Fat => record.fat_g,
            Self::Calories => record.calories,
        }
    }
}

impl std::fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// One row of the input dataset, as parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// Grouping key, taken verbatim from the cell.
    pub diet_type: String,
    /// Recipe name, `None` when missing or when the column is absent.
    pub recipe_name: Option<String>,
    /// Protein in grams.
    pub protein_g: Option<f64>,
    /// Carbohydrates in grams.
    pub carbs_g: Option<f64>,
    /// Fat in grams.
    pub fat_g: Option<f64>,
    /// Calories, `None` when missing or when the column is absent.
    pub calories: Option<f64>,
    /// Cuisine type, `None` when missing.
    pub cuisine_type: Option<String>,
}

/// An ordered, in-memory dataset together with its header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeTable {
    columns: Vec<String>,
    records: Vec<RecipeRecord>,
}

impl RecipeTable {
    /// Creates a table from a header row and its records (in input order).
    #[must_use]
    pub const fn new(columns: Vec<String>, records: Vec<RecipeRecord>) -> Self {
        Self { columns, records }
    }

    /// Header names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the header row contains column `name` under either
    /// accepted spelling (see [`header_matches`]).
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| header_matches(name, c))
    }

    /// Records in input order.
    #[must_use]
    pub fn records(&self) -> &[RecipeRecord] {
        &self.records
    }

    /// Number of data rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A row after imputation: the macronutrients are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputedRecipe {
    /// Grouping key.
    pub diet_type: String,
    /// Recipe name.
    pub recipe_name: Option<String>,
    /// Protein in grams.
    pub protein_g: f64,
    /// Carbohydrates in grams.
    pub carbs_g: f64,
    /// Fat in grams.
    pub fat_g: f64,
    /// Calories. Only `None` when the dataset has no `Calories` column.
    pub calories: Option<f64>,
    /// Cuisine type (non-numeric, so never imputed).
    pub cuisine_type: Option<String>,
}
