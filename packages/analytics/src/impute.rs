//! Column-mean imputation for the numeric columns.
//!
//! Each numeric column's missing cells are replaced with the arithmetic mean
//! of that column's non-missing cells. Text columns pass through untouched,
//! missing values included. Because the fill value is the mean itself, the
//! column mean is the same before and after imputation.

use diet_insights_recipe_models::{ImputedRecipe, NumericColumn, RecipeRecord, RecipeTable};

use crate::AnalyticsError;

/// Arithmetic mean over the present values, `None` if there are none.
#[must_use]
pub fn column_mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let values: Vec<f64> = values.into_iter().flatten().collect();
    (!values.is_empty()).then(|| finite_mean(&values))
}

/// Mean of a non-empty slice of finite values.
///
/// Sums directly when the sum stays finite. Otherwise falls back to an
/// incremental mean whose every intermediate value is bounded by the
/// largest input, so the result is finite whenever the inputs are.
#[must_use]
#[allow(clippy::cast_precision_loss)] // row counts are far below 2^52
pub fn finite_mean(values: &[f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        return sum / values.len() as f64;
    }

    let mut mean = 0.0_f64;
    for (i, value) in values.iter().enumerate() {
        let n = (i + 1) as f64;
        mean += value / n - mean / n;
    }
    mean
}

/// Per-column fill values computed from a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMeans {
    /// Mean of `protein_g`.
    pub protein_g: f64,
    /// Mean of `carbs_g`.
    pub carbs_g: f64,
    /// Mean of `fat_g`.
    pub fat_g: f64,
    /// Mean of `calories`, `None` when the column is absent.
    pub calories: Option<f64>,
}

impl ColumnMeans {
    /// Computes the mean of every numeric column present in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::EmptyColumn`] for a present column with no
    /// non-missing values.
    pub fn compute(table: &RecipeTable) -> Result<Self, AnalyticsError> {
        let mean_of = |column: NumericColumn| {
            column_mean(table.records().iter().map(|r| column.value(r)))
                .ok_or(AnalyticsError::EmptyColumn { column })
        };

        let calories = if table.has_column(NumericColumn::Calories.header()) {
            Some(mean_of(NumericColumn::Calories)?)
        } else {
            None
        };

        Ok(Self {
            protein_g: mean_of(NumericColumn::Protein)?,
            carbs_g: mean_of(NumericColumn::Carbs)?,
            fat_g: mean_of(NumericColumn::Fat)?,
            calories,
        })
    }

    /// Fills one record's missing numeric cells.
    #[must_use]
    pub fn fill(&self, record: &RecipeRecord) -> ImputedRecipe {
        ImputedRecipe {
            diet_type: record.diet_type.clone(),
            recipe_name: record.recipe_name.clone(),
            protein_g: record.protein_g.unwrap_or(self.protein_g),
            carbs_g: record.carbs_g.unwrap_or(self.carbs_g),
            fat_g: record.fat_g.unwrap_or(self.fat_g),
            calories: record.calories.or(self.calories),
            cuisine_type: record.cuisine_type.clone(),
        }
    }
}

/// Returns a copy of the table's rows with every missing numeric cell
/// replaced by its column mean, in input order.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyColumn`] if a numeric column present in
/// the table has no non-missing values (including the empty table).
pub fn impute(table: &RecipeTable) -> Result<Vec<ImputedRecipe>, AnalyticsError> {
    let means = ColumnMeans::compute(table)?;
    log::debug!("Imputing with column means: {means:?}");

    let missing = table
        .records()
        .iter()
        .flat_map(|r| NumericColumn::all().iter().map(move |c| c.value(r)))
        .filter(Option::is_none)
        .count();
    if missing > 0 {
        log::info!("Filled {missing} missing numeric values with column means");
    }

    Ok(table.records().iter().map(|r| means.fill(r)).collect())
}

#[cfg(test)]
mod tests {
    use diet_insights_recipe_models::{CARBS, CUISINE_TYPE, DIET_TYPE, FAT, PROTEIN};

    use super::*;

    fn record(protein: Option<f64>, carbs: Option<f64>, fat: Option<f64>) -> RecipeRecord {
        RecipeRecord {
            diet_type: "dash".to_string(),
            recipe_name: None,
            protein_g: protein,
            carbs_g: carbs,
            fat_g: fat,
            calories: None,
            cuisine_type: None,
        }
    }

    fn table(records: Vec<RecipeRecord>) -> RecipeTable {
        let columns = [DIET_TYPE, PROTEIN, CARBS, FAT, CUISINE_TYPE]
            .iter()
            .map(ToString::to_string)
            .collect();
        RecipeTable::new(columns, records)
    }

    #[test]
    fn mean_ignores_missing() {
        let mean = column_mean([Some(1.0), None, Some(3.0)]).unwrap();
        assert!((mean - 2.0).abs() < f64::EPSILON);
        assert_eq!(column_mean([None, None]), None);
    }

    #[test]
    fn mean_of_huge_values_stays_finite() {
        let mean = column_mean([Some(1.5e308), Some(1.5e308)]).unwrap();
        assert!(mean.is_finite());
        assert!((mean - 1.5e308).abs() <= 1.5e308 * 1e-12);

        let mixed = finite_mean(&[f64::MAX, f64::MAX, -f64::MAX]);
        assert!(mixed.is_finite());
        assert!(mixed > 0.0);
    }

    #[test]
    fn fills_missing_with_column_mean() {
        let input = table(vec![
            record(Some(10.0), Some(4.0), None),
            record(None, Some(8.0), Some(2.0)),
            record(Some(30.0), None, Some(6.0)),
        ]);
        let imputed = impute(&input).unwrap();

        assert!((imputed[1].protein_g - 20.0).abs() < f64::EPSILON);
        assert!((imputed[2].carbs_g - 6.0).abs() < f64::EPSILON);
        assert!((imputed[0].fat_g - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn imputation_preserves_column_means() {
        let input = table(vec![
            record(Some(12.5), Some(40.0), Some(3.0)),
            record(None, Some(7.0), None),
            record(Some(31.0), None, Some(11.0)),
            record(Some(2.25), Some(0.5), None),
        ]);
        let before = ColumnMeans::compute(&input).unwrap();
        let imputed = impute(&input).unwrap();

        let after_protein = column_mean(imputed.iter().map(|r| Some(r.protein_g))).unwrap();
        let after_carbs = column_mean(imputed.iter().map(|r| Some(r.carbs_g))).unwrap();
        let after_fat = column_mean(imputed.iter().map(|r| Some(r.fat_g))).unwrap();

        assert!((after_protein - before.protein_g).abs() < 1e-9);
        assert!((after_carbs - before.carbs_g).abs() < 1e-9);
        assert!((after_fat - before.fat_g).abs() < 1e-9);
    }

    #[test]
    fn leaves_text_columns_untouched() {
        let mut with_text = record(None, Some(1.0), Some(1.0));
        with_text.cuisine_type = None;
        with_text.recipe_name = Some("Soup".to_string());
        let input = table(vec![with_text, record(Some(5.0), Some(1.0), Some(1.0))]);

        let imputed = impute(&input).unwrap();
        assert_eq!(imputed[0].cuisine_type, None);
        assert_eq!(imputed[0].recipe_name.as_deref(), Some("Soup"));
        assert_eq!(imputed[0].diet_type, "dash");
    }

    #[test]
    fn all_missing_column_is_an_error() {
        let input = table(vec![record(Some(1.0), None, Some(1.0))]);
        let err = impute(&input).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::EmptyColumn {
                column: NumericColumn::Carbs
            }
        ));
    }

    #[test]
    fn absent_calories_column_stays_absent() {
        let input = table(vec![record(Some(1.0), Some(1.0), Some(1.0))]);
        let imputed = impute(&input).unwrap();
        assert_eq!(imputed[0].calories, None);
    }

    #[test]
    fn present_calories_column_is_imputed() {
        let mut columns: Vec<String> = table(vec![]).columns().to_vec();
        columns.push("Calories".to_string());
        let mut first = record(Some(1.0), Some(1.0), Some(1.0));
        first.calories = Some(200.0);
        let second = record(Some(1.0), Some(1.0), Some(1.0));
        let input = RecipeTable::new(columns, vec![first, second]);

        let imputed = impute(&input).unwrap();
        assert_eq!(imputed[1].calories, Some(200.0));
    }
}
