//! Derived per-row ratio metrics.
//!
//! Division by zero never reaches the float unit: a zero denominator
//! produces [`Ratio::Undefined`].

use diet_insights_analytics_models::{Ratio, RecipeRatios};
use diet_insights_recipe_models::ImputedRecipe;

/// `protein_g / carbs_g`.
#[must_use]
pub fn protein_to_carbs(recipe: &ImputedRecipe) -> Ratio {
    Ratio::of(recipe.protein_g, recipe.carbs_g)
}

/// `carbs_g / fat_g`.
#[must_use]
pub fn carbs_to_fat(recipe: &ImputedRecipe) -> Ratio {
    Ratio::of(recipe.carbs_g, recipe.fat_g)
}

/// Ratio metrics for every row, in input order.
#[must_use]
pub fn recipe_ratios(records: &[ImputedRecipe]) -> Vec<RecipeRatios> {
    records
        .iter()
        .map(|r| RecipeRatios {
            diet_type: r.diet_type.clone(),
            recipe_name: r.recipe_name.clone(),
            protein_to_carbs_ratio: protein_to_carbs(r),
            carbs_to_fat_ratio: carbs_to_fat(r),
        })
        .collect()
}
