//! Group-by statistics over the imputed rows.
//!
//! Partition keys are compared byte-for-byte: `"Vegan"` and `"vegan "` are
//! different diet types. Partitions keep the order in which their key was
//! first seen, and rows keep input order within a partition.

use std::collections::{BTreeMap, HashMap};

use diet_insights_analytics_models::{DietAggregate, TopProteinEntry};
use diet_insights_recipe_models::ImputedRecipe;

use crate::impute::{column_mean, finite_mean};

/// The rows sharing one diet type.
#[derive(Debug, Clone)]
pub struct DietGroup<'a> {
    /// Partition key.
    pub diet_type: &'a str,
    /// Rows in input order. Never empty.
    pub records: Vec<&'a ImputedRecipe>,
}

impl DietGroup<'_> {
    /// Mean of one numeric field over the group.
    #[must_use]
    pub fn mean(&self, field: impl Fn(&ImputedRecipe) -> f64) -> f64 {
        let values: Vec<f64> = self.records.iter().map(|r| field(*r)).collect();
        finite_mean(&values)
    }
}

/// Partitions rows by diet type, in first-seen order.
#[must_use]
pub fn group_by_diet(records: &[ImputedRecipe]) -> Vec<DietGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DietGroup<'_>> = Vec::new();

    for record in records {
        let slot = *index.entry(record.diet_type.as_str()).or_insert_with(|| {
            groups.push(DietGroup {
                diet_type: record.diet_type.as_str(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups
}

/// Most frequent cuisine in a group.
///
/// Missing cuisines are not counted. Ties go to the lexicographically
/// smallest value, so the result does not depend on row order.
#[must_use]
pub fn mode_cuisine(group: &DietGroup<'_>) -> Option<String> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for cuisine in group.records.iter().filter_map(|r| r.cuisine_type.as_deref()) {
        *counts.entry(cuisine).or_default() += 1;
    }

    let mut best: Option<(&str, u64)> = None;
    for (cuisine, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((cuisine, count));
        }
    }
    best.map(|(cuisine, _)| cuisine.to_string())
}

/// Builds one [`DietAggregate`] per group.
#[must_use]
pub fn diet_aggregates(groups: &[DietGroup<'_>]) -> Vec<DietAggregate> {
    groups
        .iter()
        .map(|group| DietAggregate {
            diet_type: group.diet_type.to_string(),
            mean_protein_g: group.mean(|r| r.protein_g),
            mean_carbs_g: group.mean(|r| r.carbs_g),
            mean_fat_g: group.mean(|r| r.fat_g),
            most_common_cuisine: mode_cuisine(group),
            record_count: group.records.len() as u64,
            mean_calories: column_mean(group.records.iter().map(|r| r.calories)),
        })
        .collect()
}

/// The aggregate with the highest mean protein. On a tie the earliest
/// aggregate wins.
#[must_use]
pub fn highest_protein_diet(aggregates: &[DietAggregate]) -> Option<&DietAggregate> {
    aggregates
        .iter()
        .fold(None, |best: Option<&DietAggregate>, candidate| match best {
            Some(current) if current.mean_protein_g >= candidate.mean_protein_g => Some(current),
            _ => Some(candidate),
        })
}

/// The `limit` highest-protein rows of every group.
///
/// Each group is sorted by descending protein with a stable sort, so rows
/// with equal protein keep their input order. Groups are emitted in
/// first-seen order.
#[must_use]
pub fn top_protein(groups: &[DietGroup<'_>], limit: usize) -> Vec<TopProteinEntry> {
    let mut entries = Vec::new();

    for group in groups {
        let mut ranked = group.records.clone();
        ranked.sort_by(|a, b| b.protein_g.total_cmp(&a.protein_g));

        entries.extend(ranked.into_iter().take(limit).map(|r| TopProteinEntry {
            diet_type: r.diet_type.clone(),
            recipe_name: r.recipe_name.clone(),
            protein_g: r.protein_g,
            carbs_g: r.carbs_g,
            cuisine_type: r.cuisine_type.clone(),
        }));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(diet: &str, name: &str, protein: f64, cuisine: Option<&str>) -> ImputedRecipe {
        ImputedRecipe {
            diet_type: diet.to_string(),
            recipe_name: Some(name.to_string()),
            protein_g: protein,
            carbs_g: 20.0,
            fat_g: 10.0,
            calories: None,
            cuisine_type: cuisine.map(str::to_string),
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let rows = vec![
            recipe("paleo", "a", 1.0, None),
            recipe("dash", "b", 1.0, None),
            recipe("paleo", "c", 1.0, None),
        ];
        let groups = group_by_diet(&rows);
        let keys: Vec<_> = groups.iter().map(|g| g.diet_type).collect();
        assert_eq!(keys, vec!["paleo", "dash"]);
        assert_eq!(groups[0].records.len(), 2);
    }

    #[test]
    fn grouping_is_exact_match() {
        let rows = vec![
            recipe("vegan", "a", 1.0, None),
            recipe("Vegan", "b", 1.0, None),
            recipe("vegan ", "c", 1.0, None),
        ];
        assert_eq!(group_by_diet(&rows).len(), 3);
    }

    #[test]
    fn mode_prefers_most_frequent() {
        let rows = vec![
            recipe("keto", "a", 1.0, Some("french")),
            recipe("keto", "b", 1.0, Some("american")),
            recipe("keto", "c", 1.0, Some("french")),
        ];
        let groups = group_by_diet(&rows);
        assert_eq!(mode_cuisine(&groups[0]).as_deref(), Some("french"));
    }

    #[test]
    fn mode_tie_takes_smallest_value() {
        let rows = vec![
            recipe("keto", "a", 1.0, Some("mexican")),
            recipe("keto", "b", 1.0, Some("british")),
            recipe("keto", "c", 1.0, Some("mexican")),
            recipe("keto", "d", 1.0, Some("british")),
        ];
        let groups = group_by_diet(&rows);
        assert_eq!(mode_cuisine(&groups[0]).as_deref(), Some("british"));
    }

    #[test]
    fn mode_skips_missing_cuisine() {
        let rows = vec![
            recipe("keto", "a", 1.0, None),
            recipe("keto", "b", 1.0, None),
            recipe("keto", "c", 1.0, Some("greek")),
        ];
        let groups = group_by_diet(&rows);
        assert_eq!(mode_cuisine(&groups[0]).as_deref(), Some("greek"));

        let none = vec![recipe("keto", "a", 1.0, None)];
        assert_eq!(mode_cuisine(&group_by_diet(&none)[0]), None);
    }

    #[test]
    fn highest_protein_tie_keeps_first() {
        let rows = vec![
            recipe("dash", "a", 40.0, None),
            recipe("paleo", "b", 40.0, None),
            recipe("vegan", "c", 10.0, None),
        ];
        let aggregates = diet_aggregates(&group_by_diet(&rows));
        assert_eq!(highest_protein_diet(&aggregates).unwrap().diet_type, "dash");
        assert!(highest_protein_diet(&[]).is_none());
    }

    #[test]
    fn top_protein_is_stable_and_bounded() {
        let rows = vec![
            recipe("vegan", "a", 5.0, None),
            recipe("vegan", "b", 9.0, None),
            recipe("vegan", "c", 9.0, None),
            recipe("keto", "k", 70.0, None),
            recipe("vegan", "d", 1.0, None),
            recipe("vegan", "e", 7.0, None),
            recipe("vegan", "f", 9.0, None),
            recipe("vegan", "g", 3.0, None),
        ];
        let entries = top_protein(&group_by_diet(&rows), 5);

        let vegan: Vec<_> = entries
            .iter()
            .filter(|e| e.diet_type == "vegan")
            .map(|e| e.recipe_name.as_deref().unwrap())
            .collect();
        assert_eq!(vegan, vec!["b", "c", "f", "e", "a"]);

        let keto: Vec<_> = entries.iter().filter(|e| e.diet_type == "keto").collect();
        assert_eq!(keto.len(), 1);
        assert_eq!(entries.len(), 6);
    }

    #[test]
    fn group_mean_of_huge_values_stays_finite() {
        let rows = vec![
            recipe("keto", "a", 1.5e308, None),
            recipe("keto", "b", 1.5e308, None),
        ];
        let groups = group_by_diet(&rows);
        let aggregates = diet_aggregates(&groups);
        assert!(aggregates[0].mean_protein_g.is_finite());
        assert!((aggregates[0].mean_protein_g - 1.5e308).abs() <= 1.5e308 * 1e-12);
    }

    #[test]
    fn aggregate_means_per_group() {
        let rows = vec![
            recipe("vegan", "a", 10.0, Some("thai")),
            recipe("vegan", "b", 20.0, Some("thai")),
            recipe("keto", "c", 50.0, Some("greek")),
        ];
        let aggregates = diet_aggregates(&group_by_diet(&rows));
        assert_eq!(aggregates.len(), 2);
        assert!((aggregates[0].mean_protein_g - 15.0).abs() < f64::EPSILON);
        assert!((aggregates[0].mean_carbs_g - 20.0).abs() < f64::EPSILON);
        assert_eq!(aggregates[0].record_count, 2);
        assert_eq!(aggregates[0].mean_calories, None);
        assert_eq!(aggregates[1].most_common_cuisine.as_deref(), Some("greek"));
    }
}
