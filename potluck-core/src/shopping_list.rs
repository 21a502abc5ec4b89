//! Shopping-list consolidation.
//!
//! Merges the ingredient lines of many recipes into one deduplicated list.
//! Two lines are the same item only when both the ingredient name and the
//! measurement unit match exactly; "Salt"/"g" and "Salt"/"kg" stay separate
//! entries.

use std::collections::BTreeMap;

/// One ingredient line of a recipe, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// One consolidated entry of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Consolidate ingredient lines into a shopping list.
///
/// Amounts are summed per (name, measurement_unit) pair. The output is
/// ordered by ingredient name ascending (case-sensitive), ties broken by
/// measurement unit ascending, and contains no duplicate pairs. An empty
/// input yields an empty list.
pub fn aggregate<I>(lines: I) -> Vec<ShoppingListEntry>
where
    I: IntoIterator<Item = IngredientLine>,
{
    // BTreeMap keyed on (name, unit) gives both the dedup and the ordering.
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += line.amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListEntry {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i64) -> IngredientLine {
        IngredientLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_list() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_overlapping_ingredients_are_summed() {
        let result = aggregate(vec![
            line("Salt", "g", 10),
            line("Salt", "g", 5),
            line("Sugar", "g", 20),
        ]);

        assert_eq!(
            result,
            vec![
                ShoppingListEntry {
                    name: "Salt".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 15,
                },
                ShoppingListEntry {
                    name: "Sugar".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 20,
                },
            ]
        );
    }

    #[test]
    fn test_same_name_different_unit_stays_separate() {
        let result = aggregate(vec![line("Milk", "ml", 200), line("Milk", "l", 1)]);

        assert_eq!(result.len(), 2);
        // Ties on name break by unit ascending.
        assert_eq!(result[0].measurement_unit, "l");
        assert_eq!(result[1].measurement_unit, "ml");
    }

    #[test]
    fn test_name_comparison_is_case_sensitive() {
        let result = aggregate(vec![line("salt", "g", 1), line("Salt", "g", 1)]);

        assert_eq!(result.len(), 2);
        // Ordinal ordering puts uppercase before lowercase.
        assert_eq!(result[0].name, "Salt");
        assert_eq!(result[1].name, "salt");
    }
}
