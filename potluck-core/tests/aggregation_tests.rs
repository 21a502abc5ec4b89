//! Integration tests for shopping-list consolidation and short links.
//!
//! These exercise the properties the server relies on: totals equal the
//! arithmetic sum of every contributing line, output ordering is stable,
//! and short-link tokens are unique per save event.

use potluck_core::short_link::generate_short_link;
use potluck_core::shopping_list::{aggregate, IngredientLine};
use std::collections::HashSet;

fn line(name: &str, unit: &str, amount: i64) -> IngredientLine {
    IngredientLine {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        amount,
    }
}

/// A cart of several recipes with heavy ingredient overlap, written out as
/// the flat line list the server feeds the aggregator.
fn overlapping_cart() -> Vec<IngredientLine> {
    vec![
        // borscht
        line("Beetroot", "g", 400),
        line("Onion", "pcs", 1),
        line("Salt", "g", 10),
        // pelmeni
        line("Flour", "g", 500),
        line("Onion", "pcs", 2),
        line("Salt", "g", 5),
        // bread
        line("Flour", "g", 300),
        line("Salt", "g", 7),
        line("Water", "ml", 250),
    ]
}

#[test]
fn test_totals_equal_sum_of_contributing_lines() {
    let lines = overlapping_cart();
    let result = aggregate(lines.clone());

    for entry in &result {
        let expected: i64 = lines
            .iter()
            .filter(|l| l.name == entry.name && l.measurement_unit == entry.measurement_unit)
            .map(|l| l.amount)
            .sum();
        assert_eq!(
            entry.total_amount, expected,
            "wrong total for {} ({})",
            entry.name, entry.measurement_unit
        );
    }

    // Nothing is lost: grand totals match too.
    let input_total: i64 = lines.iter().map(|l| l.amount).sum();
    let output_total: i64 = result.iter().map(|e| e.total_amount).sum();
    assert_eq!(input_total, output_total);
}

#[test]
fn test_output_is_sorted_and_deduplicated() {
    let result = aggregate(overlapping_cart());

    let keys: Vec<(String, String)> = result
        .iter()
        .map(|e| (e.name.clone(), e.measurement_unit.clone()))
        .collect();

    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted, "output must be ordered by (name, unit)");

    let unique: HashSet<_> = keys.iter().collect();
    assert_eq!(unique.len(), keys.len(), "no duplicate (name, unit) pairs");
}

#[test]
fn test_totals_are_at_least_one() {
    // Line amounts are validated to be >= 1 before storage, so every
    // consolidated total must be >= 1 as well.
    for entry in aggregate(overlapping_cart()) {
        assert!(entry.total_amount >= 1);
    }
}

#[test]
fn test_single_recipe_cart_passes_through() {
    let result = aggregate(vec![line("Egg", "pcs", 3)]);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Egg");
    assert_eq!(result[0].total_amount, 3);
}

#[test]
fn test_short_links_distinct_across_save_events() {
    // Same author publishing many recipes: every (timestamp, cooking_time)
    // combination must yield a distinct token.
    let mut seen = HashSet::new();
    for offset in 0..50u64 {
        let token = generate_short_link(1_700_000_000_000 + offset, 7, 10 + offset).unwrap();
        assert!(seen.insert(token), "token collision at offset {offset}");
    }
}
