//! Property-based tests for the response extractor

use proptest::prelude::*;

use crate::core::generation::{extract_fields, strip_outer_emphasis, FieldContract};

// ============================================================================
// Strategies
// ============================================================================

/// Field values free of markers and emphasis
fn arb_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:!?()-]{1,60}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][A-Z0-9_]{0,7}", 1..8).prop_map(|s| s.into_iter().collect())
}

/// Contract ids paired with values, in a shuffled response order
fn arb_fields() -> impl Strategy<Value = (Vec<String>, Vec<(String, String)>)> {
    arb_ids().prop_flat_map(|ids| {
        let n = ids.len();
        (
            Just(ids.clone()),
            prop::collection::vec(arb_value(), n)
                .prop_map(move |values| ids.clone().into_iter().zip(values).collect::<Vec<_>>())
                .prop_shuffle(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whatever the provider sends, the map has exactly the contract's keys
    #[test]
    fn prop_result_matches_contract(ids in arb_ids(), raw in ".{0,400}") {
        let contract = FieldContract::from_ids(ids).unwrap();
        let map = extract_fields(&raw, &contract);
        prop_assert!(map.matches_contract(&contract));
    }

    /// Well-formed responses round-trip every value, in any order
    #[test]
    fn prop_well_formed_values_recovered((ids, pairs) in arb_fields()) {
        let contract = FieldContract::from_ids(ids).unwrap();
        let raw: String = pairs
            .iter()
            .map(|(id, v)| format!("[START_{id}]{v}[END_{id}]\n"))
            .collect();

        let map = extract_fields(&raw, &contract);
        for (id, value) in &pairs {
            prop_assert_eq!(map.get(id), Some(value.trim()));
        }
    }

    /// Dropping every end marker loses nothing: the next start delimiter ends a field
    #[test]
    fn prop_missing_end_markers_tolerated((ids, pairs) in arb_fields()) {
        let contract = FieldContract::from_ids(ids).unwrap();
        let raw: String = pairs
            .iter()
            .map(|(id, v)| format!("[START_{id}]{v}\n"))
            .collect();

        let map = extract_fields(&raw, &contract);
        for (id, value) in &pairs {
            prop_assert_eq!(map.get(id), Some(value.trim()));
        }
    }

    /// Any number of whole-value emphasis layers unwraps to the bare value
    #[test]
    fn prop_emphasis_layers_unwrap(value in arb_value(), layers in 0usize..5) {
        let wrapped = format!("{}{}{}", "**".repeat(layers), value, "**".repeat(layers));
        prop_assert_eq!(strip_outer_emphasis(&wrapped), value.trim());
    }

    /// Unwrapping converges after one application
    #[test]
    fn prop_unwrap_is_idempotent(raw in "[a-z* ]{0,40}") {
        let once = strip_outer_emphasis(&raw);
        prop_assert_eq!(strip_outer_emphasis(&once), once);
    }
}
