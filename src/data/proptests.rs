use std::collections::BTreeSet;

use proptest::prelude::*;

use super::domain::DomainIndex;
use super::evaluate::{compute_visible, compute_visible_indexed};
use super::filter::{set_selection, FilterState};
use super::model::{Dataset, Row};

const COLUMNS: [&str; 3] = ["a", "b", "c"];

fn arb_cell() -> impl Strategy<Value = Option<String>> {
    // Small alphabet so that selections actually hit rows; `None` models a
    // missing cell and "" an empty one.
    prop_oneof![
        8 => prop::sample::select(vec!["", "x", "y", "z"]).prop_map(|s| Some(s.to_string())),
        1 => Just(None),
    ]
}

fn arb_dataset() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(prop::collection::vec(arb_cell(), COLUMNS.len()), 0..40).prop_map(
        |cells| {
            let rows = cells
                .into_iter()
                .map(|row| {
                    COLUMNS
                        .iter()
                        .zip(row)
                        .filter_map(|(col, v)| v.map(|v| (col.to_string(), v)))
                        .collect::<Row>()
                })
                .collect();
            Dataset::with_columns(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
        },
    )
}

fn arb_state() -> impl Strategy<Value = FilterState> {
    prop::collection::vec(
        (
            prop::sample::select(COLUMNS.to_vec()),
            prop::collection::btree_set(prop::sample::select(vec!["", "x", "y", "w"]), 0..3),
        ),
        0..4,
    )
    .prop_map(|updates| {
        updates
            .into_iter()
            .fold(FilterState::new(), |s, (col, vals)| s.with_selection(col, vals))
    })
}

proptest! {
    #[test]
    fn domain_lists_every_value_once(ds in arb_dataset()) {
        let index = DomainIndex::build(&ds);
        for col in ds.column_names() {
            let values = index.values(col).unwrap_or(&[]);
            let unique: BTreeSet<&String> = values.iter().collect();
            prop_assert_eq!(unique.len(), values.len());

            let mut first_seen: Vec<String> = Vec::new();
            for row in ds.rows() {
                if let Some(v) = row.get(col) {
                    if !first_seen.iter().any(|s| s == v) {
                        first_seen.push(v.to_string());
                    }
                }
            }
            prop_assert_eq!(values, first_seen.as_slice());
        }
    }

    #[test]
    fn visible_rows_satisfy_every_constraint(ds in arb_dataset(), state in arb_state()) {
        let visible: BTreeSet<usize> = compute_visible(&ds, &state).into_iter().collect();
        for (pos, row) in ds.rows().iter().enumerate() {
            let passes = state
                .active()
                .all(|(col, sel)| row.get(col).is_some_and(|v| sel.contains(v)));
            prop_assert_eq!(passes, visible.contains(&pos));
        }
    }

    #[test]
    fn visible_rows_keep_dataset_order(ds in arb_dataset(), state in arb_state()) {
        let visible = compute_visible(&ds, &state);
        prop_assert!(visible.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(visible.iter().all(|&i| i < ds.len()));
    }

    #[test]
    fn evaluation_is_repeatable(ds in arb_dataset(), state in arb_state()) {
        prop_assert_eq!(compute_visible(&ds, &state), compute_visible(&ds, &state));
    }

    #[test]
    fn indexed_matches_scan(ds in arb_dataset(), state in arb_state()) {
        let index = DomainIndex::build(&ds);
        let indexed = compute_visible_indexed(&ds, &index, &state).unwrap();
        prop_assert_eq!(indexed, compute_visible(&ds, &state));
    }

    #[test]
    fn reselecting_discards_prior_values(ds in arb_dataset(), state in arb_state()) {
        let index = DomainIndex::build(&ds);
        prop_assume!(index.contains_column("a"));
        let first = set_selection(&state, &index, "a", ["x", "y"]).unwrap();
        let second = set_selection(&first, &index, "a", ["z"]).unwrap();
        let direct = set_selection(&state, &index, "a", ["z"]).unwrap();
        prop_assert_eq!(&second, &direct);
        prop_assert_eq!(compute_visible(&ds, &second), compute_visible(&ds, &direct));
    }

    #[test]
    fn clearing_a_column_restores_its_rows(ds in arb_dataset(), state in arb_state()) {
        let index = DomainIndex::build(&ds);
        prop_assume!(index.contains_column("b"));
        let cleared = set_selection(&state, &index, "b", Vec::<String>::new()).unwrap();
        let without_b = state
            .active()
            .filter(|(col, _)| *col != "b")
            .fold(FilterState::new(), |s, (col, sel)| s.with_selection(col, sel.iter().cloned()));
        prop_assert_eq!(&cleared, &without_b);

        let before: BTreeSet<usize> = compute_visible(&ds, &state).into_iter().collect();
        let after: BTreeSet<usize> = compute_visible(&ds, &cleared).into_iter().collect();
        prop_assert!(before.is_subset(&after));
    }
}
