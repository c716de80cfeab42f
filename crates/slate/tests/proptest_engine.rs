// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Invariants that must hold for arbitrary tables.

use proptest::prelude::*;
use slate::aggregator::aggregate;
use slate::classifier::classify;
use slate::responder::respond;
use slate::{Cell, ChartSpec, Series, Table};

fn cell_strategy() -> impl Strategy<Value = Cell> {
    prop_oneof![
        (-1.0e6f64..1.0e6).prop_map(Cell::Number),
        (-1000i32..1000).prop_map(|n| Cell::Text(n.to_string())),
        "[a-zA-Z ]{0,8}".prop_map(Cell::Text),
        any::<bool>().prop_map(Cell::Bool),
        Just(Cell::Empty),
    ]
}

fn table_strategy() -> impl Strategy<Value = Table> {
    (1usize..5, 0usize..30).prop_flat_map(|(width, height)| {
        prop::collection::vec(prop::collection::vec(cell_strategy(), height), width).prop_map(
            |columns| {
                Table::from_columns(
                    columns
                        .into_iter()
                        .enumerate()
                        .map(|(i, values)| (format!("col{i}"), values))
                        .collect(),
                )
            },
        )
    })
}

proptest! {
    #[test]
    fn prop_classify_covers_requested_columns(table in table_strategy()) {
        let roles = classify(&table, table.columns());
        prop_assert_eq!(roles.len(), table.columns().len());
        for column in table.columns() {
            prop_assert!(roles.get(column).is_some());
        }
    }

    #[test]
    fn prop_classify_is_idempotent(table in table_strategy()) {
        let before = table.clone();
        let first = classify(&table, table.columns());
        let second = classify(&table, table.columns());
        prop_assert_eq!(first, second);
        prop_assert_eq!(table, before);
    }

    #[test]
    fn prop_histogram_counts_every_finite_value(table in table_strategy(), bins in 1usize..20) {
        let finite = table.numeric_values("col0", false).len();
        match aggregate(&table, &ChartSpec::histogram("col0", bins)) {
            Series::Histogram(histogram) => {
                let total: usize = histogram.iter().map(|b| b.count).sum();
                prop_assert_eq!(total, finite);
                if finite > 0 {
                    prop_assert_eq!(histogram.len(), bins);
                }
            }
            other => prop_assert!(false, "unexpected series {:?}", other),
        }
    }

    #[test]
    fn prop_bar_respects_category_limit(table in table_strategy()) {
        match aggregate(&table, &ChartSpec::bar("col0", "col1")) {
            Series::Bar(groups) => {
                prop_assert!(groups.len() <= 10);
                let rows: usize = groups.iter().map(|g| g.count).sum();
                prop_assert!(rows <= table.len());
            }
            other => prop_assert!(false, "unexpected series {:?}", other),
        }
    }

    #[test]
    fn prop_every_stage_is_total(table in table_strategy(), query in "[a-z ]{0,24}") {
        let roles = classify(&table, table.columns());
        for spec in [
            ChartSpec::pie("col0"),
            ChartSpec::line("col0", "col1"),
            ChartSpec::scatter("col1", "col0"),
            ChartSpec::card("col0"),
            ChartSpec::slicer("col1"),
        ] {
            let _ = aggregate(&table, &spec);
        }
        prop_assert!(!respond(&query, &table, &roles).is_empty());
    }
}
