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

use slate::aggregator::aggregate;
use slate::classifier::classify;
use slate::responder::respond;
use slate::{BarGroup, Cell, ChartSpec, EngineConfig, Series, Slate, Table, ValueKind};

fn column_with_failures(failures: usize) -> Table {
    let values: Vec<Cell> = (0..10)
        .map(|i: usize| {
            if i < failures {
                Cell::from("n/a")
            } else {
                Cell::Number(i as f64)
            }
        })
        .collect();
    Table::from_columns(vec![("measure", values)])
}

#[test]
fn classify_returns_one_entry_per_requested_column() {
    let table = Table::from_columns(vec![("a", vec!["x"]), ("b", vec!["1"])]);
    let roles = classify(&table, &["b", "a", "missing"]);
    assert_eq!(roles.columns(), vec!["b", "a", "missing"]);
}

#[test]
fn ninety_percent_numeric_sample_is_numeric() {
    let roles = classify(&column_with_failures(1), &["measure"]);
    assert_eq!(roles.get("measure").unwrap().value_kind, ValueKind::Numeric);
}

#[test]
fn seventy_percent_numeric_sample_is_categorical() {
    let roles = classify(&column_with_failures(3), &["measure"]);
    assert_eq!(roles.get("measure").unwrap().value_kind, ValueKind::Categorical);
}

#[test]
fn bar_groups_follow_first_seen_order() {
    let table = Table::from_columns(vec![
        ("cat", vec![Cell::from("A"), Cell::from("B"), Cell::from("A")]),
        ("val", vec![Cell::from(10), Cell::from(5), Cell::from(3)]),
    ]);
    assert_eq!(
        aggregate(&table, &ChartSpec::bar("cat", "val")),
        Series::Bar(vec![
            BarGroup { category: "A".into(), sum: 13.0, count: 2 },
            BarGroup { category: "B".into(), sum: 5.0, count: 1 },
        ])
    );
}

#[test]
fn histogram_maximum_lands_in_last_bin() {
    let table = Table::from_columns(vec![("v", (0..=10_i32).map(Cell::from).collect::<Vec<Cell>>())]);
    let Series::Histogram(bins) = aggregate(&table, &ChartSpec::histogram("v", 10)) else {
        panic!("histogram spec must produce histogram series");
    };
    assert_eq!(bins.len(), 10);
    assert!((bins[0].end - bins[0].start - 1.0).abs() < f64::EPSILON);
    assert_eq!(bins[9].count, 2);
}

#[test]
fn peak_revenue_names_month_and_value() {
    let table = Table::from_columns(vec![
        ("Revenue", vec![Cell::from(100), Cell::from(250), Cell::from(80)]),
        ("Month", vec![Cell::from("Jan"), Cell::from("Feb"), Cell::from("Mar")]),
    ]);
    let roles = classify(&table, table.columns());
    let reply = respond("which month had the max revenue", &table, &roles);
    assert!(reply.contains("Feb"), "{reply}");
    assert!(reply.contains("250"), "{reply}");
}

#[test]
fn classification_is_repeatable_and_leaves_table_alone() {
    let table = Table::from_columns(vec![
        ("Region", vec!["N", "S", ""]),
        ("Sales", vec!["1", "2", "x"]),
        ("Date", vec!["2024-01-01", "2024-02-01", "2024-03-01"]),
    ]);
    let before = table.clone();
    let first = classify(&table, table.columns());
    let second = classify(&table, table.columns());
    assert_eq!(first, second);
    assert_eq!(table, before);
}

#[test]
fn empty_table_is_handled_by_every_stage() {
    let table = Table::default();
    let roles = classify(&table, &["Revenue", "Month"]);
    assert_eq!(roles.len(), 2);

    for spec in [
        ChartSpec::bar("Month", "Revenue"),
        ChartSpec::pie("Month"),
        ChartSpec::line("Month", "Revenue"),
        ChartSpec::scatter("Month", "Revenue"),
        ChartSpec::histogram("Revenue", 10),
        ChartSpec::slicer("Month"),
    ] {
        assert!(aggregate(&table, &spec).is_empty(), "{}", spec.title);
    }

    let Series::Card(summary) = aggregate(&table, &ChartSpec::card("Revenue")) else {
        panic!("card spec must produce card series");
    };
    assert_eq!(summary.count, 0);
    assert!(summary.average.is_nan());
    assert_eq!(summary.max, f64::NEG_INFINITY);
    assert_eq!(summary.min, f64::INFINITY);

    assert!(!respond("max revenue", &table, &roles).is_empty());
    assert!(!respond("anything at all", &table, &roles).is_empty());
}

#[test]
fn blank_policy_is_configurable() {
    let table = Table::from_columns(vec![("blank", vec!["", "", " "])]);
    let default = Slate::new().classify(&table);
    assert!(default.get("blank").unwrap().is_categorical());

    let legacy = Slate::with_config(EngineConfig::legacy()).unwrap().classify(&table);
    assert!(legacy.get("blank").unwrap().is_numeric());
}
