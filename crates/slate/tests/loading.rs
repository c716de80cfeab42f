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

use slate::{ConfigError, EngineConfig, IngestError, Slate, SlateError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn yaml_config_overrides_defaults_and_normalises_keywords() {
    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    writeln!(
        file,
        "sample_size: 25\ncategory_order: by_value_desc\nkeywords:\n  revenue: [\" Turnover \"]"
    )
    .unwrap();
    let slate = Slate::from_yaml_file(file.path()).unwrap();
    let config = slate.config();
    assert_eq!(config.sample_size, 25);
    assert_eq!(config.keywords.revenue, vec!["turnover"]);
    assert_eq!(config.keywords.plan, EngineConfig::default().keywords.plan);
}

#[test]
fn invalid_yaml_values_are_rejected() {
    let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
    writeln!(file, "default_histogram_bins: 0").unwrap();
    assert!(matches!(
        Slate::from_yaml_file(file.path()),
        Err(SlateError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn missing_config_file_is_a_config_error() {
    assert!(matches!(
        Slate::from_yaml_file("/no/such/slate.yaml"),
        Err(SlateError::Config(ConfigError::ConfigFileError { .. }))
    ));
}

#[test]
fn csv_file_flows_through_the_facade() {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(
        file,
        "Month,Actual Sales,Sales Plan\n1,90,100\n2,120,100\n3,130,125"
    )
    .unwrap();
    let slate = Slate::new();
    let table = slate.load_path(file.path()).unwrap();
    let roles = slate.classify(&table);

    let reply = slate.respond_as("did we exceed the plan?", &table, &roles, "plan.csv");
    assert!(reply.contains("February"), "{reply}");
    assert!(reply.contains("March"), "{reply}");

    let dashboard = slate.dashboard(&table);
    assert_eq!(dashboard.metrics.len(), 2);
    assert!(!dashboard.charts.is_empty());
}

#[test]
fn unsupported_files_are_ingest_errors() {
    let file = NamedTempFile::with_suffix(".xlsx").unwrap();
    assert!(matches!(
        Slate::new().load_path(file.path()),
        Err(SlateError::Ingest(IngestError::UnsupportedFormat { .. }))
    ));
}
