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

use thiserror::Error;
#[derive(Error, Debug)]
pub enum SlateError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] SerialisationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read data file '{path}': {source}")]
    DataFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parse error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("JSON parse error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Expected an array of records, found {found}")]
    NotARecordArray { found: String },
    #[error("Record {index} is not an object")]
    NonObjectRecord { index: usize },
    #[error("Header row is empty")]
    EmptyHeader,
    #[error("Unsupported data format: {format}")]
    UnsupportedFormat { format: String },
    #[error("File '{path}' is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { path: String, size: u64, limit: u64 },
    #[error("Upload was rejected by the parsing service: {reason}")]
    UploadRejected { reason: String },
    #[error("Workbook has several sheets, choose one of: {}", .sheets.join(", "))]
    SheetSelectionRequired { sheets: Vec<String> },
    #[error("DataFrame conversion failed for column '{column}': {reason}")]
    DataFrame { column: String, reason: String },
}
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid engine configuration: {field} = {value}")]
    InvalidValue { field: String, value: String },
    #[error("Keyword group '{group}' is empty")]
    EmptyKeywordGroup { group: String },
}
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{chart} chart requires '{binding}' to be selected")]
    MissingBinding {
        chart: &'static str,
        binding: &'static str,
    },
    #[error("Column '{column}' bound to '{binding}' does not exist in the table")]
    UnknownColumn {
        column: String,
        binding: &'static str,
    },
    #[error("Histogram needs at least one bin")]
    ZeroBins,
}
#[derive(Error, Debug)]
pub enum SerialisationError {
    #[error("JSON serialisation failed: {source}")]
    JsonSerialisationError {
        #[from]
        source: serde_json::Error,
    },
    #[error("YAML serialisation failed: {source}")]
    YamlSerialisationError {
        #[from]
        source: serde_yaml::Error,
    },
}
pub type Result<T> = std::result::Result<T, SlateError>;
pub type IngestResult<T> = std::result::Result<T, IngestError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
