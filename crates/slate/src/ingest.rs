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

//! Getting tables in: JSON record arrays, the upload service's response
//! envelope, CSV files, and (feature `polars`) data frames.

use crate::config::EngineConfig;
use crate::error::{IngestError, IngestResult};
use crate::table::{Cell, Row, Table};
use crate::temporal::month_name;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const UPLOAD_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(b),
        Value::Number(n) => n.as_f64().map_or(Cell::Empty, Cell::Number),
        Value::String(s) => Cell::Text(s),
        nested => Cell::Text(nested.to_string()),
    }
}

impl Table {
    /// Builds a table from a JSON array of objects. Columns follow the
    /// first record's key order; keys first seen later are appended.
    pub fn from_json_records(value: Value) -> IngestResult<Table> {
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(IngestError::NotARecordArray {
                    found: json_kind(&other).to_string(),
                })
            }
        };
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| match record {
                Value::Object(fields) => Ok(fields
                    .into_iter()
                    .map(|(k, v)| (k, json_cell(v)))
                    .collect::<Row>()),
                _ => Err(IngestError::NonObjectRecord { index }),
            })
            .collect::<IngestResult<Vec<Row>>>()?;
        Ok(Table::from_rows(rows))
    }
}

/// Parses either a bare record array or an upload response envelope.
pub fn from_json_str(json: &str) -> IngestResult<Table> {
    let value: Value = serde_json::from_str(json)?;
    if value.get("success").is_some() {
        return UploadPayload::deserialize(value)?.into_table();
    }
    Table::from_json_records(value)
}

/// Response body of the spreadsheet parsing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub multiple_sheets: bool,
    #[serde(default)]
    pub sheets: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadPayload {
    /// The parsed table, with the service's column list taking precedence
    /// over record key order and month columns normalised.
    pub fn into_table(self) -> IngestResult<Table> {
        if !self.success {
            return Err(IngestError::UploadRejected {
                reason: self.error.unwrap_or_else(|| "no reason given".to_string()),
            });
        }
        if self.multiple_sheets {
            return Err(IngestError::SheetSelectionRequired {
                sheets: self.sheets,
            });
        }
        let table = Table::from_json_records(self.data.unwrap_or(Value::Array(Vec::new())))?;
        let table = match self.columns {
            Some(columns) if !columns.is_empty() => Table::new(columns, table.into_rows()),
            _ => table,
        };
        info!(
            file = self.file_name.as_deref().unwrap_or("<unnamed>"),
            rows = table.len(),
            columns = table.columns().len(),
            "ingested upload payload"
        );
        Ok(normalise_month_columns(&table))
    }
}

/// Pre-flight check for a spreadsheet upload: `.xlsx`/`.xls` only, and
/// no larger than the configured limit.
pub fn check_upload(file_name: &str, size: u64, config: &EngineConfig) -> IngestResult<()> {
    let extension = extension_of(Path::new(file_name));
    if !UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IngestError::UnsupportedFormat { format: extension });
    }
    if size > config.max_upload_bytes {
        return Err(IngestError::FileTooLarge {
            path: file_name.to_string(),
            size,
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// Replaces whole numbers 1..=12 in any column whose name mentions
/// "month" with the English month name.
pub fn normalise_month_columns(table: &Table) -> Table {
    table.map_columns(
        |column| column.to_lowercase().contains("month"),
        |value| match value {
            Cell::Number(n) if n.fract() == 0.0 && (1.0..=12.0).contains(n) => {
                month_name(*n as u32).map_or_else(|| value.clone(), |m| Cell::Text(m.to_string()))
            }
            other => other.clone(),
        },
    )
}

fn csv_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

/// Header names with repeats suffixed `.1`, `.2`, ...
fn unique_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.to_string();
        let mut n = 0;
        while seen.contains(&name) {
            n += 1;
            name = format!("{header}.{n}");
        }
        seen.push(name);
    }
    seen
}

/// Reads CSV with a header row. Numeric-looking fields become numbers,
/// empty fields become [`Cell::Empty`], short records are padded.
pub fn read_csv<R: Read>(reader: R) -> IngestResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let raw = reader.headers()?;
    if raw.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::EmptyHeader);
    }
    let headers = unique_headers(raw);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).map_or(Cell::Empty, csv_cell)))
            .collect();
        rows.push(row);
    }
    debug!(rows = rows.len(), columns = headers.len(), "parsed csv");
    Ok(Table::new(headers, rows))
}

pub fn read_csv_path<P: AsRef<Path>>(path: P) -> IngestResult<Table> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|source| IngestError::DataFileError {
        path: path.display().to_string(),
        source,
    })?;
    read_csv(file)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Loads a `.csv` or `.json` file, enforcing the upload size limit and
/// normalising month columns.
pub fn load_path<P: AsRef<Path>>(path: P, config: &EngineConfig) -> IngestResult<Table> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let size = fs::metadata(path)
        .map_err(|source| IngestError::DataFileError {
            path: shown.clone(),
            source,
        })?
        .len();
    if size > config.max_upload_bytes {
        return Err(IngestError::FileTooLarge {
            path: shown,
            size,
            limit: config.max_upload_bytes,
        });
    }
    let table = match extension_of(path).as_str() {
        "csv" => read_csv_path(path)?,
        "json" => {
            let text = fs::read_to_string(path).map_err(|source| IngestError::DataFileError {
                path: shown.clone(),
                source,
            })?;
            from_json_str(&text)?
        }
        other => {
            return Err(IngestError::UnsupportedFormat {
                format: if other.is_empty() { "<none>".to_string() } else { other.to_string() },
            })
        }
    };
    let table = normalise_month_columns(&table);
    info!(
        path = %shown,
        rows = table.len(),
        columns = table.columns().len(),
        "loaded table"
    );
    Ok(table)
}

/// Converts a polars frame column by column. Numeric and boolean columns
/// keep their type, everything else is read as text; nulls become
/// [`Cell::Empty`].
#[cfg(feature = "polars")]
pub fn from_dataframe(df: &polars::prelude::DataFrame) -> IngestResult<Table> {
    use polars::prelude::{DataType, PolarsError};

    let mut columns: Vec<(String, Vec<Cell>)> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().to_string();
        let fail = |e: PolarsError| IngestError::DataFrame {
            column: name.clone(),
            reason: e.to_string(),
        };
        let cells: Vec<Cell> = match series.dtype() {
            DataType::Boolean => series
                .bool()
                .map_err(fail)?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, Cell::Bool))
                .collect(),
            DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::UInt64
            | DataType::UInt32 => series
                .cast(&DataType::Float64)
                .map_err(fail)?
                .f64()
                .map_err(fail)?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, Cell::Number))
                .collect(),
            _ => series
                .cast(&DataType::String)
                .map_err(fail)?
                .str()
                .map_err(fail)?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, |s| Cell::Text(s.to_string())))
                .collect(),
        };
        columns.push((name, cells));
    }
    let table = Table::from_columns(columns);
    info!(rows = table.len(), columns = table.columns().len(), "ingested dataframe");
    Ok(table)
}
