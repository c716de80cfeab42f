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

//! In-memory rectangular tables of loosely typed cells.
//!
//! Rows are keyed by column name. A key missing from a row reads as
//! [`Cell::Empty`], so heterogeneous rows never fail a lookup. Nothing in
//! the crate mutates a [`Table`] after it has been built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Bool(bool),
    Text(String),
    #[default]
    Empty,
}

pub type Row = IndexMap<String, Cell>;

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose numeric coercion in the manner of a dynamic language's
    /// `Number(value)`: blanks become `0`, booleans `1`/`0`, text is
    /// trimmed and accepts decimal, exponent, `Infinity` and
    /// `0x`/`0o`/`0b` literals. Anything else is `NaN`.
    pub fn coerce_number(&self) -> f64 {
        match self {
            Cell::Number(n) => *n,
            Cell::Bool(b) => f64::from(u8::from(*b)),
            Cell::Empty => 0.0,
            Cell::Text(s) => parse_numeric_text(s),
        }
    }

    /// `coerce_number` with `NaN` folded to zero, used for sums and axis values.
    pub fn number_or_zero(&self) -> f64 {
        let n = self.coerce_number();
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Finite numeric value of the cell, if any. Blank cells only count
    /// when `blank_is_numeric` is set (they then read as zero).
    pub fn numeric_value(&self, blank_is_numeric: bool) -> Option<f64> {
        if self.is_blank() && !blank_is_numeric {
            return None;
        }
        let n = self.coerce_number();
        n.is_finite().then_some(n)
    }

    /// String rendering used for grouping keys and labels.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) => format_js_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

fn parse_numeric_text(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).map_or(f64::NAN, |v| v as f64);
    }
    // Rust's float parser also takes "inf"/"nan" spellings, which must stay NaN here.
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}
impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}
impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}
impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}
impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}
impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}
impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, Into::into)
    }
}

/// Cell stored under `column`, or [`Cell::Empty`] when the row lacks the key.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a Cell {
    row.get(column).unwrap_or(&EMPTY_CELL)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Builds a table whose column list is the union of row keys in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Column-major constructor, mostly handy in tests and fixtures.
    /// Shorter columns are padded with [`Cell::Empty`].
    pub fn from_columns<N, C>(columns: Vec<(N, Vec<C>)>) -> Self
    where
        N: Into<String>,
        C: Into<Cell>,
    {
        let height = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut rows: Vec<Row> = (0..height).map(|_| Row::new()).collect();
        let mut names = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            let name: String = name.into();
            let mut values = values.into_iter();
            for row in &mut rows {
                let value = values.next().map_or(Cell::Empty, Into::into);
                row.insert(name.clone(), value);
            }
            names.push(name);
        }
        Self {
            columns: names,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn cell(&self, row: usize, column: &str) -> &Cell {
        self.rows.get(row).map_or(&EMPTY_CELL, |r| cell(r, column))
    }

    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.rows.iter().map(move |row| cell(row, column))
    }

    /// Finite numeric values of a column in row order.
    pub fn numeric_values(&self, column: &str, blank_is_numeric: bool) -> Vec<f64> {
        self.column_values(column)
            .filter_map(|c| c.numeric_value(blank_is_numeric))
            .collect()
    }

    /// Returns a copy with `f` applied to every cell of the columns selected by `select`.
    pub fn map_columns<S, F>(&self, select: S, f: F) -> Table
    where
        S: Fn(&str) -> bool,
        F: Fn(&Cell) -> Cell,
    {
        let selected: Vec<&String> = self.columns.iter().filter(|c| select(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                for column in &selected {
                    if let Some(value) = row.get_mut(column.as_str()) {
                        *value = f(value);
                    }
                }
                row
            })
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}
