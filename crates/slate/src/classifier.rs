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

//! Column classification: value kind from a leading sample, temporal
//! flag from names or date-like values, and a best-effort semantic role
//! from keyword substrings of the column name.

use crate::config::{EngineConfig, KeywordGroups};
use crate::table::{cell, Cell, Table};
use crate::temporal::is_textual_date;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    Revenue,
    Plan,
    Quantity,
    Price,
    Time,
    Category,
}

impl SemanticRole {
    pub const ALL: [SemanticRole; 6] = [
        SemanticRole::Revenue,
        SemanticRole::Plan,
        SemanticRole::Quantity,
        SemanticRole::Price,
        SemanticRole::Time,
        SemanticRole::Category,
    ];

    pub fn keywords(self, groups: &KeywordGroups) -> &[String] {
        match self {
            SemanticRole::Revenue => &groups.revenue,
            SemanticRole::Plan => &groups.plan,
            SemanticRole::Quantity => &groups.quantity,
            SemanticRole::Price => &groups.price,
            SemanticRole::Time => &groups.time,
            SemanticRole::Category => &groups.category,
        }
    }

    /// First role, in declaration order, with a keyword contained in the column name.
    pub fn infer(column: &str, groups: &KeywordGroups) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| name_matches(column, role.keywords(groups)))
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticRole::Revenue => "revenue",
            SemanticRole::Plan => "plan",
            SemanticRole::Quantity => "quantity",
            SemanticRole::Price => "price",
            SemanticRole::Time => "time",
            SemanticRole::Category => "category",
        };
        f.write_str(name)
    }
}

/// Case-insensitive substring match of any keyword against a column name.
pub fn name_matches<S: AsRef<str>>(column: &str, keywords: &[S]) -> bool {
    let lower = column.to_lowercase();
    keywords
        .iter()
        .map(AsRef::as_ref)
        .any(|k| !k.is_empty() && lower.contains(k))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRole {
    pub value_kind: ValueKind,
    pub semantic_role: Option<SemanticRole>,
    pub temporal: bool,
    /// Share of the sample that coerced to a finite number.
    pub numeric_fraction: f64,
    pub sampled: usize,
}

impl ColumnRole {
    pub fn is_numeric(&self) -> bool {
        self.value_kind == ValueKind::Numeric
    }

    pub fn is_categorical(&self) -> bool {
        self.value_kind == ValueKind::Categorical
    }
}

/// Per-column roles in the order the columns were requested.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMap {
    roles: IndexMap<String, ColumnRole>,
}

impl RoleMap {
    pub fn get(&self, column: &str) -> Option<&ColumnRole> {
        self.roles.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRole)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn columns(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    fn filtered(&self, keep: impl Fn(&ColumnRole) -> bool) -> Vec<&str> {
        self.iter()
            .filter(|(_, role)| keep(role))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<&str> {
        self.filtered(ColumnRole::is_numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.filtered(ColumnRole::is_categorical)
    }

    pub fn temporal_columns(&self) -> Vec<&str> {
        self.filtered(|r| r.temporal)
    }

    pub fn with_role(&self, role: SemanticRole) -> Vec<&str> {
        self.filtered(|r| r.semantic_role == Some(role))
    }

    pub fn numeric_with_role(&self, role: SemanticRole) -> Vec<&str> {
        self.filtered(|r| r.is_numeric() && r.semantic_role == Some(role))
    }

    /// Columns whose name contains any of `keywords`, whatever their inferred role.
    pub fn named_like<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<&str> {
        self.columns()
            .into_iter()
            .filter(|c| name_matches(c, keywords))
            .collect()
    }
}

impl FromIterator<(String, ColumnRole)> for RoleMap {
    fn from_iter<I: IntoIterator<Item = (String, ColumnRole)>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

pub struct ColumnClassifier<'a> {
    config: &'a EngineConfig,
}

impl<'a> ColumnClassifier<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Classifies every requested column. Always returns exactly one entry
    /// per distinct requested name, in request order.
    pub fn classify<S: AsRef<str>>(&self, table: &Table, columns: &[S]) -> RoleMap {
        columns
            .iter()
            .map(|c| {
                let name = c.as_ref();
                (name.to_string(), self.classify_column(table, name))
            })
            .collect()
    }

    pub fn classify_column(&self, table: &Table, column: &str) -> ColumnRole {
        let sample = &table.rows()[..self.config.sample_size.min(table.len())];
        let sampled = sample.len();
        let numeric = sample
            .iter()
            .filter(|row| is_numeric_cell(cell(row, column), self.config.blank_is_numeric))
            .count();
        let numeric_fraction = if sampled == 0 {
            0.0
        } else {
            numeric as f64 / sampled as f64
        };
        let value_kind = if numeric_fraction > self.config.numeric_threshold {
            ValueKind::Numeric
        } else {
            ValueKind::Categorical
        };
        let keywords = &self.config.keywords;
        let name_temporal = name_matches(column, &keywords.time);
        let temporal = name_temporal || {
            let dates = sample
                .iter()
                .filter(|row| is_textual_date(cell(row, column)))
                .count();
            sampled > 0 && dates as f64 > sampled as f64 * self.config.date_sample_threshold
        };
        let semantic_role = SemanticRole::infer(column, keywords);
        debug!(
            column,
            ?value_kind,
            ?semantic_role,
            temporal,
            numeric_fraction,
            "classified column"
        );
        ColumnRole {
            value_kind,
            semantic_role,
            temporal,
            numeric_fraction,
            sampled,
        }
    }
}

fn is_numeric_cell(value: &Cell, blank_is_numeric: bool) -> bool {
    value.numeric_value(blank_is_numeric).is_some()
}

/// Classifies `columns` of `table` with the default configuration.
pub fn classify<S: AsRef<str>>(table: &Table, columns: &[S]) -> RoleMap {
    let config = EngineConfig::default();
    ColumnClassifier::new(&config).classify(table, columns)
}
