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

//! Chart specifications and the per-session board that holds them.

use crate::aggregator::{Series, SeriesAggregator};
use crate::error::ValidationError;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    pub fn new() -> Self {
        Self(format!("chart-{}", Uuid::new_v4()))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Default for ChartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChartId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Chart type with the column bindings it needs.
///
/// Bindings are optional so a half-filled request from a form still
/// deserializes; aggregation of an incomplete spec yields an empty series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Bar {
        category: Option<String>,
        value: Option<String>,
    },
    Pie {
        category: Option<String>,
    },
    Line {
        #[serde(rename = "xAxis")]
        x_axis: Option<String>,
        #[serde(rename = "yAxis")]
        y_axis: Option<String>,
    },
    Scatter {
        #[serde(rename = "xAxis")]
        x_axis: Option<String>,
        #[serde(rename = "yAxis")]
        y_axis: Option<String>,
    },
    Histogram {
        field: Option<String>,
        bins: Option<usize>,
    },
    Card {
        field: Option<String>,
    },
    Slicer {
        field: Option<String>,
    },
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Bar { .. } => "bar",
            ChartKind::Pie { .. } => "pie",
            ChartKind::Line { .. } => "line",
            ChartKind::Scatter { .. } => "scatter",
            ChartKind::Histogram { .. } => "histogram",
            ChartKind::Card { .. } => "card",
            ChartKind::Slicer { .. } => "slicer",
        }
    }

    /// Required bindings as `(binding name, bound column)` pairs.
    pub fn bindings(&self) -> Vec<(&'static str, Option<&str>)> {
        match self {
            ChartKind::Bar { category, value } => vec![
                ("category", category.as_deref()),
                ("value", value.as_deref()),
            ],
            ChartKind::Pie { category } => vec![("category", category.as_deref())],
            ChartKind::Line { x_axis, y_axis } | ChartKind::Scatter { x_axis, y_axis } => vec![
                ("xAxis", x_axis.as_deref()),
                ("yAxis", y_axis.as_deref()),
            ],
            ChartKind::Histogram { field, .. }
            | ChartKind::Card { field }
            | ChartKind::Slicer { field } => vec![("field", field.as_deref())],
        }
    }

    fn default_title(&self) -> String {
        let or_blank = |v: &Option<String>| v.clone().unwrap_or_default();
        match self {
            ChartKind::Bar { category, value } => {
                format!("{} by {}", or_blank(value), or_blank(category))
            }
            ChartKind::Pie { category } => format!("Distribution of {}", or_blank(category)),
            ChartKind::Line { x_axis, y_axis } | ChartKind::Scatter { x_axis, y_axis } => {
                format!("{} vs {}", or_blank(y_axis), or_blank(x_axis))
            }
            ChartKind::Histogram { field, .. } => format!("{} Distribution", or_blank(field)),
            ChartKind::Card { field } => format!("{} Summary", or_blank(field)),
            ChartKind::Slicer { field } => format!("{} Filter", or_blank(field)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub id: ChartId,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub kind: ChartKind,
}

fn some(s: impl Into<String>) -> Option<String> {
    Some(s.into())
}

impl ChartSpec {
    pub fn new(kind: ChartKind) -> Self {
        let title = kind.default_title();
        Self {
            id: ChartId::new(),
            title,
            kind,
        }
    }

    pub fn bar(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ChartKind::Bar {
            category: some(category),
            value: some(value),
        })
    }

    pub fn pie(category: impl Into<String>) -> Self {
        Self::new(ChartKind::Pie {
            category: some(category),
        })
    }

    pub fn line(x_axis: impl Into<String>, y_axis: impl Into<String>) -> Self {
        Self::new(ChartKind::Line {
            x_axis: some(x_axis),
            y_axis: some(y_axis),
        })
    }

    pub fn scatter(x_axis: impl Into<String>, y_axis: impl Into<String>) -> Self {
        Self::new(ChartKind::Scatter {
            x_axis: some(x_axis),
            y_axis: some(y_axis),
        })
    }

    pub fn histogram(field: impl Into<String>, bins: usize) -> Self {
        Self::new(ChartKind::Histogram {
            field: some(field),
            bins: Some(bins),
        })
    }

    pub fn card(field: impl Into<String>) -> Self {
        Self::new(ChartKind::Card { field: some(field) })
    }

    pub fn slicer(field: impl Into<String>) -> Self {
        Self::new(ChartKind::Slicer { field: some(field) })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: ChartId) -> Self {
        self.id = id;
        self
    }

    /// Checks the spec is complete and bound to columns of `table`.
    pub fn validate(&self, table: &Table) -> Result<(), ValidationError> {
        let chart = self.kind.name();
        for (binding, column) in self.kind.bindings() {
            match column.filter(|c| !c.is_empty()) {
                None => return Err(ValidationError::MissingBinding { chart, binding }),
                Some(column) if !table.has_column(column) => {
                    return Err(ValidationError::UnknownColumn {
                        column: column.to_string(),
                        binding,
                    })
                }
                Some(_) => {}
            }
        }
        if let ChartKind::Histogram { bins: Some(0), .. } = self.kind {
            return Err(ValidationError::ZeroBins);
        }
        Ok(())
    }
}

/// Ordered, in-memory collection of the charts on a dashboard.
#[derive(Debug, Clone, Default)]
pub struct ChartBoard {
    charts: Vec<ChartSpec>,
}

impl ChartBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: ChartSpec) -> ChartId {
        let id = spec.id.clone();
        self.charts.push(spec);
        id
    }

    pub fn remove(&mut self, id: &ChartId) -> Option<ChartSpec> {
        let index = self.charts.iter().position(|c| &c.id == id)?;
        Some(self.charts.remove(index))
    }

    pub fn get(&self, id: &ChartId) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| &c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        self.charts.iter()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn render_all<'a>(
        &'a self,
        table: &Table,
        aggregator: &SeriesAggregator<'_>,
    ) -> Vec<(&'a ChartSpec, Series)> {
        self.charts
            .iter()
            .map(|spec| (spec, aggregator.aggregate(table, spec)))
            .collect()
    }
}

impl Extend<ChartSpec> for ChartBoard {
    fn extend<I: IntoIterator<Item = ChartSpec>>(&mut self, iter: I) {
        self.charts.extend(iter);
    }
}
