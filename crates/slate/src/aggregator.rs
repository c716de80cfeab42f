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

//! Turns a [`ChartSpec`] into chart-ready data.
//!
//! Every chart kind has its own handler. Incomplete specs and unknown
//! columns produce an empty series of the requested kind; nothing here
//! fails.

use crate::chart::{ChartKind, ChartSpec};
use crate::config::{CategoryOrder, EngineConfig};
use crate::stats::NumericSummary;
use crate::table::{cell, Cell, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarGroup {
    pub category: String,
    pub sum: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: Cell,
    pub y: f64,
}

/// Half-open bucket `[start, end)`; the last bucket also holds the maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn range_label(&self) -> String {
        format!("{:.1}-{:.1}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Series {
    Bar(Vec<BarGroup>),
    Pie(Vec<PieSlice>),
    Line(Vec<Point>),
    Scatter(Vec<Point>),
    Histogram(Vec<HistogramBin>),
    Card(NumericSummary),
    Slicer(Vec<String>),
}

impl Series {
    /// Number of entries; a card always counts as one.
    pub fn len(&self) -> usize {
        match self {
            Series::Bar(v) => v.len(),
            Series::Pie(v) => v.len(),
            Series::Line(v) | Series::Scatter(v) => v.len(),
            Series::Histogram(v) => v.len(),
            Series::Card(_) => 1,
            Series::Slicer(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Series::Card(summary) => summary.is_empty(),
            _ => self.len() == 0,
        }
    }
}

pub struct SeriesAggregator<'a> {
    config: &'a EngineConfig,
}

impl<'a> SeriesAggregator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, table: &Table, spec: &ChartSpec) -> Series {
        for (binding, column) in spec.kind.bindings() {
            if let Some(column) = column {
                if !table.has_column(column) {
                    warn!(chart = %spec.id, binding, column, "chart bound to unknown column");
                }
            }
        }
        let series = match &spec.kind {
            ChartKind::Bar { category, value } => {
                Series::Bar(self.bar(table, category.as_deref(), value.as_deref()))
            }
            ChartKind::Pie { category } => Series::Pie(self.pie(table, category.as_deref())),
            ChartKind::Line { x_axis, y_axis } => {
                Series::Line(self.points(table, x_axis.as_deref(), y_axis.as_deref()))
            }
            ChartKind::Scatter { x_axis, y_axis } => {
                Series::Scatter(self.points(table, x_axis.as_deref(), y_axis.as_deref()))
            }
            ChartKind::Histogram { field, bins } => Series::Histogram(self.histogram(
                table,
                field.as_deref(),
                bins.unwrap_or(self.config.default_histogram_bins),
            )),
            ChartKind::Card { field } => Series::Card(self.card(table, field.as_deref())),
            ChartKind::Slicer { field } => Series::Slicer(self.slicer(table, field.as_deref())),
        };
        debug!(chart = %spec.id, kind = spec.kind.name(), entries = series.len(), "aggregated series");
        series
    }

    /// Sum and count per category. Blank and non-numeric values add zero
    /// but still count as a row.
    pub fn bar(&self, table: &Table, category: Option<&str>, value: Option<&str>) -> Vec<BarGroup> {
        let (Some(category), Some(value)) = (category, value) else {
            return Vec::new();
        };
        let mut groups: IndexMap<String, BarGroup> = IndexMap::new();
        for row in table.rows() {
            let key = cell(row, category).label();
            let group = groups.entry(key.clone()).or_insert_with(|| BarGroup {
                category: key,
                sum: 0.0,
                count: 0,
            });
            group.sum += cell(row, value).number_or_zero();
            group.count += 1;
        }
        let mut groups: Vec<BarGroup> = groups.into_values().collect();
        if self.config.category_order == CategoryOrder::ByValueDesc {
            groups.sort_by(|a, b| b.sum.total_cmp(&a.sum));
        }
        groups.truncate(self.config.bar_category_limit);
        groups
    }

    pub fn pie(&self, table: &Table, category: Option<&str>) -> Vec<PieSlice> {
        let Some(category) = category else {
            return Vec::new();
        };
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for value in table.column_values(category) {
            *counts.entry(value.label()).or_insert(0) += 1;
        }
        let mut slices: Vec<PieSlice> = counts
            .into_iter()
            .map(|(category, count)| PieSlice { category, count })
            .collect();
        if self.config.category_order == CategoryOrder::ByValueDesc {
            slices.sort_by(|a, b| b.count.cmp(&a.count));
        }
        slices.truncate(self.config.pie_category_limit);
        slices
    }

    /// `(x, y)` pairs from the leading rows only; rows without an x value are dropped.
    pub fn points(&self, table: &Table, x_axis: Option<&str>, y_axis: Option<&str>) -> Vec<Point> {
        let (Some(x_axis), Some(y_axis)) = (x_axis, y_axis) else {
            return Vec::new();
        };
        table
            .rows()
            .iter()
            .take(self.config.point_row_limit)
            .filter_map(|row| {
                let x = row.get(x_axis).filter(|x| **x != Cell::Empty)?;
                Some(Point {
                    x: x.clone(),
                    y: cell(row, y_axis).number_or_zero(),
                })
            })
            .collect()
    }

    /// Equal-width buckets over `[min, max]` of every numeric value in the column.
    pub fn histogram(&self, table: &Table, field: Option<&str>, bins: usize) -> Vec<HistogramBin> {
        let Some(field) = field else {
            return Vec::new();
        };
        let cap = self.config.max_histogram_bins;
        if bins > cap {
            warn!(field, requested = bins, cap, "histogram bin count clamped");
        }
        let bins = bins.min(cap);
        let values = table.numeric_values(field, self.config.blank_is_numeric);
        if values.is_empty() || bins == 0 {
            if values.is_empty() {
                warn!(field, "histogram over a column with no numeric values");
            }
            return Vec::new();
        }
        let summary = NumericSummary::from_values(&values);
        let (min, max) = (summary.min, summary.max);
        let bin_size = (max - min) / bins as f64;
        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                start: min + i as f64 * bin_size,
                end: min + (i + 1) as f64 * bin_size,
                count: 0,
            })
            .collect();
        let last = bins - 1;
        for v in values {
            // A constant column has zero width; everything lands in the first bucket.
            let index = if bin_size > 0.0 {
                let raw = ((v - min) / bin_size).floor();
                if raw < 0.0 {
                    0
                } else {
                    (raw as usize).min(last)
                }
            } else {
                0
            };
            histogram[index].count += 1;
        }
        histogram
    }

    pub fn card(&self, table: &Table, field: Option<&str>) -> NumericSummary {
        field.map_or_else(NumericSummary::default, |field| {
            NumericSummary::from_values(&table.numeric_values(field, self.config.blank_is_numeric))
        })
    }

    /// Distinct values in first-seen order, as filter candidates.
    pub fn slicer(&self, table: &Table, field: Option<&str>) -> Vec<String> {
        let Some(field) = field else {
            return Vec::new();
        };
        let mut seen: IndexMap<String, ()> = IndexMap::new();
        for value in table.column_values(field) {
            if seen.len() >= self.config.slicer_value_limit {
                break;
            }
            seen.entry(value.label()).or_insert(());
        }
        seen.into_keys().collect()
    }
}

/// Aggregates `spec` over `table` with the default configuration.
pub fn aggregate(table: &Table, spec: &ChartSpec) -> Series {
    let config = EngineConfig::default();
    SeriesAggregator::new(&config).aggregate(table, spec)
}
