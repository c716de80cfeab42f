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

//! Business overview built from column names alone: headline metrics for
//! sales-like columns and a few fixed multi-metric chart layouts
//! (plan vs actual, revenue split, price trends, quantities).

use crate::classifier::name_matches;
use crate::config::{EngineConfig, KeywordGroups};
use crate::format::display_name;
use crate::stats::NumericSummary;
use crate::table::{cell, Cell, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetric {
    pub column: String,
    pub label: String,
    #[serde(flatten)]
    pub summary: NumericSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardChartKind {
    Comparison,
    Pie,
    Line,
    Bar,
}

/// One x position with a value per metric; non-numeric cells read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub x: Cell,
    pub values: IndexMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTotal {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum DashboardData {
    Rows(Vec<MetricRow>),
    Totals(Vec<ColumnTotal>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardChart {
    pub kind: DashboardChartKind,
    pub title: String,
    pub x_axis: Option<String>,
    pub metrics: Vec<String>,
    pub data: DashboardData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dashboard {
    pub metrics: Vec<BusinessMetric>,
    pub charts: Vec<DashboardChart>,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.charts.is_empty()
    }
}

/// Columns grouped by what their names suggest.
// The dashboard layouts key off their own name lists, narrower than the role keywords.
const SALES_WORDS: &[&str] = &["sales", "revenue", "actual", "plan", "budget", "scrap", "net"];
const PRICE_WORDS: &[&str] = &["price", "rate", "alang", "mmr", "jpc"];

struct BusinessColumns<'t> {
    sales: Vec<&'t str>,
    quantity: Vec<&'t str>,
    price: Vec<&'t str>,
    month: Option<&'t str>,
}

impl<'t> BusinessColumns<'t> {
    fn detect(table: &'t Table, keywords: &KeywordGroups) -> Self {
        let names = || table.columns().iter().map(String::as_str);
        Self {
            sales: names().filter(|c| name_matches(c, SALES_WORDS)).collect(),
            quantity: names().filter(|c| name_matches(c, &keywords.quantity)).collect(),
            price: names().filter(|c| name_matches(c, PRICE_WORDS)).collect(),
            month: names().find(|c| name_matches(c, &keywords.time) && name_matches(c, &["month"])),
        }
    }
}

fn metric_rows(table: &Table, x_axis: &str, metrics: &[&str]) -> Vec<MetricRow> {
    table
        .rows()
        .iter()
        .map(|row| MetricRow {
            x: cell(row, x_axis).clone(),
            values: metrics
                .iter()
                .map(|m| ((*m).to_string(), cell(row, m).number_or_zero()))
                .collect(),
        })
        .collect()
}

fn rows_chart(
    kind: DashboardChartKind,
    title: &str,
    table: &Table,
    x_axis: &str,
    metrics: &[&str],
) -> DashboardChart {
    DashboardChart {
        kind,
        title: title.to_string(),
        x_axis: Some(x_axis.to_string()),
        metrics: metrics.iter().map(|m| (*m).to_string()).collect(),
        data: DashboardData::Rows(metric_rows(table, x_axis, metrics)),
    }
}

/// Builds the dashboard for `table`. An empty table yields an empty dashboard.
pub fn build_dashboard(table: &Table, config: &EngineConfig) -> Dashboard {
    if table.is_empty() {
        return Dashboard::default();
    }
    let keywords = &config.keywords;
    let columns = BusinessColumns::detect(table, keywords);

    let metrics = columns
        .sales
        .iter()
        .take(config.dashboard_metric_limit)
        .map(|c| BusinessMetric {
            column: (*c).to_string(),
            label: display_name(c),
            summary: NumericSummary::from_values(
                &table.numeric_values(c, config.blank_is_numeric),
            ),
        })
        .collect();

    let mut charts = Vec::new();

    let actual_sales = columns
        .sales
        .iter()
        .find(|c| name_matches(c, &keywords.actual) && name_matches(c, &keywords.revenue));
    let plan_sales = columns
        .sales
        .iter()
        .find(|c| name_matches(c, &keywords.plan) && !name_matches(c, &keywords.quantity));
    if let (Some(actual), Some(plan), Some(month)) = (actual_sales, plan_sales, columns.month) {
        charts.push(rows_chart(
            DashboardChartKind::Comparison,
            "Plan vs Actual Sales by Month",
            table,
            month,
            &[*actual, *plan],
        ));
    }

    if columns.sales.len() >= 2 {
        let shown = &columns.sales[..columns.sales.len().min(5)];
        let totals = shown
            .iter()
            .map(|c| ColumnTotal {
                name: display_name(c),
                value: table.column_values(c).map(Cell::number_or_zero).sum(),
            })
            .filter(|t| t.value > 0.0)
            .collect();
        charts.push(DashboardChart {
            kind: DashboardChartKind::Pie,
            title: "Revenue Distribution".to_string(),
            x_axis: None,
            metrics: shown.iter().map(|c| (*c).to_string()).collect(),
            data: DashboardData::Totals(totals),
        });
    }

    if let (true, Some(month)) = (columns.price.len() >= 2, columns.month) {
        let shown = &columns.price[..columns.price.len().min(3)];
        charts.push(rows_chart(
            DashboardChartKind::Line,
            "Price Trends Over Time",
            table,
            month,
            shown,
        ));
    }

    let actual_qty = columns
        .quantity
        .iter()
        .find(|c| name_matches(c, &keywords.actual));
    let plan_qty = columns
        .quantity
        .iter()
        .find(|c| name_matches(c, &keywords.plan));
    if let (Some(actual), Some(plan), Some(month)) = (actual_qty, plan_qty, columns.month) {
        charts.push(rows_chart(
            DashboardChartKind::Bar,
            "Planned vs Actual Quantity",
            table,
            month,
            &[*plan, *actual],
        ));
    }

    let dashboard = Dashboard { metrics, charts };
    debug!(
        metrics = dashboard.metrics.len(),
        charts = dashboard.charts.len(),
        "built dashboard"
    );
    dashboard
}
