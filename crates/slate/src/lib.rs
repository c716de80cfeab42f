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

pub mod aggregator;
pub mod chart;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod ingest;
pub mod responder;
pub mod stats;
pub mod suggest;
pub mod table;
pub mod temporal;

pub use aggregator::{BarGroup, HistogramBin, PieSlice, Point, Series, SeriesAggregator};
pub use chart::{ChartBoard, ChartId, ChartKind, ChartSpec};
pub use classifier::{ColumnClassifier, ColumnRole, RoleMap, SemanticRole, ValueKind};
pub use config::{CategoryOrder, EngineConfig, KeywordGroups};
pub use dashboard::{build_dashboard, Dashboard, DashboardChart, DashboardChartKind};
pub use error::{
    ConfigError, IngestError, Result, SerialisationError, SlateError, ValidationError,
};
pub use responder::{QueryContext, QueryResponder, QueryRule};
pub use stats::NumericSummary;
pub use suggest::{quick_suggestions, ChartSuggestion};
pub use table::{Cell, Row, Table};

use std::path::Path;
use tracing::instrument;

/// Entry point bundling the engine stages under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Slate {
    config: EngineConfig,
}

impl Slate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(EngineConfig::from_yaml_file(path)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        Ok(ingest::load_path(path, &self.config)?)
    }

    /// Classifies every column of `table`.
    #[instrument(skip_all, fields(rows = table.len(), columns = table.columns().len()))]
    pub fn classify(&self, table: &Table) -> RoleMap {
        self.classify_columns(table, table.columns())
    }

    pub fn classify_columns<S: AsRef<str>>(&self, table: &Table, columns: &[S]) -> RoleMap {
        ColumnClassifier::new(&self.config).classify(table, columns)
    }

    #[instrument(skip_all, fields(chart = %spec.id, kind = spec.kind.name()))]
    pub fn aggregate(&self, table: &Table, spec: &ChartSpec) -> Series {
        SeriesAggregator::new(&self.config).aggregate(table, spec)
    }

    /// Rejects specs with missing bindings or unknown columns before they are rendered.
    pub fn validate_chart(&self, table: &Table, spec: &ChartSpec) -> Result<()> {
        Ok(spec.validate(table)?)
    }

    pub fn render_board<'b>(&self, board: &'b ChartBoard, table: &Table) -> Vec<(&'b ChartSpec, Series)> {
        board.render_all(table, &SeriesAggregator::new(&self.config))
    }

    #[instrument(skip(self, table, roles))]
    pub fn respond(&self, query: &str, table: &Table, roles: &RoleMap) -> String {
        QueryResponder::new(&self.config).respond(query, table, roles)
    }

    #[instrument(skip(self, table, roles))]
    pub fn respond_as(&self, query: &str, table: &Table, roles: &RoleMap, dataset: &str) -> String {
        QueryResponder::new(&self.config).respond_as(query, table, roles, dataset)
    }

    pub fn suggest_charts(&self, roles: &RoleMap) -> Vec<ChartSuggestion> {
        quick_suggestions(roles, &self.config)
    }

    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn dashboard(&self, table: &Table) -> Dashboard {
        build_dashboard(table, &self.config)
    }

    pub fn export_roles_json(&self, roles: &RoleMap) -> Result<String> {
        Ok(serde_json::to_string_pretty(roles).map_err(SerialisationError::from)?)
    }

    pub fn export_series_json(&self, series: &Series) -> Result<String> {
        Ok(serde_json::to_string_pretty(series).map_err(SerialisationError::from)?)
    }
}
