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

use crate::chart::ChartSpec;
use crate::classifier::{RoleMap, SemanticRole};
use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A ready-made chart offered to the user, with the label shown on its button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSuggestion {
    pub label: String,
    pub spec: ChartSpec,
}

impl ChartSuggestion {
    fn new(label: impl Into<String>, spec: ChartSpec) -> Self {
        Self {
            label: label.into(),
            spec,
        }
    }
}

/// One-click suggestions derived from the role map, in display order:
/// revenue over time, category distribution, first measure by first
/// category, histogram, summary card, category filter. A suggestion is
/// only offered when the columns it needs exist.
pub fn quick_suggestions(roles: &RoleMap, config: &EngineConfig) -> Vec<ChartSuggestion> {
    let numeric = roles.numeric_columns();
    let categorical = roles.categorical_columns();
    let time = roles.temporal_columns();
    let revenue = roles.numeric_with_role(SemanticRole::Revenue);
    let mut suggestions = Vec::new();

    if let (Some(x), Some(y)) = (time.first(), revenue.first()) {
        let title = format!("{y} over {x}");
        suggestions.push(ChartSuggestion::new(
            title.clone(),
            ChartSpec::line(*x, *y).with_title(title),
        ));
    }
    if let Some(category) = categorical.first() {
        let spec = ChartSpec::pie(*category);
        suggestions.push(ChartSuggestion::new(spec.title.clone(), spec));
    }
    if let (Some(category), Some(value)) = (categorical.first(), numeric.first()) {
        let spec = ChartSpec::bar(*category, *value);
        suggestions.push(ChartSuggestion::new(spec.title.clone(), spec));
    }
    if let Some(field) = numeric.first() {
        let spec = ChartSpec::histogram(*field, config.default_histogram_bins);
        suggestions.push(ChartSuggestion::new(spec.title.clone(), spec));
        suggestions.push(ChartSuggestion::new(
            format!("{field} Summary Card"),
            ChartSpec::card(*field),
        ));
    }
    if let Some(field) = categorical.first() {
        let spec = ChartSpec::slicer(*field);
        suggestions.push(ChartSuggestion::new(spec.title.clone(), spec));
    }
    debug!(count = suggestions.len(), "built quick chart suggestions");
    suggestions
}
