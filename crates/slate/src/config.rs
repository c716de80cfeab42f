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

//! Engine configuration: sampling thresholds, output caps and the keyword
//! groups used for semantic role inference.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Ordering applied to grouped bar and pie output before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    /// Groups appear in the order their category was first encountered.
    #[default]
    FirstSeen,
    /// Groups are ranked by their aggregate, largest first.
    ByValueDesc,
}

/// Keyword groups matched as substrings of lower-cased column names.
///
/// Role inference walks `revenue`, `plan`, `quantity`, `price`, `time` and
/// `category` in that order and stops at the first group with a hit.
/// `actual` is never a role on its own; it only helps pick the "actual"
/// side of plan-vs-actual comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordGroups {
    pub revenue: Vec<String>,
    pub plan: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub time: Vec<String>,
    pub category: Vec<String>,
    pub actual: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for KeywordGroups {
    fn default() -> Self {
        Self {
            revenue: words(&[
                "sales", "revenue", "income", "amount", "earnings", "net", "scrap", "budget",
            ]),
            plan: words(&["plan", "target", "goal", "budget"]),
            quantity: words(&["qty", "quantity", "volume"]),
            price: words(&["price", "rate"]),
            time: words(&["date", "time", "month", "year", "period"]),
            category: words(&["category", "type", "region", "product"]),
            actual: words(&["actual"]),
        }
    }
}

impl KeywordGroups {
    fn named_groups(&self) -> [(&'static str, &[String]); 7] {
        [
            ("revenue", &self.revenue),
            ("plan", &self.plan),
            ("quantity", &self.quantity),
            ("price", &self.price),
            ("time", &self.time),
            ("category", &self.category),
            ("actual", &self.actual),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leading rows inspected per column during classification.
    pub sample_size: usize,
    /// A column is numeric when the numeric share of its sample is strictly above this.
    pub numeric_threshold: f64,
    /// Count blank cells as numeric (they coerce to zero).
    pub blank_is_numeric: bool,
    /// A column is a date column when the parsed share of its sample is strictly above this.
    pub date_sample_threshold: f64,
    pub bar_category_limit: usize,
    pub pie_category_limit: usize,
    pub point_row_limit: usize,
    pub slicer_value_limit: usize,
    pub default_histogram_bins: usize,
    /// Upper bound on requested histogram bins; larger requests are clamped.
    pub max_histogram_bins: usize,
    pub summary_numeric_columns: usize,
    pub dashboard_metric_limit: usize,
    pub default_top_n: usize,
    pub max_upload_bytes: u64,
    pub category_order: CategoryOrder,
    pub keywords: KeywordGroups,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            numeric_threshold: 0.7,
            blank_is_numeric: false,
            date_sample_threshold: 0.5,
            bar_category_limit: 10,
            pie_category_limit: 8,
            point_row_limit: 50,
            slicer_value_limit: 20,
            default_histogram_bins: 10,
            max_histogram_bins: 1000,
            summary_numeric_columns: 3,
            dashboard_metric_limit: 4,
            default_top_n: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            category_order: CategoryOrder::FirstSeen,
            keywords: KeywordGroups::default(),
        }
    }
}

impl EngineConfig {
    /// Reproduces the browser dashboard's coercion, where a blank cell
    /// converts to zero and therefore counts as numeric.
    pub fn legacy() -> Self {
        Self {
            blank_is_numeric: true,
            ..Default::default()
        }
    }

    pub fn for_large_tables() -> Self {
        Self {
            sample_size: 100,
            point_row_limit: 200,
            max_upload_bytes: 100 * 1024 * 1024,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let fraction_ok = |v: f64| v > 0.0 && v < 1.0;
        if !fraction_ok(self.numeric_threshold) {
            return Err(invalid("numeric_threshold", self.numeric_threshold));
        }
        if !fraction_ok(self.date_sample_threshold) {
            return Err(invalid("date_sample_threshold", self.date_sample_threshold));
        }
        let limits = [
            ("sample_size", self.sample_size),
            ("bar_category_limit", self.bar_category_limit),
            ("pie_category_limit", self.pie_category_limit),
            ("point_row_limit", self.point_row_limit),
            ("slicer_value_limit", self.slicer_value_limit),
            ("default_histogram_bins", self.default_histogram_bins),
            ("max_histogram_bins", self.max_histogram_bins),
            ("default_top_n", self.default_top_n),
        ];
        if let Some((field, value)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(invalid(field, value));
        }
        if self.default_histogram_bins > self.max_histogram_bins {
            return Err(invalid("default_histogram_bins", self.default_histogram_bins));
        }
        if self.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes", self.max_upload_bytes));
        }
        for (group, list) in self.keywords.named_groups() {
            if list.iter().all(|w| w.trim().is_empty()) {
                return Err(ConfigError::EmptyKeywordGroup {
                    group: group.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.normalise_keywords();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    // Matching is done against lower-cased names.
    fn normalise_keywords(&mut self) {
        let k = &mut self.keywords;
        for list in [
            &mut k.revenue,
            &mut k.plan,
            &mut k.quantity,
            &mut k.price,
            &mut k.time,
            &mut k.category,
            &mut k.actual,
        ] {
            for word in list.iter_mut() {
                *word = word.trim().to_lowercase();
            }
        }
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::legacy().validate().is_ok());
        assert!(EngineConfig::for_large_tables().validate().is_ok());
    }

    #[test]
    fn rejects_threshold_outside_unit_interval() {
        let config = EngineConfig {
            numeric_threshold: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "numeric_threshold"
        ));
    }

    #[test]
    fn rejects_zero_limits() {
        let config = EngineConfig {
            pie_category_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_bins_must_fit_under_the_cap() {
        let config = EngineConfig {
            default_histogram_bins: 50,
            max_histogram_bins: 20,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "default_histogram_bins"
        ));
    }

    #[test]
    fn partial_yaml_keeps_defaults_and_lowercases_keywords() {
        let yaml = "sample_size: 25\nkeywords:\n  revenue: [\"Turnover\", \"Sales\"]\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.sample_size, 25);
        assert_eq!(config.pie_category_limit, 8);
        assert_eq!(config.keywords.revenue, vec!["turnover", "sales"]);
        assert_eq!(config.keywords.plan, KeywordGroups::default().plan);
    }

    #[test]
    fn empty_keyword_group_is_rejected() {
        let yaml = "keywords:\n  price: []\n";
        assert!(matches!(
            EngineConfig::from_yaml_str(yaml),
            Err(ConfigError::EmptyKeywordGroup { group }) if group == "price"
        ));
    }

    #[test]
    fn category_order_parses_snake_case() {
        let config = EngineConfig::from_yaml_str("category_order: by_value_desc\n").unwrap();
        assert_eq!(config.category_order, CategoryOrder::ByValueDesc);
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let config = EngineConfig::legacy();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(EngineConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
