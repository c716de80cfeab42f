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

use serde::{Deserialize, Serialize};

/// Sum, mean and extremes over a set of numeric values.
///
/// An empty set is not an error: `average` is `NaN`, `max` is `-inf` and
/// `min` is `+inf`. Callers that display these must check
/// [`NumericSummary::is_empty`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub sum: f64,
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

impl NumericSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let sum: f64 = values.iter().sum();
        let count = values.len();
        Self {
            sum,
            average: sum / count as f64,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self::from_values(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarises_values() {
        let s = NumericSummary::from_values(&[4.0, -2.0, 10.0]);
        assert_eq!(s.sum, 12.0);
        assert_eq!(s.average, 4.0);
        assert_eq!(s.max, 10.0);
        assert_eq!(s.min, -2.0);
        assert_eq!(s.count, 3);
    }

    #[test]
    fn empty_set_yields_sentinels() {
        let s = NumericSummary::default();
        assert!(s.is_empty());
        assert_eq!(s.sum, 0.0);
        assert!(s.average.is_nan());
        assert_eq!(s.max, f64::NEG_INFINITY);
        assert_eq!(s.min, f64::INFINITY);
    }
}
