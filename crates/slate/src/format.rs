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

//! Number rendering for chat answers.

use itertools::Itertools;

fn non_finite(v: f64) -> Option<String> {
    if v.is_nan() {
        Some("NaN".to_string())
    } else if v.is_infinite() {
        Some(if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
    } else {
        None
    }
}

/// Thousands-grouped rendering with at most three fraction digits,
/// trailing zeros dropped: `1234567.891` becomes `1,234,567.891`.
pub fn format_number(v: f64) -> String {
    if let Some(s) = non_finite(v) {
        return s;
    }
    let scaled = v * 1000.0;
    // Values this large have no fraction digits to round.
    let rounded = if scaled.is_finite() { scaled.round() / 1000.0 } else { v };
    let fixed = format!("{:.3}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");
    let frac = frac_part.trim_end_matches('0');
    let sign = if rounded < 0.0 { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// Fixed-point rendering, `NaN`/`Infinity` passed through.
pub fn format_fixed(v: f64, decimals: usize) -> String {
    non_finite(v).unwrap_or_else(|| format!("{v:.decimals$}"))
}

/// Signed percentage with one decimal, e.g. `+12.5%`.
pub fn format_percent(v: f64) -> String {
    non_finite(v).unwrap_or_else(|| format!("{v:+.1}%"))
}

/// Column names with `.` and `_` shown as spaces.
pub fn display_name(column: &str) -> String {
    column.replace(['.', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands_and_trims_fraction() {
        assert_eq!(format_number(250.0), "250");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(1_234_567.891_2), "1,234,567.891");
        assert_eq!(format_number(-9876.0), "-9,876");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(999.9999), "1,000");
    }

    #[test]
    fn huge_finite_values_stay_numeric() {
        let text = format_number(1e306);
        assert!(text.starts_with("1,000,000"), "{text}");
        assert!(!text.contains("inf"));
        assert_eq!(text.len(), 307 + 102);
        assert!(format_number(-f64::MAX).starts_with("-179,769"));
    }

    #[test]
    fn passes_sentinels_through() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_fixed(f64::INFINITY, 2), "Infinity");
    }

    #[test]
    fn fixed_and_percent() {
        assert_eq!(format_fixed(2.0 / 3.0, 2), "0.67");
        assert_eq!(format_percent(12.345), "+12.3%");
        assert_eq!(format_percent(-4.0), "-4.0%");
    }

    #[test]
    fn display_names_replace_separators() {
        assert_eq!(display_name("actual_sales.eur"), "actual sales eur");
    }
}
