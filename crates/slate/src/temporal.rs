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

use crate::table::{cell, Cell, Row, Table};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Label returned when no time-like column yields a value.
pub const UNKNOWN_PERIOD: &str = "Unknown";

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%m-%d-%y",
    "%d/%m/%Y",
    "%d/%m/%y",
    "%d-%m-%Y",
    "%d-%m-%y",
    "%d.%m.%Y",
    "%d.%m.%y",
    "%b %d, %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%Y/%m/%d",
    "%y/%m/%d",
    "%Y%m%d",
    "%d%m%Y",
    "%m%d%Y",
];

const DISPLAY_FORMAT: &str = "%b %d, %Y";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    Timestamp(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateParseResult {
    pub is_date: bool,
    pub parsed: Option<NaiveDateTime>,
    pub display: String,
    pub sort_key: SortKey,
}

impl DateParseResult {
    fn date(parsed: NaiveDateTime) -> Self {
        Self {
            is_date: true,
            parsed: Some(parsed),
            display: parsed.format(DISPLAY_FORMAT).to_string(),
            sort_key: SortKey::Timestamp(parsed.and_utc().timestamp_millis()),
        }
    }

    fn not_a_date(text: &str) -> Self {
        Self {
            is_date: false,
            parsed: None,
            display: text.to_string(),
            sort_key: SortKey::Text(text.to_lowercase()),
        }
    }

    pub fn month_name(&self) -> Option<&'static str> {
        self.parsed.and_then(|dt| month_name(dt.month()))
    }
}

/// Full English name of a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Case-insensitive search for a full month name, then a three-letter
/// abbreviation, anywhere in `text`.
pub fn month_in_text(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|name| lower.contains(&name.to_lowercase()))
        .or_else(|| {
            MONTH_NAMES
                .iter()
                .find(|name| lower.contains(&name[..3].to_lowercase()))
        })
        .copied()
}

fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses date-like text: RFC 3339 first, then the known layouts in order.
pub fn parse_text_date(text: &str) -> Option<NaiveDateTime> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| parse_with_format(value, format))
}

// Excel stores dates as day counts from 1900-01-01 (day 1).
fn excel_serial_date(serial: f64) -> Option<NaiveDateTime> {
    if !(serial > 1.0 && serial < 100_000.0) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let millis = ((serial - 1.0) * 86_400_000.0).round() as i64;
    let date = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    (date.year() > 1900 && date.year() < 2100).then_some(date)
}

fn unix_timestamp_date(value: f64) -> Option<NaiveDateTime> {
    let millis = if value > 1e9 && value < 1e10 {
        value * 1000.0
    } else if value > 1e12 && value < 1e13 {
        value
    } else {
        return None;
    };
    DateTime::from_timestamp_millis(millis.round() as i64).map(|dt| dt.naive_utc())
}

/// Full date detection for a cell: text layouts, then Excel serial day
/// numbers, then Unix timestamps in seconds or milliseconds.
pub fn parse_date(value: &Cell) -> DateParseResult {
    if value.is_blank() {
        return DateParseResult::not_a_date(&value.label());
    }
    let text = value.label();
    let text = text.trim();
    if let Some(dt) = parse_text_date(text) {
        return DateParseResult::date(dt);
    }
    let n = value.coerce_number();
    if n.is_finite() {
        if let Some(dt) = excel_serial_date(n).or_else(|| unix_timestamp_date(n)) {
            return DateParseResult::date(dt);
        }
    }
    DateParseResult::not_a_date(text)
}

/// Text cells that read as dates. Numbers never qualify, so plain numeric
/// measures are not mistaken for serial dates.
pub fn is_textual_date(value: &Cell) -> bool {
    match value {
        Cell::Text(s) => s.trim().parse::<f64>().is_err() && parse_text_date(s).is_some(),
        _ => false,
    }
}

/// Columns where strictly more than `threshold` of the leading
/// `sample_size` cells parse as dates under [`parse_date`].
pub fn detect_date_columns(
    table: &Table,
    columns: &[String],
    sample_size: usize,
    threshold: f64,
) -> Vec<String> {
    let sample = sample_size.min(table.len());
    if sample == 0 {
        return Vec::new();
    }
    columns
        .iter()
        .filter(|column| {
            let dates = table.rows()[..sample]
                .iter()
                .filter(|row| parse_date(cell(row, column)).is_date)
                .count();
            dates as f64 > sample as f64 * threshold
        })
        .cloned()
        .collect()
}

/// Period label for one cell of a time-like column, `None` when blank.
pub fn period_of_cell(column: &str, value: &Cell) -> Option<String> {
    if value.is_blank() {
        return None;
    }
    if let Cell::Number(n) = value {
        if column.to_lowercase().contains("month") && n.fract() == 0.0 {
            if let Some(name) = month_name(*n as u32) {
                return Some(name.to_string());
            }
        }
        return Some(value.label());
    }
    let text = value.label();
    if let Some(name) = month_in_text(&text) {
        return Some(name.to_string());
    }
    if let Some(name) = parse_text_date(&text).and_then(|dt| month_name(dt.month())) {
        return Some(name.to_string());
    }
    Some(text)
}

/// Period label for a row: the first time-like column with a non-blank
/// value decides. [`UNKNOWN_PERIOD`] when none does.
pub fn period_label(row: &Row, time_columns: &[&str]) -> String {
    time_columns
        .iter()
        .find_map(|column| period_of_cell(column, cell(row, column)))
        .unwrap_or_else(|| UNKNOWN_PERIOD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_full_names_before_abbreviations() {
        assert_eq!(month_in_text("Sales for MARCH"), Some("March"));
        assert_eq!(month_in_text("feb-24"), Some("February"));
        assert_eq!(month_in_text("Q1"), None);
    }

    #[test]
    fn parses_common_layouts() {
        for value in ["2024-03-15", "03/15/2024", "15.03.2024", "Mar 15, 2024", "15 March 2024"] {
            let parsed = parse_text_date(value).unwrap_or_else(|| panic!("{value}"));
            assert_eq!(parsed.month(), 3, "{value}");
        }
        assert!(parse_text_date("2024-03-15T10:30:00Z").is_some());
        for value in ["March 15, 2024", "March 5, 2024", "5 September 2023"] {
            assert!(parse_text_date(value).is_some(), "{value}");
        }
        assert!(is_textual_date(&Cell::from("15 March 2024")));
        assert!(parse_text_date("north").is_none());
    }

    #[test]
    fn excel_serials_and_unix_timestamps_are_dates() {
        let serial = parse_date(&Cell::from(45_000));
        assert!(serial.is_date);
        assert_eq!(serial.parsed.unwrap().year(), 2023);
        let unix = parse_date(&Cell::from(1_700_000_000_i64));
        assert!(unix.is_date);
        assert_eq!(unix.display, "Nov 14, 2023");
        assert!(!parse_date(&Cell::from(0.5)).is_date);
    }

    #[test]
    fn non_dates_keep_text_sort_key() {
        let result = parse_date(&Cell::from("North"));
        assert!(!result.is_date);
        assert_eq!(result.sort_key, SortKey::Text("north".into()));
    }

    #[test]
    fn textual_dates_exclude_numbers() {
        assert!(is_textual_date(&Cell::from("2024-01-31")));
        assert!(!is_textual_date(&Cell::from("20240131")));
        assert!(!is_textual_date(&Cell::from(45_000)));
    }

    #[test]
    fn detects_date_columns_by_majority() {
        let table = Table::from_columns(vec![
            ("when", vec!["2024-01-01", "2024-02-01", "oops"]),
            ("who", vec!["a", "b", "c"]),
        ]);
        let columns = table.columns().to_vec();
        assert_eq!(detect_date_columns(&table, &columns, 10, 0.5), vec!["when"]);
    }

    #[test]
    fn period_labels_resolve_month_names_dates_and_raw_values() {
        let mut row = Row::new();
        row.insert("Month".into(), Cell::from("Feb"));
        assert_eq!(period_label(&row, &["Month"]), "February");

        row.insert("Month".into(), Cell::from(4));
        assert_eq!(period_label(&row, &["Month"]), "April");

        row.insert("Date".into(), Cell::from("2024-07-04"));
        assert_eq!(period_label(&row, &["Date"]), "July");

        row.insert("Period".into(), Cell::from("Q3"));
        assert_eq!(period_label(&row, &["Period"]), "Q3");

        row.insert("Year".into(), Cell::Empty);
        assert_eq!(period_label(&row, &["Year", "Period"]), "Q3");
        assert_eq!(period_label(&row, &[]), UNKNOWN_PERIOD);
    }
}
