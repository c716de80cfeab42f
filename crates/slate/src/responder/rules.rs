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

use super::{QueryContext, QueryRule};
use crate::classifier::{name_matches, SemanticRole};
use crate::format::{format_fixed, format_number, format_percent};
use crate::stats::NumericSummary;
use crate::table::{cell, Cell, Row};
use crate::temporal::period_label;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// The built-in rules in the order they are tried.
pub fn default_rules() -> Vec<QueryRule> {
    vec![
        QueryRule {
            name: "peak_revenue",
            matches: |q| q.contains("max") && has_any(q, &["revenue", "sales"]),
            answer: peak_revenue,
        },
        QueryRule {
            name: "plan_crossings",
            matches: |q| {
                has_any(q, &["cross", "exceed", "beat"]) && has_any(q, &["plan", "target", "goal"])
            },
            answer: plan_crossings,
        },
        QueryRule {
            name: "revenue_trend",
            matches: |q| has_any(q, &["trend", "pattern"]) && has_any(q, &["revenue", "sales"]),
            answer: revenue_trend,
        },
        QueryRule {
            name: "plan_vs_actual",
            matches: |q| q.contains("compare") && has_any(q, &["actual", "plan"]),
            answer: plan_vs_actual,
        },
        QueryRule {
            name: "totals",
            // Whole-word "sum": "summary" and "summarize" go to the summary rule, not here.
            matches: |q| q.contains("total") || has_word(q, "sum"),
            answer: totals,
        },
        QueryRule {
            name: "averages",
            matches: |q| has_any(q, &["average", "mean"]),
            answer: averages,
        },
        QueryRule {
            name: "maximums",
            matches: |q| has_any(q, &["maximum", "max", "highest"]),
            answer: maximums,
        },
        QueryRule {
            name: "minimums",
            matches: |q| has_any(q, &["minimum", "min", "lowest"]),
            answer: minimums,
        },
        QueryRule {
            name: "counts",
            matches: |q| has_any(q, &["count", "how many"]),
            answer: counts,
        },
        QueryRule {
            name: "columns",
            matches: |q| has_any(q, &["columns", "fields"]),
            answer: columns,
        },
        QueryRule {
            name: "top_records",
            matches: |q| has_any(q, &["top", "first"]),
            answer: top_records,
        },
        QueryRule {
            name: "summary",
            matches: |q| has_any(q, &["summary", "summari", "overview", "insights"]),
            answer: summary,
        },
    ]
}

fn has_any(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| query.contains(n))
}

fn has_word(query: &str, word: &str) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}

fn missing(kind: &str, ctx: &QueryContext<'_>) -> String {
    format!(
        "I couldn't find {kind} column in \"{}\". Columns available: {}.",
        ctx.dataset,
        ctx.table.columns().join(", ")
    )
}

fn value(ctx: &QueryContext<'_>, row: &Row, column: &str) -> Option<f64> {
    cell(row, column).numeric_value(ctx.config.blank_is_numeric)
}

fn column_summary(ctx: &QueryContext<'_>, column: &str) -> NumericSummary {
    NumericSummary::from_values(
        &ctx.table
            .numeric_values(column, ctx.config.blank_is_numeric),
    )
}

/// Numeric revenue-like column, preferring one named after the word used
/// in the query, then one marked as actuals.
fn revenue_column<'a>(ctx: &QueryContext<'a>) -> Option<&'a str> {
    let candidates = ctx.roles.numeric_with_role(SemanticRole::Revenue);
    let asked: Vec<&str> = ["revenue", "sales"]
        .into_iter()
        .filter(|w| ctx.query.contains(w))
        .collect();
    candidates
        .iter()
        .find(|c| name_matches(c, &asked))
        .or_else(|| {
            candidates
                .iter()
                .find(|c| name_matches(c, &ctx.config.keywords.actual))
        })
        .or_else(|| candidates.first())
        .copied()
}

fn plan_column<'a>(ctx: &QueryContext<'a>) -> Option<&'a str> {
    ctx.roles
        .numeric_columns()
        .into_iter()
        .find(|c| name_matches(c, &ctx.config.keywords.plan))
}

fn actual_column<'a>(ctx: &QueryContext<'a>) -> Option<&'a str> {
    let keywords = &ctx.config.keywords;
    ctx.roles
        .numeric_columns()
        .into_iter()
        .find(|c| name_matches(c, &keywords.actual))
        .or_else(|| {
            ctx.roles
                .numeric_with_role(SemanticRole::Revenue)
                .into_iter()
                .find(|c| !name_matches(c, &keywords.plan))
        })
}

/// `(value, period)` for every row with a numeric value in `column`.
fn periodic_values(ctx: &QueryContext<'_>, column: &str) -> Vec<(f64, String)> {
    let time = ctx.roles.temporal_columns();
    ctx.table
        .rows()
        .iter()
        .filter_map(|row| value(ctx, row, column).map(|v| (v, period_label(row, &time))))
        .collect()
}

/// First row holding the largest value.
fn peak(values: &[(f64, String)]) -> Option<&(f64, String)> {
    values
        .iter()
        .fold(None, |best: Option<&(f64, String)>, current| match best {
            Some(b) if b.0 >= current.0 => Some(b),
            _ => Some(current),
        })
}

fn peak_revenue(ctx: &QueryContext<'_>) -> String {
    let Some(column) = revenue_column(ctx) else {
        return missing("a revenue or sales", ctx);
    };
    match peak(&periodic_values(ctx, column)) {
        Some((v, period)) => format!(
            "The highest {column} was {} in {period}.",
            format_number(*v)
        ),
        None => format!("{column} has no numeric values to compare."),
    }
}

fn plan_crossings(ctx: &QueryContext<'_>) -> String {
    let (Some(actual), Some(plan)) = (actual_column(ctx), plan_column(ctx)) else {
        return missing("both an actual and a plan", ctx);
    };
    let time = ctx.roles.temporal_columns();
    let crossings: Vec<String> = ctx
        .table
        .rows()
        .iter()
        .filter_map(|row| {
            let a = value(ctx, row, actual)?;
            let p = value(ctx, row, plan)?;
            (a > p).then(|| {
                format!(
                    "• {}: {} vs {} planned (+{})",
                    period_label(row, &time),
                    format_number(a),
                    format_number(p),
                    format_number(a - p)
                )
            })
        })
        .collect();
    if crossings.is_empty() {
        format!("{actual} never exceeded {plan} in any period.")
    } else {
        format!(
            "{actual} exceeded {plan} in {} period(s):\n{}",
            crossings.len(),
            crossings.join("\n")
        )
    }
}

fn revenue_trend(ctx: &QueryContext<'_>) -> String {
    let Some(column) = revenue_column(ctx) else {
        return missing("a revenue or sales", ctx);
    };
    let values = periodic_values(ctx, column);
    let (Some(first), Some(last), Some(best)) = (values.first(), values.last(), peak(&values))
    else {
        return format!("{column} has no numeric values to analyse.");
    };
    let direction = match last.0 - first.0 {
        d if d > 0.0 => "increasing",
        d if d < 0.0 => "decreasing",
        _ => "flat",
    };
    let average = values.iter().map(|(v, _)| v).sum::<f64>() / values.len() as f64;
    format!(
        "📈 **{column} trend**\n\
         • Direction: {direction} (from {} to {})\n\
         • Average: {}\n\
         • Best period: {} ({})\n\
         • Periods analysed: {}",
        format_number(first.0),
        format_number(last.0),
        format_fixed(average, 2),
        best.1,
        format_number(best.0),
        values.len()
    )
}

fn plan_vs_actual(ctx: &QueryContext<'_>) -> String {
    let (Some(actual), Some(plan)) = (actual_column(ctx), plan_column(ctx)) else {
        return missing("both an actual and a plan", ctx);
    };
    let actual_total = column_summary(ctx, actual).sum;
    let plan_total = column_summary(ctx, plan).sum;
    let variance = actual_total - plan_total;
    let percent = if plan_total == 0.0 {
        "n/a".to_string()
    } else {
        format_percent(variance / plan_total * 100.0)
    };
    format!(
        "Planned vs actual ({actual} vs {plan}):\n\
         • Total actual: {}\n\
         • Total planned: {}\n\
         • Variance: {} ({percent})",
        format_number(actual_total),
        format_number(plan_total),
        format_number(variance)
    )
}

/// One `column: value` line per numeric column.
fn per_numeric_column(
    ctx: &QueryContext<'_>,
    heading: &str,
    render: impl Fn(&NumericSummary) -> String,
) -> String {
    let numeric = ctx.roles.numeric_columns();
    if numeric.is_empty() {
        return missing("a numeric", ctx);
    }
    let lines = numeric
        .iter()
        .map(|c| format!("{c}: {}", render(&column_summary(ctx, c))))
        .join("\n");
    format!("{heading}\n{lines}")
}

fn totals(ctx: &QueryContext<'_>) -> String {
    per_numeric_column(ctx, "Here are the totals:", |s| format_number(s.sum))
}

fn averages(ctx: &QueryContext<'_>) -> String {
    per_numeric_column(ctx, "Here are the averages:", |s| format_fixed(s.average, 2))
}

fn maximums(ctx: &QueryContext<'_>) -> String {
    per_numeric_column(ctx, "Here are the maximum values:", |s| format_number(s.max))
}

fn minimums(ctx: &QueryContext<'_>) -> String {
    per_numeric_column(ctx, "Here are the minimum values:", |s| format_number(s.min))
}

fn counts(ctx: &QueryContext<'_>) -> String {
    format!(
        "Your dataset contains {} records with {} columns.",
        ctx.table.len(),
        ctx.table.columns().len()
    )
}

fn columns(ctx: &QueryContext<'_>) -> String {
    let columns = ctx.table.columns();
    format!("Your data has {} columns:\n{}", columns.len(), columns.join(", "))
}

fn top_records(ctx: &QueryContext<'_>) -> String {
    let n = FIRST_INTEGER
        .find(&ctx.query)
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(ctx.config.default_top_n);
    let shown = &ctx.table.columns()[..ctx.table.columns().len().min(3)];
    let records = ctx
        .table
        .rows()
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, row)| {
            let fields = shown
                .iter()
                .map(|c| format!("{c}: {}", cell(row, c)))
                .join(", ");
            format!("Record {}: {fields}", i + 1)
        })
        .join("\n");
    format!("Here are the top {n} records:\n{records}")
}

fn summary(ctx: &QueryContext<'_>) -> String {
    let numeric = ctx.roles.numeric_columns();
    let categorical = ctx.roles.categorical_columns();
    let mut out = format!(
        "📊 **Data Summary for {}**\n\n\
         📈 **Dataset Overview:**\n\
         • Total records: {}\n\
         • Total columns: {}\n\
         • Numeric columns: {}\n\
         • Categorical columns: {}\n",
        ctx.dataset,
        ctx.table.len(),
        ctx.table.columns().len(),
        numeric.len(),
        categorical.len()
    );
    if !numeric.is_empty() {
        out.push_str("\n🔢 **Numeric Analysis:**\n");
        for column in numeric.iter().take(ctx.config.summary_numeric_columns) {
            let s = column_summary(ctx, column);
            out.push_str(&format!(
                "• {column}: Avg {}, Range {}-{}\n",
                format_fixed(s.average, 2),
                Cell::Number(s.min),
                Cell::Number(s.max)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::QueryResponder;
    use crate::classifier::classify;
    use crate::config::EngineConfig;
    use crate::table::{Cell, Table};

    fn ask(table: &Table, query: &str) -> String {
        let config = EngineConfig::default();
        let roles = classify(table, table.columns());
        QueryResponder::new(&config).respond_as(query, table, &roles, "plan.xlsx")
    }

    fn plan_table() -> Table {
        Table::from_columns(vec![
            ("Month", vec![Cell::from(1), Cell::from(2), Cell::from(3), Cell::from(4)]),
            ("Actual Sales", vec![Cell::from(90), Cell::from(120), Cell::from(130), Cell::from(100)]),
            ("Sales Plan", vec![Cell::from(100), Cell::from(100), Cell::from(125), Cell::from(110)]),
            ("Region", vec!["N", "S", "N", "E"].into_iter().map(Cell::from).collect()),
        ])
    }

    #[test]
    fn lists_periods_where_actuals_beat_plan() {
        let reply = ask(&plan_table(), "When did we beat the plan?");
        assert!(reply.starts_with("Actual Sales exceeded Sales Plan in 2 period(s)"), "{reply}");
        assert!(reply.contains("• February: 120 vs 100 planned (+20)"), "{reply}");
        assert!(reply.contains("• March: 130 vs 125 planned (+5)"), "{reply}");
    }

    #[test]
    fn reports_when_plan_was_never_crossed() {
        let table = Table::from_columns(vec![
            ("Actual", vec![1, 2]),
            ("Target", vec![5, 5]),
        ]);
        assert_eq!(
            ask(&table, "did actuals exceed target?"),
            "Actual never exceeded Target in any period."
        );
    }

    #[test]
    fn compares_totals_against_plan() {
        let reply = ask(&plan_table(), "compare actual with plan");
        assert!(reply.contains("Total actual: 440"), "{reply}");
        assert!(reply.contains("Total planned: 435"), "{reply}");
        assert!(reply.contains("Variance: 5 (+1.1%)"), "{reply}");
    }

    #[test]
    fn describes_revenue_trend() {
        let reply = ask(&plan_table(), "what is the sales trend");
        assert!(reply.contains("Direction: increasing (from 90 to 100)"), "{reply}");
        assert!(reply.contains("Average: 110.00"), "{reply}");
        assert!(reply.contains("Best period: March (130)"), "{reply}");
        assert!(reply.contains("Periods analysed: 4"), "{reply}");
    }

    #[test]
    fn peak_prefers_the_column_named_in_the_query() {
        let table = Table::from_columns(vec![
            ("Net Revenue", vec![5, 9]),
            ("Sales", vec![50, 10]),
        ]);
        assert!(ask(&table, "max sales").starts_with("The highest Sales was 50 in Unknown"));
        assert!(ask(&table, "max revenue").starts_with("The highest Net Revenue was 9"));
    }

    #[test]
    fn missing_revenue_column_is_explained() {
        let table = Table::from_columns(vec![("Colour", vec!["red"])]);
        let reply = ask(&table, "max revenue please");
        assert!(reply.starts_with("I couldn't find a revenue or sales column"), "{reply}");
    }

    #[test]
    fn generic_aggregates_cover_numeric_columns() {
        let table = plan_table();
        assert_eq!(
            ask(&table, "sum everything"),
            "Here are the totals:\nMonth: 10\nActual Sales: 440\nSales Plan: 435"
        );
        assert!(ask(&table, "mean values").contains("Actual Sales: 110.00"));
        assert!(ask(&table, "highest values").contains("Sales Plan: 125"));
        assert!(ask(&table, "lowest values").contains("Actual Sales: 90"));
        assert_eq!(ask(&table, "how many rows"), "Your dataset contains 4 records with 4 columns.");
        assert_eq!(
            ask(&table, "list the fields"),
            "Your data has 4 columns:\nMonth, Actual Sales, Sales Plan, Region"
        );
    }

    #[test]
    fn top_records_use_requested_count_and_first_three_columns() {
        let reply = ask(&plan_table(), "show the top 2 rows");
        assert_eq!(
            reply,
            "Here are the top 2 records:\n\
             Record 1: Month: 1, Actual Sales: 90, Sales Plan: 100\n\
             Record 2: Month: 2, Actual Sales: 120, Sales Plan: 100"
        );
        assert!(ask(&plan_table(), "first records").starts_with("Here are the top 5 records:"));
    }

    #[test]
    fn summary_is_not_mistaken_for_sum() {
        let reply = ask(&plan_table(), "give me a summary");
        assert!(reply.starts_with("📊 **Data Summary for plan.xlsx**"), "{reply}");
        assert!(reply.contains("• Numeric columns: 3"));
        assert!(reply.contains("• Categorical columns: 1"));
        assert!(reply.contains("• Actual Sales: Avg 110.00, Range 90-130"));
    }

    #[test]
    fn summarize_requests_get_the_summary_not_totals() {
        for query in ["summarize this file", "please summarise"] {
            let reply = ask(&plan_table(), query);
            assert!(reply.starts_with("📊 **Data Summary for plan.xlsx**"), "{query}: {reply}");
        }
        assert!(ask(&plan_table(), "what is the sum").starts_with("Here are the totals:"));
    }

    #[test]
    fn degenerate_averages_pass_through() {
        let table = Table::from_columns(vec![("v", Vec::<Cell>::new())]);
        let config = EngineConfig::legacy();
        let roles = classify(&table, table.columns());
        let reply = QueryResponder::new(&config).respond("average", &table, &roles);
        assert!(reply.contains("I couldn't find a numeric column") || reply.contains("NaN"));
    }
}
