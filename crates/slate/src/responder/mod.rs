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

//! Keyword-driven answers to free-text questions about a table.
//!
//! A [`QueryResponder`] walks an ordered list of [`QueryRule`]s against the
//! lower-cased query and lets the first match answer. When nothing
//! matches, the reply is a help message. Responding never fails.

mod rules;

pub use rules::default_rules;

use crate::classifier::RoleMap;
use crate::config::EngineConfig;
use crate::table::Table;
use tracing::debug;

/// Display name used when the caller does not supply one.
pub const DEFAULT_DATASET: &str = "your data";

/// Everything a rule may look at while answering.
pub struct QueryContext<'a> {
    /// Lower-cased query text.
    pub query: String,
    pub table: &'a Table,
    pub roles: &'a RoleMap,
    pub dataset: &'a str,
    pub config: &'a EngineConfig,
}

#[derive(Clone, Copy)]
pub struct QueryRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub answer: fn(&QueryContext<'_>) -> String,
}

impl std::fmt::Debug for QueryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRule").field("name", &self.name).finish()
    }
}

pub struct QueryResponder<'a> {
    config: &'a EngineConfig,
    rules: Vec<QueryRule>,
}

impl<'a> QueryResponder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self::from_rules(config, default_rules())
    }

    pub fn from_rules(config: &'a EngineConfig, rules: Vec<QueryRule>) -> Self {
        Self { config, rules }
    }

    /// Appends a rule after the existing ones; the help fallback stays last.
    pub fn push(&mut self, rule: QueryRule) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn respond(&self, query: &str, table: &Table, roles: &RoleMap) -> String {
        self.respond_as(query, table, roles, DEFAULT_DATASET)
    }

    /// Like [`respond`](Self::respond), naming the dataset `dataset` in replies.
    pub fn respond_as(&self, query: &str, table: &Table, roles: &RoleMap, dataset: &str) -> String {
        let ctx = QueryContext {
            query: query.to_lowercase(),
            table,
            roles,
            dataset,
            config: self.config,
        };
        match self.rules.iter().find(|rule| (rule.matches)(&ctx.query)) {
            Some(rule) => {
                debug!(rule = rule.name, "query matched rule");
                (rule.answer)(&ctx)
            }
            None => {
                debug!("no rule matched, replying with help");
                help(&ctx)
            }
        }
    }

    /// Opening message for a chat about `dataset`.
    pub fn greeting(dataset: &str) -> String {
        format!(
            "Hi! I'm your data assistant. I can help you analyze the data from \"{dataset}\". \
             You can ask me questions like:\n\n\
             • \"What's the average value of [column name]?\"\n\
             • \"Show me the top 5 records\"\n\
             • \"Which month had the max revenue?\"\n\
             • \"Summarize the key insights\"\n\n\
             What would you like to know about your data?"
        )
    }
}

fn help(ctx: &QueryContext<'_>) -> String {
    format!(
        "I can help you analyze your data from \"{}\" which contains {} records and {} columns. \
         Try asking me about:\n\n\
         • Statistical summaries (average, total, max, min)\n\
         • Data counts and distributions\n\
         • Top records or specific values\n\
         • Column information\n\
         • Revenue peaks, trends and plan vs actual comparisons\n\n\
         What specific aspect would you like to explore?",
        ctx.dataset,
        ctx.table.len(),
        ctx.table.columns().len()
    )
}

/// Answers `query` with the default rules and configuration.
pub fn respond(query: &str, table: &Table, roles: &RoleMap) -> String {
    let config = EngineConfig::default();
    QueryResponder::new(&config).respond(query, table, roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::table::Cell;

    fn monthly() -> (Table, RoleMap) {
        let table = Table::from_columns(vec![
            ("Month", vec![Cell::from("Jan"), Cell::from("Feb"), Cell::from("Mar")]),
            ("Revenue", vec![Cell::from(100), Cell::from(250), Cell::from(80)]),
        ]);
        let roles = classify(&table, table.columns());
        (table, roles)
    }

    #[test]
    fn names_the_month_with_peak_revenue() {
        let (table, roles) = monthly();
        let reply = respond("Which month had the MAX revenue?", &table, &roles);
        assert!(reply.contains("Feb"), "{reply}");
        assert!(reply.contains("250"), "{reply}");
    }

    #[test]
    fn unmatched_queries_get_help() {
        let (table, roles) = monthly();
        let config = EngineConfig::default();
        let reply = QueryResponder::new(&config).respond_as("hello there", &table, &roles, "q1.xlsx");
        assert!(reply.contains("\"q1.xlsx\""));
        assert!(reply.contains("3 records and 2 columns"));
    }

    #[test]
    fn default_rule_order_is_stable() {
        let config = EngineConfig::default();
        assert_eq!(
            QueryResponder::new(&config).rule_names(),
            vec![
                "peak_revenue",
                "plan_crossings",
                "revenue_trend",
                "plan_vs_actual",
                "totals",
                "averages",
                "maximums",
                "minimums",
                "counts",
                "columns",
                "top_records",
                "summary",
            ]
        );
    }

    #[test]
    fn pushed_rules_run_before_help_only() {
        let (table, roles) = monthly();
        let config = EngineConfig::default();
        let mut responder = QueryResponder::new(&config);
        responder.push(QueryRule {
            name: "greeting",
            matches: |q| q.contains("hello"),
            answer: |ctx| format!("hello from {}", ctx.dataset),
        });
        assert_eq!(responder.respond("hello", &table, &roles), "hello from your data");
        // Earlier rules still win.
        assert!(responder.respond("hello, how many rows?", &table, &roles).starts_with("Your dataset"));
    }

    #[test]
    fn custom_rule_lists_replace_defaults() {
        let (table, roles) = monthly();
        let config = EngineConfig::default();
        let responder = QueryResponder::from_rules(&config, Vec::new());
        assert!(responder.respond("total", &table, &roles).starts_with("I can help"));
    }

    #[test]
    fn empty_table_never_panics() {
        let table = Table::default();
        let roles = classify(&table, &["Revenue", "Plan", "Month"]);
        for query in [
            "max revenue",
            "did we beat the plan",
            "revenue trend",
            "compare actual and plan",
            "total",
            "average",
            "max",
            "min",
            "count",
            "columns",
            "top 3",
            "summary",
            "???",
        ] {
            let reply = respond(query, &table, &roles);
            assert!(!reply.is_empty(), "{query}");
        }
    }

    #[test]
    fn greeting_names_the_dataset() {
        assert!(QueryResponder::greeting("sales.csv").contains("\"sales.csv\""));
    }
}
