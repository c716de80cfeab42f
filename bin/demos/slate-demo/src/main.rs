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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slate::{EngineConfig, QueryResponder, RoleMap, Slate, Table};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print column roles and the quick chart suggestions with their data.
    Inspect { file: PathBuf },
    /// Answer a single question about the file.
    Ask {
        file: PathBuf,
        #[arg(long, short)]
        query: String,
    },
    /// Print headline metrics and dashboard layouts.
    Dashboard { file: PathBuf },
    /// Read questions from stdin until EOF or "exit".
    Chat { file: PathBuf },
}

#[derive(Parser, Debug, Clone)]
#[command(name = "slate-demo")]
#[command(about = "Classify a CSV/JSON table, suggest charts and answer questions about it.")]
struct Cli {
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// YAML engine configuration; falls back to $SLATE_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit JSON instead of text where possible.
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

fn engine(config: Option<PathBuf>) -> Result<Slate> {
    let path = config.or_else(|| std::env::var_os("SLATE_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading engine configuration");
            Slate::from_yaml_file(&path)
                .with_context(|| format!("invalid configuration in {}", path.display()))
        }
        None => Ok(Slate::with_config(EngineConfig::default())?),
    }
}

fn load(slate: &Slate, file: &Path) -> Result<(Table, RoleMap, String)> {
    let table = slate
        .load_path(file)
        .with_context(|| format!("could not load {}", file.display()))?;
    if table.is_empty() {
        warn!(file = %file.display(), "table has no rows");
    }
    let roles = slate.classify(&table);
    let name = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok((table, roles, name))
}

fn print_roles(roles: &RoleMap) {
    println!("Columns:");
    for (column, role) in roles.iter() {
        let semantic = role
            .semantic_role
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        println!(
            "  {column:<24} {:<12} role={semantic:<9} temporal={} numeric={:.0}%",
            format!("{:?}", role.value_kind).to_lowercase(),
            role.temporal,
            role.numeric_fraction * 100.0
        );
    }
}

fn inspect(slate: &Slate, file: &Path, json: bool) -> Result<()> {
    let (table, roles, name) = load(slate, file)?;
    if json {
        println!("{}", slate.export_roles_json(&roles)?);
    } else {
        println!("{name}: {} rows, {} columns\n", table.len(), table.columns().len());
        print_roles(&roles);
    }
    let suggestions = slate.suggest_charts(&roles);
    if !json {
        println!("\nSuggested charts:");
    }
    for suggestion in &suggestions {
        let series = slate.aggregate(&table, &suggestion.spec);
        if json {
            println!("{}", slate.export_series_json(&series)?);
        } else {
            println!("  {:<40} {} entries", suggestion.label, series.len());
        }
    }
    Ok(())
}

fn dashboard(slate: &Slate, file: &Path, json: bool) -> Result<()> {
    let (table, _, name) = load(slate, file)?;
    let dashboard = slate.dashboard(&table);
    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }
    if dashboard.is_empty() {
        println!("No business columns found in {name}.");
        return Ok(());
    }
    for metric in &dashboard.metrics {
        let s = metric.summary;
        println!(
            "{:<24} total {:>14}  avg {:>10}  max {:>12}  min {:>12}",
            metric.label,
            slate::format::format_number(s.sum),
            slate::format::format_fixed(s.average, 0),
            slate::format::format_number(s.max),
            slate::format::format_number(s.min)
        );
    }
    for chart in &dashboard.charts {
        println!("\n{} ({:?}): {}", chart.title, chart.kind, chart.metrics.join(", "));
    }
    Ok(())
}

fn chat(slate: &Slate, file: &Path) -> Result<()> {
    let (table, roles, name) = load(slate, file)?;
    println!("{}\n", QueryResponder::greeting(&name));
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }
        println!("{}\n", slate.respond_as(query, &table, &roles, &name));
    }
    Ok(())
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("warn,slate=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let slate = engine(args.config)?;
    match args.command {
        Commands::Inspect { file } => inspect(&slate, &file, args.json),
        Commands::Ask { file, query } => {
            let (table, roles, name) = load(&slate, &file)?;
            println!("{}", slate.respond_as(&query, &table, &roles, &name));
            Ok(())
        }
        Commands::Dashboard { file } => dashboard(&slate, &file, args.json),
        Commands::Chat { file } => chat(&slate, &file),
    }
}
