//! Run the full analytics pipeline over a portfolio CSV file
//!
//! Reads the upload, validates and ingests every row, builds the analytics
//! bundle, and writes the report in the chosen format(s).

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use portfolio_analytics::loan::{load_portfolio, PortfolioSummary};
use portfolio_analytics::{build_analytics, export, AggregatorOptions, IngestOptions, ParseMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
    Markdown,
}

#[derive(Parser, Debug)]
#[command(name = "run_portfolio", about = "Loan portfolio analytics pipeline")]
struct Args {
    /// Portfolio CSV file to ingest
    input: PathBuf,

    /// Output file; format-specific default extension when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: Format,

    /// Drop invalid rows with warnings instead of aborting the ingest
    #[arg(long)]
    lenient: bool,

    /// Observation date anchoring the growth projection (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let opts = IngestOptions {
        mode: if args.lenient {
            ParseMode::Lenient
        } else {
            ParseMode::Strict
        },
    };

    println!("Loading portfolio from {}...", args.input.display());
    let ingested = load_portfolio(&args.input, &opts)
        .with_context(|| format!("failed to ingest {}", args.input.display()))?;
    let rows = ingested.data;
    println!("Loaded {} loans in {:?}", rows.len(), start.elapsed());
    for warning in &ingested.warnings {
        println!("  warning: {warning}");
    }

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let result = build_analytics(&rows, &AggregatorOptions::new(as_of));
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }
    let bundle = result.data;

    let (content, default_name) = match args.format {
        Format::Csv => (export::to_csv(&bundle), "analytics_output.csv"),
        Format::Json => (export::to_json(&bundle)?, "analytics_output.json"),
        Format::Markdown => (export::to_markdown(&bundle), "analytics_output.md"),
    };
    let output = args.output.unwrap_or_else(|| PathBuf::from(default_name));
    std::fs::write(&output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Report written to {}", output.display());

    let summary = PortfolioSummary::from_rows(&rows);
    println!("\nPortfolio Summary:");
    println!("  Loans:         {}", summary.row_count);
    println!("  Total Balance: ${:.2}", summary.total_principal_balance);
    println!("  30+ Overdue:   ${:.2}", summary.overdue_30_balance);
    println!("  90+ Overdue:   ${:.2}", summary.overdue_90_balance);
    for kpi in bundle.kpis.values() {
        println!("  {:<18} {:.4} {}", kpi.name, kpi.value, kpi.unit.as_str());
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
