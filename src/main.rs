//! Portfolio Analytics CLI
//!
//! Demo run over a small inline portfolio

use chrono::Local;
use portfolio_analytics::loan::PortfolioSummary;
use portfolio_analytics::{
    build_analytics, export, ingest_csv, AggregatorOptions, IngestOptions,
};

const SAMPLE_PORTFOLIO: &str = "\
loan_amount,appraised_value,borrower_income,monthly_debt,loan_status,interest_rate,principal_balance,dpd_status,payments_scheduled,payments_received
10000,20000,60000,1000,current,5.5,9500,0-7,500,500
25000,40000,84000,1800,current,6.1,23800,0-7,900,860
18000,30000,72000,1500,late,7.4,17200,30-60,750,420
32000,45000,96000,2100,default,8.9,31500,90+,1200,0
";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Portfolio Analytics v0.1.0");
    println!("==========================\n");

    let ingested = ingest_csv(SAMPLE_PORTFOLIO, &IngestOptions::default())?;
    let rows = ingested.data;
    println!("Ingested {} loans", rows.len());
    for warning in &ingested.warnings {
        println!("  warning: {warning}");
    }

    let summary = PortfolioSummary::from_rows(&rows);
    println!("\nPortfolio:");
    println!("  Total Balance: ${:.2}", summary.total_principal_balance);
    println!("  30+ Overdue:   ${:.2}", summary.overdue_30_balance);
    println!("  90+ Overdue:   ${:.2}", summary.overdue_90_balance);
    println!("  Avg Rate:      {:.2}%", summary.average_interest_rate);

    let as_of = Local::now().date_naive();
    let result = build_analytics(&rows, &AggregatorOptions::new(as_of));
    let bundle = result.data;
    for warning in &result.warnings {
        println!("  warning: {warning}");
    }

    println!("\nKPIs:");
    println!("{:>20} {:>10} {:>8}", "Metric", "Value", "Unit");
    println!("{}", "-".repeat(40));
    for kpi in bundle.kpis.values() {
        println!("{:>20} {:>10.4} {:>8}", kpi.name, kpi.value, kpi.unit.as_str());
    }

    println!("\nBalance by Status:");
    for (status, cell) in &bundle.treemap {
        println!("  {:<10} ${:>12.2} ({} loans)", status, cell.balance, cell.count);
    }

    println!("\nGrowth Projection:");
    for point in &bundle.growth_projection {
        println!("  {} ${:>12.2}", point.period, point.projected_value);
    }

    let csv_path = "analytics_output.csv";
    std::fs::write(csv_path, export::to_csv(&bundle))?;
    println!("\nFull report written to: {csv_path}");

    Ok(())
}
