//! Markdown export of the analytics bundle
//!
//! GFM tables, one section per view. Pipes, backticks, and newlines in string
//! cells are escaped so a hostile loan-status value cannot break the table
//! layout.

use std::fmt::Write;

use crate::analytics::AnalyticsBundle;

/// Escape one table cell for GFM rendering
pub(crate) fn escape_cell(cell: &str) -> String {
    cell.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('`', "\\`")
        .replace(['\n', '\r'], " ")
}

/// Serialize the bundle as a Markdown report
///
/// Total over any bundle; an empty bundle yields a minimal document stating
/// that no data is available.
pub fn to_markdown(bundle: &AnalyticsBundle) -> String {
    let mut out = String::from("# Portfolio Analytics\n");

    if bundle.is_empty() {
        out.push_str("\nNo data available.\n");
        return out;
    }

    out.push_str("\n## KPIs\n\n");
    out.push_str("| Metric | Value | Unit |\n");
    out.push_str("| --- | --- | --- |\n");
    for result in bundle.kpis.values() {
        let _ = writeln!(
            out,
            "| {} | {:.4} | {} |",
            escape_cell(&result.name),
            result.value,
            result.unit.as_str()
        );
    }

    out.push_str("\n## Balance by Loan Status\n\n");
    if bundle.treemap.is_empty() {
        out.push_str("No data available.\n");
    } else {
        out.push_str("| Loan Status | Balance | Count |\n");
        out.push_str("| --- | --- | --- |\n");
        for (status, cell) in &bundle.treemap {
            let _ = writeln!(
                out,
                "| {} | {:.2} | {} |",
                escape_cell(status),
                cell.balance,
                cell.count
            );
        }
    }

    out.push_str("\n## Delinquency Buckets\n\n");
    if bundle.roll_rate.is_empty() {
        out.push_str("No data available.\n");
    } else {
        out.push_str("| DPD Bucket | Count | Balance |\n");
        out.push_str("| --- | --- | --- |\n");
        for label in &bundle.roll_rate.buckets {
            if let Some(flow) = bundle.roll_rate.counts.get(label) {
                let _ = writeln!(
                    out,
                    "| {} | {} | {:.2} |",
                    escape_cell(label),
                    flow.count,
                    flow.balance
                );
            }
        }
    }

    out.push_str("\n## Growth Projection\n\n");
    if bundle.growth_projection.is_empty() {
        out.push_str("No data available.\n");
    } else {
        out.push_str("| Period | Projected Value |\n");
        out.push_str("| --- | --- |\n");
        for point in &bundle.growth_projection {
            let _ = writeln!(
                out,
                "| {} | {:.2} |",
                escape_cell(&point.period),
                point.projected_value
            );
        }
    }

    out
}
