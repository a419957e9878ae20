//! CSV export of the analytics bundle
//!
//! Sectioned report: KPI rows, then treemap, roll-rate, and growth tables.
//! String cells are quoted per RFC 4180 when they contain a delimiter, quote,
//! or newline, and guarded against spreadsheet formula injection: a cell
//! starting with `=`, `+`, `-`, or `@` is prefixed with an apostrophe so
//! Excel/Sheets render it as text instead of executing it.

use std::fmt::Write;

use crate::analytics::AnalyticsBundle;

/// Escape one string cell: formula guard first, then RFC 4180 quoting
pub(crate) fn escape_cell(cell: &str) -> String {
    let guarded = if cell.starts_with(['=', '+', '-', '@']) {
        format!("'{cell}")
    } else {
        cell.to_string()
    };

    if guarded.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", guarded.replace('"', "\"\""))
    } else {
        guarded
    }
}

/// Serialize the bundle as a sectioned CSV report
///
/// Total over any bundle; an empty bundle yields a minimal document stating
/// that no data is available.
pub fn to_csv(bundle: &AnalyticsBundle) -> String {
    let mut out = String::new();

    if bundle.is_empty() {
        out.push_str("section,status\n");
        out.push_str("report,No data available\n");
        return out;
    }

    out.push_str("kpi,value,unit\n");
    for result in bundle.kpis.values() {
        let _ = writeln!(
            out,
            "{},{:.4},{}",
            escape_cell(&result.name),
            result.value,
            result.unit.as_str()
        );
    }

    out.push('\n');
    out.push_str("loan_status,balance,count\n");
    for (status, cell) in &bundle.treemap {
        let _ = writeln!(out, "{},{:.2},{}", escape_cell(status), cell.balance, cell.count);
    }

    out.push('\n');
    out.push_str("dpd_bucket,count,balance\n");
    for label in &bundle.roll_rate.buckets {
        if let Some(flow) = bundle.roll_rate.counts.get(label) {
            let _ = writeln!(out, "{},{},{:.2}", escape_cell(label), flow.count, flow.balance);
        }
    }

    out.push('\n');
    out.push_str("period,projected_value\n");
    for point in &bundle.growth_projection {
        let _ = writeln!(out, "{},{:.2}", escape_cell(&point.period), point.projected_value);
    }

    out
}
