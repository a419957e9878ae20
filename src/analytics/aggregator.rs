//! Builds the analytics bundle from validated loan rows
//!
//! The aggregator drives the KPI engine internally and merges its results, so
//! one call yields the complete bundle. Growth-projection period boundaries
//! use calendar month arithmetic (`chrono::Months`), not fixed 30-day steps.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use log::debug;

use super::{AnalyticsBundle, BucketFlow, GrowthPoint, RollRateMatrix, TreemapCell};
use crate::error::Validated;
use crate::kpi::{EngineConfig, KpiEngine};
use crate::loan::{DpdBucket, LoanRow};

/// Forward growth series configuration
#[derive(Debug, Clone, Copy)]
pub struct GrowthConfig {
    /// Number of forward periods to project
    pub periods: u32,

    /// Compound monthly growth rate applied to observed balance
    pub monthly_rate: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            periods: 6,
            monthly_rate: 0.02,
        }
    }
}

/// Aggregator configuration
///
/// `as_of` anchors the growth-projection periods and is injected by the
/// caller so repeated runs over the same input produce identical bundles.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorOptions {
    /// Observation date anchoring the projection series
    pub as_of: NaiveDate,

    /// Growth series configuration
    pub growth: GrowthConfig,

    /// KPI engine configuration
    pub engine: EngineConfig,
}

impl AggregatorOptions {
    /// Options with default growth and engine settings
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            growth: GrowthConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Build the full analytics bundle, stamping KPIs with the current time
pub fn build_analytics(rows: &[LoanRow], opts: &AggregatorOptions) -> Validated<AnalyticsBundle> {
    build_analytics_at(rows, opts, Utc::now())
}

/// Build the full analytics bundle against an injected clock
pub fn build_analytics_at(
    rows: &[LoanRow],
    opts: &AggregatorOptions,
    at: DateTime<Utc>,
) -> Validated<AnalyticsBundle> {
    let mut warnings = Vec::new();

    let run = KpiEngine::new(opts.engine).calculate_all_at(rows, at);
    warnings.extend(run.warnings);

    let treemap = build_treemap(rows, &mut warnings);
    let roll_rate = build_roll_rate(rows, &mut warnings);
    let growth_projection = build_growth_projection(rows, opts);

    debug!(
        "analytics bundle: {} kpis, {} status groups, {} occupied buckets",
        run.kpis.len(),
        treemap.len(),
        roll_rate.counts.len()
    );

    Validated::with_warnings(
        AnalyticsBundle {
            kpis: run.kpis,
            treemap,
            roll_rate,
            growth_projection,
        },
        warnings,
    )
}

/// Group rows by loan status, summing balance and counting rows
fn build_treemap(rows: &[LoanRow], warnings: &mut Vec<String>) -> BTreeMap<String, TreemapCell> {
    let mut treemap: BTreeMap<String, TreemapCell> = BTreeMap::new();

    for row in rows {
        let cell = treemap
            .entry(row.loan_status.clone())
            .or_insert(TreemapCell {
                balance: 0.0,
                count: 0,
            });
        cell.balance += row.principal_balance;
        cell.count += 1;
    }

    if treemap.is_empty() {
        warnings.push("treemap is empty".to_string());
    }
    treemap
}

/// Tally rows into delinquency buckets; rows without a bucket are excluded
/// from this view only and reported in one warning
fn build_roll_rate(rows: &[LoanRow], warnings: &mut Vec<String>) -> RollRateMatrix {
    let mut counts: BTreeMap<String, BucketFlow> = BTreeMap::new();
    let mut missing = 0usize;

    for row in rows {
        match row.dpd_status {
            Some(bucket) => {
                let flow = counts
                    .entry(bucket.as_str().to_string())
                    .or_insert(BucketFlow {
                        count: 0,
                        balance: 0.0,
                    });
                flow.count += 1;
                flow.balance += row.principal_balance;
            }
            None => missing += 1,
        }
    }

    if missing > 0 {
        warnings.push(format!(
            "{missing} rows missing dpd_status, excluded from roll-rate"
        ));
    }

    // Axis in canonical delinquency order, restricted to occupied buckets
    let buckets = DpdBucket::ALL
        .iter()
        .map(|b| b.as_str().to_string())
        .filter(|label| counts.contains_key(label))
        .collect();

    RollRateMatrix { buckets, counts }
}

/// Compound-growth projection from observed total balance
///
/// Period labels advance with calendar month arithmetic from `as_of`; a
/// fixed-length series is produced even for an empty portfolio (all zeros).
fn build_growth_projection(rows: &[LoanRow], opts: &AggregatorOptions) -> Vec<GrowthPoint> {
    let base: f64 = rows.iter().map(|r| r.principal_balance).sum();
    let mut series = Vec::with_capacity(opts.growth.periods as usize);

    for i in 1..=opts.growth.periods {
        let period_date = opts.as_of + Months::new(i);
        let projected_value = base * (1.0 + opts.growth.monthly_rate).powi(i as i32);
        series.push(GrowthPoint {
            period: period_date.format("%Y-%m").to_string(),
            projected_value,
        });
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn row(status: &str, balance: f64, bucket: Option<DpdBucket>) -> LoanRow {
        LoanRow {
            loan_amount: 10_000.0,
            appraised_value: 20_000.0,
            borrower_income: 5_000.0,
            monthly_debt: 1_000.0,
            loan_status: status.to_string(),
            interest_rate: 5.5,
            principal_balance: balance,
            dpd_status: bucket,
            payments_scheduled: None,
            payments_received: None,
        }
    }

    #[test]
    fn test_treemap_groups_by_status() {
        let rows = vec![
            row("current", 9_500.0, Some(DpdBucket::Current)),
            row("current", 500.0, Some(DpdBucket::Current)),
            row("default", 2_000.0, Some(DpdBucket::Late90Plus)),
        ];
        let bundle = build_analytics_at(&rows, &AggregatorOptions::new(as_of()), ts()).data;

        assert_eq!(bundle.treemap.len(), 2);
        assert_relative_eq!(bundle.treemap["current"].balance, 10_000.0, epsilon = 1e-9);
        assert_eq!(bundle.treemap["current"].count, 2);
        assert_eq!(bundle.treemap["default"].count, 1);
    }

    #[test]
    fn test_empty_input_is_valid_with_warnings() {
        let result = build_analytics_at(&[], &AggregatorOptions::new(as_of()), ts());
        assert!(result.data.treemap.is_empty());
        assert!(result.data.roll_rate.is_empty());
        assert!(result.warnings.iter().any(|w| w == "treemap is empty"));
        // KPIs still present, all zero-valued
        assert_eq!(result.data.kpis["par30"].value, 0.0);
    }

    #[test]
    fn test_roll_rate_excludes_missing_dpd() {
        let rows = vec![
            row("current", 9_500.0, Some(DpdBucket::Current)),
            row("current", 1_000.0, None),
        ];
        let result = build_analytics_at(&rows, &AggregatorOptions::new(as_of()), ts());

        assert_eq!(result.data.roll_rate.counts.len(), 1);
        assert_eq!(result.data.roll_rate.counts["0-7"].count, 1);
        // Excluded from roll-rate, still counted in the treemap
        assert_eq!(result.data.treemap["current"].count, 2);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("1 rows missing dpd_status")));
    }

    #[test]
    fn test_roll_rate_axis_in_canonical_order() {
        let rows = vec![
            row("d", 1.0, Some(DpdBucket::Late90Plus)),
            row("c", 1.0, Some(DpdBucket::Current)),
            row("l", 1.0, Some(DpdBucket::Late30)),
        ];
        let bundle = build_analytics_at(&rows, &AggregatorOptions::new(as_of()), ts()).data;
        assert_eq!(bundle.roll_rate.buckets, vec!["0-7", "30-60", "90+"]);
    }

    #[test]
    fn test_growth_projection_compound() {
        let rows = vec![row("current", 10_000.0, None)];
        let bundle = build_analytics_at(&rows, &AggregatorOptions::new(as_of()), ts()).data;

        assert_eq!(bundle.growth_projection.len(), 6);
        assert_eq!(bundle.growth_projection[0].period, "2026-02");
        assert_eq!(bundle.growth_projection[5].period, "2026-07");
        assert_relative_eq!(
            bundle.growth_projection[0].projected_value,
            10_200.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            bundle.growth_projection[5].projected_value,
            10_000.0 * 1.02f64.powi(6),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_growth_periods_calendar_correct() {
        // Jan 31 + 1 month clamps to Feb, not "Mar 2" via +30 days
        let opts = AggregatorOptions::new(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        let rows = vec![row("current", 1_000.0, None)];
        let bundle = build_analytics_at(&rows, &opts, ts()).data;

        let periods: Vec<&str> = bundle
            .growth_projection
            .iter()
            .map(|p| p.period.as_str())
            .collect();
        assert_eq!(
            periods,
            vec!["2026-02", "2026-03", "2026-04", "2026-05", "2026-06", "2026-07"]
        );
    }

    #[test]
    fn test_bundles_identical_across_runs() {
        let rows = vec![
            row("current", 9_500.0, Some(DpdBucket::Current)),
            row("default", 2_000.0, Some(DpdBucket::Late90Plus)),
        ];
        let opts = AggregatorOptions::new(as_of());
        let a = build_analytics_at(&rows, &opts, ts()).data;
        let b = build_analytics_at(&rows, &opts, ts()).data;
        assert_eq!(a, b);
    }
}
