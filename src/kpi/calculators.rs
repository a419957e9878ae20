//! KPI calculators
//!
//! Each calculator is a pure function over the row set: no side effects, no
//! panics. A zero denominator produces a zero-valued result with a diagnostic
//! component instead of NaN or infinity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::result::{KpiResult, KpiUnit};
use crate::loan::LoanRow;

/// Metric names used as engine map keys
pub const PAR30: &str = "par30";
pub const PAR90: &str = "par90";
pub const COLLECTION_RATE: &str = "collection_rate";
pub const PORTFOLIO_HEALTH: &str = "portfolio_health";

/// Diagnostic component recorded when no row carries payment data
pub const INSUFFICIENT_PAYMENT_DATA: &str = "insufficient data for collection rate";

/// A single-responsibility KPI calculation over the row set
pub trait KpiCalculator {
    /// Metric name, used as the key in the engine's result map
    fn name(&self) -> &'static str;

    /// Reporting unit for the metric
    fn unit(&self) -> KpiUnit;

    /// Compute the metric; total over any input, never panics
    fn calculate(&self, rows: &[LoanRow], at: DateTime<Utc>) -> KpiResult;
}

/// Portfolio-at-risk over a delinquency threshold
///
/// `value = 100 * overdue_balance / total_balance`, with the denominator
/// floored at 1.0. A zero-balance portfolio therefore always reports 0.
fn portfolio_at_risk(
    name: &'static str,
    rows: &[LoanRow],
    at: DateTime<Utc>,
    is_overdue: fn(&LoanRow) -> bool,
) -> KpiResult {
    let total_balance: f64 = rows.iter().map(|r| r.principal_balance).sum();
    let overdue_balance: f64 = rows
        .iter()
        .filter(|r| is_overdue(r))
        .map(|r| r.principal_balance)
        .sum();

    let denominator = total_balance.max(1.0);
    let value = 100.0 * overdue_balance / denominator;

    let mut components = BTreeMap::new();
    components.insert("overdue_balance".to_string(), overdue_balance);
    components.insert("total_balance".to_string(), total_balance);
    components.insert("row_count".to_string(), rows.len() as f64);
    if total_balance < 1.0 {
        components.insert("denominator_floored".to_string(), 1.0);
    }

    KpiResult::new(name, value, KpiUnit::Percent, components, at)
}

/// PAR30: share of outstanding balance at least 30 days past due
pub struct Par30;

impl KpiCalculator for Par30 {
    fn name(&self) -> &'static str {
        PAR30
    }

    fn unit(&self) -> KpiUnit {
        KpiUnit::Percent
    }

    fn calculate(&self, rows: &[LoanRow], at: DateTime<Utc>) -> KpiResult {
        portfolio_at_risk(PAR30, rows, at, |r| {
            r.dpd_status.is_some_and(|b| b.is_past_due_30())
        })
    }
}

/// PAR90: share of outstanding balance at least 90 days past due
pub struct Par90;

impl KpiCalculator for Par90 {
    fn name(&self) -> &'static str {
        PAR90
    }

    fn unit(&self) -> KpiUnit {
        KpiUnit::Percent
    }

    fn calculate(&self, rows: &[LoanRow], at: DateTime<Utc>) -> KpiResult {
        portfolio_at_risk(PAR90, rows, at, |r| {
            r.dpd_status.is_some_and(|b| b.is_past_due_90())
        })
    }
}

/// Collection rate: received payments over scheduled payments
///
/// Only rows carrying both payment fields contribute. When no row does, the
/// result is 0 with an "insufficient data" diagnostic rather than a failure.
pub struct CollectionRate;

impl KpiCalculator for CollectionRate {
    fn name(&self) -> &'static str {
        COLLECTION_RATE
    }

    fn unit(&self) -> KpiUnit {
        KpiUnit::Percent
    }

    fn calculate(&self, rows: &[LoanRow], at: DateTime<Utc>) -> KpiResult {
        let with_data: Vec<&LoanRow> = rows.iter().filter(|r| r.has_payment_data()).collect();

        if with_data.is_empty() {
            let mut result = KpiResult::degenerate(
                COLLECTION_RATE,
                KpiUnit::Percent,
                INSUFFICIENT_PAYMENT_DATA,
                at,
            );
            result
                .components
                .insert("rows_with_payment_data".to_string(), 0.0);
            return result;
        }

        let scheduled: f64 = with_data
            .iter()
            .filter_map(|r| r.payments_scheduled)
            .sum();
        let received: f64 = with_data.iter().filter_map(|r| r.payments_received).sum();

        let mut components = BTreeMap::new();
        components.insert("payments_scheduled".to_string(), scheduled);
        components.insert("payments_received".to_string(), received);
        components.insert("rows_with_payment_data".to_string(), with_data.len() as f64);

        if scheduled <= 0.0 {
            components.insert("zero_scheduled_payments".to_string(), 0.0);
            return KpiResult::new(COLLECTION_RATE, 0.0, KpiUnit::Percent, components, at);
        }

        let value = 100.0 * received / scheduled;
        KpiResult::new(COLLECTION_RATE, value, KpiUnit::Percent, components, at)
    }
}

/// Weighting for the composite portfolio health score
///
/// Weights need not sum to one; the score is normalized over the weight sum.
#[derive(Debug, Clone, Copy)]
pub struct HealthWeights {
    /// Weight of the inverse-PAR30 sub-score
    pub par30: f64,
    /// Weight of the inverse-PAR90 sub-score
    pub par90: f64,
    /// Weight of the collection-rate sub-score
    pub collection: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            par30: 0.4,
            par90: 0.3,
            collection: 0.3,
        }
    }
}

/// Composite portfolio health score in [0, 10]
///
/// Each input metric is linearly rescaled to a [0, 10] sub-score (PAR metrics
/// inverted: 0% at risk scores 10), then combined per the configured weights.
/// Depends on the three leaf metrics being computed first; the engine
/// enforces that ordering.
pub fn portfolio_health(
    par30: &KpiResult,
    par90: &KpiResult,
    collection: &KpiResult,
    weights: &HealthWeights,
    at: DateTime<Utc>,
) -> KpiResult {
    let weight_sum = weights.par30 + weights.par90 + weights.collection;
    if weight_sum <= 0.0 {
        return KpiResult::degenerate(PORTFOLIO_HEALTH, KpiUnit::Score, "zero_weight_sum", at);
    }

    let par30_score = 10.0 - par30.value / 10.0;
    let par90_score = 10.0 - par90.value / 10.0;
    let collection_score = collection.value / 10.0;

    let value = (weights.par30 * par30_score
        + weights.par90 * par90_score
        + weights.collection * collection_score)
        / weight_sum;

    let mut components = BTreeMap::new();
    components.insert("par30_score".to_string(), par30_score);
    components.insert("par90_score".to_string(), par90_score);
    components.insert("collection_score".to_string(), collection_score);
    components.insert("weight_par30".to_string(), weights.par30);
    components.insert("weight_par90".to_string(), weights.par90);
    components.insert("weight_collection".to_string(), weights.collection);

    KpiResult::new(PORTFOLIO_HEALTH, value, KpiUnit::Score, components, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::DpdBucket;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn row(balance: f64, bucket: Option<DpdBucket>) -> LoanRow {
        LoanRow {
            loan_amount: 10_000.0,
            appraised_value: 20_000.0,
            borrower_income: 5_000.0,
            monthly_debt: 1_000.0,
            loan_status: "current".to_string(),
            interest_rate: 5.5,
            principal_balance: balance,
            dpd_status: bucket,
            payments_scheduled: None,
            payments_received: None,
        }
    }

    #[test]
    fn test_par30_mixed_portfolio() {
        let rows = vec![
            row(6_000.0, Some(DpdBucket::Current)),
            row(3_000.0, Some(DpdBucket::Late30)),
            row(1_000.0, Some(DpdBucket::Late90Plus)),
        ];
        let result = Par30.calculate(&rows, ts());
        assert_relative_eq!(result.value, 40.0, epsilon = 1e-9);
        assert_relative_eq!(result.components["overdue_balance"], 4_000.0, epsilon = 1e-9);

        let result = Par90.calculate(&rows, ts());
        assert_relative_eq!(result.value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_par_zero_balance_portfolio() {
        // Every balance zero: denominator floors at 1, value stays 0
        let rows = vec![row(0.0, Some(DpdBucket::Late90Plus)); 3];
        let par30 = Par30.calculate(&rows, ts());
        let par90 = Par90.calculate(&rows, ts());
        assert_eq!(par30.value, 0.0);
        assert_eq!(par90.value, 0.0);
        assert!(par30.value.is_finite() && par90.value.is_finite());
        assert!(par30.components.contains_key("denominator_floored"));
    }

    #[test]
    fn test_par_empty_rows() {
        let par30 = Par30.calculate(&[], ts());
        assert_eq!(par30.value, 0.0);
        assert_eq!(par30.components["row_count"], 0.0);
    }

    #[test]
    fn test_par_ignores_missing_dpd() {
        let rows = vec![row(5_000.0, None), row(5_000.0, Some(DpdBucket::Late60))];
        let result = Par30.calculate(&rows, ts());
        assert_relative_eq!(result.value, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collection_rate() {
        let mut paying = row(9_500.0, Some(DpdBucket::Current));
        paying.payments_scheduled = Some(500.0);
        paying.payments_received = Some(450.0);
        let rows = vec![paying, row(1_000.0, None)];

        let result = CollectionRate.calculate(&rows, ts());
        assert_relative_eq!(result.value, 90.0, epsilon = 1e-9);
        assert_eq!(result.components["rows_with_payment_data"], 1.0);
    }

    #[test]
    fn test_collection_rate_without_data() {
        let result = CollectionRate.calculate(&[row(9_500.0, None)], ts());
        assert_eq!(result.value, 0.0);
        assert!(result.components.contains_key(INSUFFICIENT_PAYMENT_DATA));
    }

    #[test]
    fn test_collection_rate_zero_scheduled() {
        let mut paying = row(9_500.0, None);
        paying.payments_scheduled = Some(0.0);
        paying.payments_received = Some(100.0);
        let result = CollectionRate.calculate(&[paying], ts());
        assert_eq!(result.value, 0.0);
        assert!(result.components.contains_key("zero_scheduled_payments"));
    }

    #[test]
    fn test_portfolio_health_perfect() {
        let par30 = Par30.calculate(&[row(1_000.0, Some(DpdBucket::Current))], ts());
        let par90 = Par90.calculate(&[row(1_000.0, Some(DpdBucket::Current))], ts());
        let mut paying = row(1_000.0, Some(DpdBucket::Current));
        paying.payments_scheduled = Some(100.0);
        paying.payments_received = Some(100.0);
        let collection = CollectionRate.calculate(&[paying], ts());

        let health = portfolio_health(&par30, &par90, &collection, &HealthWeights::default(), ts());
        assert_relative_eq!(health.value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_portfolio_health_worst_case() {
        // All balance 90+ overdue, nothing collected
        let rows = vec![row(1_000.0, Some(DpdBucket::Late90Plus))];
        let par30 = Par30.calculate(&rows, ts());
        let par90 = Par90.calculate(&rows, ts());
        let collection = CollectionRate.calculate(&rows, ts());

        let health = portfolio_health(&par30, &par90, &collection, &HealthWeights::default(), ts());
        assert_relative_eq!(health.value, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_portfolio_health_custom_weights_normalized() {
        let rows = vec![row(1_000.0, Some(DpdBucket::Current))];
        let par30 = Par30.calculate(&rows, ts());
        let par90 = Par90.calculate(&rows, ts());
        let collection = CollectionRate.calculate(&rows, ts());

        // PAR sub-scores are 10, collection is 0; doubling all weights must
        // not change the normalized score
        let base = portfolio_health(&par30, &par90, &collection, &HealthWeights::default(), ts());
        let doubled = portfolio_health(
            &par30,
            &par90,
            &collection,
            &HealthWeights {
                par30: 0.8,
                par90: 0.6,
                collection: 0.6,
            },
            ts(),
        );
        assert_relative_eq!(base.value, doubled.value, epsilon = 1e-9);
        assert_relative_eq!(base.value, 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_portfolio_health_zero_weights() {
        let rows = vec![row(1_000.0, Some(DpdBucket::Current))];
        let par30 = Par30.calculate(&rows, ts());
        let par90 = Par90.calculate(&rows, ts());
        let collection = CollectionRate.calculate(&rows, ts());
        let health = portfolio_health(
            &par30,
            &par90,
            &collection,
            &HealthWeights {
                par30: 0.0,
                par90: 0.0,
                collection: 0.0,
            },
            ts(),
        );
        assert_eq!(health.value, 0.0);
        assert!(health.components.contains_key("zero_weight_sum"));
    }
}
