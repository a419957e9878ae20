//! KPI engine orchestrating calculators over a dataset
//!
//! Calculators are injected as an explicit ordered list; the engine holds no
//! state between runs. The only ordering constraint is that the leaf metrics
//! (PAR30, PAR90, collection rate) complete before the composite portfolio
//! health score, which consumes their results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculators::{
    portfolio_health, CollectionRate, HealthWeights, KpiCalculator, Par30, Par90,
    COLLECTION_RATE, INSUFFICIENT_PAYMENT_DATA, PAR30, PAR90, PORTFOLIO_HEALTH,
};
use super::result::{KpiResult, KpiUnit};
use crate::loan::LoanRow;

/// Configuration for an engine run
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Whether to compute the composite portfolio health score
    pub include_composite: bool,

    /// Weighting of the composite score
    pub health_weights: HealthWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            include_composite: true,
            health_weights: HealthWeights::default(),
        }
    }
}

/// Audit trail attached to every engine run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAudit {
    /// Unique run identifier
    pub run_id: Uuid,

    /// When the run was stamped
    pub timestamp: DateTime<Utc>,

    /// Number of input rows the calculators saw
    pub input_row_count: usize,
}

/// Output of one engine run
#[derive(Debug, Clone)]
pub struct EngineRun {
    /// Results keyed by metric name
    pub kpis: BTreeMap<String, KpiResult>,

    /// Run audit trail
    pub audit: RunAudit,

    /// Non-fatal diagnostics surfaced during the run
    pub warnings: Vec<String>,
}

/// Orchestrates KPI calculators over a row set
pub struct KpiEngine {
    calculators: Vec<Box<dyn KpiCalculator>>,
    config: EngineConfig,
}

impl KpiEngine {
    /// Create an engine with the standard leaf calculators
    pub fn new(config: EngineConfig) -> Self {
        Self::with_calculators(
            vec![Box::new(Par30), Box::new(Par90), Box::new(CollectionRate)],
            config,
        )
    }

    /// Create an engine with an explicit calculator list
    ///
    /// The composite score still requires the three leaf metrics; when a
    /// custom list omits one, the composite degrades to a zero-valued result
    /// with a `missing_dependency` component.
    pub fn with_calculators(calculators: Vec<Box<dyn KpiCalculator>>, config: EngineConfig) -> Self {
        Self {
            calculators,
            config,
        }
    }

    /// Run every calculator, stamping results with the current time
    pub fn calculate_all(&self, rows: &[LoanRow]) -> EngineRun {
        self.calculate_all_at(rows, Utc::now())
    }

    /// Run every calculator against an injected clock
    ///
    /// Numeric outputs depend only on the rows, so repeated runs over the
    /// same input and timestamp produce identical results; only `run_id`
    /// differs between runs.
    pub fn calculate_all_at(&self, rows: &[LoanRow], at: DateTime<Utc>) -> EngineRun {
        let audit = RunAudit {
            run_id: Uuid::new_v4(),
            timestamp: at,
            input_row_count: rows.len(),
        };
        debug!(
            "KPI run {} over {} rows ({} calculators)",
            audit.run_id,
            rows.len(),
            self.calculators.len()
        );

        let mut kpis = BTreeMap::new();
        let mut warnings = Vec::new();

        // Leaf calculators run independently, in registration order
        for calculator in &self.calculators {
            let result = sanitize(calculator.calculate(rows, at), calculator.unit(), at);
            if result.components.contains_key(INSUFFICIENT_PAYMENT_DATA) {
                warnings.push(INSUFFICIENT_PAYMENT_DATA.to_string());
            }
            kpis.insert(result.name.clone(), result);
        }

        // Composite runs last: it consumes PAR30, PAR90, and collection rate
        if self.config.include_composite {
            let composite = match (
                kpis.get(PAR30),
                kpis.get(PAR90),
                kpis.get(COLLECTION_RATE),
            ) {
                (Some(par30), Some(par90), Some(collection)) => portfolio_health(
                    par30,
                    par90,
                    collection,
                    &self.config.health_weights,
                    at,
                ),
                _ => {
                    warnings.push(
                        "portfolio health skipped: leaf metrics incomplete".to_string(),
                    );
                    KpiResult::degenerate(PORTFOLIO_HEALTH, KpiUnit::Score, "missing_dependency", at)
                }
            };
            kpis.insert(composite.name.clone(), composite);
        }

        debug!("KPI run {} complete: {} metrics", audit.run_id, kpis.len());

        EngineRun {
            kpis,
            audit,
            warnings,
        }
    }
}

impl Default for KpiEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Defensively normalize a calculator output
///
/// Calculators are contracted never to produce non-finite values, but one
/// misbehaving metric must not abort the run: anything non-finite is replaced
/// by a zero-valued result carrying an error component.
fn sanitize(result: KpiResult, unit: KpiUnit, at: DateTime<Utc>) -> KpiResult {
    if result.value.is_finite() {
        result
    } else {
        let mut replaced = KpiResult::degenerate(&result.name, unit, "error_non_finite", at);
        replaced.components.extend(result.components);
        replaced
    }
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
    fn test_calculate_all_produces_four_metrics() {
        let rows = vec![
            row(6_000.0, Some(DpdBucket::Current)),
            row(4_000.0, Some(DpdBucket::Late90Plus)),
        ];
        let run = KpiEngine::default().calculate_all_at(&rows, ts());

        assert_eq!(run.kpis.len(), 4);
        assert_relative_eq!(run.kpis[PAR30].value, 40.0, epsilon = 1e-9);
        assert_relative_eq!(run.kpis[PAR90].value, 40.0, epsilon = 1e-9);
        assert_eq!(run.kpis[COLLECTION_RATE].value, 0.0);
        assert!(run.kpis.contains_key(PORTFOLIO_HEALTH));
        assert_eq!(run.audit.input_row_count, 2);
    }

    #[test]
    fn test_missing_payment_data_surfaces_warning() {
        let run = KpiEngine::default().calculate_all_at(&[row(1_000.0, None)], ts());
        assert!(run
            .warnings
            .iter()
            .any(|w| w.contains("insufficient data")));
    }

    #[test]
    fn test_composite_skipped_without_leaves() {
        let engine = KpiEngine::with_calculators(vec![Box::new(Par30)], EngineConfig::default());
        let run = engine.calculate_all_at(&[row(1_000.0, None)], ts());
        let composite = &run.kpis[PORTFOLIO_HEALTH];
        assert_eq!(composite.value, 0.0);
        assert!(composite.components.contains_key("missing_dependency"));
    }

    #[test]
    fn test_composite_excluded_by_config() {
        let config = EngineConfig {
            include_composite: false,
            ..EngineConfig::default()
        };
        let run = KpiEngine::new(config).calculate_all_at(&[row(1_000.0, None)], ts());
        assert!(!run.kpis.contains_key(PORTFOLIO_HEALTH));
        assert_eq!(run.kpis.len(), 3);
    }

    #[test]
    fn test_misbehaving_calculator_is_contained() {
        struct Broken;
        impl KpiCalculator for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn unit(&self) -> KpiUnit {
                KpiUnit::Ratio
            }
            fn calculate(&self, _rows: &[LoanRow], at: DateTime<Utc>) -> KpiResult {
                // Bypass the constructor's finite check on purpose
                let mut result =
                    KpiResult::new("broken", 0.0, KpiUnit::Ratio, Default::default(), at);
                result.value = f64::NAN;
                result
            }
        }

        let engine = KpiEngine::with_calculators(
            vec![Box::new(Par30), Box::new(Par90), Box::new(CollectionRate), Box::new(Broken)],
            EngineConfig::default(),
        );
        let run = engine.calculate_all_at(&[row(1_000.0, Some(DpdBucket::Current))], ts());

        assert_eq!(run.kpis["broken"].value, 0.0);
        assert!(run.kpis["broken"].components.contains_key("error_non_finite"));
        // The bad metric did not block the others
        assert_relative_eq!(run.kpis[PAR30].value, 0.0, epsilon = 1e-9);
        assert!(run.kpis.contains_key(PORTFOLIO_HEALTH));
    }

    #[test]
    fn test_runs_differ_only_in_run_id() {
        let rows = vec![row(5_000.0, Some(DpdBucket::Late30))];
        let engine = KpiEngine::default();
        let a = engine.calculate_all_at(&rows, ts());
        let b = engine.calculate_all_at(&rows, ts());

        assert_ne!(a.audit.run_id, b.audit.run_id);
        assert_eq!(a.kpis, b.kpis);
    }
}
