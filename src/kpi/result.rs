//! KPI result structures

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a KPI value, driving its clamping range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KpiUnit {
    /// Percentage, reported within [0, 100]
    Percent,
    /// Composite score, reported within [0, 10]
    Score,
    /// Unbounded ratio
    Ratio,
}

impl KpiUnit {
    /// Clamp a value into the unit's reporting range
    pub fn clamp(&self, value: f64) -> f64 {
        match self {
            KpiUnit::Percent => value.clamp(0.0, 100.0),
            KpiUnit::Score => value.clamp(0.0, 10.0),
            KpiUnit::Ratio => value,
        }
    }

    /// Label used in report output
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiUnit::Percent => "percent",
            KpiUnit::Score => "score",
            KpiUnit::Ratio => "ratio",
        }
    }
}

/// One named metric produced by a calculator run
///
/// `components` records the intermediate sums behind the value so a reviewer
/// can audit the arithmetic without re-running the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    /// Metric name, e.g. "par30"
    pub name: String,

    /// Finite metric value, clamped per `unit`
    pub value: f64,

    /// Reporting unit
    pub unit: KpiUnit,

    /// Intermediate sums used in the calculation
    pub components: BTreeMap<String, f64>,

    /// When the engine run producing this result was stamped
    pub timestamp: DateTime<Utc>,
}

impl KpiResult {
    /// Build a result, clamping the value into the unit's range
    ///
    /// Non-finite inputs collapse to 0 with an `error` component so one bad
    /// metric never poisons a run.
    pub fn new(
        name: &str,
        value: f64,
        unit: KpiUnit,
        components: BTreeMap<String, f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut components = components;
        let value = if value.is_finite() {
            unit.clamp(value)
        } else {
            components.insert("error_non_finite".to_string(), 1.0);
            0.0
        };

        Self {
            name: name.to_string(),
            value,
            unit,
            components,
            timestamp,
        }
    }

    /// Zero-valued result carrying a single diagnostic component
    pub fn degenerate(name: &str, unit: KpiUnit, diagnostic: &str, timestamp: DateTime<Utc>) -> Self {
        let mut components = BTreeMap::new();
        components.insert(diagnostic.to_string(), 0.0);
        Self {
            name: name.to_string(),
            value: 0.0,
            unit,
            components,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_clamping_by_unit() {
        assert_eq!(KpiUnit::Percent.clamp(150.0), 100.0);
        assert_eq!(KpiUnit::Percent.clamp(-5.0), 0.0);
        assert_eq!(KpiUnit::Score.clamp(12.0), 10.0);
        assert_eq!(KpiUnit::Ratio.clamp(12.0), 12.0);
    }

    #[test]
    fn test_non_finite_collapses_to_zero() {
        let result = KpiResult::new("par30", f64::NAN, KpiUnit::Percent, BTreeMap::new(), ts());
        assert_eq!(result.value, 0.0);
        assert!(result.components.contains_key("error_non_finite"));

        let result = KpiResult::new(
            "par30",
            f64::INFINITY,
            KpiUnit::Percent,
            BTreeMap::new(),
            ts(),
        );
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn test_degenerate_result() {
        let result = KpiResult::degenerate("collection_rate", KpiUnit::Percent, "no_payment_data", ts());
        assert_eq!(result.value, 0.0);
        assert!(result.components.contains_key("no_payment_data"));
    }
}
