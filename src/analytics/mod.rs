//! Derived analytics views and the aggregate bundle

mod aggregator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kpi::KpiResult;

pub use aggregator::{build_analytics, build_analytics_at, AggregatorOptions, GrowthConfig};

/// Aggregate balance and count for one loan-status group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapCell {
    /// Sum of principal balance in the group
    pub balance: f64,
    /// Number of rows in the group
    pub count: u64,
}

/// Count and balance observed in one delinquency bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketFlow {
    /// Number of rows in the bucket
    pub count: u64,
    /// Sum of principal balance in the bucket
    pub balance: f64,
}

/// Delinquency-bucket occupancy in canonical bucket order
///
/// A single upload is one observation, so bucket-to-bucket transitions cannot
/// be witnessed; the matrix reports per-bucket occupancy and keeps the
/// map-shaped layout so transition counts can populate it when two-snapshot
/// inputs exist. May be empty when no row carries a `dpd_status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollRateMatrix {
    /// Occupied bucket labels, in canonical delinquency order
    pub buckets: Vec<String>,
    /// Flows keyed by bucket label
    pub counts: BTreeMap<String, BucketFlow>,
}

impl RollRateMatrix {
    /// Whether any bucket is occupied
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One point of the forward growth series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPoint {
    /// Calendar period label, `YYYY-MM`
    pub period: String,
    /// Projected portfolio balance for the period
    pub projected_value: f64,
}

/// The aggregate output of one pipeline run
///
/// Maps are `BTreeMap` so serialization order is deterministic and repeated
/// runs over identical input produce byte-identical exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsBundle {
    /// KPI results keyed by metric name
    pub kpis: BTreeMap<String, KpiResult>,

    /// Balance/count aggregates by loan status
    pub treemap: BTreeMap<String, TreemapCell>,

    /// Delinquency-bucket occupancy matrix
    pub roll_rate: RollRateMatrix,

    /// Forward growth series
    pub growth_projection: Vec<GrowthPoint>,
}

impl AnalyticsBundle {
    /// Whether the bundle holds no data at all
    pub fn is_empty(&self) -> bool {
        self.kpis.is_empty() && self.treemap.is_empty() && self.roll_rate.is_empty()
    }
}
