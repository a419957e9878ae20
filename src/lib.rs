//! Portfolio Analytics - Loan-portfolio KPI pipeline
//!
//! This library provides:
//! - CSV ingestion with schema validation and strict/lenient row policies
//! - KPI calculation (PAR30, PAR90, collection rate, portfolio health)
//! - Derived analytics views (status treemap, roll-rate, growth projection)
//! - Report export to CSV, JSON, and Markdown

pub mod analytics;
pub mod error;
pub mod export;
pub mod kpi;
pub mod loan;

// Re-export commonly used types
pub use analytics::{build_analytics, build_analytics_at, AggregatorOptions, AnalyticsBundle};
pub use error::{Validated, ValidationError};
pub use kpi::{EngineConfig, EngineRun, KpiEngine, KpiResult};
pub use loan::{ingest_csv, DpdBucket, IngestOptions, LoanRow, ParseMode};
