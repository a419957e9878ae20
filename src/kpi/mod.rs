//! KPI calculators and the engine that orchestrates them

pub mod calculators;
mod engine;
mod result;

pub use calculators::{
    portfolio_health, CollectionRate, HealthWeights, KpiCalculator, Par30, Par90,
};
pub use engine::{EngineConfig, EngineRun, KpiEngine, RunAudit};
pub use result::{KpiResult, KpiUnit};
