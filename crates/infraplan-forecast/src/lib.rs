//! infraplan forecasting models
//!
//! This crate provides the models that feed the solvers:
//! - [`DeteriorationModel`]: condition trajectory, failure probability and
//!   maintenance windows
//! - [`DemandModel`]: usage growth, capacity gaps and regional bottlenecks
//!
//! Both are pure functions of their inputs and configuration.

pub mod demand;
pub mod deterioration;

pub use demand::{demand_elasticity, DemandModel, DemographicSource, StaticGrowthRates};
pub use deterioration::{
    age_failure_multiplier, base_decay_rate, type_failure_multiplier, DeteriorationModel,
    EnvironmentFactors,
};
