//! infraplan - resource-allocation engine for infrastructure planning
//!
//! Capital budgeting, supply-network resilience and multi-resource
//! allocation, with the deterioration and demand models that feed them.
//! Every solver is a plain value built from a [`PlannerConfig`] and is
//! safe to share across threads.
//!
//! # Example
//!
//! ```rust
//! use infraplan::prelude::*;
//!
//! let assets = vec![
//!     Asset::new("B-1", AssetType::Bridge, "ON", 35.0, 60.0, 8_000.0, 100.0).unwrap(),
//!     Asset::new("W-1", AssetType::WaterMain, "QC", 70.0, 20.0, 0.0, 200.0).unwrap(),
//! ];
//! let plan = CapitalPlanner::default().solve(&assets, 300.0).unwrap();
//! assert_eq!(plan.status, SolveStatus::Optimal);
//! assert_eq!(plan.assets_funded, 2);
//! ```

pub mod logging;

pub use infraplan_config::{
    CapitalConfig, ConfigError, ExplorationType, ForecastConfig, NetworkConfig, PlannerConfig,
    ResourceConfig, SolverConfig, StrategyKind,
};
pub use infraplan_core::result;
pub use infraplan_core::{
    partition_records, Asset, AssetRecord, AssetType, DisruptionEvent, NodeType, PlanError,
    ResourcePool, ResourceRequirement, ResourceType, Result, SolveStatus, SolverTrace,
    SupplyNode, SupplyRoute, ValidationError,
};
pub use infraplan_forecast::{
    DemandModel, DemographicSource, DeteriorationModel, EnvironmentFactors, StaticGrowthRates,
};
pub use infraplan_solver::{
    verify_conservation, wait, wait_blocking, CapitalOptions, CapitalPlanner,
    MultiResourceSolver, NetworkFlowSolver, PendingSolve, PlanningManager, PriorityWeights,
    ScoringWeights, SupplyOverrides,
};

pub mod prelude {
    pub use super::result::{
        AllocationResult, AllocationStatus, ConditionForecast, DemandForecast, FlowResult,
        MultiResourceResult, NetworkStatus, RouteStatus,
    };
    pub use super::{
        Asset, AssetType, CapitalOptions, CapitalPlanner, DemandModel, DeteriorationModel,
        DisruptionEvent, EnvironmentFactors, MultiResourceSolver, NetworkFlowSolver, NodeType,
        PlanError, PlannerConfig, PlanningManager, ResourcePool, ResourceRequirement,
        ResourceType, SolveStatus, SupplyNode, SupplyRoute,
    };
}
