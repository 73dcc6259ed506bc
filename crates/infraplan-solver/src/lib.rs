//! infraplan solvers
//!
//! This crate provides the allocation engines:
//! - Capital plan solver (fund/defer under a budget, optional regional equity)
//! - Resilient network flow under disruption events
//! - Multi-resource (money, personnel, equipment) allocation
//! - A small MILP backend (simplex relaxation plus branch and bound)
//! - The ordered strategy chain shared by the solvers
//! - Off-thread dispatch through [`PlanningManager`]
//!
//! # Logging
//!
//! Solvers emit `tracing` events:
//! - `info!` for `solve_start` / `solve_end` with sizes, status and elapsed time
//! - `debug!` for strategy attempts, incumbents and skipped constraints
//! - `warn!` for fallbacks

pub mod capital;
pub mod manager;
pub mod milp;
pub mod network;
pub mod resources;
pub mod strategy;

pub use capital::{CapitalOptions, CapitalPlanner, ScoringWeights};
pub use manager::{wait, wait_blocking, PendingSolve, PlanningManager};
pub use milp::{BranchAndBound, MilpModel, MilpSolution, MilpStatus};
pub use network::{verify_conservation, NetworkFlowSolver, SupplyOverrides};
pub use resources::{MultiResourceSolver, PriorityWeights};
pub use strategy::{run_strategies, StrategyOutcome};
