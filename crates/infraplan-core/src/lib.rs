//! infraplan core - domain types, results and errors
//!
//! This crate provides the shared vocabulary of the allocation engine:
//! - Domain records (assets, supply network, resource pools)
//! - Result structures returned by the solvers and forecasting models
//! - Solve status and the append-only decision trace
//! - Error and validation types

pub mod domain;
pub mod error;
pub mod result;
pub mod status;

pub use domain::{
    partition_records, Asset, AssetRecord, AssetType, DisruptionEvent, NodeType, ResourcePool, ResourceRequirement,
    ResourceType, SupplyNode, SupplyRoute, MAX_TRAVEL_TIME,
};
pub use error::{PlanError, Result, ValidationError};
pub use status::{SolveStatus, SolverTrace};
