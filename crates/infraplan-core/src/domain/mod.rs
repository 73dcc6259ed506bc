//! Domain model for infrastructure planning
//!
//! Plain input records consumed by the forecasting models and solvers:
//! - [`Asset`]: a piece of infrastructure competing for capital
//! - [`SupplyNode`] / [`SupplyRoute`]: the supply-chain graph
//! - [`ResourcePool`] / [`ResourceRequirement`]: money, personnel, equipment

mod asset;
mod network;
mod resource;

pub use asset::{partition_records, Asset, AssetRecord, AssetType, DEFAULT_CONDITION_SCORE};
pub use network::{DisruptionEvent, NodeType, SupplyNode, SupplyRoute, MAX_TRAVEL_TIME};
pub use resource::{ResourcePool, ResourceRequirement, ResourceType};
