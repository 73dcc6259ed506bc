//! Result structures handed back to callers
//!
//! Every result is a plain serde-serializable struct with an explicit
//! status field rather than an open-ended map.

mod allocation;
mod flow;
mod forecast;
mod resources;

pub use allocation::{AllocationResult, AssetDecision};
pub use flow::{EdgeRef, FlowResult, NetworkStatus, RerouteSuggestion, RouteFlow, RouteStatus};
pub use forecast::{
    Bottleneck, BottleneckKind, CapacityGap, ConditionForecast, DemandForecast, DemandPoint,
    ForecastPoint, GapSeverity, MaintenanceWindow, Urgency,
};
pub use resources::{
    AllocationStatus, MultiResourceAllocation, MultiResourceResult, ProjectStatus, ProjectSummary,
    ResourceSummary, FULL_ALLOCATION_TOLERANCE, UNFUNDED_THRESHOLD,
};
