//! Multi-resource allocation outcome.

use serde::{Deserialize, Serialize};

use crate::domain::ResourceType;
use crate::status::{SolveStatus, SolverTrace};

/// Share of need below which a requirement or project counts as unfunded.
pub const UNFUNDED_THRESHOLD: f64 = 0.10;

/// Tolerance used when deciding that a need is fully covered.
pub const FULL_ALLOCATION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Allocated,
    Partial,
    Unfunded,
}

impl AllocationStatus {
    /// Classifies a covered fraction of need.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction >= 1.0 - FULL_ALLOCATION_TOLERANCE {
            AllocationStatus::Allocated
        } else if fraction < UNFUNDED_THRESHOLD {
            AllocationStatus::Unfunded
        } else {
            AllocationStatus::Partial
        }
    }
}

/// Quantity drawn by one requirement from one pool.
///
/// Requirements that received nothing appear once with `pool_id = None`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MultiResourceAllocation {
    pub requirement_id: String,
    pub asset_id: String,
    pub pool_id: Option<String>,
    pub resource_type: ResourceType,
    pub quantity_allocated: f64,
    /// Share of the pool's available quantity consumed by this allocation.
    pub utilization_pct: f64,
    pub cost_estimate: f64,
    /// Status of the owning requirement as a whole.
    pub status: AllocationStatus,
}

/// Totals per resource type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceSummary {
    pub resource_type: ResourceType,
    pub allocated: f64,
    pub available: f64,
    pub utilization_pct: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    FullyFunded,
    Partial,
    Unfunded,
}

/// Funding outcome for all requirements of one asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectSummary {
    pub asset_id: String,
    pub requirement_count: usize,
    pub requirements_completed: usize,
    /// Mean covered fraction over the project's requirements.
    pub funded_fraction: f64,
    pub status: ProjectStatus,
}

/// Result of a multi-resource solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MultiResourceResult {
    pub status: SolveStatus,
    pub allocations: Vec<MultiResourceAllocation>,
    pub summaries: Vec<ResourceSummary>,
    pub projects: Vec<ProjectSummary>,
    pub requirements_completed: usize,
    pub total_cost: f64,
    /// Weighted completion objective achieved.
    pub objective: f64,
    pub equity_satisfied: bool,
    pub trace: SolverTrace,
}

impl MultiResourceResult {
    pub fn empty(status: SolveStatus, trace: SolverTrace) -> Self {
        Self {
            status,
            allocations: Vec::new(),
            summaries: Vec::new(),
            projects: Vec::new(),
            requirements_completed: 0,
            total_cost: 0.0,
            objective: 0.0,
            equity_satisfied: true,
            trace,
        }
    }

    /// Total quantity allocated to `requirement_id` across pools.
    pub fn allocated_to(&self, requirement_id: &str) -> f64 {
        self.allocations
            .iter()
            .filter(|a| a.requirement_id == requirement_id)
            .map(|a| a.quantity_allocated)
            .sum()
    }

    /// Total quantity drawn from `pool_id`.
    pub fn drawn_from(&self, pool_id: &str) -> f64 {
        self.allocations
            .iter()
            .filter(|a| a.pool_id.as_deref() == Some(pool_id))
            .map(|a| a.quantity_allocated)
            .sum()
    }

    pub fn summary(&self, resource_type: ResourceType) -> Option<&ResourceSummary> {
        self.summaries.iter().find(|s| s.resource_type == resource_type)
    }

    pub fn project(&self, asset_id: &str) -> Option<&ProjectSummary> {
        self.projects.iter().find(|p| p.asset_id == asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_fraction() {
        assert_eq!(AllocationStatus::from_fraction(1.0), AllocationStatus::Allocated);
        assert_eq!(AllocationStatus::from_fraction(0.5), AllocationStatus::Partial);
        assert_eq!(AllocationStatus::from_fraction(0.05), AllocationStatus::Unfunded);
        assert_eq!(AllocationStatus::from_fraction(0.0), AllocationStatus::Unfunded);
    }
}
