//! Capital plan outcome.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::{SolveStatus, SolverTrace};

/// Fund/defer decision for one asset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetDecision {
    pub asset_id: String,
    pub asset_name: String,
    pub region: String,
    pub funded: bool,
    /// Weighted blend of normalized risk and impact, in [0, 1] for unit weights.
    pub priority_score: f64,
    /// Normalized failure-risk proxy in [0, 1].
    pub risk_score: f64,
    /// Replacement cost requested by the asset.
    pub requested: f64,
    /// Amount allocated (the full request when funded, else 0).
    pub budget_assigned: f64,
    pub rationale: String,
}

/// Result of a capital plan solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationResult {
    pub status: SolveStatus,
    pub budget: f64,
    pub total_allocated: f64,
    pub total_requested: f64,
    pub assets_funded: usize,
    pub assets_deferred: usize,
    /// |best bound - objective| / |objective|, or 0 when unknown.
    pub optimality_gap: f64,
    pub risk_reduction_pct: f64,
    pub equity_satisfied: bool,
    pub decisions: Vec<AssetDecision>,
    /// Allocated amount per region code.
    pub regional_allocation: BTreeMap<String, f64>,
    pub trace: SolverTrace,
}

impl AllocationResult {
    /// A zero-effect result carrying only a status and the trace so far.
    pub fn empty(status: SolveStatus, budget: f64, trace: SolverTrace) -> Self {
        Self {
            status,
            budget,
            total_allocated: 0.0,
            total_requested: 0.0,
            assets_funded: 0,
            assets_deferred: 0,
            optimality_gap: 0.0,
            risk_reduction_pct: 0.0,
            equity_satisfied: true,
            decisions: Vec::new(),
            regional_allocation: BTreeMap::new(),
            trace,
        }
    }

    /// Ids of funded assets in input order.
    pub fn funded_ids(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.funded)
            .map(|d| d.asset_id.as_str())
            .collect()
    }

    pub fn decision(&self, asset_id: &str) -> Option<&AssetDecision> {
        self.decisions.iter().find(|d| d.asset_id == asset_id)
    }

    pub fn remaining_budget(&self) -> f64 {
        self.budget - self.total_allocated
    }
}
