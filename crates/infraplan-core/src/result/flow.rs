//! Network flow outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DisruptionEvent;
use crate::status::{SolveStatus, SolverTrace};

/// Operating state of a route after the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RouteStatus {
    /// Carries flow at near-nominal speed.
    Active,
    /// Knocked out by the disruption.
    Blocked,
    /// Open but not used by the flow solution.
    Unused,
    /// Carries flow (or would) under a significant delay.
    Delayed,
}

/// Qualitative health of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum NetworkStatus {
    Low,
    Moderate,
    High,
    Critical,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetworkStatus::Low => "Low",
            NetworkStatus::Moderate => "Moderate",
            NetworkStatus::High => "High",
            NetworkStatus::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// A directed edge reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct EdgeRef {
    pub source: String,
    pub target: String,
}

impl EdgeRef {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Per-route outcome.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteFlow {
    pub source: String,
    pub target: String,
    pub flow: i64,
    /// Capacity assigned to the arc (1 for blocked routes).
    pub capacity: i64,
    pub status: RouteStatus,
    pub original_time: f64,
    pub estimated_time: f64,
    /// Load relative to capacity, scaled by the delay multiplier.
    pub traffic_index: f64,
}

impl RouteFlow {
    pub fn edge(&self) -> EdgeRef {
        EdgeRef::new(&self.source, &self.target)
    }
}

/// An open detour around a blocked route.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RerouteSuggestion {
    pub blocked: EdgeRef,
    /// Node ids from the blocked route's source to its target.
    pub path: Vec<String>,
    /// Delay-adjusted travel time along `path`.
    pub estimated_time: f64,
}

/// Result of a resilient flow solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowResult {
    pub status: SolveStatus,
    pub event: DisruptionEvent,
    pub delay_multiplier: f64,
    pub routes: Vec<RouteFlow>,
    pub total_flow: i64,
    pub total_cost: i64,
    pub blocked_edges: Vec<EdgeRef>,
    pub reroutes: Vec<RerouteSuggestion>,
    pub network_status: NetworkStatus,
    pub alerts: Vec<String>,
    pub trace: SolverTrace,
}

impl FlowResult {
    pub fn route(&self, source: &str, target: &str) -> Option<&RouteFlow> {
        self.routes
            .iter()
            .find(|r| r.source == source && r.target == target)
    }

    /// Share of routes that are blocked, in [0, 1].
    pub fn blocked_fraction(&self) -> f64 {
        if self.routes.is_empty() {
            0.0
        } else {
            self.blocked_edges.len() as f64 / self.routes.len() as f64
        }
    }
}
