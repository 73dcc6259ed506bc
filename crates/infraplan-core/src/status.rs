//! Solve status and the append-only decision trace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome tag carried by every solver result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal by the integer-programming backend.
    Optimal,
    /// Valid but not proven optimal (search stopped by a limit).
    Feasible,
    /// No strategy produced a valid answer.
    Infeasible,
    /// Produced by the greedy allocator after the exact backends declined.
    GreedyFallback,
    /// Flow could not be solved; routes are reported annotated only.
    Fallback,
    NoAssets,
    NoNetwork,
    NoRequirements,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::GreedyFallback => "GREEDY_FALLBACK",
            SolveStatus::Fallback => "FALLBACK",
            SolveStatus::NoAssets => "NO_ASSETS",
            SolveStatus::NoNetwork => "NO_NETWORK",
            SolveStatus::NoRequirements => "NO_REQUIREMENTS",
        }
    }

    /// True for statuses produced by an exact backend.
    pub fn is_exact(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, human-readable log of solver decisions.
///
/// Entries can only be appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SolverTrace {
    entries: Vec<String>,
}

impl SolverTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }
}
