//! Ordered strategy chain with tagged outcomes.
//!
//! Each solver tries the strategies named in [`SolverConfig::strategies`]
//! in order. A strategy either solves the problem, proves it infeasible
//! under its formulation, or declines. The chain stops at the first
//! solution.
//!
//! [`SolverConfig::strategies`]: infraplan_config::SolverConfig::strategies

use infraplan_config::StrategyKind;
use infraplan_core::SolverTrace;
use tracing::{debug, warn};

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome<T> {
    Solved(T),
    /// The formulation has no feasible point.
    Infeasible(String),
    /// The strategy declined or could not finish (size, limits, numerics).
    Unavailable(String),
}

impl<T> StrategyOutcome<T> {
    pub fn is_solved(&self) -> bool {
        matches!(self, StrategyOutcome::Solved(_))
    }
}

/// Runs `attempt` for each strategy until one returns
/// [`StrategyOutcome::Solved`].
///
/// Every attempt and its outcome is appended to `trace`. Returns the
/// winning strategy with its value, or `None` if all strategies failed.
pub fn run_strategies<T>(
    strategies: &[StrategyKind],
    trace: &mut SolverTrace,
    mut attempt: impl FnMut(StrategyKind, &mut SolverTrace) -> StrategyOutcome<T>,
) -> Option<(StrategyKind, T)> {
    for (position, &kind) in strategies.iter().enumerate() {
        if position > 0 {
            warn!(event = "strategy_fallback", strategy = %kind);
            trace.record(format!("falling back to {kind}"));
        }
        debug!(event = "strategy_start", strategy = %kind);
        match attempt(kind, trace) {
            StrategyOutcome::Solved(value) => {
                debug!(event = "strategy_solved", strategy = %kind);
                return Some((kind, value));
            }
            StrategyOutcome::Infeasible(reason) => {
                debug!(event = "strategy_infeasible", strategy = %kind, reason = %reason);
                trace.record(format!("{kind}: infeasible ({reason})"));
            }
            StrategyOutcome::Unavailable(reason) => {
                debug!(event = "strategy_unavailable", strategy = %kind, reason = %reason);
                trace.record(format!("{kind}: unavailable ({reason})"));
            }
        }
    }
    warn!(event = "strategies_exhausted", tried = strategies.len());
    trace.record("no strategy produced a solution");
    None
}
