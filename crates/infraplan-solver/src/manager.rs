//! Off-thread solve dispatch.
//!
//! [`PlanningManager`] runs each solve on its own worker thread and hands
//! back a [`oneshot::Receiver`]. Async callers `.await` the receiver without
//! blocking their scheduler; synchronous callers use [`wait_blocking`].
//! Dropping the receiver abandons the result; the worker finishes its solve
//! and discards it.

use std::thread::{self, JoinHandle};

use infraplan_config::PlannerConfig;
use infraplan_core::result::{AllocationResult, FlowResult, MultiResourceResult};
use infraplan_core::{
    Asset, DisruptionEvent, PlanError, ResourcePool, ResourceRequirement, Result, SupplyNode,
    SupplyRoute,
};
use tokio::sync::oneshot;
use tracing::debug;

use crate::capital::{CapitalOptions, CapitalPlanner};
use crate::network::{NetworkFlowSolver, SupplyOverrides};
use crate::resources::{MultiResourceSolver, PriorityWeights};

/// Receiving end of a dispatched solve.
pub type PendingSolve<T> = oneshot::Receiver<Result<T>>;

/// Awaits a dispatched solve.
///
/// Returns [`PlanError::Abandoned`] if the worker went away without replying.
pub async fn wait<T>(pending: PendingSolve<T>) -> Result<T> {
    pending.await.map_err(|_| PlanError::Abandoned)?
}

/// Blocks the current thread until a dispatched solve finishes.
///
/// Must not be called from within an async runtime.
pub fn wait_blocking<T>(pending: PendingSolve<T>) -> Result<T> {
    pending.blocking_recv().map_err(|_| PlanError::Abandoned)?
}

/// Dispatches solves onto worker threads.
#[derive(Debug, Clone, Default)]
pub struct PlanningManager {
    capital: CapitalPlanner,
    network: NetworkFlowSolver,
    resources: MultiResourceSolver,
}

impl PlanningManager {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            capital: CapitalPlanner::new(config.clone()),
            network: NetworkFlowSolver::new(config.clone()),
            resources: MultiResourceSolver::new(config),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        self.capital.config()
    }

    pub fn solve_capital(
        &self,
        assets: Vec<Asset>,
        budget: f64,
        options: Option<CapitalOptions>,
    ) -> PendingSolve<AllocationResult> {
        let planner = self.capital.clone();
        dispatch("capital", move || {
            let options = options.unwrap_or_else(|| planner.default_options());
            planner.solve_with(&assets, budget, &options)
        })
    }

    /// Seeded network solve; see [`NetworkFlowSolver::optimize_flows_seeded`].
    pub fn optimize_flows(
        &self,
        nodes: Vec<SupplyNode>,
        routes: Vec<SupplyRoute>,
        event: DisruptionEvent,
        overrides: Option<SupplyOverrides>,
    ) -> PendingSolve<FlowResult> {
        let solver = self.network.clone();
        dispatch("network", move || {
            solver.optimize_flows_seeded(&nodes, &routes, event, overrides.as_ref())
        })
    }

    pub fn solve_resources(
        &self,
        requirements: Vec<ResourceRequirement>,
        pools: Vec<ResourcePool>,
        weights: Option<PriorityWeights>,
        enforce_equity: bool,
    ) -> PendingSolve<MultiResourceResult> {
        let solver = self.resources.clone();
        dispatch("multi_resource", move || {
            solver.solve(&requirements, &pools, weights.as_ref(), enforce_equity)
        })
    }
}

fn dispatch<T, F>(solver: &'static str, job: F) -> PendingSolve<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (pending, _worker) = spawn_solve(solver, job);
    pending
}

/// Runs `job` on a new thread; the handle yields whether the result was delivered.
fn spawn_solve<T, F>(solver: &'static str, job: F) -> (PendingSolve<T>, JoinHandle<bool>)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let worker = thread::spawn(move || {
        let outcome = job();
        let delivered = sender.send(outcome).is_ok();
        if !delivered {
            debug!(event = "solve_abandoned", solver);
        }
        delivered
    });
    (receiver, worker)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use infraplan_core::SolveStatus;
    use infraplan_test::{costed, hub_and_spoke};

    #[test]
    fn test_capital_off_thread() {
        let manager = PlanningManager::default();
        let pending = manager.solve_capital(costed(&[100.0, 200.0, 300.0]), 300.0, None);
        let result = wait_blocking(pending).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        assert_eq!(result.funded_ids(), vec!["A0", "A1"]);
    }

    #[test]
    fn test_matches_direct_solve() {
        let (nodes, routes) = hub_and_spoke();
        let manager = PlanningManager::default();
        let pending =
            manager.optimize_flows(nodes.clone(), routes.clone(), DisruptionEvent::Flood, None);
        let direct = NetworkFlowSolver::default()
            .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::Flood, None)
            .unwrap();
        assert_eq!(wait_blocking(pending).unwrap(), direct);
    }

    #[test]
    fn test_errors_are_forwarded() {
        let manager = PlanningManager::default();
        let pending = manager.solve_capital(costed(&[100.0]), -5.0, None);
        assert!(matches!(
            wait_blocking(pending),
            Err(PlanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dropped_receiver_discards_result() {
        let (release, gate) = mpsc::channel::<()>();
        let planner = CapitalPlanner::default();
        let (pending, worker) = spawn_solve("capital", move || {
            // hold the solve until the receiver is gone
            let _ = gate.recv();
            planner.solve(&costed(&[100.0]), 100.0)
        });

        drop(pending);
        release.send(()).unwrap();
        assert!(!worker.join().unwrap());
    }

    #[test]
    fn test_delivered_result_is_reported() {
        let planner = CapitalPlanner::default();
        let (pending, worker) =
            spawn_solve("capital", move || planner.solve(&costed(&[100.0]), 100.0));

        assert_eq!(wait_blocking(pending).unwrap().assets_funded, 1);
        assert!(worker.join().unwrap());
    }

    #[test]
    fn test_worker_panic_abandons_solve() {
        let pending = dispatch::<AllocationResult, _>("capital", || panic!("worker lost"));
        assert!(matches!(wait_blocking(pending), Err(PlanError::Abandoned)));
    }

    #[tokio::test]
    async fn test_wait_awaits_result() {
        let manager = PlanningManager::default();
        let pending = manager.solve_capital(costed(&[100.0, 200.0]), 100.0, None);
        let result = wait(pending).await.unwrap();
        assert_eq!(result.funded_ids(), vec!["A0"]);

        let pending = dispatch::<FlowResult, _>("network", || panic!("worker lost"));
        assert!(matches!(wait(pending).await, Err(PlanError::Abandoned)));
    }
}
