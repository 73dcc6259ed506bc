//! Resilient supply-network flow.
//!
//! Routes supply from warehouses to hospitals at minimum delay-adjusted
//! cost while a disruption blocks a share of the routes. Blocked routes
//! stay in the network at unit capacity and a prohibitive cost, so the
//! solver only uses them when nothing else reaches a node.
//!
//! # Example
//!
//! ```
//! use infraplan_core::{DisruptionEvent, NodeType, SolveStatus, SupplyNode, SupplyRoute};
//! use infraplan_solver::NetworkFlowSolver;
//!
//! let nodes = vec![
//!     SupplyNode::new("W1", NodeType::Warehouse),
//!     SupplyNode::new("H1", NodeType::Hospital),
//!     SupplyNode::new("H2", NodeType::Hospital),
//! ];
//! let routes = vec![
//!     SupplyRoute::new("W1", "H1", 12.0, 20.0),
//!     SupplyRoute::new("W1", "H2", 18.0, 30.0),
//! ];
//!
//! let result = NetworkFlowSolver::default()
//!     .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::None, None)
//!     .unwrap();
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert_eq!(result.total_flow, 50);
//! ```

mod graph;

#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use infraplan_config::PlannerConfig;
use infraplan_core::result::{
    EdgeRef, FlowResult, NetworkStatus, RerouteSuggestion, RouteFlow, RouteStatus,
};
use infraplan_core::{
    DisruptionEvent, PlanError, Result, SolveStatus, SolverTrace, SupplyNode, SupplyRoute,
    ValidationError,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

pub use graph::{FlowOutcome, MinCostFlow, RouteGraph};

/// Per-node supply overrides: positive supplies, negative demands.
pub type SupplyOverrides = HashMap<String, i64>;

/// Delay multiplier above which a loaded route is reported as delayed.
const DELAYED_MULTIPLIER: f64 = 1.5;

/// Supply of `node`, from `overrides` when present, else its type default.
pub fn node_supply(node: &SupplyNode, overrides: Option<&SupplyOverrides>) -> i64 {
    overrides
        .and_then(|o| o.get(&node.id).copied())
        .unwrap_or_else(|| node.node_type.default_supply())
}

/// Picks `round(fraction * route_count)` distinct route indices.
pub fn sample_blocked<R: Rng + ?Sized>(
    route_count: usize,
    fraction: f64,
    rng: &mut R,
) -> BTreeSet<usize> {
    let amount = (fraction.clamp(0.0, 1.0) * route_count as f64).round() as usize;
    let amount = amount.min(route_count);

    // partial Fisher-Yates over the route indices
    let mut indices: Vec<usize> = (0..route_count).collect();
    for i in 0..amount {
        let j = rng.random_range(i..route_count);
        indices.swap(i, j);
    }
    indices.truncate(amount);
    indices.into_iter().collect()
}

/// Positive supply and demand totals.
///
/// Overrides large enough to overflow `i64` are rejected.
fn supply_totals(supplies: &[i64]) -> Result<(i64, i64)> {
    let overflow = || PlanError::InvalidInput("supply totals overflow i64".to_string());
    let supply = supplies
        .iter()
        .filter(|s| **s > 0)
        .try_fold(0_i64, |acc, s| acc.checked_add(*s))
        .ok_or_else(overflow)?;
    let demand = supplies
        .iter()
        .filter(|s| **s < 0)
        .try_fold(0_i64, |acc, s| acc.checked_sub(*s))
        .ok_or_else(overflow)?;
    Ok((supply, demand))
}

/// Qualitative network health from the blocked share and delay.
pub fn network_status(blocked_fraction: f64, delay_multiplier: f64) -> NetworkStatus {
    if blocked_fraction > 0.5 {
        NetworkStatus::Critical
    } else if blocked_fraction > 0.2 || delay_multiplier > 3.0 {
        NetworkStatus::High
    } else if delay_multiplier > DELAYED_MULTIPLIER {
        NetworkStatus::Moderate
    } else {
        NetworkStatus::Low
    }
}

/// Nodes whose net outflow differs from their supply, with the difference.
pub fn conservation_violations(
    nodes: &[SupplyNode],
    result: &FlowResult,
    overrides: Option<&SupplyOverrides>,
) -> Vec<(String, i64)> {
    let mut net: HashMap<&str, i64> = HashMap::new();
    for route in &result.routes {
        *net.entry(route.source.as_str()).or_insert(0) += route.flow;
        *net.entry(route.target.as_str()).or_insert(0) -= route.flow;
    }
    nodes
        .iter()
        .filter_map(|node| {
            let outflow = net.get(node.id.as_str()).copied().unwrap_or(0);
            let diff = outflow - node_supply(node, overrides);
            (diff != 0).then(|| (node.id.clone(), diff))
        })
        .collect()
}

/// True if every node ships exactly its supply (receives exactly its demand).
pub fn verify_conservation(
    nodes: &[SupplyNode],
    result: &FlowResult,
    overrides: Option<&SupplyOverrides>,
) -> bool {
    conservation_violations(nodes, result, overrides).is_empty()
}

/// Min-cost flow under disruption.
#[derive(Debug, Clone, Default)]
pub struct NetworkFlowSolver {
    config: PlannerConfig,
}

impl NetworkFlowSolver {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Like [`optimize_flows`](Self::optimize_flows) with a `ChaCha8Rng`
    /// seeded from `[solver] random_seed`.
    pub fn optimize_flows_seeded(
        &self,
        nodes: &[SupplyNode],
        routes: &[SupplyRoute],
        event: DisruptionEvent,
        overrides: Option<&SupplyOverrides>,
    ) -> Result<FlowResult> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.solver.seed());
        self.optimize_flows(nodes, routes, event, overrides, &mut rng)
    }

    /// Routes supply to demand under `event`, blocking routes drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Validation`] for duplicate node ids, routes with
    /// unknown endpoints or invalid route attributes.
    pub fn optimize_flows<R: Rng + ?Sized>(
        &self,
        nodes: &[SupplyNode],
        routes: &[SupplyRoute],
        event: DisruptionEvent,
        overrides: Option<&SupplyOverrides>,
        rng: &mut R,
    ) -> Result<FlowResult> {
        let start = Instant::now();
        let delay = event.delay_multiplier();
        info!(
            event = "solve_start",
            solver = "network",
            node_count = nodes.len(),
            route_count = routes.len(),
            disruption = %event,
        );
        let mut trace = SolverTrace::new();

        if nodes.is_empty() || routes.is_empty() {
            trace.record("network has no nodes or no routes");
            info!(event = "solve_end", solver = "network", status = %SolveStatus::NoNetwork);
            return Ok(FlowResult {
                status: SolveStatus::NoNetwork,
                event,
                delay_multiplier: delay,
                routes: Vec::new(),
                total_flow: 0,
                total_cost: 0,
                blocked_edges: Vec::new(),
                reroutes: Vec::new(),
                network_status: network_status(0.0, delay),
                alerts: Vec::new(),
                trace,
            });
        }

        let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index_of.insert(node.id.as_str(), i).is_some() {
                return Err(ValidationError::new(&node.id, "id", "duplicate node id").into());
            }
        }
        let mut endpoints = Vec::with_capacity(routes.len());
        for route in routes {
            route.validate()?;
            let source = index_of.get(route.source.as_str()).copied();
            let target = index_of.get(route.target.as_str()).copied();
            match (source, target) {
                (Some(s), Some(t)) => endpoints.push((s, t)),
                (None, _) => {
                    return Err(PlanError::Validation(ValidationError::new(
                        format!("{}->{}", route.source, route.target),
                        "source",
                        format!("unknown node `{}`", route.source),
                    )))
                }
                (_, None) => {
                    return Err(PlanError::Validation(ValidationError::new(
                        format!("{}->{}", route.source, route.target),
                        "target",
                        format!("unknown node `{}`", route.target),
                    )))
                }
            }
        }

        let mut blocked = sample_blocked(routes.len(), event.blocked_fraction(), rng);
        let sampled = blocked.len();
        for (i, &(s, t)) in endpoints.iter().enumerate() {
            if !nodes[s].operational || !nodes[t].operational {
                blocked.insert(i);
            }
        }
        trace.record(format!(
            "{event}: delay x{delay:.1}, {sampled} routes blocked by sampling, {} by offline nodes",
            blocked.len() - sampled
        ));
        debug!(event = "routes_blocked", sampled, total = blocked.len());

        let network = &self.config.network;
        let capacities: Vec<i64> = routes
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if blocked.contains(&i) {
                    network.blocked_capacity
                } else {
                    r.capacity.unwrap_or(network.default_route_capacity)
                }
            })
            .collect();
        let costs: Vec<i64> = routes
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if blocked.contains(&i) {
                    network.blocked_cost
                } else {
                    (r.travel_time * delay).round() as i64
                }
            })
            .collect();

        let supplies: Vec<i64> = nodes.iter().map(|n| node_supply(n, overrides)).collect();
        let (total_supply, total_demand) = supply_totals(&supplies)?;

        let mut flows = vec![0_i64; routes.len()];
        let mut total_cost = 0;
        let mut delivered = 0;
        let status = if total_supply != total_demand {
            warn!(
                event = "flow_fallback",
                reason = "unbalanced",
                supply = total_supply,
                demand = total_demand,
            );
            trace.record(format!(
                "supply {total_supply} does not balance demand {total_demand}; \
                 reporting annotated routes only"
            ));
            SolveStatus::Fallback
        } else {
            let source = nodes.len();
            let sink = nodes.len() + 1;
            let mut graph = MinCostFlow::new(nodes.len() + 2);
            let arcs: Vec<usize> = endpoints
                .iter()
                .enumerate()
                .map(|(i, &(s, t))| graph.add_arc(s, t, capacities[i], costs[i]))
                .collect();
            for (i, &supply) in supplies.iter().enumerate() {
                if supply > 0 {
                    graph.add_arc(source, i, supply, 0);
                } else if supply < 0 {
                    graph.add_arc(i, sink, -supply, 0);
                }
            }

            let outcome = graph.solve(source, sink, total_supply);
            if outcome.flow < total_supply {
                warn!(
                    event = "flow_fallback",
                    reason = "unroutable",
                    routed = outcome.flow,
                    required = total_supply,
                );
                trace.record(format!(
                    "only {} of {total_supply} units routable; reporting annotated routes only",
                    outcome.flow
                ));
                SolveStatus::Fallback
            } else {
                for (flow, arc) in flows.iter_mut().zip(&arcs) {
                    *flow = graph.flow(*arc);
                }
                total_cost = outcome.cost;
                delivered = outcome.flow;
                trace.record(format!(
                    "min-cost flow routed {} units at cost {total_cost}",
                    outcome.flow
                ));
                SolveStatus::Optimal
            }
        };

        let route_flows: Vec<RouteFlow> = routes
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let is_blocked = blocked.contains(&i);
                let flow = flows[i];
                let route_status = if is_blocked {
                    RouteStatus::Blocked
                } else if status == SolveStatus::Fallback {
                    if delay > DELAYED_MULTIPLIER {
                        RouteStatus::Delayed
                    } else {
                        RouteStatus::Active
                    }
                } else if flow > 0 && delay > DELAYED_MULTIPLIER {
                    RouteStatus::Delayed
                } else if flow > 0 {
                    RouteStatus::Active
                } else {
                    RouteStatus::Unused
                };
                let traffic_index = if capacities[i] > 0 {
                    flow as f64 / capacities[i] as f64 * delay
                } else {
                    0.0
                };
                RouteFlow {
                    source: r.source.clone(),
                    target: r.target.clone(),
                    flow,
                    capacity: capacities[i],
                    status: route_status,
                    original_time: r.travel_time,
                    estimated_time: r.travel_time * delay,
                    traffic_index,
                }
            })
            .collect();

        let blocked_edges: Vec<EdgeRef> = blocked
            .iter()
            .map(|&i| EdgeRef::new(&routes[i].source, &routes[i].target))
            .collect();

        let open_routes = RouteGraph::new(
            nodes.len(),
            endpoints
                .iter()
                .enumerate()
                .filter(|(i, _)| !blocked.contains(i))
                .map(|(i, &(s, t))| (s, t, routes[i].travel_time * delay)),
        );
        let reroutes: Vec<RerouteSuggestion> = blocked
            .iter()
            .filter_map(|&i| {
                let (s, t) = endpoints[i];
                open_routes.shortest_path(s, t).map(|(path, time)| {
                    RerouteSuggestion {
                        blocked: EdgeRef::new(&routes[i].source, &routes[i].target),
                        path: path.into_iter().map(|n| nodes[n].id.clone()).collect(),
                        estimated_time: time,
                    }
                })
            })
            .collect();

        let blocked_fraction = blocked.len() as f64 / routes.len() as f64;
        let health = network_status(blocked_fraction, delay);

        let mut alerts = Vec::new();
        if event.is_active() {
            alerts.push(format!(
                "{event} disruption active: travel times x{delay:.1}"
            ));
        }
        if !blocked.is_empty() {
            alerts.push(format!(
                "{} of {} routes blocked",
                blocked.len(),
                routes.len()
            ));
        }
        if !reroutes.is_empty() {
            alerts.push(format!(
                "{} reroute(s) available around blocked routes",
                reroutes.len()
            ));
        }
        if status == SolveStatus::Fallback {
            alerts.push("Supply could not be routed; showing annotated routes only".to_string());
        }
        trace.record(format!(
            "network status {health}, {} reroutes suggested",
            reroutes.len()
        ));

        let total_flow = delivered;
        info!(
            event = "solve_end",
            solver = "network",
            status = %status,
            total_flow,
            total_cost,
            network_status = %health,
            elapsed_ms = start.elapsed().as_millis() as u64,
        );

        Ok(FlowResult {
            status,
            event,
            delay_multiplier: delay,
            routes: route_flows,
            total_flow,
            total_cost,
            blocked_edges,
            reroutes,
            network_status: health,
            alerts,
            trace,
        })
    }
}
