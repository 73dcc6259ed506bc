//! LP-based branch and bound.
//!
//! Open nodes live in a priority queue ordered by the configured
//! [`ExplorationType`]. Each node carries tightened variable bounds and the
//! relaxation bound inherited from its parent, which is used for pruning
//! and for the best-bound estimate when the search stops early.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::{Duration, Instant};

use infraplan_config::{ExplorationType, SolverConfig};
use tracing::debug;

use super::model::MilpModel;
use super::simplex::{solve_relaxation, LpOutcome};

/// Distance from an integer below which a value counts as integral.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Termination state of a branch-and-bound search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilpStatus {
    /// Search completed with a proven optimum.
    Optimal,
    /// Stopped by a limit while holding an incumbent.
    Feasible,
    /// Search completed without any integer-feasible point.
    Infeasible,
    /// Relaxation is unbounded.
    Unbounded,
    /// Stopped by a limit (or a stalled relaxation) before any incumbent.
    NoSolution,
}

impl fmt::Display for MilpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilpStatus::Optimal => write!(f, "Optimal"),
            MilpStatus::Feasible => write!(f, "Feasible"),
            MilpStatus::Infeasible => write!(f, "Infeasible"),
            MilpStatus::Unbounded => write!(f, "Unbounded"),
            MilpStatus::NoSolution => write!(f, "NoSolution"),
        }
    }
}

/// Search outcome and statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MilpSolution {
    pub status: MilpStatus,
    /// Incumbent values; empty without an incumbent.
    pub values: Vec<f64>,
    pub objective: f64,
    /// Upper bound on the optimum over the unexplored tree.
    pub best_bound: f64,
    pub nodes_explored: u64,
    pub elapsed: Duration,
}

impl MilpSolution {
    pub fn has_incumbent(&self) -> bool {
        matches!(self.status, MilpStatus::Optimal | MilpStatus::Feasible)
    }

    /// Relative distance between bound and incumbent, 0 when the objective
    /// is zero or there is no incumbent.
    pub fn gap(&self) -> f64 {
        if !self.has_incumbent() || self.objective.abs() < f64::EPSILON {
            return 0.0;
        }
        (self.best_bound - self.objective).abs() / self.objective.abs()
    }

    /// True if the binary at `index` is 1 in the incumbent.
    pub fn is_set(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(|v| *v > 0.5)
    }
}

#[derive(Debug, Clone)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    depth: usize,
    bound: f64,
    sequence: u64,
}

/// Frontier entry ordered by the exploration type.
struct PriorityNode {
    node: Node,
    exploration_type: ExplorationType,
}

impl Eq for PriorityNode {}

impl PartialEq for PriorityNode {
    fn eq(&self, other: &Self) -> bool {
        self.node.sequence == other.node.sequence
    }
}

impl Ord for PriorityNode {
    fn cmp(&self, other: &Self) -> Ordering {
        let primary = match self.exploration_type {
            ExplorationType::DepthFirst => self
                .node
                .depth
                .cmp(&other.node.depth)
                .then_with(|| self.node.bound.total_cmp(&other.node.bound)),
            ExplorationType::BestBound => self
                .node
                .bound
                .total_cmp(&other.node.bound)
                .then_with(|| self.node.depth.cmp(&other.node.depth)),
        };
        // Latest node wins ties
        primary.then_with(|| self.node.sequence.cmp(&other.node.sequence))
    }
}

impl PartialOrd for PriorityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Branch-and-bound search over a [`MilpModel`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use infraplan_solver::milp::{BranchAndBound, MilpModel, MilpStatus, Relation};
///
/// let mut model = MilpModel::new();
/// let a = model.add_binary("a", 5.0);
/// let b = model.add_binary("b", 4.0);
/// let c = model.add_binary("c", 3.0);
/// model.add_constraint("budget", [(a, 4.0), (b, 3.0), (c, 2.0)], Relation::LessEq, 5.0);
///
/// let solution = BranchAndBound::new(Duration::from_secs(1), 1_000).solve(&model);
/// assert_eq!(solution.status, MilpStatus::Optimal);
/// assert!((solution.objective - 7.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    time_limit: Duration,
    node_limit: u64,
    exploration_type: ExplorationType,
}

impl BranchAndBound {
    pub fn new(time_limit: Duration, node_limit: u64) -> Self {
        Self {
            time_limit,
            node_limit,
            exploration_type: ExplorationType::default(),
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.time_limit(), config.node_limit).with_exploration(config.exploration)
    }

    pub fn with_exploration(mut self, exploration_type: ExplorationType) -> Self {
        self.exploration_type = exploration_type;
        self
    }

    pub fn exploration_type(&self) -> ExplorationType {
        self.exploration_type
    }

    pub fn solve(&self, model: &MilpModel) -> MilpSolution {
        let start = Instant::now();
        let variables = model.variables();
        let integer: Vec<bool> = variables.iter().map(|v| v.integer).collect();

        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut nodes_explored: u64 = 0;
        let mut sequence: u64 = 0;
        let mut stopped_early = false;
        let mut open_bound = f64::NEG_INFINITY;

        let mut frontier: BinaryHeap<PriorityNode> = BinaryHeap::new();
        frontier.push(PriorityNode {
            node: Node {
                lower: variables.iter().map(|v| v.lower).collect(),
                upper: variables.iter().map(|v| v.upper).collect(),
                depth: 0,
                bound: f64::INFINITY,
                sequence,
            },
            exploration_type: self.exploration_type,
        });

        while let Some(PriorityNode { node, .. }) = frontier.pop() {
            let best = incumbent.as_ref().map(|(_, obj)| *obj);
            if let Some(best) = best {
                if node.bound <= best + prune_tolerance(best) {
                    continue;
                }
            }

            if nodes_explored >= self.node_limit || start.elapsed() >= self.time_limit {
                stopped_early = true;
                open_bound = open_bound.max(node.bound);
                break;
            }
            nodes_explored += 1;

            let (values, objective) = match solve_relaxation(model, &node.lower, &node.upper) {
                LpOutcome::Optimal { values, objective } => (values, objective),
                LpOutcome::Infeasible => continue,
                LpOutcome::Unbounded => {
                    return MilpSolution {
                        status: MilpStatus::Unbounded,
                        values: Vec::new(),
                        objective: f64::INFINITY,
                        best_bound: f64::INFINITY,
                        nodes_explored,
                        elapsed: start.elapsed(),
                    };
                }
                LpOutcome::IterationLimit => {
                    // Unexplored subtree: the search can no longer prove optimality
                    stopped_early = true;
                    open_bound = open_bound.max(node.bound);
                    continue;
                }
            };

            if let Some(best) = best {
                if objective <= best + prune_tolerance(best) {
                    continue;
                }
            }

            match most_fractional(&values, &integer) {
                None => {
                    let snapped: Vec<f64> = values
                        .iter()
                        .zip(&integer)
                        .map(|(v, is_int)| if *is_int { v.round() } else { *v })
                        .collect();
                    let value = model.objective_value(&snapped);
                    debug!(
                        event = "incumbent",
                        objective = value,
                        depth = node.depth,
                        nodes = nodes_explored,
                    );
                    incumbent = Some((snapped, value));
                }
                Some(j) => {
                    let v = values[j];
                    let mut down = node.clone();
                    down.upper[j] = v.floor();
                    down.depth += 1;
                    down.bound = objective;
                    sequence += 1;
                    down.sequence = sequence;

                    let mut up = node;
                    up.lower[j] = v.ceil();
                    up.depth += 1;
                    up.bound = objective;
                    sequence += 1;
                    up.sequence = sequence;

                    frontier.push(PriorityNode {
                        node: down,
                        exploration_type: self.exploration_type,
                    });
                    frontier.push(PriorityNode {
                        node: up,
                        exploration_type: self.exploration_type,
                    });
                }
            }
        }

        if stopped_early {
            for entry in frontier.iter() {
                open_bound = open_bound.max(entry.node.bound);
            }
        }

        let elapsed = start.elapsed();
        let solution = match incumbent {
            Some((values, objective)) => {
                let (status, best_bound) = if stopped_early {
                    (MilpStatus::Feasible, open_bound.max(objective))
                } else {
                    (MilpStatus::Optimal, objective)
                };
                MilpSolution {
                    status,
                    values,
                    objective,
                    best_bound,
                    nodes_explored,
                    elapsed,
                }
            }
            None => MilpSolution {
                status: if stopped_early {
                    MilpStatus::NoSolution
                } else {
                    MilpStatus::Infeasible
                },
                values: Vec::new(),
                objective: f64::NEG_INFINITY,
                best_bound: open_bound,
                nodes_explored,
                elapsed,
            },
        };

        debug!(
            event = "branch_and_bound_end",
            status = %solution.status,
            nodes = solution.nodes_explored,
            elapsed_ms = solution.elapsed.as_millis() as u64,
        );
        solution
    }
}

fn prune_tolerance(best: f64) -> f64 {
    1e-9 * best.abs().max(1.0)
}

/// Index of the integer variable farthest from integrality, lowest index on ties.
fn most_fractional(values: &[f64], integer: &[bool]) -> Option<usize> {
    let mut chosen: Option<(usize, f64)> = None;
    for (j, (v, is_int)) in values.iter().zip(integer).enumerate() {
        if !is_int {
            continue;
        }
        let frac = v - v.floor();
        let distance = frac.min(1.0 - frac);
        if distance <= INTEGRALITY_TOLERANCE {
            continue;
        }
        if chosen.map_or(true, |(_, d)| distance > d) {
            chosen = Some((j, distance));
        }
    }
    chosen.map(|(j, _)| j)
}
