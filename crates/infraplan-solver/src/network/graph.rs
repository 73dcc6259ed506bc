//! Graph algorithms behind the network solver.
//!
//! - [`MinCostFlow`]: successive shortest paths on a residual network
//! - [`RouteGraph`]: open routes searched for detours with `petgraph`

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// Distance label of a node not yet reached by Bellman-Ford.
const UNREACHED: i128 = i128::MAX;

#[derive(Debug, Clone)]
struct FlowArc {
    to: usize,
    capacity: i64,
    cost: i64,
    flow: i64,
}

/// Outcome of [`MinCostFlow::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOutcome {
    pub flow: i64,
    /// Saturates at the `i64` bounds instead of overflowing.
    pub cost: i64,
}

/// Residual network with integer capacities and costs.
///
/// Arcs are stored in pairs: arc `e` and its reverse `e ^ 1`.
#[derive(Debug, Clone, Default)]
pub struct MinCostFlow {
    arcs: Vec<FlowArc>,
    adjacency: Vec<Vec<usize>>,
}

impl MinCostFlow {
    pub fn new(node_count: usize) -> Self {
        Self {
            arcs: Vec::new(),
            adjacency: vec![Vec::new(); node_count],
        }
    }

    /// Adds a directed arc and returns its id.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: i64, cost: i64) -> usize {
        let id = self.arcs.len();
        self.arcs.push(FlowArc {
            to,
            capacity,
            cost,
            flow: 0,
        });
        self.arcs.push(FlowArc {
            to: from,
            capacity: 0,
            cost: cost.saturating_neg(),
            flow: 0,
        });
        self.adjacency[from].push(id);
        self.adjacency[to].push(id + 1);
        id
    }

    pub fn flow(&self, arc: usize) -> i64 {
        self.arcs[arc].flow
    }

    #[inline]
    fn residual(&self, arc: usize) -> i64 {
        self.arcs[arc].capacity - self.arcs[arc].flow
    }

    /// Pushes up to `required` units from `source` to `sink` at minimum cost.
    ///
    /// Each augmentation follows a cheapest residual path found with
    /// Bellman-Ford, so negative reverse arcs are handled. Path lengths are
    /// accumulated in `i128`. Stops early when the sink becomes unreachable.
    pub fn solve(&mut self, source: usize, sink: usize, required: i64) -> FlowOutcome {
        let n = self.adjacency.len();
        let mut total = FlowOutcome { flow: 0, cost: 0 };

        while total.flow < required {
            let mut dist = vec![UNREACHED; n];
            let mut via: Vec<Option<usize>> = vec![None; n];
            dist[source] = 0;

            for _ in 0..n.saturating_sub(1) {
                let mut changed = false;
                for u in 0..n {
                    if dist[u] == UNREACHED {
                        continue;
                    }
                    for &e in &self.adjacency[u] {
                        if self.residual(e) <= 0 {
                            continue;
                        }
                        let v = self.arcs[e].to;
                        let candidate = dist[u].saturating_add(i128::from(self.arcs[e].cost));
                        if candidate < dist[v] {
                            dist[v] = candidate;
                            via[v] = Some(e);
                            changed = true;
                        }
                    }
                }
                if !changed {
                    break;
                }
            }

            if dist[sink] == UNREACHED {
                break;
            }

            let mut push = required - total.flow;
            let mut v = sink;
            while let Some(e) = via[v] {
                push = push.min(self.residual(e));
                v = self.arcs[e ^ 1].to;
            }
            let mut v = sink;
            while let Some(e) = via[v] {
                self.arcs[e].flow += push;
                self.arcs[e ^ 1].flow -= push;
                v = self.arcs[e ^ 1].to;
            }
            total.flow += push;
            let path_cost = clamp_i64(i128::from(push).saturating_mul(dist[sink]));
            total.cost = total.cost.saturating_add(path_cost);
        }
        total
    }
}

fn clamp_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Directed graph of open routes weighted by delay-adjusted travel time.
#[derive(Debug, Clone)]
pub struct RouteGraph {
    graph: DiGraph<(), f64>,
}

impl RouteGraph {
    /// Builds the graph over nodes `0..node_count` from `(from, to, time)` edges.
    pub fn new(node_count: usize, edges: impl IntoIterator<Item = (usize, usize, f64)>) -> Self {
        let mut graph = DiGraph::with_capacity(node_count, 0);
        for _ in 0..node_count {
            graph.add_node(());
        }
        for (from, to, time) in edges {
            graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), time);
        }
        Self { graph }
    }

    /// Fastest path from `from` to `to` and its total time.
    ///
    /// Returns `None` when `to` is unreachable or equal to `from`.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<(Vec<usize>, f64)> {
        if from == to {
            return None;
        }
        let goal = NodeIndex::new(to);
        let (time, path) = astar(
            &self.graph,
            NodeIndex::new(from),
            |n| n == goal,
            |e| *e.weight(),
            |_| 0.0,
        )?;
        Some((path.into_iter().map(NodeIndex::index).collect(), time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_cheaper_path() {
        // 0 -> 1 -> 3 costs 2, 0 -> 2 -> 3 costs 10, both capacity 5
        let mut graph = MinCostFlow::new(4);
        let a = graph.add_arc(0, 1, 5, 1);
        graph.add_arc(1, 3, 5, 1);
        let b = graph.add_arc(0, 2, 5, 5);
        graph.add_arc(2, 3, 5, 5);

        let outcome = graph.solve(0, 3, 7);
        assert_eq!(outcome.flow, 7);
        assert_eq!(outcome.cost, 5 * 2 + 2 * 10);
        assert_eq!(graph.flow(a), 5);
        assert_eq!(graph.flow(b), 2);
    }

    #[test]
    fn test_uses_reverse_arcs() {
        // Classic case where the second augmentation cancels flow on 1 -> 2
        let mut graph = MinCostFlow::new(4);
        graph.add_arc(0, 1, 1, 1);
        graph.add_arc(0, 2, 1, 4);
        let middle = graph.add_arc(1, 2, 1, 1);
        graph.add_arc(1, 3, 1, 4);
        graph.add_arc(2, 3, 1, 1);

        let outcome = graph.solve(0, 3, 2);
        assert_eq!(outcome.flow, 2);
        assert_eq!(outcome.cost, 10);
        assert_eq!(graph.flow(middle), 0);
    }

    #[test]
    fn test_partial_when_capacity_short() {
        let mut graph = MinCostFlow::new(2);
        graph.add_arc(0, 1, 3, 2);
        let outcome = graph.solve(0, 1, 5);
        assert_eq!(outcome, FlowOutcome { flow: 3, cost: 6 });
    }

    #[test]
    fn test_huge_costs_saturate() {
        let mut graph = MinCostFlow::new(3);
        graph.add_arc(0, 1, 2, i64::MAX - 1);
        graph.add_arc(1, 2, 2, i64::MAX - 1);

        let outcome = graph.solve(0, 2, 2);
        assert_eq!(outcome, FlowOutcome { flow: 2, cost: i64::MAX });
    }

    #[test]
    fn test_shortest_path() {
        let edges = [(0, 1, 4.0), (1, 2, 4.0), (0, 2, 10.0), (2, 3, 1.0)];
        let graph = RouteGraph::new(4, edges);
        let (path, time) = graph.shortest_path(0, 3).unwrap();
        assert_eq!(path, vec![0, 1, 2, 3]);
        assert_eq!(time, 9.0);
        assert!(graph.shortest_path(3, 0).is_none());
        assert!(graph.shortest_path(1, 1).is_none());
    }
}
