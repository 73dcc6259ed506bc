//! Tests for the network flow solver.

use super::*;
use infraplan_core::NodeType;
use infraplan_core::MAX_TRAVEL_TIME;
use infraplan_test::network::{
    balanced_network, hub_and_spoke, resilient_network, route, unbalanced_network,
};

fn solve(
    nodes: &[SupplyNode],
    routes: &[SupplyRoute],
    event: DisruptionEvent,
) -> FlowResult {
    NetworkFlowSolver::default()
        .optimize_flows_seeded(nodes, routes, event, None)
        .unwrap()
}

#[test]
fn test_undisrupted_hub_and_spoke() {
    let (nodes, routes) = hub_and_spoke();
    let result = solve(&nodes, &routes, DisruptionEvent::None);

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.total_flow, 50);
    assert_eq!(result.total_cost, 25 * 30 + 25 * 45);
    assert_eq!(result.network_status, NetworkStatus::Low);
    assert!(result.blocked_edges.is_empty());
    assert!(result.alerts.is_empty());
    assert!(verify_conservation(&nodes, &result, None));
    for r in &result.routes {
        assert_eq!(r.status, RouteStatus::Active);
        assert_eq!(r.flow, 25);
        assert_eq!(r.estimated_time, r.original_time);
        assert!((r.traffic_index - 0.25).abs() < 1e-12);
    }
}

#[test]
fn test_balanced_network_conserves_flow() {
    let (nodes, routes) = balanced_network();
    let result = solve(&nodes, &routes, DisruptionEvent::None);

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.total_flow, 100);
    assert!(verify_conservation(&nodes, &result, None));
    for r in &result.routes {
        let expected = if r.flow > 0 {
            RouteStatus::Active
        } else {
            RouteStatus::Unused
        };
        assert_eq!(r.status, expected, "{}->{}", r.source, r.target);
        assert!(r.flow <= r.capacity);
    }
}

#[test]
fn test_flood_blocks_routes() {
    let (nodes, routes) = balanced_network();
    let result = solve(&nodes, &routes, DisruptionEvent::Flood);

    // round(0.3 * 14)
    assert_eq!(result.blocked_edges.len(), 4);
    assert!(matches!(
        result.network_status,
        NetworkStatus::High | NetworkStatus::Critical
    ));
    assert_eq!(result.delay_multiplier, 3.5);
    for edge in &result.blocked_edges {
        let r = result.route(&edge.source, &edge.target).unwrap();
        assert_eq!(r.status, RouteStatus::Blocked);
        assert_eq!(r.capacity, 1);
        assert!(r.flow <= 1);
    }
    assert!(result
        .alerts
        .iter()
        .any(|a| a.starts_with("Flood disruption active")));
    assert!(result.alerts.iter().any(|a| a == "4 of 14 routes blocked"));
}

#[test]
fn test_flood_conserves_flow_around_blocked_routes() {
    let (nodes, routes, demands) = resilient_network();
    for seed in [1, 7, 42, 99, 2024] {
        let solver = NetworkFlowSolver::new(PlannerConfig::default().with_random_seed(seed));
        let result = solver
            .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::Flood, Some(&demands))
            .unwrap();

        assert_eq!(result.status, SolveStatus::Optimal, "seed {seed}");
        assert_eq!(result.blocked_edges.len(), 2);
        assert_eq!(result.total_flow, 100);
        assert!(verify_conservation(&nodes, &result, Some(&demands)));
        for r in &result.routes {
            assert!(r.flow >= 0 && r.flow <= r.capacity, "{}->{}", r.source, r.target);
        }
        for edge in &result.blocked_edges {
            assert_eq!(result.route(&edge.source, &edge.target).unwrap().flow, 0);
        }
        assert!(result.total_cost < 1_000_000);
    }
}

#[test]
fn test_reroutes_follow_open_routes() {
    let (nodes, routes) = balanced_network();
    let result = solve(&nodes, &routes, DisruptionEvent::Flood);
    let blocked: BTreeSet<&EdgeRef> = result.blocked_edges.iter().collect();

    for reroute in &result.reroutes {
        assert!(blocked.contains(&reroute.blocked));
        assert_eq!(reroute.path.first(), Some(&reroute.blocked.source));
        assert_eq!(reroute.path.last(), Some(&reroute.blocked.target));

        let mut time = 0.0;
        for hop in reroute.path.windows(2) {
            let r = result.route(&hop[0], &hop[1]).unwrap();
            assert_ne!(r.status, RouteStatus::Blocked);
            time += r.estimated_time;
        }
        assert!((time - reroute.estimated_time).abs() < 1e-9);
    }
}

#[test]
fn test_earthquake_blocks_half() {
    let (nodes, routes) = balanced_network();
    let result = solve(&nodes, &routes, DisruptionEvent::Earthquake);

    assert_eq!(result.blocked_edges.len(), 7);
    assert_eq!(result.blocked_fraction(), 0.5);
    // exactly half is not critical, but a x10 delay is high
    assert_eq!(result.network_status, NetworkStatus::High);
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let (nodes, routes) = balanced_network();
    let first = solve(&nodes, &routes, DisruptionEvent::Flood);
    let second = solve(&nodes, &routes, DisruptionEvent::Flood);
    assert_eq!(first, second);

    let solver = NetworkFlowSolver::default();
    let mut a = ChaCha8Rng::seed_from_u64(7);
    let mut b = ChaCha8Rng::seed_from_u64(7);
    let x = solver
        .optimize_flows(&nodes, &routes, DisruptionEvent::Flood, None, &mut a)
        .unwrap();
    let y = solver
        .optimize_flows(&nodes, &routes, DisruptionEvent::Flood, None, &mut b)
        .unwrap();
    assert_eq!(x.blocked_edges, y.blocked_edges);
}

#[test]
fn test_offline_node_blocks_its_routes() {
    let (mut nodes, routes) = hub_and_spoke();
    nodes[2] = nodes[2].clone().offline();
    let result = solve(&nodes, &routes, DisruptionEvent::None);

    // H2 can only receive one unit through its blocked route
    assert_eq!(result.status, SolveStatus::Fallback);
    assert_eq!(result.total_flow, 0);
    assert_eq!(result.blocked_edges, vec![EdgeRef::new("W1", "H2")]);
    assert_eq!(result.route("W1", "H2").unwrap().status, RouteStatus::Blocked);
    assert_eq!(result.route("W1", "H1").unwrap().status, RouteStatus::Active);
    assert!(result.routes.iter().all(|r| r.flow == 0));
    assert!(result.trace.mentions("routable"));
    // 1 of 2 blocked
    assert_eq!(result.network_status, NetworkStatus::High);
}

#[test]
fn test_unbalanced_supply_falls_back() {
    let (nodes, routes) = unbalanced_network();
    let result = solve(&nodes, &routes, DisruptionEvent::Snowstorm);

    assert_eq!(result.status, SolveStatus::Fallback);
    assert_eq!(result.network_status, NetworkStatus::Moderate);
    assert!(result.trace.mentions("does not balance"));
    for r in &result.routes {
        assert_eq!(r.flow, 0);
        assert_eq!(r.status, RouteStatus::Delayed);
        assert_eq!(r.estimated_time, r.original_time * 2.0);
    }
    assert!(result
        .alerts
        .iter()
        .any(|a| a.contains("could not be routed")));
}

#[test]
fn test_supply_overrides() {
    let (nodes, routes) = hub_and_spoke();
    let overrides: SupplyOverrides = [("W1", 30), ("H1", -10), ("H2", -20)]
        .into_iter()
        .map(|(id, s)| (id.to_string(), s))
        .collect();
    let result = NetworkFlowSolver::default()
        .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::None, Some(&overrides))
        .unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.total_flow, 30);
    assert_eq!(result.route("W1", "H2").unwrap().flow, 20);
    assert!(verify_conservation(&nodes, &result, Some(&overrides)));
    assert!(!verify_conservation(&nodes, &result, None));
    assert_eq!(
        conservation_violations(&nodes, &result, None),
        vec![
            ("W1".to_string(), -20),
            ("H1".to_string(), 15),
            ("H2".to_string(), 5),
        ]
    );
}

#[test]
fn test_route_capacity_respected() {
    let nodes = vec![
        SupplyNode::new("W1", NodeType::Warehouse),
        SupplyNode::new("D1", NodeType::Distribution),
        SupplyNode::new("H1", NodeType::Hospital),
        SupplyNode::new("H2", NodeType::Hospital),
    ];
    let routes = vec![
        route("W1", "H1", 10.0).with_capacity(10),
        route("W1", "D1", 5.0),
        route("D1", "H1", 20.0),
        route("D1", "H2", 5.0),
    ];
    let result = solve(&nodes, &routes, DisruptionEvent::None);

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.route("W1", "H1").unwrap().flow, 10);
    assert_eq!(result.route("D1", "H1").unwrap().flow, 15);
    assert_eq!(result.route("W1", "D1").unwrap().flow, 40);
    assert!(verify_conservation(&nodes, &result, None));
}

#[test]
fn test_empty_network() {
    let result = solve(&[], &[], DisruptionEvent::Flood);
    assert_eq!(result.status, SolveStatus::NoNetwork);
    assert!(result.routes.is_empty());

    let (nodes, _) = hub_and_spoke();
    let result = solve(&nodes, &[], DisruptionEvent::None);
    assert_eq!(result.status, SolveStatus::NoNetwork);
}

#[test]
fn test_invalid_network_rejected() {
    let (nodes, mut routes) = hub_and_spoke();
    routes.push(route("W1", "H9", 5.0));
    let err = NetworkFlowSolver::default()
        .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::None, None)
        .unwrap_err();
    match err {
        PlanError::Validation(e) => assert_eq!(e.field, "target"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let (mut nodes, routes) = hub_and_spoke();
    nodes.push(SupplyNode::new("H1", NodeType::Hospital));
    let err = NetworkFlowSolver::default()
        .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::None, None)
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn test_extreme_travel_time_rejected() {
    let nodes = vec![
        SupplyNode::new("W", NodeType::Warehouse),
        SupplyNode::new("D", NodeType::Distribution),
        SupplyNode::new("H1", NodeType::Hospital),
        SupplyNode::new("H2", NodeType::Hospital),
    ];
    let routes = vec![route("W", "D", 6e18), route("D", "H1", 6e18), route("D", "H2", 6e18)];
    let err = NetworkFlowSolver::default()
        .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::Earthquake, None)
        .unwrap_err();
    match err {
        PlanError::Validation(e) => assert_eq!(e.field, "travel_time"),
        other => panic!("expected validation error, got {other:?}"),
    }

    // the largest accepted time still routes
    let routes: Vec<SupplyRoute> = ["H1", "H2"]
        .into_iter()
        .map(|h| route("W", h, MAX_TRAVEL_TIME))
        .collect();
    let result = solve(&nodes, &routes, DisruptionEvent::None);
    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.total_cost, 50 * 1_000_000_000);
}

#[test]
fn test_overflowing_supply_rejected() {
    let (nodes, routes) = hub_and_spoke();
    let overrides: SupplyOverrides = [("W1", i64::MAX), ("H1", i64::MAX)]
        .into_iter()
        .map(|(id, s)| (id.to_string(), s))
        .collect();
    let err = NetworkFlowSolver::default()
        .optimize_flows_seeded(&nodes, &routes, DisruptionEvent::None, Some(&overrides))
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidInput(_)));
}

#[test]
fn test_network_status_table() {
    assert_eq!(network_status(0.6, 1.0), NetworkStatus::Critical);
    assert_eq!(network_status(0.3, 1.0), NetworkStatus::High);
    assert_eq!(network_status(0.0, 3.5), NetworkStatus::High);
    assert_eq!(network_status(0.0, 2.0), NetworkStatus::Moderate);
    assert_eq!(network_status(0.0, 1.3), NetworkStatus::Low);
}

#[test]
fn test_sample_blocked_counts() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    assert!(sample_blocked(10, 0.0, &mut rng).is_empty());
    assert_eq!(sample_blocked(10, 0.3, &mut rng).len(), 3);
    assert_eq!(sample_blocked(5, 0.5, &mut rng).len(), 3);
    let all = sample_blocked(4, 1.0, &mut rng);
    assert_eq!(all.into_iter().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn test_result_serializes() {
    let (nodes, routes) = hub_and_spoke();
    let result = solve(&nodes, &routes, DisruptionEvent::Heatwave);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["event"], "Heatwave");
    assert_eq!(json["network_status"], "Low");
    assert_eq!(json["routes"][0]["status"], "Active");
}
