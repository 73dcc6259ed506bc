//! Supply network fixtures.

use std::collections::HashMap;

use infraplan_core::{NodeType, SupplyNode, SupplyRoute};

pub fn warehouse(id: &str) -> SupplyNode {
    SupplyNode::new(id, NodeType::Warehouse)
}

pub fn hospital(id: &str) -> SupplyNode {
    SupplyNode::new(id, NodeType::Hospital)
}

pub fn hub(id: &str) -> SupplyNode {
    SupplyNode::new(id, NodeType::Distribution)
}

pub fn route(source: &str, target: &str, travel_time: f64) -> SupplyRoute {
    SupplyRoute::new(source, target, travel_time, travel_time)
}

/// One warehouse feeding two hospitals directly.
///
/// Supply 50 against demand 2 x 25.
pub fn hub_and_spoke() -> (Vec<SupplyNode>, Vec<SupplyRoute>) {
    let nodes = vec![warehouse("W1"), hospital("H1"), hospital("H2")];
    let routes = vec![route("W1", "H1", 30.0), route("W1", "H2", 45.0)];
    (nodes, routes)
}

/// Two warehouses, one distribution hub and four hospitals.
///
/// Supply 2 x 50 balances demand 4 x 25. Every hospital is reachable
/// directly from both warehouses and through the hub, giving 14 routes.
pub fn balanced_network() -> (Vec<SupplyNode>, Vec<SupplyRoute>) {
    let nodes = vec![
        warehouse("W1"),
        warehouse("W2"),
        hub("D1"),
        hospital("H1"),
        hospital("H2"),
        hospital("H3"),
        hospital("H4"),
    ];
    let mut routes = Vec::new();
    for (w, base) in [("W1", 20.0), ("W2", 35.0)] {
        for (i, h) in ["H1", "H2", "H3", "H4"].into_iter().enumerate() {
            routes.push(route(w, h, base + 10.0 * i as f64));
        }
        routes.push(route(w, "D1", 15.0));
    }
    for h in ["H1", "H2", "H3", "H4"] {
        routes.push(route("D1", h, 12.0));
    }
    (nodes, routes)
}

/// One warehouse and three hospitals: supply 50 against demand 75.
pub fn unbalanced_network() -> (Vec<SupplyNode>, Vec<SupplyRoute>) {
    let nodes = vec![warehouse("W1"), hospital("H1"), hospital("H2"), hospital("H3")];
    let routes = vec![
        route("W1", "H1", 10.0),
        route("W1", "H2", 20.0),
        route("W1", "H3", 30.0),
    ];
    (nodes, routes)
}

/// Two warehouses and two hospitals, wired directly and through a hub.
///
/// Every node keeps an open route to the rest of the network whenever at
/// most two of the eight routes are blocked, so a Flood (round(0.3 x 8) = 2
/// blocked) is always routable without touching a blocked route. The
/// returned demands override the hospital defaults to balance 2 x 50 supply.
pub fn resilient_network() -> (Vec<SupplyNode>, Vec<SupplyRoute>, HashMap<String, i64>) {
    let nodes = vec![
        warehouse("W1"),
        warehouse("W2"),
        hub("D1"),
        hospital("H1"),
        hospital("H2"),
    ];
    let routes = vec![
        route("W1", "H1", 20.0),
        route("W1", "H2", 25.0),
        route("W2", "H1", 30.0),
        route("W2", "H2", 20.0),
        route("W1", "D1", 10.0),
        route("W2", "D1", 10.0),
        route("D1", "H1", 15.0),
        route("D1", "H2", 15.0),
    ];
    let demands = [("H1", -50), ("H2", -50)]
        .into_iter()
        .map(|(id, demand)| (id.to_string(), demand))
        .collect();
    (nodes, routes, demands)
}
