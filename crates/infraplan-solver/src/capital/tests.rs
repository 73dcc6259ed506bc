//! Tests for the capital plan solver.

use super::*;
use infraplan_core::AssetType;
use infraplan_test::assets::{asset, costed, mixed_portfolio};

fn objective(result: &AllocationResult) -> f64 {
    result
        .decisions
        .iter()
        .filter(|d| d.funded)
        .map(|d| d.priority_score)
        .sum()
}

fn within_budget(result: &AllocationResult) -> bool {
    result.total_allocated <= result.budget + 1e-9 * result.budget.max(1.0)
}

fn greedy_only() -> CapitalPlanner {
    CapitalPlanner::new(PlannerConfig::new().with_strategies([StrategyKind::Greedy]))
}

#[test]
fn test_empty_assets() {
    let result = CapitalPlanner::default().solve(&[], 1_000.0).unwrap();
    assert_eq!(result.status, SolveStatus::NoAssets);
    assert_eq!(result.total_allocated, 0.0);
    assert!(result.decisions.is_empty());
    assert!(result.trace.mentions("no assets"));
}

#[test]
fn test_invalid_inputs_rejected() {
    let planner = CapitalPlanner::default();
    let assets = costed(&[100.0]);

    for budget in [-1.0, f64::NAN, f64::INFINITY] {
        let err = planner.solve(&assets, budget).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)), "budget {budget}");
    }

    let options = CapitalOptions::default().with_weights(-0.5, 1.0);
    let err = planner.solve_with(&assets, 100.0, &options).unwrap_err();
    assert!(matches!(err, PlanError::InvalidInput(_)));

    let options = CapitalOptions::default().with_equity(1.5);
    let err = planner.solve_with(&assets, 100.0, &options).unwrap_err();
    assert!(matches!(err, PlanError::InvalidInput(_)));
}

#[test]
fn test_invalid_asset_rejected() {
    let mut assets = costed(&[100.0, 200.0]);
    assets[1].replacement_cost = 0.0;
    let err = CapitalPlanner::default().solve(&assets, 500.0).unwrap_err();
    match err {
        PlanError::Validation(e) => {
            assert_eq!(e.record_id, "A1");
            assert_eq!(e.field, "replacement_cost");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_three_assets_tight_budget() {
    // no pair of {100, 200, 300} fits in 250
    let assets = costed(&[100.0, 200.0, 300.0]);
    let result = CapitalPlanner::default().solve(&assets, 250.0).unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.assets_funded, 1);
    assert_eq!(result.assets_deferred, 2);
    assert!(within_budget(&result));
    assert!(result.equity_satisfied);
    assert_eq!(result.optimality_gap, 0.0);
}

#[test]
fn test_three_assets_pair_fits() {
    let assets = costed(&[100.0, 200.0, 300.0]);
    let result = CapitalPlanner::default().solve(&assets, 300.0).unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.funded_ids(), vec!["A0", "A1"]);
    assert_eq!(result.total_allocated, 300.0);
    assert_eq!(result.remaining_budget(), 0.0);
    assert_eq!(result.total_requested, 600.0);
}

#[test]
fn test_budget_sweep_objective_never_falls() {
    let assets = mixed_portfolio();
    let planner = CapitalPlanner::default();
    let mut previous = 0.0;
    for budget in [0.0, 100.0, 250.0, 500.0, 900.0, 1_400.0, 2_000.0, 5_000.0] {
        let result = planner.solve(&assets, budget).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal, "budget {budget}");
        assert!(result.total_allocated <= budget, "budget {budget}");
        assert!(within_budget(&result), "budget {budget}");
        let value = objective(&result);
        assert!(value + 1e-9 >= previous, "objective fell at budget {budget}");
        previous = value;
    }
}

#[test]
fn test_more_budget_can_fund_fewer_assets() {
    let assets = vec![
        asset("A", AssetType::Bridge, "ON", 0.0, 100.0, 100.0).with_daily_usage(50_000.0),
        asset("B", AssetType::Bridge, "ON", 80.0, 0.0, 40.0).with_daily_usage(0.0),
        asset("C", AssetType::Bridge, "ON", 80.0, 0.0, 40.0).with_daily_usage(0.0),
    ];
    let planner = CapitalPlanner::default();
    let small = planner.solve(&assets, 80.0).unwrap();
    let large = planner.solve(&assets, 100.0).unwrap();

    assert_eq!(small.funded_ids(), vec!["B", "C"]);
    assert_eq!(large.funded_ids(), vec!["A"]);
    // the count drops, the objective and spend do not
    assert!(large.assets_funded < small.assets_funded);
    assert!(objective(&large) > objective(&small));
    assert!(large.total_allocated >= small.total_allocated);
}

#[test]
fn test_large_budget_funds_everything() {
    let assets = mixed_portfolio();
    let result = CapitalPlanner::default().solve(&assets, 1e9).unwrap();
    assert_eq!(result.assets_funded, assets.len());
    // funded assets keep 20% of their baseline risk
    assert!((result.risk_reduction_pct - 80.0).abs() < 1e-9);
}

#[test]
fn test_zero_budget_funds_nothing() {
    let result = CapitalPlanner::default()
        .solve(&mixed_portfolio(), 0.0)
        .unwrap();
    assert_eq!(result.assets_funded, 0);
    assert_eq!(result.risk_reduction_pct, 0.0);
    assert!(result
        .decisions
        .iter()
        .all(|d| d.budget_assigned == 0.0 && d.rationale.contains("eferred")));
}

#[test]
fn test_equity_enforced() {
    let assets = mixed_portfolio();
    let options = CapitalOptions::default().with_equity(0.2);
    let result = CapitalPlanner::default()
        .solve_with(&assets, 900.0, &options)
        .unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert!(result.equity_satisfied);
    assert!(within_budget(&result));
    for region in ["ON", "QC", "BC"] {
        assert!(
            result.regional_allocation[region] >= 900.0 * 0.2,
            "region {region} got {}",
            result.regional_allocation[region]
        );
    }
    assert!(result.trace.mentions("each of 3 regions"));
}

#[test]
fn test_infeasible_equity_falls_back_to_greedy() {
    // BC needs its 350 asset, ON 250, QC 300: 900 > 800
    let assets = mixed_portfolio();
    let options = CapitalOptions::default().with_equity(0.2);
    let result = CapitalPlanner::default()
        .solve_with(&assets, 800.0, &options)
        .unwrap();

    assert_eq!(result.status, SolveStatus::GreedyFallback);
    assert!(!result.equity_satisfied);
    assert!(within_budget(&result));
    assert!(result.trace.mentions("branch_and_bound: infeasible"));
    assert!(result.trace.mentions("falling back to greedy"));
}

#[test]
fn test_all_strategies_fail() {
    let planner = CapitalPlanner::new(
        PlannerConfig::new().with_strategies([StrategyKind::BranchAndBound]),
    );
    let options = CapitalOptions::default().with_equity(0.2);
    let result = planner
        .solve_with(&mixed_portfolio(), 800.0, &options)
        .unwrap();

    assert_eq!(result.status, SolveStatus::Infeasible);
    assert_eq!(result.assets_funded, 0);
    assert_eq!(result.total_allocated, 0.0);
    assert!(!result.equity_satisfied);
    assert!(result.trace.mentions("no strategy produced a solution"));
}

#[test]
fn test_equity_skipped_for_single_region() {
    let assets = costed(&[100.0, 200.0]);
    let options = CapitalOptions::default().with_equity(0.5);
    let result = CapitalPlanner::default()
        .solve_with(&assets, 300.0, &options)
        .unwrap();
    assert_eq!(result.status, SolveStatus::Optimal);
    assert!(result.trace.mentions("fewer than two regions"));

    let options = CapitalOptions::default().with_equity(0.0);
    let result = CapitalPlanner::default()
        .solve_with(&mixed_portfolio(), 300.0, &options)
        .unwrap();
    assert!(result.trace.mentions("minimum regional share is zero"));
}

#[test]
fn test_greedy_tie_breaks() {
    let assets = costed(&[300.0, 100.0, 200.0]);
    let result = greedy_only().solve(&assets, 300.0).unwrap();

    assert_eq!(result.status, SolveStatus::GreedyFallback);
    assert_eq!(result.funded_ids(), vec!["A1", "A2"]);
    assert!(!result.equity_satisfied);
    assert_eq!(result.optimality_gap, 0.0);
}

#[test]
fn test_variable_limit_declines_branch_and_bound() {
    let mut config = PlannerConfig::new();
    config.solver.max_variables = 2;
    let result = CapitalPlanner::new(config)
        .solve(&costed(&[100.0, 200.0, 300.0]), 300.0)
        .unwrap();

    assert_eq!(result.status, SolveStatus::GreedyFallback);
    assert!(result.trace.mentions("exceed the limit of 2"));
    assert!(within_budget(&result));
}

#[test]
fn test_weights_change_selection() {
    // one risky asset, one busy asset, room for only one
    let risky = asset("risky", AssetType::Bridge, "ON", 10.0, 70.0, 100.0).with_daily_usage(10.0);
    let busy = asset("busy", AssetType::HighwaySegment, "ON", 90.0, 5.0, 100.0)
        .with_daily_usage(90_000.0);
    let assets = vec![risky, busy];
    let planner = CapitalPlanner::default();

    let risk_first = CapitalOptions::default().with_weights(1.0, 0.0);
    let result = planner.solve_with(&assets, 100.0, &risk_first).unwrap();
    assert_eq!(result.funded_ids(), vec!["risky"]);

    let coverage_first = CapitalOptions::default().with_weights(0.0, 1.0);
    let result = planner.solve_with(&assets, 100.0, &coverage_first).unwrap();
    assert_eq!(result.funded_ids(), vec!["busy"]);
}

#[test]
fn test_rationales() {
    let critical = asset("crit", AssetType::Bridge, "ON", 20.0, 70.0, 100.0);
    let healthy = asset("ok", AssetType::Bridge, "ON", 95.0, 2.0, 500.0);
    let result = CapitalPlanner::default()
        .solve(&[critical, healthy], 100.0)
        .unwrap();

    let crit = result.decision("crit").unwrap();
    assert!(crit.funded);
    assert_eq!(
        crit.rationale,
        "Critical condition - immediate intervention required"
    );
    let ok = result.decision("ok").unwrap();
    assert!(!ok.funded);
    assert!(ok.rationale.starts_with("Deferred - cost"));
}

#[test]
fn test_idempotent() {
    let assets = mixed_portfolio();
    let planner = CapitalPlanner::default();
    let options = CapitalOptions::default().with_equity(0.1);
    let first = planner.solve_with(&assets, 1_200.0, &options).unwrap();
    let second = planner.solve_with(&assets, 1_200.0, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_result_serializes() {
    let result = CapitalPlanner::default()
        .solve(&costed(&[100.0, 200.0]), 150.0)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "OPTIMAL");
    assert_eq!(json["assets_funded"], 1);
    assert!(json["trace"].as_array().is_some_and(|t| !t.is_empty()));
}
