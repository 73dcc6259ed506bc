//! Capital plan solver.
//!
//! Chooses which assets to fund under a budget, maximizing the summed
//! priority score of funded assets. Optional regional equity requires every
//! region to receive a minimum share of the budget.
//!
//! # Example
//!
//! ```
//! use infraplan_core::{Asset, AssetType, SolveStatus};
//! use infraplan_solver::CapitalPlanner;
//!
//! let assets = vec![
//!     Asset::new("B-1", AssetType::Bridge, "ON", 35.0, 60.0, 8_000.0, 100.0).unwrap(),
//!     Asset::new("B-2", AssetType::Bridge, "ON", 80.0, 10.0, 2_000.0, 200.0).unwrap(),
//! ];
//!
//! let result = CapitalPlanner::default().solve(&assets, 150.0).unwrap();
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert_eq!(result.funded_ids(), vec!["B-1"]);
//! ```

mod greedy;
mod scoring;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use infraplan_config::{CapitalConfig, PlannerConfig, StrategyKind};
use infraplan_core::result::{AllocationResult, AssetDecision};
use infraplan_core::{Asset, PlanError, Result, SolveStatus, SolverTrace};
use tracing::{debug, info};

use crate::milp::{BranchAndBound, MilpModel, MilpStatus, Relation};
use crate::strategy::{run_strategies, StrategyOutcome};

pub use greedy::greedy_selection;
pub use scoring::{raw_impact, raw_risk, score_assets, AssetScore, ScoringWeights};

/// Normalized risk above which a funded asset is described as high risk.
const HIGH_RISK: f64 = 0.7;

/// Per-call options for [`CapitalPlanner::solve_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalOptions {
    pub weights: ScoringWeights,
    pub enforce_equity: bool,
    /// Minimum share of the budget per region when equity is enforced.
    pub min_regional_pct: f64,
}

impl CapitalOptions {
    pub fn from_config(config: &CapitalConfig) -> Self {
        Self {
            weights: ScoringWeights::new(config.risk_weight, config.coverage_weight),
            enforce_equity: false,
            min_regional_pct: config.min_regional_pct,
        }
    }

    pub fn with_weights(mut self, risk: f64, coverage: f64) -> Self {
        self.weights = ScoringWeights::new(risk, coverage);
        self
    }

    /// Enables the equity constraint with the given minimum share.
    pub fn with_equity(mut self, min_regional_pct: f64) -> Self {
        self.enforce_equity = true;
        self.min_regional_pct = min_regional_pct;
        self
    }
}

impl Default for CapitalOptions {
    fn default() -> Self {
        Self::from_config(&CapitalConfig::default())
    }
}

/// Fund/defer selection produced by one strategy.
#[derive(Debug, Clone)]
struct Plan {
    funded: Vec<bool>,
    status: SolveStatus,
    gap: f64,
    equity_satisfied: bool,
}

/// Budget-constrained asset selection.
#[derive(Debug, Clone, Default)]
pub struct CapitalPlanner {
    config: PlannerConfig,
}

impl CapitalPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Options derived from the `[capital]` configuration section.
    pub fn default_options(&self) -> CapitalOptions {
        CapitalOptions::from_config(&self.config.capital)
    }

    /// Solves with the configured weights and no equity constraint.
    pub fn solve(&self, assets: &[Asset], budget: f64) -> Result<AllocationResult> {
        self.solve_with(assets, budget, &self.default_options())
    }

    /// Solves the capital plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidInput`] for a negative or non-finite
    /// budget, invalid weights or an out-of-range equity share, and
    /// [`PlanError::Validation`] for an invalid asset.
    pub fn solve_with(
        &self,
        assets: &[Asset],
        budget: f64,
        options: &CapitalOptions,
    ) -> Result<AllocationResult> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "budget must be finite and non-negative, got {budget}"
            )));
        }
        if !options.weights.is_valid() {
            return Err(PlanError::InvalidInput(format!(
                "scoring weights must be finite and non-negative, got {:?}",
                options.weights
            )));
        }
        if !(0.0..=1.0).contains(&options.min_regional_pct) {
            return Err(PlanError::InvalidInput(format!(
                "min_regional_pct must lie within [0, 1], got {}",
                options.min_regional_pct
            )));
        }

        let start = Instant::now();
        info!(
            event = "solve_start",
            solver = "capital",
            asset_count = assets.len(),
            budget,
        );
        let mut trace = SolverTrace::new();

        if assets.is_empty() {
            trace.record("no assets supplied");
            info!(event = "solve_end", solver = "capital", status = %SolveStatus::NoAssets);
            return Ok(AllocationResult::empty(SolveStatus::NoAssets, budget, trace));
        }
        for asset in assets {
            asset.validate()?;
        }

        let scores = score_assets(assets, options.weights);
        trace.record(format!(
            "scored {} assets (risk weight {:.2}, coverage weight {:.2})",
            assets.len(),
            options.weights.risk,
            options.weights.coverage
        ));

        let regions: BTreeSet<&str> = assets.iter().map(|a| a.region.as_str()).collect();
        let equity_pct = if !options.enforce_equity {
            None
        } else if regions.len() < 2 {
            debug!(event = "equity_skipped", reason = "single_region");
            trace.record("equity constraint skipped: fewer than two regions");
            None
        } else if options.min_regional_pct <= 0.0 {
            debug!(event = "equity_skipped", reason = "zero_share");
            trace.record("equity constraint skipped: minimum regional share is zero");
            None
        } else {
            trace.record(format!(
                "equity: each of {} regions must receive at least {:.1}% of the budget",
                regions.len(),
                options.min_regional_pct * 100.0
            ));
            Some(options.min_regional_pct)
        };

        let solved = run_strategies(&self.config.solver.strategies, &mut trace, |kind, trace| {
            match kind {
                StrategyKind::BranchAndBound => {
                    self.branch_and_bound(assets, &scores, budget, &regions, equity_pct, trace)
                }
                StrategyKind::Greedy => {
                    let costs: Vec<f64> = assets.iter().map(|a| a.replacement_cost).collect();
                    let priorities: Vec<f64> = scores.iter().map(|s| s.priority).collect();
                    let funded = greedy_selection(&costs, &priorities, budget);
                    trace.record(format!(
                        "greedy: funded {} of {} assets",
                        funded.iter().filter(|f| **f).count(),
                        assets.len()
                    ));
                    StrategyOutcome::Solved(Plan {
                        funded,
                        status: SolveStatus::GreedyFallback,
                        gap: 0.0,
                        equity_satisfied: false,
                    })
                }
            }
        });

        let plan = match solved {
            Some((_, plan)) => plan,
            None => Plan {
                funded: vec![false; assets.len()],
                status: SolveStatus::Infeasible,
                gap: 0.0,
                equity_satisfied: equity_pct.is_none(),
            },
        };

        let result = self.build_result(assets, &scores, budget, plan, trace);
        info!(
            event = "solve_end",
            solver = "capital",
            status = %result.status,
            funded = result.assets_funded,
            allocated = result.total_allocated,
            elapsed_ms = start.elapsed().as_millis() as u64,
        );
        Ok(result)
    }

    fn branch_and_bound(
        &self,
        assets: &[Asset],
        scores: &[AssetScore],
        budget: f64,
        regions: &BTreeSet<&str>,
        equity_pct: Option<f64>,
        trace: &mut SolverTrace,
    ) -> StrategyOutcome<Plan> {
        let max_variables = self.config.solver.max_variables;
        if assets.len() > max_variables {
            return StrategyOutcome::Unavailable(format!(
                "{} variables exceed the limit of {max_variables}",
                assets.len()
            ));
        }

        let mut model = MilpModel::new();
        let vars: Vec<_> = assets
            .iter()
            .zip(scores)
            .map(|(a, s)| model.add_binary(&a.id, s.priority))
            .collect();
        model.add_constraint(
            "budget",
            vars.iter()
                .zip(assets)
                .map(|(x, a)| (*x, a.replacement_cost)),
            Relation::LessEq,
            budget,
        );
        if let Some(pct) = equity_pct {
            for region in regions {
                model.add_constraint(
                    format!("equity_{region}"),
                    vars.iter()
                        .zip(assets)
                        .filter(|(_, a)| a.region == *region)
                        .map(|(x, a)| (*x, a.replacement_cost)),
                    Relation::GreaterEq,
                    budget * pct,
                );
            }
        }

        let solution = BranchAndBound::from_config(&self.config.solver).solve(&model);
        match solution.status {
            MilpStatus::Optimal | MilpStatus::Feasible => {
                if !model.is_feasible(&solution.values, 1e-9) {
                    return StrategyOutcome::Unavailable(
                        "incumbent violates constraints beyond tolerance".to_string(),
                    );
                }
                trace.record(format!(
                    "branch_and_bound: {} after {} nodes, objective {:.4}, gap {:.4}",
                    solution.status,
                    solution.nodes_explored,
                    solution.objective,
                    solution.gap()
                ));
                let status = if solution.status == MilpStatus::Optimal {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Feasible
                };
                StrategyOutcome::Solved(Plan {
                    funded: (0..assets.len()).map(|i| solution.is_set(i)).collect(),
                    status,
                    gap: solution.gap(),
                    equity_satisfied: true,
                })
            }
            MilpStatus::Infeasible => StrategyOutcome::Infeasible(if equity_pct.is_some() {
                "regional minimums cannot be met within the budget".to_string()
            } else {
                "no feasible selection".to_string()
            }),
            MilpStatus::Unbounded => {
                StrategyOutcome::Unavailable("relaxation is unbounded".to_string())
            }
            MilpStatus::NoSolution => StrategyOutcome::Unavailable(format!(
                "limits reached after {} nodes without an incumbent",
                solution.nodes_explored
            )),
        }
    }

    fn build_result(
        &self,
        assets: &[Asset],
        scores: &[AssetScore],
        budget: f64,
        plan: Plan,
        mut trace: SolverTrace,
    ) -> AllocationResult {
        let capital = &self.config.capital;
        let total_allocated: f64 = assets
            .iter()
            .zip(&plan.funded)
            .filter(|(_, f)| **f)
            .map(|(a, _)| a.replacement_cost)
            .sum();
        let total_requested: f64 = assets.iter().map(|a| a.replacement_cost).sum();
        let remaining = budget - total_allocated;

        let baseline: f64 = scores.iter().map(|s| s.risk).sum();
        let residual: f64 = scores
            .iter()
            .zip(&plan.funded)
            .map(|(s, f)| {
                if *f {
                    s.risk * capital.funded_risk_retention
                } else {
                    s.risk
                }
            })
            .sum();
        let risk_reduction_pct = if baseline > 0.0 {
            (baseline - residual) / baseline * 100.0
        } else {
            0.0
        };

        let mut regional_allocation: BTreeMap<String, f64> = BTreeMap::new();
        let decisions: Vec<AssetDecision> = assets
            .iter()
            .zip(scores)
            .zip(&plan.funded)
            .map(|((asset, score), &funded)| {
                let share = regional_allocation.entry(asset.region.clone()).or_insert(0.0);
                if funded {
                    *share += asset.replacement_cost;
                }
                AssetDecision {
                    asset_id: asset.id.clone(),
                    asset_name: asset.name.clone(),
                    region: asset.region.clone(),
                    funded,
                    priority_score: score.priority,
                    risk_score: score.risk,
                    requested: asset.replacement_cost,
                    budget_assigned: if funded { asset.replacement_cost } else { 0.0 },
                    rationale: rationale(asset, score, funded, remaining, capital),
                }
            })
            .collect();

        let assets_funded = plan.funded.iter().filter(|f| **f).count();
        trace.record(format!(
            "funded {assets_funded} of {} assets, allocated {total_allocated:.2} of {budget:.2}",
            assets.len()
        ));

        AllocationResult {
            status: plan.status,
            budget,
            total_allocated,
            total_requested,
            assets_funded,
            assets_deferred: assets.len() - assets_funded,
            optimality_gap: plan.gap,
            risk_reduction_pct,
            equity_satisfied: plan.equity_satisfied,
            decisions,
            regional_allocation,
            trace,
        }
    }
}

fn rationale(
    asset: &Asset,
    score: &AssetScore,
    funded: bool,
    remaining: f64,
    config: &CapitalConfig,
) -> String {
    let critical = asset.condition_score < config.critical_condition;
    match (funded, critical) {
        (true, true) => "Critical condition - immediate intervention required".to_string(),
        (true, false) if score.risk >= HIGH_RISK => {
            format!("High failure risk ({:.2}) addressed", score.risk)
        }
        (true, false) => format!("Funded - priority score {:.2} within budget", score.priority),
        (false, true) => {
            "Critical condition but deferred - insufficient budget for replacement".to_string()
        }
        (false, false) if asset.replacement_cost > remaining => format!(
            "Deferred - cost {:.2} exceeds remaining budget {:.2}",
            asset.replacement_cost,
            remaining.max(0.0)
        ),
        (false, false) => "Deferred - lower priority than funded assets".to_string(),
    }
}
