//! Multi-resource allocation.
//!
//! Allocates money, personnel and equipment pools to the requirements of
//! asset projects. Each requirement is either completed from its compatible
//! pools or left partially covered; the objective maximizes the priority
//! weight of completed requirements.
//!
//! # Example
//!
//! ```
//! use infraplan_core::{ResourcePool, ResourceRequirement, ResourceType, SolveStatus};
//! use infraplan_solver::MultiResourceSolver;
//!
//! let pools = vec![ResourcePool::new("cash", ResourceType::Money, 1_000.0, "CAD")];
//! let requirements = vec![
//!     ResourceRequirement::new("r1", "B-1", ResourceType::Money, 600.0, 1),
//!     ResourceRequirement::new("r2", "B-2", ResourceType::Money, 600.0, 3),
//! ];
//!
//! let result = MultiResourceSolver::default()
//!     .solve(&requirements, &pools, None, false)
//!     .unwrap();
//! assert_eq!(result.status, SolveStatus::Optimal);
//! assert_eq!(result.requirements_completed, 1);
//! assert!((result.allocated_to("r1") - 600.0).abs() < 1e-6);
//! ```

mod costing;
mod greedy;


use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use infraplan_config::{PlannerConfig, StrategyKind};
use infraplan_core::result::{
    AllocationStatus, MultiResourceAllocation, MultiResourceResult, ProjectStatus,
    ProjectSummary, ResourceSummary, UNFUNDED_THRESHOLD,
};
use infraplan_core::{
    PlanError, ResourcePool, ResourceRequirement, ResourceType, Result, SolveStatus, SolverTrace,
    ValidationError,
};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::milp::{BranchAndBound, MilpModel, MilpStatus, Relation, VarId};
use crate::strategy::{run_strategies, StrategyOutcome};

pub use costing::{cost_estimate, duration_days};
pub use greedy::greedy_drain;

/// Caller overrides of the objective weight per priority level.
pub type PriorityWeights = BTreeMap<u8, f64>;

/// Indices of the pools able to serve one requirement.
pub type Compatible = SmallVec<[usize; 4]>;

/// Share of one requirement's need drawn from each compatible pool.
pub type Fractions = SmallVec<[f64; 4]>;

/// Fractions below this are treated as zero.
const FRACTION_EPS: f64 = 1e-9;

/// Pool indices compatible with each requirement, in pool order.
pub fn compatible_pools(
    requirements: &[ResourceRequirement],
    pools: &[ResourcePool],
) -> Vec<Compatible> {
    requirements
        .iter()
        .map(|r| {
            pools
                .iter()
                .enumerate()
                .filter(|(_, p)| p.can_serve(r))
                .map(|(i, _)| i)
                .collect()
        })
        .collect()
}

/// Objective weight of `requirement`: the caller's override for its
/// priority, else `6 - priority`.
pub fn requirement_weight(
    requirement: &ResourceRequirement,
    weights: Option<&PriorityWeights>,
) -> f64 {
    weights
        .and_then(|w| w.get(&requirement.priority).copied())
        .unwrap_or_else(|| requirement.priority_weight())
}

/// Minimum draw from the pools of one region and resource type.
#[derive(Debug, Clone)]
struct EquityFloor {
    region: String,
    resource_type: ResourceType,
    pools: Vec<usize>,
    floor: f64,
}

/// Draw fractions produced by one strategy.
#[derive(Debug, Clone)]
struct Plan {
    fractions: Vec<Fractions>,
    status: SolveStatus,
    equity_satisfied: bool,
}

/// Allocates resource pools across project requirements.
#[derive(Debug, Clone, Default)]
pub struct MultiResourceSolver {
    config: PlannerConfig,
}

impl MultiResourceSolver {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Allocates `pools` to `requirements`.
    ///
    /// With `enforce_equity`, every region owning pools must draw at least
    /// `[resources] min_regional_pct` of what its pools could serve.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Validation`] for an invalid or duplicate pool or
    /// requirement, and [`PlanError::InvalidInput`] for negative or
    /// non-finite weights or an out-of-range regional share.
    pub fn solve(
        &self,
        requirements: &[ResourceRequirement],
        pools: &[ResourcePool],
        weights: Option<&PriorityWeights>,
        enforce_equity: bool,
    ) -> Result<MultiResourceResult> {
        if let Some(w) = weights {
            if let Some((priority, value)) = w.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
                return Err(PlanError::InvalidInput(format!(
                    "weight for priority {priority} must be finite and non-negative, got {value}"
                )));
            }
        }
        let min_regional_pct = self.config.resources.min_regional_pct;
        if !(0.0..=1.0).contains(&min_regional_pct) {
            return Err(PlanError::InvalidInput(format!(
                "min_regional_pct must lie within [0, 1], got {min_regional_pct}"
            )));
        }

        let start = Instant::now();
        info!(
            event = "solve_start",
            solver = "multi_resource",
            requirement_count = requirements.len(),
            pool_count = pools.len(),
            enforce_equity,
        );
        let mut trace = SolverTrace::new();

        if requirements.is_empty() {
            trace.record("no requirements supplied");
            info!(
                event = "solve_end",
                solver = "multi_resource",
                status = %SolveStatus::NoRequirements,
            );
            return Ok(MultiResourceResult::empty(SolveStatus::NoRequirements, trace));
        }
        validate_unique(requirements.iter().map(|r| r.id.as_str()), "requirement")?;
        validate_unique(pools.iter().map(|p| p.id.as_str()), "pool")?;
        for requirement in requirements {
            requirement.validate()?;
        }
        for pool in pools {
            pool.validate()?;
        }

        let compatible = compatible_pools(requirements, pools);
        for (requirement, candidates) in requirements.iter().zip(&compatible) {
            if candidates.is_empty() {
                trace.record(format!("requirement {} has no compatible pool", requirement.id));
            }
        }
        let pair_count: usize = compatible.iter().map(|c| c.len()).sum();
        trace.record(format!(
            "{} requirements, {} pools, {pair_count} compatible pairs",
            requirements.len(),
            pools.len()
        ));

        let floors = if enforce_equity {
            self.equity_floors(requirements, pools, &compatible, min_regional_pct, &mut trace)
        } else {
            Vec::new()
        };

        let plan = if pair_count == 0 {
            trace.record("nothing to allocate");
            Plan {
                fractions: compatible.iter().map(|_| Fractions::new()).collect(),
                status: SolveStatus::Optimal,
                equity_satisfied: true,
            }
        } else {
            let solved = run_strategies(&self.config.solver.strategies, &mut trace, |kind, trace| {
                match kind {
                    StrategyKind::BranchAndBound => self.branch_and_bound(
                        requirements,
                        pools,
                        &compatible,
                        weights,
                        &floors,
                        trace,
                    ),
                    StrategyKind::Greedy => {
                        let fractions = greedy_drain(requirements, pools, &compatible);
                        trace.record(format!(
                            "greedy: drained pools for {} requirements by priority",
                            requirements.len()
                        ));
                        StrategyOutcome::Solved(Plan {
                            fractions,
                            status: SolveStatus::GreedyFallback,
                            equity_satisfied: false,
                        })
                    }
                }
            });
            match solved {
                Some((_, plan)) => plan,
                None => Plan {
                    fractions: compatible
                        .iter()
                        .map(|c| SmallVec::from_elem(0.0, c.len()))
                        .collect(),
                    status: SolveStatus::Infeasible,
                    equity_satisfied: floors.is_empty(),
                },
            }
        };

        let result = self.build_result(requirements, pools, &compatible, weights, plan, trace);
        info!(
            event = "solve_end",
            solver = "multi_resource",
            status = %result.status,
            completed = result.requirements_completed,
            total_cost = result.total_cost,
            elapsed_ms = start.elapsed().as_millis() as u64,
        );
        Ok(result)
    }

    fn equity_floors(
        &self,
        requirements: &[ResourceRequirement],
        pools: &[ResourcePool],
        compatible: &[Compatible],
        pct: f64,
        trace: &mut SolverTrace,
    ) -> Vec<EquityFloor> {
        let regions: BTreeSet<&str> = pools.iter().filter_map(|p| p.region.as_deref()).collect();
        if regions.len() < 2 {
            debug!(event = "equity_skipped", reason = "single_region");
            trace.record("equity constraint skipped: fewer than two regions");
            return Vec::new();
        }
        if pct <= 0.0 {
            debug!(event = "equity_skipped", reason = "zero_share");
            trace.record("equity constraint skipped: minimum regional share is zero");
            return Vec::new();
        }

        let mut groups: BTreeMap<(&str, ResourceType), Vec<usize>> = BTreeMap::new();
        for (i, pool) in pools.iter().enumerate() {
            if let Some(region) = pool.region.as_deref() {
                groups.entry((region, pool.resource_type)).or_default().push(i);
            }
        }

        let floors: Vec<EquityFloor> = groups
            .into_iter()
            .filter_map(|((region, resource_type), members)| {
                let available: f64 = members.iter().map(|&p| pools[p].available_quantity).sum();
                let demand: f64 = requirements
                    .iter()
                    .zip(compatible)
                    .filter(|(_, c)| c.iter().any(|p| members.contains(p)))
                    .map(|(r, _)| r.quantity_needed)
                    .sum();
                let floor = pct * available.min(demand);
                (floor > 0.0).then(|| EquityFloor {
                    region: region.to_string(),
                    resource_type,
                    pools: members,
                    floor,
                })
            })
            .collect();

        trace.record(format!(
            "equity: {} regional pool groups must each draw at least {:.1}% of what they can serve",
            floors.len(),
            pct * 100.0
        ));
        floors
    }

    fn branch_and_bound(
        &self,
        requirements: &[ResourceRequirement],
        pools: &[ResourcePool],
        compatible: &[Compatible],
        weights: Option<&PriorityWeights>,
        floors: &[EquityFloor],
        trace: &mut SolverTrace,
    ) -> StrategyOutcome<Plan> {
        let modeled: Vec<usize> = (0..requirements.len())
            .filter(|&r| !compatible[r].is_empty())
            .collect();
        let variable_count: usize = modeled.iter().map(|&r| 1 + compatible[r].len()).sum();
        let max_variables = self.config.solver.max_variables;
        if variable_count > max_variables {
            return StrategyOutcome::Unavailable(format!(
                "{variable_count} variables exceed the limit of {max_variables}"
            ));
        }

        // Partial-allocation rewards sum to less than the smallest weight.
        let smallest_weight = modeled
            .iter()
            .map(|&r| requirement_weight(&requirements[r], weights))
            .filter(|w| *w > 0.0)
            .fold(f64::INFINITY, f64::min);
        let smallest_weight = if smallest_weight.is_finite() {
            smallest_weight
        } else {
            1.0
        };
        let tie_break = 0.5 * smallest_weight / (modeled.len() + 1) as f64;

        let mut model = MilpModel::new();
        let mut completion: Vec<Option<VarId>> = vec![None; requirements.len()];
        let mut draws: Vec<SmallVec<[VarId; 4]>> = vec![SmallVec::new(); requirements.len()];
        for &r in &modeled {
            let requirement = &requirements[r];
            completion[r] = Some(model.add_binary(
                format!("complete_{}", requirement.id),
                requirement_weight(requirement, weights),
            ));
            for &p in &compatible[r] {
                draws[r].push(model.add_continuous(
                    format!("{}@{}", requirement.id, pools[p].id),
                    0.0,
                    1.0,
                    tie_break,
                ));
            }
        }

        for (p, pool) in pools.iter().enumerate() {
            let terms: Vec<(VarId, f64)> = modeled
                .iter()
                .flat_map(|&r| {
                    compatible[r]
                        .iter()
                        .zip(&draws[r])
                        .filter(move |(q, _)| **q == p)
                        .map(move |(_, &f)| (f, requirements[r].quantity_needed))
                })
                .collect();
            if !terms.is_empty() {
                model.add_constraint(
                    format!("capacity_{}", pool.id),
                    terms,
                    Relation::LessEq,
                    pool.available_quantity,
                );
            }
        }
        for &r in &modeled {
            let id = &requirements[r].id;
            model.add_constraint(
                format!("share_{id}"),
                draws[r].iter().map(|&f| (f, 1.0)),
                Relation::LessEq,
                1.0,
            );
            if let Some(z) = completion[r] {
                model.add_constraint(
                    format!("complete_{id}"),
                    std::iter::once((z, 1.0)).chain(draws[r].iter().map(|&f| (f, -1.0))),
                    Relation::LessEq,
                    0.0,
                );
            }
        }
        for floor in floors {
            let terms: Vec<(VarId, f64)> = modeled
                .iter()
                .flat_map(|&r| {
                    compatible[r]
                        .iter()
                        .zip(&draws[r])
                        .filter(move |(q, _)| floor.pools.contains(*q))
                        .map(move |(_, &f)| (f, requirements[r].quantity_needed))
                })
                .collect();
            model.add_constraint(
                format!("equity_{}_{}", floor.region, floor.resource_type),
                terms,
                Relation::GreaterEq,
                floor.floor,
            );
        }

        let solution = BranchAndBound::from_config(&self.config.solver).solve(&model);
        match solution.status {
            MilpStatus::Optimal | MilpStatus::Feasible => {
                if !model.is_feasible(&solution.values, 1e-7) {
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
                let fractions = draws
                    .iter()
                    .map(|vars| {
                        vars.iter()
                            .map(|f| {
                                let x = solution.values[f.index()].clamp(0.0, 1.0);
                                if x < FRACTION_EPS {
                                    0.0
                                } else {
                                    x
                                }
                            })
                            .collect()
                    })
                    .collect();
                let status = if solution.status == MilpStatus::Optimal {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Feasible
                };
                StrategyOutcome::Solved(Plan {
                    fractions,
                    status,
                    equity_satisfied: true,
                })
            }
            MilpStatus::Infeasible => StrategyOutcome::Infeasible(if floors.is_empty() {
                "no feasible allocation".to_string()
            } else {
                "regional minimums cannot be met by the requirements".to_string()
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
        requirements: &[ResourceRequirement],
        pools: &[ResourcePool],
        compatible: &[Compatible],
        weights: Option<&PriorityWeights>,
        plan: Plan,
        mut trace: SolverTrace,
    ) -> MultiResourceResult {
        let config = &self.config.resources;
        let covered: Vec<f64> = plan
            .fractions
            .iter()
            .map(|f| f.iter().sum::<f64>().min(1.0))
            .collect();
        let statuses: Vec<AllocationStatus> = covered
            .iter()
            .map(|&c| AllocationStatus::from_fraction(c))
            .collect();

        let mut allocations = Vec::new();
        for (r, requirement) in requirements.iter().enumerate() {
            let mut drew = false;
            for (&p, &fraction) in compatible[r].iter().zip(&plan.fractions[r]) {
                if fraction <= 0.0 {
                    continue;
                }
                drew = true;
                let pool = &pools[p];
                let quantity = fraction * requirement.quantity_needed;
                allocations.push(MultiResourceAllocation {
                    requirement_id: requirement.id.clone(),
                    asset_id: requirement.asset_id.clone(),
                    pool_id: Some(pool.id.clone()),
                    resource_type: requirement.resource_type,
                    quantity_allocated: quantity,
                    utilization_pct: if pool.available_quantity > 0.0 {
                        quantity / pool.available_quantity * 100.0
                    } else {
                        0.0
                    },
                    cost_estimate: cost_estimate(requirement, pool, quantity, config),
                    status: statuses[r],
                });
            }
            if !drew {
                allocations.push(MultiResourceAllocation {
                    requirement_id: requirement.id.clone(),
                    asset_id: requirement.asset_id.clone(),
                    pool_id: None,
                    resource_type: requirement.resource_type,
                    quantity_allocated: 0.0,
                    utilization_pct: 0.0,
                    cost_estimate: 0.0,
                    status: AllocationStatus::Unfunded,
                });
            }
        }

        let present: BTreeSet<ResourceType> = pools
            .iter()
            .map(|p| p.resource_type)
            .chain(requirements.iter().map(|r| r.resource_type))
            .collect();
        let summaries: Vec<ResourceSummary> = present
            .into_iter()
            .map(|resource_type| {
                let (allocated, cost) = allocations
                    .iter()
                    .filter(|a| a.resource_type == resource_type)
                    .fold((0.0, 0.0), |(q, c), a| {
                        (q + a.quantity_allocated, c + a.cost_estimate)
                    });
                let available: f64 = pools
                    .iter()
                    .filter(|p| p.resource_type == resource_type)
                    .map(|p| p.available_quantity)
                    .sum();
                ResourceSummary {
                    resource_type,
                    allocated,
                    available,
                    utilization_pct: if available > 0.0 {
                        allocated / available * 100.0
                    } else {
                        0.0
                    },
                    cost,
                }
            })
            .collect();

        let mut by_asset: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (r, requirement) in requirements.iter().enumerate() {
            by_asset.entry(requirement.asset_id.as_str()).or_default().push(r);
        }
        let projects: Vec<ProjectSummary> = by_asset
            .into_iter()
            .map(|(asset_id, members)| {
                let completed = members
                    .iter()
                    .filter(|&&r| statuses[r] == AllocationStatus::Allocated)
                    .count();
                let funded_fraction =
                    members.iter().map(|&r| covered[r]).sum::<f64>() / members.len() as f64;
                let status = if completed == members.len() {
                    ProjectStatus::FullyFunded
                } else if funded_fraction < UNFUNDED_THRESHOLD {
                    ProjectStatus::Unfunded
                } else {
                    ProjectStatus::Partial
                };
                ProjectSummary {
                    asset_id: asset_id.to_string(),
                    requirement_count: members.len(),
                    requirements_completed: completed,
                    funded_fraction,
                    status,
                }
            })
            .collect();

        trace_dependencies(requirements, &statuses, &covered, &mut trace);

        let requirements_completed = statuses
            .iter()
            .filter(|s| **s == AllocationStatus::Allocated)
            .count();
        let objective: f64 = requirements
            .iter()
            .zip(&statuses)
            .filter(|(_, s)| **s == AllocationStatus::Allocated)
            .map(|(r, _)| requirement_weight(r, weights))
            .sum();
        let total_cost: f64 = allocations.iter().map(|a| a.cost_estimate).sum();
        trace.record(format!(
            "completed {requirements_completed} of {} requirements, estimated cost {total_cost:.2}",
            requirements.len()
        ));

        MultiResourceResult {
            status: plan.status,
            allocations,
            summaries,
            projects,
            requirements_completed,
            total_cost,
            objective,
            equity_satisfied: plan.equity_satisfied,
            trace,
        }
    }
}

fn validate_unique<'a>(ids: impl Iterator<Item = &'a str>, kind: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::new(id, "id", format!("duplicate {kind} id")).into());
        }
    }
    Ok(())
}

/// Records dependency ids that are unknown or not yet fully allocated.
///
/// Dependencies never constrain the allocation.
fn trace_dependencies(
    requirements: &[ResourceRequirement],
    statuses: &[AllocationStatus],
    covered: &[f64],
    trace: &mut SolverTrace,
) {
    let index: HashMap<&str, usize> = requirements
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();
    for (r, requirement) in requirements.iter().enumerate() {
        for dependency in &requirement.dependencies {
            match index.get(dependency.as_str()) {
                None => {
                    debug!(
                        event = "dependency_unknown",
                        requirement = %requirement.id,
                        dependency = %dependency,
                    );
                    trace.record(format!(
                        "requirement {} depends on unknown requirement {dependency}",
                        requirement.id
                    ));
                }
                Some(&d) if covered[r] > 0.0 && statuses[d] != AllocationStatus::Allocated => {
                    debug!(
                        event = "dependency_unmet",
                        requirement = %requirement.id,
                        dependency = %dependency,
                    );
                    trace.record(format!(
                        "requirement {} drawn before dependency {dependency} was fully allocated",
                        requirement.id
                    ));
                }
                Some(_) => {}
            }
        }
    }
}
