//! Mixed-integer linear programming backend.
//!
//! A small, dependency-free MILP stack: [`MilpModel`] describes a
//! maximization problem, [`solve_relaxation`] solves its LP relaxation with a
//! dense two-phase simplex, and [`BranchAndBound`] searches for integer
//! solutions under time and node limits.

mod branch_bound;
mod model;
mod simplex;

pub use branch_bound::{BranchAndBound, MilpSolution, MilpStatus, INTEGRALITY_TOLERANCE};
pub use model::{Constraint, MilpModel, Relation, VarId, Variable};
pub use simplex::{solve_relaxation, LpOutcome};
