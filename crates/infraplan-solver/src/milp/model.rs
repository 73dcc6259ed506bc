//! Mixed-integer linear model representation.

use std::fmt;

/// Index of a variable within a [`MilpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::LessEq => write!(f, "<="),
            Relation::GreaterEq => write!(f, ">="),
            Relation::Equal => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub integer: bool,
    /// Objective coefficient (maximized).
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub relation: Relation,
    pub rhs: f64,
}

impl Constraint {
    /// Left-hand side value under `values`.
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, a)| a * values[v.0]).sum()
    }
}

/// A maximization problem over bounded variables.
///
/// # Example
///
/// ```
/// use infraplan_solver::milp::{MilpModel, Relation};
///
/// let mut model = MilpModel::new();
/// let x = model.add_binary("x", 3.0);
/// let y = model.add_binary("y", 2.0);
/// model.add_constraint("cap", [(x, 4.0), (y, 3.0)], Relation::LessEq, 5.0);
///
/// assert_eq!(model.num_variables(), 2);
/// assert_eq!(model.objective_value(&[1.0, 0.0]), 3.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MilpModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a 0/1 variable.
    pub fn add_binary(&mut self, name: impl Into<String>, objective: f64) -> VarId {
        self.push(Variable {
            name: name.into(),
            lower: 0.0,
            upper: 1.0,
            integer: true,
            objective,
        })
    }

    /// Adds a general integer variable in `[lower, upper]`.
    pub fn add_integer(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        objective: f64,
    ) -> VarId {
        self.push(Variable {
            name: name.into(),
            lower,
            upper,
            integer: true,
            objective,
        })
    }

    /// Adds a continuous variable in `[lower, upper]`.
    pub fn add_continuous(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        objective: f64,
    ) -> VarId {
        self.push(Variable {
            name: name.into(),
            lower,
            upper,
            integer: false,
            objective,
        })
    }

    fn push(&mut self, variable: Variable) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(variable);
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms: terms.into_iter().collect(),
            relation,
            rhs,
        });
    }

    #[inline]
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(v, x)| v.objective * x)
            .sum()
    }

    /// Returns true if `values` satisfies bounds, integrality and every
    /// constraint within `tolerance` (relative to the magnitude of each rhs).
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let bounds_ok = self.variables.iter().zip(values).all(|(v, &x)| {
            x >= v.lower - tolerance
                && x <= v.upper + tolerance
                && (!v.integer || (x - x.round()).abs() <= tolerance)
        });
        if !bounds_ok {
            return false;
        }
        self.constraints.iter().all(|c| {
            let lhs = c.activity(values);
            let slack = tolerance * c.rhs.abs().max(1.0);
            match c.relation {
                Relation::LessEq => lhs <= c.rhs + slack,
                Relation::GreaterEq => lhs >= c.rhs - slack,
                Relation::Equal => (lhs - c.rhs).abs() <= slack,
            }
        })
    }
}
