//! Dense two-phase primal simplex for LP relaxations.
//!
//! Variables are shifted by their lower bound (`x = lower + y`, `y >= 0`)
//! and finite upper bounds become explicit rows. Rows are scaled by their
//! largest coefficient before the tableau is built. Pivoting follows
//! Bland's rule, so the method terminates on degenerate problems.

use super::model::{MilpModel, Relation};

/// Smallest magnitude accepted as a pivot element.
const PIVOT_EPS: f64 = 1e-9;

/// Reduced cost above which a column still improves the objective.
const OPTIMALITY_EPS: f64 = 1e-9;

/// Residual infeasibility tolerated at the end of phase one.
const FEASIBILITY_EPS: f64 = 1e-7;

/// Outcome of one relaxation solve.
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    /// Pivot budget exhausted before reaching an optimal basis.
    IterationLimit,
}

struct Row {
    coefs: Vec<f64>,
    relation: Relation,
    rhs: f64,
}

/// Solves the continuous relaxation of `model` with bounds overridden by
/// `lower` and `upper`.
///
/// Lower bounds must be finite.
pub fn solve_relaxation(model: &MilpModel, lower: &[f64], upper: &[f64]) -> LpOutcome {
    let n = model.num_variables();
    debug_assert_eq!(lower.len(), n);
    debug_assert_eq!(upper.len(), n);

    if lower
        .iter()
        .zip(upper)
        .any(|(lo, hi)| *lo > *hi + FEASIBILITY_EPS)
    {
        return LpOutcome::Infeasible;
    }

    let mut rows = Vec::with_capacity(model.num_constraints() + n);
    for constraint in model.constraints() {
        let mut coefs = vec![0.0; n];
        let mut shift = 0.0;
        for &(var, a) in &constraint.terms {
            coefs[var.index()] += a;
            shift += a * lower[var.index()];
        }
        rows.push(Row {
            coefs,
            relation: constraint.relation,
            rhs: constraint.rhs - shift,
        });
    }
    for j in 0..n {
        if upper[j].is_finite() {
            let mut coefs = vec![0.0; n];
            coefs[j] = 1.0;
            rows.push(Row {
                coefs,
                relation: Relation::LessEq,
                rhs: (upper[j] - lower[j]).max(0.0),
            });
        }
    }

    let mut kept = Vec::with_capacity(rows.len());
    for mut row in rows {
        let scale = row.coefs.iter().fold(0.0_f64, |m, a| m.max(a.abs()));
        if scale < PIVOT_EPS {
            let tol = FEASIBILITY_EPS * row.rhs.abs().max(1.0);
            let satisfied = match row.relation {
                Relation::LessEq => row.rhs >= -tol,
                Relation::GreaterEq => row.rhs <= tol,
                Relation::Equal => row.rhs.abs() <= tol,
            };
            if !satisfied {
                return LpOutcome::Infeasible;
            }
            continue;
        }
        for a in &mut row.coefs {
            *a /= scale;
        }
        row.rhs /= scale;
        if row.rhs < 0.0 {
            for a in &mut row.coefs {
                *a = -*a;
            }
            row.rhs = -row.rhs;
            row.relation = match row.relation {
                Relation::LessEq => Relation::GreaterEq,
                Relation::GreaterEq => Relation::LessEq,
                Relation::Equal => Relation::Equal,
            };
        }
        kept.push(row);
    }

    let costs: Vec<f64> = model.variables().iter().map(|v| v.objective).collect();
    let mut tableau = Tableau::build(&kept, n);
    match tableau.run_phase_one() {
        PhaseResult::Optimal => {}
        PhaseResult::Unbounded => return LpOutcome::Infeasible,
        PhaseResult::IterationLimit => return LpOutcome::IterationLimit,
    }
    if tableau.phase_one_residual() > FEASIBILITY_EPS {
        return LpOutcome::Infeasible;
    }
    tableau.drive_out_artificials();
    match tableau.run_phase_two(&costs) {
        PhaseResult::Optimal => {}
        PhaseResult::Unbounded => return LpOutcome::Unbounded,
        PhaseResult::IterationLimit => return LpOutcome::IterationLimit,
    }

    let shifted = tableau.structural_values();
    let values: Vec<f64> = shifted
        .iter()
        .enumerate()
        .map(|(j, y)| (lower[j] + y).min(upper[j]))
        .collect();
    let objective = model.objective_value(&values);
    LpOutcome::Optimal { values, objective }
}

enum PhaseResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

struct Tableau {
    /// Row-major, `width` entries per row, rhs last.
    cells: Vec<f64>,
    /// Reduced costs, objective value (negated) last.
    objective: Vec<f64>,
    basis: Vec<usize>,
    rows: usize,
    width: usize,
    structural: usize,
    artificial_start: usize,
    max_iterations: usize,
}

impl Tableau {
    fn build(rows: &[Row], structural: usize) -> Self {
        let slacks = rows
            .iter()
            .filter(|r| r.relation != Relation::Equal)
            .count();
        let artificials = rows
            .iter()
            .filter(|r| r.relation != Relation::LessEq)
            .count();
        let artificial_start = structural + slacks;
        let columns = artificial_start + artificials;
        let width = columns + 1;
        let m = rows.len();

        let mut cells = vec![0.0; m * width];
        let mut basis = Vec::with_capacity(m);
        let mut next_slack = structural;
        let mut next_artificial = artificial_start;
        for (i, row) in rows.iter().enumerate() {
            let line = &mut cells[i * width..(i + 1) * width];
            line[..structural].copy_from_slice(&row.coefs);
            line[columns] = row.rhs;
            match row.relation {
                Relation::LessEq => {
                    line[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                Relation::GreaterEq => {
                    line[next_slack] = -1.0;
                    next_slack += 1;
                    line[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                Relation::Equal => {
                    line[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
        }

        Self {
            cells,
            objective: vec![0.0; width],
            basis,
            rows: m,
            width,
            structural,
            artificial_start,
            max_iterations: 50 * (m + columns) + 1_000,
        }
    }

    #[inline]
    fn rhs(&self, i: usize) -> f64 {
        self.cells[i * self.width + self.width - 1]
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.width + j]
    }

    fn run_phase_one(&mut self) -> PhaseResult {
        // maximize -sum(artificials)
        self.objective.iter_mut().for_each(|c| *c = 0.0);
        for i in 0..self.rows {
            if self.basis[i] >= self.artificial_start {
                for j in 0..self.width {
                    if j < self.artificial_start || j == self.width - 1 {
                        let a = self.at(i, j);
                        self.objective[j] += a;
                    }
                }
            }
        }
        let limit = self.width - 1;
        self.iterate(limit)
    }

    /// Sum of artificial values left after phase one.
    fn phase_one_residual(&self) -> f64 {
        self.objective[self.width - 1]
    }

    fn drive_out_artificials(&mut self) {
        for i in 0..self.rows {
            if self.basis[i] < self.artificial_start {
                continue;
            }
            let column = (0..self.artificial_start).find(|&j| self.at(i, j).abs() > PIVOT_EPS);
            if let Some(j) = column {
                self.pivot(i, j);
            }
            // otherwise the row is redundant and its artificial stays at zero
        }
    }

    fn run_phase_two(&mut self, costs: &[f64]) -> PhaseResult {
        let cost = |j: usize| if j < self.structural { costs[j] } else { 0.0 };
        let mut objective = vec![0.0; self.width];
        for (j, slot) in objective.iter_mut().enumerate().take(self.width - 1) {
            *slot = cost(j);
        }
        for i in 0..self.rows {
            let cb = cost(self.basis[i]);
            if cb == 0.0 {
                continue;
            }
            for (j, slot) in objective.iter_mut().enumerate() {
                *slot -= cb * self.at(i, j);
            }
        }
        self.objective = objective;
        let limit = self.artificial_start;
        self.iterate(limit)
    }

    /// Pivots until no column below `column_limit` has a positive reduced cost.
    fn iterate(&mut self, column_limit: usize) -> PhaseResult {
        for _ in 0..self.max_iterations {
            let Some(entering) = (0..column_limit).find(|&j| self.objective[j] > OPTIMALITY_EPS)
            else {
                return PhaseResult::Optimal;
            };

            let mut leaving: Option<(usize, f64)> = None;
            for i in 0..self.rows {
                let a = self.at(i, entering);
                if a <= PIVOT_EPS {
                    continue;
                }
                let ratio = self.rhs(i) / a;
                let better = match leaving {
                    None => true,
                    Some((r, best)) => {
                        ratio < best - 1e-12
                            || ((ratio - best).abs() <= 1e-12 && self.basis[i] < self.basis[r])
                    }
                };
                if better {
                    leaving = Some((i, ratio));
                }
            }

            match leaving {
                Some((row, _)) => self.pivot(row, entering),
                None => return PhaseResult::Unbounded,
            }
        }
        PhaseResult::IterationLimit
    }

    fn pivot(&mut self, row: usize, column: usize) {
        let width = self.width;
        let start = row * width;
        let p = self.cells[start + column];
        for j in 0..width {
            self.cells[start + j] /= p;
        }
        self.cells[start + column] = 1.0;
        let pivot_row: Vec<f64> = self.cells[start..start + width].to_vec();

        for i in 0..self.rows {
            if i == row {
                continue;
            }
            let factor = self.cells[i * width + column];
            if factor == 0.0 {
                continue;
            }
            let line = &mut self.cells[i * width..(i + 1) * width];
            for (cell, a) in line.iter_mut().zip(&pivot_row) {
                *cell -= factor * a;
            }
            line[column] = 0.0;
            let rhs = &mut line[width - 1];
            if *rhs < 0.0 && *rhs > -FEASIBILITY_EPS {
                *rhs = 0.0;
            }
        }

        let factor = self.objective[column];
        if factor != 0.0 {
            for (cell, a) in self.objective.iter_mut().zip(&pivot_row) {
                *cell -= factor * a;
            }
            self.objective[column] = 0.0;
        }
        self.basis[row] = column;
    }

    fn structural_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.structural];
        for i in 0..self.rows {
            let j = self.basis[i];
            if j < self.structural {
                values[j] = self.rhs(i).max(0.0);
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(model: &MilpModel) -> (Vec<f64>, Vec<f64>) {
        model
            .variables()
            .iter()
            .map(|v| (v.lower, v.upper))
            .unzip()
    }

    fn optimal(outcome: LpOutcome) -> (Vec<f64>, f64) {
        match outcome {
            LpOutcome::Optimal { values, objective } => (values, objective),
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_knapsack_relaxation() {
        let mut model = MilpModel::new();
        let x = model.add_binary("x", 6.0);
        let y = model.add_binary("y", 5.0);
        let z = model.add_binary("z", 4.0);
        model.add_constraint("budget", [(x, 3.0), (y, 2.0), (z, 2.0)], Relation::LessEq, 4.0);

        let (lo, hi) = bounds(&model);
        let (values, objective) = optimal(solve_relaxation(&model, &lo, &hi));
        // ratios 2.0, 2.5, 2.0: y fully, then 2 units split between x and z
        assert!((objective - 9.0).abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_greater_equal_and_equality_rows() {
        let mut model = MilpModel::new();
        let x = model.add_continuous("x", 0.0, 10.0, 1.0);
        let y = model.add_continuous("y", 0.0, 10.0, 2.0);
        model.add_constraint("sum", [(x, 1.0), (y, 1.0)], Relation::Equal, 8.0);
        model.add_constraint("floor_x", [(x, 1.0)], Relation::GreaterEq, 3.0);

        let (lo, hi) = bounds(&model);
        let (values, objective) = optimal(solve_relaxation(&model, &lo, &hi));
        assert!((values[0] - 3.0).abs() < 1e-6);
        assert!((values[1] - 5.0).abs() < 1e-6);
        assert!((objective - 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_shifted_lower_bounds() {
        let mut model = MilpModel::new();
        let x = model.add_continuous("x", 2.0, 5.0, -1.0);
        model.add_constraint("cap", [(x, 1.0)], Relation::LessEq, 4.0);

        let (lo, hi) = bounds(&model);
        let (values, _) = optimal(solve_relaxation(&model, &lo, &hi));
        assert!((values[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let mut model = MilpModel::new();
        let x = model.add_continuous("x", 0.0, 1.0, 1.0);
        model.add_constraint("impossible", [(x, 1.0)], Relation::GreaterEq, 2.0);

        let (lo, hi) = bounds(&model);
        assert_eq!(solve_relaxation(&model, &lo, &hi), LpOutcome::Infeasible);
    }

    #[test]
    fn test_crossed_bounds_are_infeasible() {
        let mut model = MilpModel::new();
        model.add_binary("x", 1.0);
        assert_eq!(
            solve_relaxation(&model, &[1.0], &[0.0]),
            LpOutcome::Infeasible
        );
    }

    #[test]
    fn test_unbounded() {
        let mut model = MilpModel::new();
        let x = model.add_continuous("x", 0.0, f64::INFINITY, 1.0);
        model.add_constraint("floor", [(x, 1.0)], Relation::GreaterEq, 1.0);

        let (lo, hi) = bounds(&model);
        assert_eq!(solve_relaxation(&model, &lo, &hi), LpOutcome::Unbounded);
    }

    #[test]
    fn test_redundant_equalities() {
        let mut model = MilpModel::new();
        let x = model.add_continuous("x", 0.0, 4.0, 1.0);
        let y = model.add_continuous("y", 0.0, 4.0, 1.0);
        model.add_constraint("a", [(x, 1.0), (y, 1.0)], Relation::Equal, 3.0);
        model.add_constraint("b", [(x, 2.0), (y, 2.0)], Relation::Equal, 6.0);

        let (lo, hi) = bounds(&model);
        let (_, objective) = optimal(solve_relaxation(&model, &lo, &hi));
        assert!((objective - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_coefficients_scaled() {
        let mut model = MilpModel::new();
        let x = model.add_binary("x", 0.9);
        let y = model.add_binary("y", 0.5);
        model.add_constraint(
            "budget",
            [(x, 2_500_000.0), (y, 1_000_000.0)],
            Relation::LessEq,
            3_000_000.0,
        );

        let (lo, hi) = bounds(&model);
        let (values, objective) = optimal(solve_relaxation(&model, &lo, &hi));
        // y has the better ratio, x takes the remaining 2M of 2.5M
        assert!((values[1] - 1.0).abs() < 1e-6);
        assert!((values[0] - 0.8).abs() < 1e-6);
        assert!((objective - 1.22).abs() < 1e-6);
    }
}
