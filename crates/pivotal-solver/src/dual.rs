use crate::method::Strategy;
use crate::problem::{Constraint, Direction, Problem, Relation};
use crate::solution::{Solution, SolveError};
use crate::Solver;

/// The dual of a primal problem, with enough bookkeeping to map results back.
#[derive(Debug, Clone)]
pub struct DualProblem {
    problem: Problem,
    primal_direction: Direction,
    /// Primal constraint behind each dual variable, and whether its row was negated
    origins: Vec<(usize, bool)>,
    num_primal_constraints: usize,
}

/// Build the dual of `primal`.
///
/// The primal is first written as `max c'x, A'x <= b'`: minimize objectives are negated,
/// `>=` rows negated, equalities split into two opposite `<=` rows. The dual is then
/// `min b'y, A'^T y >= c'`.
pub fn dual_problem(primal: &Problem) -> Result<DualProblem, SolveError> {
    let mut rows: Vec<(Vec<f64>, f64)> = Vec::new();
    let mut origins = Vec::new();

    for (i, c) in primal.constraints().iter().enumerate() {
        let negated = || -> (Vec<f64>, f64) { (c.coefficients.iter().map(|a| -a).collect(), -c.rhs) };
        match c.relation {
            Relation::Le => {
                rows.push((c.coefficients.clone(), c.rhs));
                origins.push((i, false));
            }
            Relation::Ge => {
                rows.push(negated());
                origins.push((i, true));
            }
            Relation::Eq => {
                rows.push((c.coefficients.clone(), c.rhs));
                rows.push(negated());
                origins.extend([(i, false), (i, true)]);
            }
        }
    }

    if rows.is_empty() {
        return Err(SolveError::InvalidProblem("a problem without constraints has no dual".to_string()));
    }

    let objective: Vec<f64> = rows.iter().map(|(_, b)| *b).collect();
    let constraints = primal
        .normalized_objective()
        .into_iter()
        .enumerate()
        .map(|(j, cost)| {
            let column = rows.iter().map(|(a, _)| a[j]).collect();
            Constraint::new(column, Relation::Ge, cost)
        })
        .collect();

    let problem = Problem::minimize(objective, constraints)?.with_variable_prefix("y");

    Ok(DualProblem {
        problem,
        primal_direction: primal.direction(),
        origins,
        num_primal_constraints: primal.num_constraints(),
    })
}

impl DualProblem {
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Primal constraint behind dual variable `index`.
    pub fn origin(&self, index: usize) -> usize {
        self.origins[index].0
    }

    /// Fold optimal dual values back into one shadow price per primal constraint, in the
    /// primal's direction and row orientation.
    ///
    /// Negated rows contribute with a flipped sign, so the two halves of a split equality
    /// combine into a single free price.
    pub fn primal_prices(&self, dual_values: &[f64]) -> Vec<f64> {
        let mut prices = vec![0.0; self.num_primal_constraints];
        for (&(origin, negated), &y) in self.origins.iter().zip(dual_values) {
            prices[origin] += if negated { -y } else { y };
        }
        if self.primal_direction == Direction::Minimize {
            for p in &mut prices {
                *p = -*p;
            }
        }
        prices
    }
}

impl Solver {
    /// Solve the dual of `primal` with the Big-M method.
    ///
    /// The returned objective is expressed in the primal's sense, so at optimality it equals
    /// the primal objective.
    pub fn solve_dual(&self, primal: &Problem) -> Result<Solution, SolveError> {
        let dual = dual_problem(primal)?;
        log::info!(
            "solving dual with {} variables and {} constraints",
            dual.problem().num_variables(),
            dual.problem().num_constraints()
        );

        let mut solution = self.solve_relaxation(dual.problem(), Strategy::BigM)?;
        if dual.primal_direction == Direction::Minimize {
            solution.objective_value = -solution.objective_value;
        }
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_of_le_maximization() {
        let primal = Problem::maximize(
            vec![3.0, 5.0],
            vec![
                Constraint::new(vec![1.0, 0.0], Relation::Le, 4.0),
                Constraint::new(vec![0.0, 2.0], Relation::Le, 12.0),
                Constraint::new(vec![3.0, 2.0], Relation::Le, 18.0),
            ],
        )
        .unwrap();
        let dual = dual_problem(&primal).unwrap();

        assert_eq!(dual.problem().direction(), Direction::Minimize);
        assert_eq!(dual.problem().objective(), &[4.0, 12.0, 18.0]);
        assert_eq!(dual.problem().constraints()[0], Constraint::new(vec![1.0, 0.0, 3.0], Relation::Ge, 3.0));
        assert_eq!(dual.problem().constraints()[1], Constraint::new(vec![0.0, 2.0, 2.0], Relation::Ge, 5.0));
        assert_eq!((0..3).map(|k| dual.origin(k)).collect::<Vec<_>>(), vec![0, 1, 2]);

        let solution = Solver::new().solve_dual(&primal).unwrap();
        assert!((solution.objective_value - 36.0).abs() < 1e-6, "W = {}", solution.objective_value);
        assert_eq!(solution.variables, vec!["y1", "y2", "y3"]);
        assert!(solution.values[0].abs() < 1e-6);
        assert!((solution.values[1] - 1.5).abs() < 1e-6);
        assert!((solution.values[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dual_splits_equalities() {
        let primal = Problem::minimize(
            vec![2.0, 3.0, 1.0],
            vec![
                Constraint::new(vec![1.0, 1.0, 1.0], Relation::Ge, 6.0),
                Constraint::new(vec![1.0, 0.0, -1.0], Relation::Eq, 1.0),
                Constraint::new(vec![0.0, 1.0, 0.0], Relation::Le, 4.0),
            ],
        )
        .unwrap();
        let dual = dual_problem(&primal).unwrap();

        assert_eq!(dual.problem().num_variables(), 4);
        assert_eq!((0..4).map(|k| dual.origin(k)).collect::<Vec<_>>(), vec![0, 1, 1, 2]);
        assert_eq!(dual.problem().objective(), &[-6.0, 1.0, -1.0, 4.0]);
        assert_eq!(dual.problem().constraints()[0], Constraint::new(vec![-1.0, 1.0, -1.0, 0.0], Relation::Ge, -2.0));

        let solution = Solver::new().solve_dual(&primal).unwrap();
        assert!((solution.objective_value - 9.5).abs() < 1e-6, "W = {}", solution.objective_value);

        // Folded back, the dual optimum reproduces the primal's own shadow prices
        let prices = dual.primal_prices(&solution.values);
        let primal_duals = Solver::new()
            .solve_relaxation(&primal, Strategy::TwoPhase)
            .unwrap()
            .dual_values
            .unwrap();
        assert_eq!(prices.len(), 3);
        for (i, (p, q)) in prices.iter().zip(&primal_duals).enumerate() {
            assert!((p - q).abs() < 1e-6, "constraint {}: {} vs {}", i + 1, p, q);
        }
    }

    #[test]
    fn test_dual_needs_constraints() {
        let primal = Problem::maximize(vec![1.0], vec![]).unwrap();
        assert!(matches!(dual_problem(&primal), Err(SolveError::InvalidProblem(_))));
    }
}
