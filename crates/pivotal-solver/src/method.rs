use std::str::FromStr;

use thiserror::Error;

use crate::problem::{Constraint, Direction, Problem};
use crate::simplex::{IterationRecord, Phase, SimplexStatus};
use crate::solution::{Solution, SolutionStatus, SolveError};
use crate::tableau::{self, Basis, ColumnKind, Layout, StandardForm, Tableau, TableauMode};
use crate::Solver;

/// Factor between the largest problem coefficient and the Big-M penalty.
const PENALTY_SCALE: f64 = 1e3;

/// Solution method for a single LP relaxation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Pick a method from the problem's shape
    #[default]
    Auto,
    /// Plain simplex; only for problems whose rows are all `<=` after rows with a negative
    /// right-hand side are flipped.
    ///
    /// `x1 >= -1` becomes `-x1 <= 1` and is accepted; `x1 >= 1` and any equality need an
    /// artificial column and are rejected with [`SolveError::InvalidMethod`].
    Standard,
    TwoPhase,
    BigM,
    /// Vertex enumeration; only for two variables
    Graphical,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown method: {0}")]
pub struct UnknownStrategy(pub String);

impl Strategy {
    /// The method `Auto` stands for on `problem`.
    pub fn for_problem(problem: &Problem) -> Strategy {
        if problem.num_variables() == 2 {
            Strategy::Graphical
        } else if problem.needs_artificial() {
            Strategy::TwoPhase
        } else {
            Strategy::Standard
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::Standard => "standard",
            Strategy::TwoPhase => "two_phase",
            Strategy::BigM => "big_m",
            Strategy::Graphical => "graphical",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(Strategy::Auto),
            "standard" | "simplex" => Ok(Strategy::Standard),
            "two_phase" => Ok(Strategy::TwoPhase),
            "big_m" => Ok(Strategy::BigM),
            "graphical" => Ok(Strategy::Graphical),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl Solver {
    /// Solve the continuous relaxation of `problem` with `strategy`.
    pub fn solve_relaxation(&self, problem: &Problem, strategy: Strategy) -> Result<Solution, SolveError> {
        match strategy {
            Strategy::Auto => {
                let chosen = Strategy::for_problem(problem);
                log::info!("auto strategy resolved to {}", chosen);
                self.solve_relaxation(problem, chosen)
            }
            Strategy::Standard => self.standard(problem),
            Strategy::TwoPhase => self.two_phase(problem),
            Strategy::BigM => self.big_m(problem),
            Strategy::Graphical => self.graphical(problem),
        }
    }

    fn standard(&self, problem: &Problem) -> Result<Solution, SolveError> {
        if let Some((i, c)) = problem
            .constraints()
            .iter()
            .enumerate()
            .find(|(_, c)| c.needs_artificial())
        {
            return Err(SolveError::InvalidMethod {
                method: Strategy::Standard,
                reason: format!("constraint {} ({} {}) needs an artificial variable", i + 1, c.relation, c.rhs),
            });
        }

        let StandardForm { tableau, basis, layout } = tableau::build(problem, TableauMode::Plain)?;
        let run = self.engine().iterate(tableau, basis, Phase::Simplex);
        self.check_status(run.status)?;

        Ok(self.extract_solution(problem, &layout, &run.tableau, &run.basis, Strategy::Standard, run.history))
    }

    fn two_phase(&self, problem: &Problem) -> Result<Solution, SolveError> {
        if !problem.needs_artificial() {
            log::debug!("no artificial variables needed, using standard simplex");
            return self.standard(problem);
        }

        let tol = self.options().tolerances;
        let StandardForm { mut tableau, basis, layout } = tableau::build(problem, TableauMode::Plain)?;
        let original_objective = tableau.objective_row().to_vec();

        // Phase 1 objective: maximize -sum(artificials), reduced against the artificial basis
        let mut phase1 = vec![0.0; tableau.num_cols()];
        for col in layout.artificial_columns() {
            phase1[col] = 1.0;
        }
        tableau.set_objective_row(phase1);
        for (i, row) in layout.rows.iter().enumerate() {
            if row.artificial.is_some() {
                tableau.reduce_objective(i + 1, 1.0);
            }
        }

        let run = self.engine().iterate(tableau, basis, Phase::PhaseOne);
        match run.status {
            SimplexStatus::Optimal => {}
            // The artificial sum is bounded below by zero
            SimplexStatus::Unbounded => {
                return Err(SolveError::Infeasible("phase 1 did not converge".to_string()));
            }
            SimplexStatus::CycleLimit => return Err(SolveError::CycleLimit(self.options().max_iterations)),
        }

        let residue = run.tableau.rhs(0).abs();
        if residue > tol.feasibility {
            log::info!("phase 1 left an artificial sum of {:.3e}", residue);
            return Err(SolveError::Infeasible(format!(
                "phase 1 ended with artificial sum {:.6}",
                residue
            )));
        }

        let mut history = run.history;
        let (mut tableau, mut basis) = (run.tableau, run.basis);
        self.drive_out_artificials(&layout, &mut tableau, &mut basis, &mut history);

        // Restore the true objective and make it consistent with the current basis
        tableau.set_objective_row(original_objective);
        for i in 0..basis.len() {
            let factor = tableau.get(0, basis.get(i));
            if factor != 0.0 {
                tableau.reduce_objective(i + 1, factor);
            }
        }

        let run = self
            .engine()
            .iterate_with_limit(tableau, basis, Phase::PhaseTwo, layout.artificial_start);
        self.check_status(run.status)?;
        history.extend(run.history);

        Ok(self.extract_solution(problem, &layout, &run.tableau, &run.basis, Strategy::TwoPhase, history))
    }

    /// Pivot zero-level artificial columns out of the basis after Phase 1.
    ///
    /// Rows without a usable non-artificial entry are redundant and keep their artificial.
    fn drive_out_artificials(
        &self,
        layout: &Layout,
        tableau: &mut Tableau,
        basis: &mut Basis,
        history: &mut Vec<IterationRecord>,
    ) {
        let tol = self.options().tolerances.pivot;
        let mut step = history.last().map_or(0, |r| r.step);
        let mut terminal = None;

        for i in 0..basis.len() {
            if !layout.is_artificial(basis.get(i)) {
                continue;
            }
            let row = i + 1;
            let Some(col) = (0..layout.artificial_start).find(|&j| tableau.get(row, j).abs() > tol) else {
                log::debug!("constraint row {} is redundant", row);
                continue;
            };

            if terminal.is_none() {
                terminal = history.pop();
            }
            history.push(IterationRecord {
                phase: Phase::PhaseOne,
                step,
                tableau: tableau.clone(),
                basis: basis.clone(),
                pivot: Some(crate::simplex::Pivot { row, col }),
            });
            log::debug!("driving artificial out of row {} via column {}", row, col);
            tableau.pivot(row, col);
            basis.set(i, col);
            step += 1;
        }

        if terminal.is_some() {
            history.push(IterationRecord {
                phase: Phase::PhaseOne,
                step,
                tableau: tableau.clone(),
                basis: basis.clone(),
                pivot: None,
            });
        }
    }

    /// Penalty on artificial columns: the configured `big_m`, raised when the problem's
    /// costs or right-hand sides would outweigh it.
    pub(crate) fn penalty(&self, problem: &Problem) -> f64 {
        let max_cost = problem.objective().iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        let max_rhs = problem.constraints().iter().fold(0.0_f64, |m, c| m.max(c.rhs.abs()));
        self.options().big_m.max(PENALTY_SCALE * (1.0 + max_cost + max_rhs))
    }

    fn big_m(&self, problem: &Problem) -> Result<Solution, SolveError> {
        let tol = self.options().tolerances;
        let m = self.penalty(problem);
        log::debug!("big-M penalty {:.3e}", m);
        let mode = TableauMode::BigM(m);
        let StandardForm { tableau, basis, layout } = tableau::build(problem, mode)?;

        let run = self.engine().iterate(tableau, basis, Phase::BigM);
        self.check_status(run.status)?;

        for (i, col) in run.basis.iter().enumerate() {
            let level = run.tableau.rhs(i + 1);
            if layout.is_artificial(col) && level.abs() > tol.feasibility {
                log::info!("artificial {} stayed basic at {:.3e}", run.tableau.columns()[col].label, level);
                return Err(SolveError::Infeasible(format!(
                    "artificial variable {} remains at {:.6}",
                    run.tableau.columns()[col].label,
                    level
                )));
            }
        }

        Ok(self.extract_solution(problem, &layout, &run.tableau, &run.basis, Strategy::BigM, run.history))
    }

    fn check_status(&self, status: SimplexStatus) -> Result<(), SolveError> {
        match status {
            SimplexStatus::Optimal => Ok(()),
            SimplexStatus::Unbounded => Err(SolveError::Unbounded),
            SimplexStatus::CycleLimit => Err(SolveError::CycleLimit(self.options().max_iterations)),
        }
    }

    fn extract_solution(
        &self,
        problem: &Problem,
        layout: &Layout,
        tableau: &Tableau,
        basis: &Basis,
        method: Strategy,
        iterations: Vec<IterationRecord>,
    ) -> Solution {
        let tol = self.options().tolerances;
        let n_vars = problem.num_variables();

        let mut values = vec![0.0; n_vars];
        for (i, col) in basis.iter().enumerate() {
            if col < n_vars {
                values[col] = clean(tableau.rhs(i + 1), tol.feasibility);
            }
        }

        let objective_value = problem.evaluate(&values);
        let dual_values = dual_values(problem, layout, tableau, tol.feasibility);

        // A zero reduced cost on a non-basic column means another vertex is just as good
        let row0 = tableau.objective_row();
        let alternate_optima = (0..layout.artificial_start)
            .any(|j| !basis.contains(j) && row0[j].abs() <= tol.degeneracy);

        log::info!("{} finished with Z = {}", method, objective_value);

        Solution {
            status: SolutionStatus::Optimal,
            method,
            variables: problem.variable_names(),
            values,
            objective_value,
            dual_values: Some(dual_values),
            iterations,
            alternate_optima,
        }
    }
}

/// Shadow prices dZ/db_i in the caller's direction and row orientation.
fn dual_values(problem: &Problem, layout: &Layout, tableau: &Tableau, tolerance: f64) -> Vec<f64> {
    let row0 = tableau.objective_row();

    layout
        .rows
        .iter()
        .map(|row| {
            let normalized = match (row.auxiliary, row.artificial) {
                (Some(col), _) => match tableau.column_kind(col) {
                    ColumnKind::Surplus => -row0[col],
                    _ => row0[col],
                },
                (None, Some(col)) => match layout.mode {
                    TableauMode::BigM(m) => row0[col] - m,
                    TableauMode::Plain => row0[col],
                },
                (None, None) => 0.0,
            };
            let oriented = if row.flipped { -normalized } else { normalized };
            let value = match problem.direction() {
                Direction::Maximize => oriented,
                Direction::Minimize => -oriented,
            };
            clean(value, tolerance)
        })
        .collect()
}

/// Snap values within `tolerance` of zero to exactly zero.
pub(crate) fn clean(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance { 0.0 } else { value }
}

/// Whether `point` satisfies `constraint` within `tolerance`, scaled by the right-hand side.
pub(crate) fn satisfies(constraint: &Constraint, point: &[f64], tolerance: f64) -> bool {
    let lhs = constraint.activity(point);
    let slack = tolerance * (1.0 + constraint.rhs.abs());
    match constraint.relation {
        crate::problem::Relation::Le => lhs <= constraint.rhs + slack,
        crate::problem::Relation::Ge => lhs >= constraint.rhs - slack,
        crate::problem::Relation::Eq => (lhs - constraint.rhs).abs() <= slack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Relation;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn scenario_a() -> Problem {
        Problem::maximize(
            vec![3.0, 5.0],
            vec![
                Constraint::new(vec![1.0, 0.0], Relation::Le, 4.0),
                Constraint::new(vec![0.0, 2.0], Relation::Le, 12.0),
                Constraint::new(vec![3.0, 2.0], Relation::Le, 18.0),
            ],
        )
        .unwrap()
    }

    fn three_var_mixed() -> Problem {
        // Minimize: 2x1 + 3x2 + x3
        // Subject to:
        //   x1 + x2 + x3 >= 6
        //   x1 - x3 = 1
        //   x2 <= 4
        // Optimal: x1=3.5, x2=0, x3=2.5, Z=9.5
        Problem::minimize(
            vec![2.0, 3.0, 1.0],
            vec![
                Constraint::new(vec![1.0, 1.0, 1.0], Relation::Ge, 6.0),
                Constraint::new(vec![1.0, 0.0, -1.0], Relation::Eq, 1.0),
                Constraint::new(vec![0.0, 1.0, 0.0], Relation::Le, 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("two_phase".parse::<Strategy>().unwrap(), Strategy::TwoPhase);
        assert_eq!("Big-M".parse::<Strategy>().unwrap(), Strategy::BigM);
        assert_eq!("simplex".parse::<Strategy>().unwrap(), Strategy::Standard);
        assert!("dual".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_auto_resolution() {
        assert_eq!(Strategy::for_problem(&scenario_a()), Strategy::Graphical);
        assert_eq!(Strategy::for_problem(&three_var_mixed()), Strategy::TwoPhase);

        let le_only = Problem::maximize(
            vec![1.0, 1.0, 1.0],
            vec![Constraint::new(vec![1.0, 1.0, 1.0], Relation::Le, 3.0)],
        )
        .unwrap();
        assert_eq!(Strategy::for_problem(&le_only), Strategy::Standard);
    }

    #[test]
    fn test_standard_scenario_a() {
        init();
        let solution = Solver::new().solve_relaxation(&scenario_a(), Strategy::Standard).unwrap();

        assert_eq!(solution.method, Strategy::Standard);
        assert!((solution.values[0] - 2.0).abs() < 1e-9, "x1 = {} (expected 2)", solution.values[0]);
        assert!((solution.values[1] - 6.0).abs() < 1e-9, "x2 = {} (expected 6)", solution.values[1]);
        assert!((solution.objective_value - 36.0).abs() < 1e-9);
        assert!(!solution.alternate_optima);

        let duals = solution.dual_values.unwrap();
        assert!((duals[0] - 0.0).abs() < 1e-9);
        assert!((duals[1] - 1.5).abs() < 1e-9);
        assert!((duals[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_standard_rejects_ge() {
        let result = Solver::new().solve_relaxation(&three_var_mixed(), Strategy::Standard);
        assert!(matches!(
            result,
            Err(SolveError::InvalidMethod { method: Strategy::Standard, .. })
        ));
    }

    #[test]
    fn test_standard_accepts_flipped_ge() {
        // x1 >= -1 flips to -x1 <= 1, which a slack column can start from
        let problem = Problem::maximize(
            vec![1.0, 2.0, 0.0],
            vec![
                Constraint::new(vec![1.0, 0.0, 0.0], Relation::Ge, -1.0),
                Constraint::new(vec![1.0, 1.0, 1.0], Relation::Le, 4.0),
            ],
        )
        .unwrap();
        let solution = Solver::new().solve_relaxation(&problem, Strategy::Standard).unwrap();

        assert!((solution.objective_value - 8.0).abs() < 1e-9, "obj = {}", solution.objective_value);
        assert!((solution.values[1] - 4.0).abs() < 1e-9);
        assert_eq!(Strategy::for_problem(&problem), Strategy::Standard);
    }

    #[test]
    fn test_beale_cycles_until_limit() {
        // Beale's example: degenerate ties send the largest-coefficient rule round a
        // six-pivot loop back to the starting basis.
        let problem = Problem::maximize(
            vec![0.75, -20.0, 0.5, -6.0],
            vec![
                Constraint::new(vec![0.25, -8.0, -1.0, 9.0], Relation::Le, 0.0),
                Constraint::new(vec![0.5, -12.0, -0.5, 3.0], Relation::Le, 0.0),
                Constraint::new(vec![0.0, 0.0, 1.0, 0.0], Relation::Le, 1.0),
            ],
        )
        .unwrap();
        let result = Solver::new().solve_relaxation(&problem, Strategy::Standard);
        assert_eq!(result.unwrap_err(), SolveError::CycleLimit(100));
    }

    #[test]
    fn test_two_phase_mixed() {
        init();
        let solution = Solver::new().solve_relaxation(&three_var_mixed(), Strategy::TwoPhase).unwrap();

        assert_eq!(solution.method, Strategy::TwoPhase);
        assert!((solution.objective_value - 9.5).abs() < 1e-6, "obj = {}", solution.objective_value);
        assert!((solution.values[0] - 3.5).abs() < 1e-6);
        assert!(solution.values[1].abs() < 1e-6);
        assert!((solution.values[2] - 2.5).abs() < 1e-6);

        let phases: Vec<Phase> = solution.iterations.iter().map(|r| r.phase).collect();
        assert_eq!(phases.first(), Some(&Phase::PhaseOne));
        assert_eq!(phases.last(), Some(&Phase::PhaseTwo));
    }

    #[test]
    fn test_big_m_mixed() {
        init();
        let solution = Solver::new().solve_relaxation(&three_var_mixed(), Strategy::BigM).unwrap();

        assert_eq!(solution.method, Strategy::BigM);
        assert!((solution.objective_value - 9.5).abs() < 1e-6, "obj = {}", solution.objective_value);
        assert!(solution.iterations.iter().all(|r| r.phase == Phase::BigM));
    }

    #[test]
    fn test_minimize_shadow_prices() {
        // Minimize: 2x1 + 3x2 + x3 with the rows above.
        // Raising the >= requirement by one costs 1.5 (x1 and x3 split the extra unit),
        // raising the equality right-hand side by one costs 0.5.
        for strategy in [Strategy::TwoPhase, Strategy::BigM] {
            let solution = Solver::new().solve_relaxation(&three_var_mixed(), strategy).unwrap();
            let duals = solution.dual_values.unwrap();
            assert!((duals[0] - 1.5).abs() < 1e-6, "{}: y1 = {}", strategy, duals[0]);
            assert!((duals[1] - 0.5).abs() < 1e-6, "{}: y2 = {}", strategy, duals[1]);
            assert!(duals[2].abs() < 1e-6, "{}: y3 = {}", strategy, duals[2]);
        }
    }

    #[test]
    fn test_infeasible_detected_by_both_artificial_methods() {
        // x1 + x2 >= 5, x1 + x2 <= 3
        let problem = Problem::maximize(
            vec![1.0, 1.0, 0.0],
            vec![
                Constraint::new(vec![1.0, 1.0, 0.0], Relation::Ge, 5.0),
                Constraint::new(vec![1.0, 1.0, 0.0], Relation::Le, 3.0),
            ],
        )
        .unwrap();

        for strategy in [Strategy::TwoPhase, Strategy::BigM] {
            let result = Solver::new().solve_relaxation(&problem, strategy);
            assert!(matches!(result, Err(SolveError::Infeasible(_))), "{}: {:?}", strategy, result);
        }
    }

    fn large_cost() -> Problem {
        // Maximize: 1e7 x1 + x2
        // Subject to:
        //   x2 >= 5
        //   x1 + x2 <= 6
        //   x1 <= 4
        // Optimal: x1=1, x2=5, Z=10000005
        Problem::maximize(
            vec![1e7, 1.0, 0.0],
            vec![
                Constraint::new(vec![0.0, 1.0, 0.0], Relation::Ge, 5.0),
                Constraint::new(vec![1.0, 1.0, 0.0], Relation::Le, 6.0),
                Constraint::new(vec![1.0, 0.0, 0.0], Relation::Le, 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_penalty_grows_with_coefficients() {
        let solver = Solver::new();
        assert_eq!(solver.penalty(&three_var_mixed()), 1e6);
        assert!(solver.penalty(&large_cost()) > 1e10);
    }

    #[test]
    fn test_big_m_agrees_with_two_phase_on_large_costs() {
        init();
        let solver = Solver::new();
        let two_phase = solver.solve_relaxation(&large_cost(), Strategy::TwoPhase).unwrap();
        let big_m = solver.solve_relaxation(&large_cost(), Strategy::BigM).unwrap();

        for solution in [&two_phase, &big_m] {
            assert!(
                (solution.objective_value - 10_000_005.0).abs() < 1e-3,
                "{}: obj = {}",
                solution.method,
                solution.objective_value
            );
            assert!((solution.values[0] - 1.0).abs() < 1e-9);
            assert!((solution.values[1] - 5.0).abs() < 1e-9);
        }

        // Raising x2's floor by one gives up a unit of x1
        let (tp, bm) = (two_phase.dual_values.unwrap(), big_m.dual_values.unwrap());
        assert!((tp[0] - (1.0 - 1e7)).abs() < 1e-3, "two_phase y1 = {}", tp[0]);
        assert!((bm[0] - tp[0]).abs() < 1e-3, "big_m y1 = {}", bm[0]);
        assert!((bm[1] - tp[1]).abs() < 1e-3, "big_m y2 = {}", bm[1]);
    }

    #[test]
    fn test_unbounded() {
        let problem = Problem::maximize(
            vec![1.0, 1.0, 0.0],
            vec![Constraint::new(vec![1.0, -1.0, 0.0], Relation::Le, 2.0)],
        )
        .unwrap();
        let result = Solver::new().solve_relaxation(&problem, Strategy::Standard);
        assert_eq!(result.unwrap_err(), SolveError::Unbounded);
    }

    #[test]
    fn test_alternate_optima_flag() {
        // Maximize x1 + x2 + x3 subject to x1 + x2 + x3 <= 5: a whole face is optimal
        let problem = Problem::maximize(
            vec![1.0, 1.0, 1.0],
            vec![Constraint::new(vec![1.0, 1.0, 1.0], Relation::Le, 5.0)],
        )
        .unwrap();
        let solution = Solver::new().solve_relaxation(&problem, Strategy::Standard).unwrap();

        assert!((solution.objective_value - 5.0).abs() < 1e-9);
        assert!(solution.alternate_optima);
    }

    #[test]
    fn test_redundant_equality_rows() {
        // The second equality repeats the first; its artificial cannot be driven out.
        let problem = Problem::maximize(
            vec![1.0, 2.0, 0.0],
            vec![
                Constraint::new(vec![1.0, 1.0, 1.0], Relation::Eq, 4.0),
                Constraint::new(vec![2.0, 2.0, 2.0], Relation::Eq, 8.0),
            ],
        )
        .unwrap();
        let solution = Solver::new().solve_relaxation(&problem, Strategy::TwoPhase).unwrap();

        assert!((solution.objective_value - 8.0).abs() < 1e-9, "obj = {}", solution.objective_value);
        assert!((solution.values[1] - 4.0).abs() < 1e-9);
    }
}
