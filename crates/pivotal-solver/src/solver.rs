use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::branch_bound::BranchOutcome;
use crate::method::Strategy;
use crate::options::SolverOptions;
use crate::problem::Problem;
use crate::simplex::SimplexEngine;
use crate::solution::{ErrorDescriptor, Solution, SolutionStatus, SolveError};

/// Entry point for every solving method.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolverOptions,
    /// Polled between branch-and-bound nodes
    cancel: Option<Arc<AtomicBool>>,
}

/// A successful solve: the LP relaxation and, when integers were required, the search result.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Outcome {
    pub solution: Solution,
    pub integer: Option<BranchOutcome>,
}

impl Outcome {
    pub fn status_text(&self) -> &'static str {
        match &self.integer {
            Some(search) if search.best.is_none() => "No integer solution",
            Some(search) if search.truncated => "Best found",
            _ => match self.solution.status {
                SolutionStatus::Optimal => "Optimal",
                SolutionStatus::BestFound => "Best found",
            },
        }
    }
}

/// Status line plus either the outcome or a flattened error.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub status_text: String,
    pub result: Result<Outcome, ErrorDescriptor>,
}

impl SolveReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SolverOptions) -> Self {
        Self { options, cancel: None }
    }

    /// Share a flag that stops branch-and-bound at the next node once set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub(crate) fn engine(&self) -> SimplexEngine {
        SimplexEngine::new(self.options.max_iterations, self.options.tolerances.pivot)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Solve the relaxation with `strategy`, then search for an integral solution if asked.
    pub fn solve(&self, problem: &Problem, strategy: Strategy, integer_required: bool) -> Result<Outcome, SolveError> {
        log::info!(
            "solving {} variables, {} constraints with {}",
            problem.num_variables(),
            problem.num_constraints(),
            strategy
        );
        let solution = self.solve_relaxation(problem, strategy)?;

        let integer = if integer_required {
            Some(self.branch_and_bound(problem)?)
        } else {
            None
        };

        Ok(Outcome { solution, integer })
    }

    /// Like [`Solver::solve`] but never fails: errors are folded into the report.
    pub fn report(&self, problem: &Problem, strategy: Strategy, integer_required: bool) -> SolveReport {
        match self.solve(problem, strategy, integer_required) {
            Ok(outcome) => SolveReport {
                status_text: outcome.status_text().to_string(),
                result: Ok(outcome),
            },
            Err(err) => {
                log::info!("solve failed: {}", err);
                SolveReport {
                    status_text: err.to_string(),
                    result: Err(err.descriptor()),
                }
            }
        }
    }
}

/// Solve `problem` with default options.
pub fn solve(problem: &Problem, strategy: Strategy, integer_required: bool) -> SolveReport {
    Solver::new().report(problem, strategy, integer_required)
}
