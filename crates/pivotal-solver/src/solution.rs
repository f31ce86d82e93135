use thiserror::Error;

use crate::method::Strategy;
use crate::simplex::IterationRecord;

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// The strategy that produced this solution (never `Auto`)
    pub method: Strategy,
    /// Variable names, parallel to `values`
    pub variables: Vec<String>,
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Objective value `Z` in the problem's own direction
    pub objective_value: f64,
    /// Shadow price of each constraint, when the strategy produces a final tableau
    pub dual_values: Option<Vec<f64>>,
    /// Tableau snapshots in pivot order
    pub iterations: Vec<IterationRecord>,
    /// More than one optimal vertex exists
    pub alternate_optima: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// Best integral solution inside the explored part of a truncated branch-and-bound tree
    BestFound,
}

impl Solution {
    /// Value of the variable called `name`, if it exists.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.variables
            .iter()
            .position(|v| v == name)
            .map(|i| self.values[i])
    }

    pub fn named_values(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Whether every value lies within `tolerance` of an integer.
    pub fn is_integral(&self, tolerance: f64) -> bool {
        self.values.iter().all(|v| (v - v.round()).abs() <= tolerance)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
    #[error("Method {method} cannot solve this problem: {reason}")]
    InvalidMethod { method: Strategy, reason: String },
    #[error("Infeasible problem: {0}")]
    Infeasible(String),
    #[error("Unbounded problem: the objective can grow without limit")]
    Unbounded,
    #[error("Iteration limit of {0} reached, the pivot sequence is probably cycling")]
    CycleLimit(usize),
}

/// Error categories reported across the engine boundary.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidProblem,
    InvalidMethod,
    Infeasible,
    Unbounded,
    CycleLimit,
}

impl SolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolveError::InvalidProblem(_) => ErrorKind::InvalidProblem,
            SolveError::InvalidMethod { .. } => ErrorKind::InvalidMethod,
            SolveError::Infeasible(_) => ErrorKind::Infeasible,
            SolveError::Unbounded => ErrorKind::Unbounded,
            SolveError::CycleLimit(_) => ErrorKind::CycleLimit,
        }
    }

    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Flat form of a [`SolveError`] for callers that only need a kind and a message.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<SolveError> for ErrorDescriptor {
    fn from(err: SolveError) -> Self {
        err.descriptor()
    }
}
