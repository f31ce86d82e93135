use serde::Deserialize;
use thiserror::Error;

use pivotal_solver::{Constraint, Direction, Problem, Relation, SolveError, SolverOptions, Strategy, UnknownStrategy};

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid JSON or missing field: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownMethod(#[from] UnknownStrategy),
    #[error(transparent)]
    Problem(#[from] SolveError),
}

/// Solve request as posted by the web front end.
#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub objective: Objective,
    pub objective_function: Vec<f64>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    /// Method name; `auto` when absent
    #[serde(default)]
    pub method: Option<String>,
    /// Require every variable to be integral
    #[serde(default)]
    pub integer: bool,
    /// Also solve the dual problem
    #[serde(default)]
    pub dual: bool,
    #[serde(default)]
    pub options: SolverOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[serde(alias = "maximize")]
    Max,
    #[serde(alias = "minimize")]
    Min,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConstraintSpec {
    pub coefficients: Vec<f64>,
    pub sign: Sign,
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Sign {
    #[serde(rename = "<=", alias = "≤")]
    Le,
    #[serde(rename = ">=", alias = "≥")]
    Ge,
    #[serde(rename = "=", alias = "==")]
    Eq,
}

impl From<Objective> for Direction {
    fn from(objective: Objective) -> Self {
        match objective {
            Objective::Max => Direction::Maximize,
            Objective::Min => Direction::Minimize,
        }
    }
}

impl From<Sign> for Relation {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Le => Relation::Le,
            Sign::Ge => Relation::Ge,
            Sign::Eq => Relation::Eq,
        }
    }
}

impl SolveRequest {
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn to_problem(&self) -> Result<Problem, RequestError> {
        let constraints = self
            .constraints
            .iter()
            .map(|c| Constraint::new(c.coefficients.clone(), c.sign.into(), c.rhs))
            .collect();
        Ok(Problem::new(self.objective.into(), self.objective_function.clone(), constraints)?)
    }

    pub fn strategy(&self) -> Result<Strategy, RequestError> {
        match &self.method {
            Some(name) => Ok(name.parse()?),
            None => Ok(Strategy::Auto),
        }
    }
}
