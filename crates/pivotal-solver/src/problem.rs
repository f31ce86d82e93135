use crate::solution::SolveError;

/// Represents a linear programming problem.
///
/// A problem is immutable once built: branch-and-bound and the dual constructor derive new
/// problems from it instead of editing it in place.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    direction: Direction,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
    variable_prefix: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each decision variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Le => "<=",
            Relation::Ge => ">=",
            Relation::Eq => "=",
        }
    }

    /// The relation obtained by multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, relation: Relation, rhs: f64) -> Self {
        Self { coefficients, relation, rhs }
    }

    /// `x_var <= bound` over `n_vars` decision variables.
    pub fn upper_bound(n_vars: usize, var: usize, bound: f64) -> Self {
        Self::new(unit_vector(n_vars, var), Relation::Le, bound)
    }

    /// `x_var >= bound` over `n_vars` decision variables.
    pub fn lower_bound(n_vars: usize, var: usize, bound: f64) -> Self {
        Self::new(unit_vector(n_vars, var), Relation::Ge, bound)
    }

    /// Left-hand side evaluated at `point`.
    pub fn activity(&self, point: &[f64]) -> f64 {
        self.coefficients.iter().zip(point).map(|(a, x)| a * x).sum()
    }

    /// Whether the constraint must be rewritten with an artificial column once its
    /// right-hand side is made non-negative.
    pub fn needs_artificial(&self) -> bool {
        self.normalized_relation() != Relation::Le
    }

    /// Relation after flipping rows with a negative right-hand side.
    pub fn normalized_relation(&self) -> Relation {
        if self.rhs < 0.0 {
            self.relation.flipped()
        } else {
            self.relation
        }
    }
}

fn unit_vector(n: usize, index: usize) -> Vec<f64> {
    let mut v = vec![0.0; n];
    v[index] = 1.0;
    v
}

impl Problem {
    /// Build a problem, checking that every coefficient vector has one entry per variable.
    pub fn new(direction: Direction, objective: Vec<f64>, constraints: Vec<Constraint>) -> Result<Self, SolveError> {
        let n = objective.len();
        if n == 0 {
            return Err(SolveError::InvalidProblem("objective has no coefficients".to_string()));
        }
        if objective.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::InvalidProblem("objective coefficients must be finite".to_string()));
        }

        for (i, c) in constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(SolveError::InvalidProblem(format!(
                    "constraint {} has {} coefficients, expected {}",
                    i + 1,
                    c.coefficients.len(),
                    n
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
                return Err(SolveError::InvalidProblem(format!(
                    "constraint {} contains a non-finite value",
                    i + 1
                )));
            }
        }

        Ok(Self {
            direction,
            objective,
            constraints,
            variable_prefix: "x".to_string(),
        })
    }

    /// Rename the decision variables to `{prefix}1..{prefix}N`.
    pub fn with_variable_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.variable_prefix = prefix.into();
        self
    }

    pub fn maximize(objective: Vec<f64>, constraints: Vec<Constraint>) -> Result<Self, SolveError> {
        Self::new(Direction::Maximize, objective, constraints)
    }

    pub fn minimize(objective: Vec<f64>, constraints: Vec<Constraint>) -> Result<Self, SolveError> {
        Self::new(Direction::Minimize, objective, constraints)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective coefficients of the equivalent maximization problem.
    pub fn normalized_objective(&self) -> Vec<f64> {
        match self.direction {
            Direction::Maximize => self.objective.clone(),
            Direction::Minimize => self.objective.iter().map(|c| -c).collect(),
        }
    }

    /// Objective value at `point`, in the problem's own direction.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        self.objective.iter().zip(point).map(|(c, x)| c * x).sum()
    }

    /// Converts an objective value between the problem's direction and the maximization form.
    pub fn to_maximization(&self, value: f64) -> f64 {
        match self.direction {
            Direction::Maximize => value,
            Direction::Minimize => -value,
        }
    }

    pub fn needs_artificial(&self) -> bool {
        self.constraints.iter().any(Constraint::needs_artificial)
    }

    /// Name of the decision variable at `index` (`x1`, `x2`, ...).
    pub fn variable_name(&self, index: usize) -> String {
        format!("{}{}", self.variable_prefix, index + 1)
    }

    pub fn variable_names(&self) -> Vec<String> {
        (0..self.num_variables()).map(|j| self.variable_name(j)).collect()
    }

    /// A new problem with `extra` appended to this problem's constraints.
    pub fn with_constraints(&self, extra: impl IntoIterator<Item = Constraint>) -> Result<Self, SolveError> {
        let mut constraints = self.constraints.clone();
        constraints.extend(extra);
        let problem = Self::new(self.direction, self.objective.clone(), constraints)?;
        Ok(problem.with_variable_prefix(self.variable_prefix.clone()))
    }
}
