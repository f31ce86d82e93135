/// Tunable limits for one [`Solver`](crate::Solver).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Pivots allowed per simplex run before reporting a cycle
    pub max_iterations: usize,
    /// Smallest penalty placed on artificial columns by the Big-M method; problems with
    /// larger costs or right-hand sides get a larger one
    pub big_m: f64,
    /// Deepest branch-and-bound level that is still expanded
    pub max_depth: usize,
    pub tolerances: Tolerances,
}

/// One tolerance per kind of comparison.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Reduced-cost sign tests and ratio-test denominators
    pub pivot: f64,
    /// Constraint satisfaction and leftover artificial values
    pub feasibility: f64,
    /// Distance from the nearest integer still counted as integral
    pub integrality: f64,
    /// Zero reduced costs that signal alternate optima, and objective ties
    pub degeneracy: f64,
    /// Distance under which two graphical intersection points are merged
    pub vertex: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            big_m: 1e6,
            max_depth: 10,
            tolerances: Tolerances::default(),
        }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            pivot: 1e-9,
            feasibility: 1e-9,
            integrality: 1e-6,
            degeneracy: 1e-9,
            vertex: 1e-7,
        }
    }
}

impl SolverOptions {
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_big_m(mut self, m: f64) -> Self {
        self.big_m = m;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }
}
