use crate::tableau::{Basis, Tableau};

/// Pivoting loop shared by every tableau-based method.
#[derive(Debug, Clone)]
pub struct SimplexEngine {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for reduced-cost and ratio-test comparisons
    tolerance: f64,
}

/// Which stage of a method produced a record.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Simplex,
    PhaseOne,
    PhaseTwo,
    BigM,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Simplex => "Simplex",
            Phase::PhaseOne => "Phase 1",
            Phase::PhaseTwo => "Phase 2",
            Phase::BigM => "Big M",
        }
    }
}

/// Pivot position; `row` is a tableau row (row 0 is the objective).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub row: usize,
    pub col: usize,
}

/// Snapshot of the tableau at one step of a run.
///
/// `pivot` is the position chosen on this tableau, or `None` for the terminal snapshot.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub phase: Phase,
    pub step: usize,
    pub tableau: Tableau,
    pub basis: Basis,
    pub pivot: Option<Pivot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    Optimal,
    Unbounded,
    CycleLimit,
}

/// Outcome of one pivoting loop.
#[derive(Debug, Clone)]
pub struct SimplexRun {
    pub status: SimplexStatus,
    pub tableau: Tableau,
    pub basis: Basis,
    pub history: Vec<IterationRecord>,
}

impl Default for SimplexEngine {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-9,
        }
    }
}

impl SimplexEngine {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Pivot until no reduced cost is negative, no ratio limits the entering column, or
    /// the iteration cap is hit.
    pub fn iterate(&self, tableau: Tableau, basis: Basis, phase: Phase) -> SimplexRun {
        let limit = tableau.rhs_col();
        self.iterate_with_limit(tableau, basis, phase, limit)
    }

    /// Like [`iterate`](Self::iterate), but only columns below `entering_limit` may enter.
    pub fn iterate_with_limit(
        &self,
        mut tableau: Tableau,
        mut basis: Basis,
        phase: Phase,
        entering_limit: usize,
    ) -> SimplexRun {
        let mut history = Vec::new();
        let mut iterations = 0;

        let status = loop {
            let Some(col) = self.find_pivot_column(&tableau, entering_limit) else {
                break SimplexStatus::Optimal;
            };
            if iterations >= self.max_iterations {
                log::warn!("{}: iteration cap of {} reached", phase.label(), self.max_iterations);
                break SimplexStatus::CycleLimit;
            }
            let Some(row) = self.find_pivot_row(&tableau, col) else {
                log::debug!("{}: column {} has no limiting ratio", phase.label(), col);
                break SimplexStatus::Unbounded;
            };

            history.push(IterationRecord {
                phase,
                step: iterations,
                tableau: tableau.clone(),
                basis: basis.clone(),
                pivot: Some(Pivot { row, col }),
            });

            log::debug!(
                "{} step {}: pivot on row {} column {} ({:.6})",
                phase.label(),
                iterations,
                row,
                col,
                tableau.get(row, col)
            );
            tableau.pivot(row, col);
            basis.set(row - 1, col);
            iterations += 1;
        };

        history.push(IterationRecord {
            phase,
            step: iterations,
            tableau: tableau.clone(),
            basis: basis.clone(),
            pivot: None,
        });

        SimplexRun {
            status,
            tableau,
            basis,
            history,
        }
    }

    /// Most negative reduced cost; the first column wins ties.
    fn find_pivot_column(&self, tableau: &Tableau, entering_limit: usize) -> Option<usize> {
        let row0 = tableau.objective_row();
        let n_cols = entering_limit.min(tableau.rhs_col());

        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for (j, &value) in row0.iter().enumerate().take(n_cols) {
            if value < min_val {
                min_val = value;
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Minimum ratio test over rows with a positive entry; the first row wins ties.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 1..tableau.num_rows() {
            let val = tableau.get(i, col);
            if val > self.tolerance {
                let ratio = tableau.get(i, rhs_col) / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }
}
