use crate::problem::{Problem, Relation};
use crate::solution::SolveError;

/// Dense simplex tableau.
///
/// Row 0 holds the reduced costs of the maximization form, rows `1..=m` the constraints.
/// The last column is the right-hand side.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    rows: Vec<Vec<f64>>,
    columns: Vec<Column>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub kind: ColumnKind,
    pub label: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Decision,
    Slack,
    Surplus,
    Artificial,
    Rhs,
}

/// Basic column of each constraint row. Entry `i` belongs to tableau row `i + 1`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basis(Vec<usize>);

/// How the builder fills row 0 when artificial columns are present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableauMode {
    /// Artificial columns get zero cost; the caller sets up Phase 1.
    Plain,
    /// Artificial columns are penalized with the given constant.
    BigM(f64),
}

/// Auxiliary columns attached to one constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowColumns {
    /// Slack (for <=) or surplus (for >=) column
    pub auxiliary: Option<usize>,
    pub artificial: Option<usize>,
    /// Row was multiplied by -1 to make its right-hand side non-negative
    pub flipped: bool,
}

/// A problem rewritten in tableau form together with its starting basis.
#[derive(Debug, Clone)]
pub struct StandardForm {
    pub tableau: Tableau,
    pub basis: Basis,
    pub layout: Layout,
}

/// Where the builder put each kind of column.
#[derive(Debug, Clone)]
pub struct Layout {
    pub rows: Vec<RowColumns>,
    pub n_vars: usize,
    /// First artificial column; equals the RHS column when there are none
    pub artificial_start: usize,
    pub rhs_col: usize,
    pub mode: TableauMode,
}

impl Tableau {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn rhs_col(&self) -> usize {
        self.columns.len() - 1
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.rows[row]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn objective_row(&self) -> &[f64] {
        &self.rows[0]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.rhs_col()]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn column_kind(&self, col: usize) -> ColumnKind {
        self.columns[col].kind
    }

    pub(crate) fn set_objective_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.num_cols());
        self.rows[0] = row;
    }

    /// Subtract `factor` times tableau row `source` from row 0.
    pub(crate) fn reduce_objective(&mut self, source: usize, factor: f64) {
        let (head, tail) = self.rows.split_at_mut(1);
        let src = &tail[source - 1];
        for (dst, &s) in head[0].iter_mut().zip(src) {
            *dst -= factor * s;
        }
    }

    /// Pivot on (`row`, `col`), where `row` is a tableau row (>= 1).
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.num_cols();

        let pivot_val = self.rows[row][col];
        for j in 0..n_cols {
            self.rows[row][j] /= pivot_val;
        }
        // Exact unit entry avoids drift in the basic column.
        self.rows[row][col] = 1.0;

        let pivot_row = self.rows[row].clone();
        for (i, target) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = target[col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                target[j] -= factor * pivot_row[j];
            }
            target[col] = 0.0;
        }
    }
}

impl Basis {
    pub fn new(columns: Vec<usize>) -> Self {
        Self(columns)
    }

    /// Basic column of constraint row `i` (tableau row `i + 1`).
    pub fn get(&self, i: usize) -> usize {
        self.0[i]
    }

    pub(crate) fn set(&mut self, i: usize, col: usize) {
        self.0[i] = col;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, col: usize) -> bool {
        self.0.contains(&col)
    }

    /// Constraint row in which `col` is basic.
    pub fn row_of(&self, col: usize) -> Option<usize> {
        self.0.iter().position(|&c| c == col)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// Convert `problem` to tableau form.
pub fn build(problem: &Problem, mode: TableauMode) -> Result<StandardForm, SolveError> {
    let n_vars = problem.num_variables();
    let n_constraints = problem.num_constraints();

    // Count slack, surplus and artificial variables needed
    let mut n_slack = 0;
    let mut n_surplus = 0;
    let mut n_artificial = 0;

    for (i, c) in problem.constraints().iter().enumerate() {
        if c.coefficients.len() != n_vars {
            return Err(SolveError::InvalidProblem(format!(
                "constraint {} has {} coefficients, expected {}",
                i + 1,
                c.coefficients.len(),
                n_vars
            )));
        }
        match c.normalized_relation() {
            Relation::Le => n_slack += 1,
            Relation::Ge => {
                n_surplus += 1;
                n_artificial += 1;
            }
            Relation::Eq => n_artificial += 1,
        }
    }

    let mut columns = Vec::with_capacity(n_vars + n_slack + n_surplus + n_artificial + 1);
    for j in 0..n_vars {
        columns.push(Column { kind: ColumnKind::Decision, label: problem.variable_name(j) });
    }
    for k in 0..n_slack {
        columns.push(Column { kind: ColumnKind::Slack, label: format!("s{}", k + 1) });
    }
    for k in 0..n_surplus {
        columns.push(Column { kind: ColumnKind::Surplus, label: format!("e{}", k + 1) });
    }
    for k in 0..n_artificial {
        columns.push(Column { kind: ColumnKind::Artificial, label: format!("a{}", k + 1) });
    }
    columns.push(Column { kind: ColumnKind::Rhs, label: "b".to_string() });

    let total_cols = columns.len();
    let mut data = vec![vec![0.0; total_cols]; n_constraints + 1];
    let mut basis = vec![0; n_constraints];
    let mut rows = Vec::with_capacity(n_constraints);

    let mut slack_idx = n_vars;
    let mut surplus_idx = n_vars + n_slack;
    let artificial_start = n_vars + n_slack + n_surplus;
    let mut artificial_idx = artificial_start;

    for (i, c) in problem.constraints().iter().enumerate() {
        let row = &mut data[i + 1];
        let flipped = c.rhs < 0.0;
        let sign = if flipped { -1.0 } else { 1.0 };

        for (j, &coef) in c.coefficients.iter().enumerate() {
            row[j] = sign * coef;
        }
        row[total_cols - 1] = sign * c.rhs;

        let mut info = RowColumns { auxiliary: None, artificial: None, flipped };
        match c.normalized_relation() {
            Relation::Le => {
                row[slack_idx] = 1.0;
                basis[i] = slack_idx;
                info.auxiliary = Some(slack_idx);
                slack_idx += 1;
            }
            Relation::Ge => {
                row[surplus_idx] = -1.0;
                info.auxiliary = Some(surplus_idx);
                surplus_idx += 1;
                row[artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                info.artificial = Some(artificial_idx);
                artificial_idx += 1;
            }
            Relation::Eq => {
                row[artificial_idx] = 1.0;
                basis[i] = artificial_idx;
                info.artificial = Some(artificial_idx);
                artificial_idx += 1;
            }
        }
        rows.push(info);
    }

    // Row 0 stores -c of the maximization form
    for (j, coef) in problem.normalized_objective().into_iter().enumerate() {
        data[0][j] = -coef;
    }

    let mut tableau = Tableau { rows: data, columns };

    if let TableauMode::BigM(m) = mode {
        for col in artificial_start..artificial_start + n_artificial {
            tableau.rows[0][col] = m;
        }
        for (i, info) in rows.iter().enumerate() {
            if info.artificial.is_some() {
                tableau.reduce_objective(i + 1, m);
            }
        }
    }

    Ok(StandardForm {
        tableau,
        basis: Basis(basis),
        layout: Layout {
            rows,
            n_vars,
            artificial_start,
            rhs_col: total_cols - 1,
            mode,
        },
    })
}

impl Layout {
    pub fn has_artificial(&self) -> bool {
        self.artificial_start < self.rhs_col
    }

    pub fn is_artificial(&self, col: usize) -> bool {
        col >= self.artificial_start && col < self.rhs_col
    }

    pub fn artificial_columns(&self) -> std::ops::Range<usize> {
        self.artificial_start..self.rhs_col
    }
}
