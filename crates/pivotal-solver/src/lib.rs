mod branch_bound;
mod dual;
mod graphical;
mod method;
mod options;
mod problem;
mod simplex;
mod solution;
mod solver;
mod tableau;


pub use branch_bound::{BranchBound, BranchNode, BranchOutcome, NodeStatus};
pub use dual::{dual_problem, DualProblem};
pub use graphical::{feasible_vertices, PlotData, Point};
pub use method::{Strategy, UnknownStrategy};
pub use options::{SolverOptions, Tolerances};
pub use problem::{Constraint, Direction, Problem, Relation};
pub use simplex::{IterationRecord, Phase, Pivot, SimplexEngine, SimplexRun, SimplexStatus};
pub use solution::{ErrorDescriptor, ErrorKind, Solution, SolutionStatus, SolveError};
pub use solver::{solve, Outcome, SolveReport, Solver};
pub use tableau::{build, Basis, Column, ColumnKind, Layout, RowColumns, StandardForm, Tableau, TableauMode};
