use crate::method::Strategy;
use crate::problem::{Constraint, Problem, Relation};
use crate::solution::{Solution, SolutionStatus, SolveError};
use crate::Solver;

/// Lifecycle of a search node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Not finished: beyond the depth cap or cut off by cancellation
    Processing,
    /// LP relaxation is infeasible
    Infeasible,
    /// Relaxation cannot beat the incumbent
    Pruned,
    /// Relaxation is already integral
    Integer,
    /// Children were created
    Branched,
}

/// Bound added on one variable when branching.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchBound {
    pub variable: usize,
    /// `Le` for the down branch, `Ge` for the up branch
    pub relation: Relation,
    pub value: f64,
}

impl BranchBound {
    pub fn to_constraint(&self, n_vars: usize) -> Constraint {
        match self.relation {
            Relation::Ge => Constraint::lower_bound(n_vars, self.variable, self.value),
            _ => Constraint::upper_bound(n_vars, self.variable, self.value),
        }
    }
}

impl std::fmt::Display for BranchBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{} {} {}", self.variable + 1, self.relation, self.value)
    }
}

/// One node of the search tree. Children are owned; the tree has no back-references.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct BranchNode {
    /// Path identifier such as `P0.1.2`
    pub id: String,
    pub depth: usize,
    /// Bound that created this node; `None` at the root
    pub bound: Option<BranchBound>,
    /// Every bound added between the root and this node, root first
    pub added_constraints: Vec<BranchBound>,
    pub relaxation: Option<Solution>,
    pub status: NodeStatus,
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    /// Depth-first iterator over this node and its descendants.
    pub fn iter(&self) -> impl Iterator<Item = &BranchNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Result of a branch-and-bound run.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct BranchOutcome {
    pub tree: BranchNode,
    /// Best integral solution found, if any
    pub best: Option<Solution>,
    /// Part of the tree was left unexplored, so `best` is not proven optimal
    pub truncated: bool,
    pub nodes_explored: usize,
}

/// Branching bounds stored once, each pointing at its parent's entry.
#[derive(Debug, Default)]
struct BoundArena {
    entries: Vec<ArenaEntry>,
}

#[derive(Debug)]
struct ArenaEntry {
    parent: Option<usize>,
    bound: BranchBound,
}

impl BoundArena {
    fn push(&mut self, parent: Option<usize>, bound: BranchBound) -> usize {
        self.entries.push(ArenaEntry { parent, bound });
        self.entries.len() - 1
    }

    /// Bounds on the path from the root to `entry`, root first.
    fn path(&self, entry: Option<usize>) -> Vec<BranchBound> {
        let mut bounds = Vec::new();
        let mut cursor = entry;
        while let Some(i) = cursor {
            bounds.push(self.entries[i].bound);
            cursor = self.entries[i].parent;
        }
        bounds.reverse();
        bounds
    }
}

/// Best integral point found so far, scored in maximization form.
struct Incumbent {
    score: f64,
    solution: Solution,
}

struct Search<'a> {
    solver: &'a Solver,
    problem: &'a Problem,
    arena: BoundArena,
    nodes_explored: usize,
    truncated: bool,
}

impl Solver {
    /// Search for the best integral solution of `problem`.
    ///
    /// Every decision variable must be integral. Each node's relaxation is solved with the
    /// Big-M method.
    pub fn branch_and_bound(&self, problem: &Problem) -> Result<BranchOutcome, SolveError> {
        let mut search = Search {
            solver: self,
            problem,
            arena: BoundArena::default(),
            nodes_explored: 0,
            truncated: false,
        };
        let mut incumbent = None;
        let tree = search.explore(&mut incumbent, None, "P0".to_string(), 0)?;

        if search.truncated {
            log::warn!("branch-and-bound stopped early; the result is the best found, not a proven optimum");
        }

        let best = incumbent.map(|inc| {
            let mut solution = inc.solution;
            if search.truncated {
                solution.status = SolutionStatus::BestFound;
            }
            solution
        });

        Ok(BranchOutcome {
            tree,
            best,
            truncated: search.truncated,
            nodes_explored: search.nodes_explored,
        })
    }
}

impl Search<'_> {
    fn explore(
        &mut self,
        incumbent: &mut Option<Incumbent>,
        entry: Option<usize>,
        id: String,
        depth: usize,
    ) -> Result<BranchNode, SolveError> {
        let added_constraints = self.arena.path(entry);
        let mut node = BranchNode {
            id,
            depth,
            bound: entry.map(|i| self.arena.entries[i].bound),
            added_constraints,
            relaxation: None,
            status: NodeStatus::Processing,
            children: Vec::new(),
        };

        if self.solver.is_cancelled() {
            self.truncated = true;
            return Ok(node);
        }
        self.nodes_explored += 1;

        let n_vars = self.problem.num_variables();
        let subproblem = self
            .problem
            .with_constraints(node.added_constraints.iter().map(|b| b.to_constraint(n_vars)))?;

        let relaxation = match self.solver.solve_relaxation(&subproblem, Strategy::BigM) {
            Ok(solution) => solution,
            Err(SolveError::Infeasible(_)) => {
                log::debug!("{}: infeasible", node.id);
                node.status = NodeStatus::Infeasible;
                return Ok(node);
            }
            Err(e) => return Err(e),
        };

        let tol = self.solver.options().tolerances;
        let score = self.problem.to_maximization(relaxation.objective_value);

        if incumbent
            .as_ref()
            .is_some_and(|inc| score <= inc.score + tol.degeneracy)
        {
            log::debug!("{}: pruned at Z = {}", node.id, relaxation.objective_value);
            node.status = NodeStatus::Pruned;
        } else if relaxation.is_integral(tol.integrality) {
            log::debug!("{}: integral at Z = {}", node.id, relaxation.objective_value);
            let improves = incumbent.as_ref().is_none_or(|inc| score > inc.score);
            if improves {
                *incumbent = Some(Incumbent {
                    score,
                    solution: self.rounded(&relaxation),
                });
            }
            node.status = NodeStatus::Integer;
        } else if depth >= self.solver.options().max_depth {
            log::debug!("{}: depth cap reached", node.id);
            self.truncated = true;
        } else {
            let var = most_fractional(&relaxation.values, tol.integrality);
            let value = relaxation.values[var];
            log::debug!("{}: branching on x{} = {}", node.id, var + 1, value);

            let branches = [
                BranchBound { variable: var, relation: Relation::Le, value: value.floor() },
                BranchBound { variable: var, relation: Relation::Ge, value: value.ceil() },
            ];
            node.status = NodeStatus::Branched;
            for (k, bound) in branches.into_iter().enumerate() {
                let child_entry = self.arena.push(entry, bound);
                let child_id = format!("{}.{}", node.id, k + 1);
                let child = self.explore(incumbent, Some(child_entry), child_id, depth + 1)?;
                node.children.push(child);
            }
        }

        node.relaxation = Some(relaxation);
        Ok(node)
    }

    /// Copy of an integral relaxation with its values snapped to integers.
    fn rounded(&self, relaxation: &Solution) -> Solution {
        let mut solution = relaxation.clone();
        for v in &mut solution.values {
            *v = v.round();
        }
        solution.objective_value = self.problem.evaluate(&solution.values);
        solution
    }
}

/// Variable whose fractional part is closest to one half; the first one wins ties.
///
/// Must only be called when at least one value is fractional.
fn most_fractional(values: &[f64], tolerance: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;

    for (j, &v) in values.iter().enumerate() {
        if (v - v.round()).abs() <= tolerance {
            continue;
        }
        let distance = (v - v.floor() - 0.5).abs();
        if distance < best_distance {
            best_distance = distance;
            best = j;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SolverOptions;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn knapsack_like() -> Problem {
        // Maximize: 5x1 + 8x2
        // Subject to:
        //   x1 + x2 <= 6
        //   5x1 + 9x2 <= 45
        // LP optimum: x1=2.25, x2=3.75, Z=41.25
        // Integer optimum: x1=0, x2=5, Z=40
        Problem::maximize(
            vec![5.0, 8.0],
            vec![
                Constraint::new(vec![1.0, 1.0], Relation::Le, 6.0),
                Constraint::new(vec![5.0, 9.0], Relation::Le, 45.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_most_fractional() {
        assert_eq!(most_fractional(&[1.0, 2.4, 3.5, 0.5], 1e-6), 2);
        assert_eq!(most_fractional(&[1.25, 2.75], 1e-6), 0);
        assert_eq!(most_fractional(&[3.0, 0.9], 1e-6), 1);
    }

    #[test]
    fn test_arena_path() {
        let mut arena = BoundArena::default();
        let a = arena.push(None, BranchBound { variable: 0, relation: Relation::Le, value: 2.0 });
        let b = arena.push(Some(a), BranchBound { variable: 1, relation: Relation::Ge, value: 4.0 });
        let c = arena.push(Some(a), BranchBound { variable: 1, relation: Relation::Le, value: 3.0 });

        assert!(arena.path(None).is_empty());
        let path_b = arena.path(Some(b));
        assert_eq!(path_b.len(), 2);
        assert_eq!(path_b[0].variable, 0);
        assert_eq!(path_b[1].relation, Relation::Ge);
        assert_eq!(arena.path(Some(c))[1].value, 3.0);
    }

    #[test]
    fn test_integral_root_needs_no_branching() {
        init();
        // Maximize 2x1 + 3x2 subject to x1 + x2 <= 4
        let problem = Problem::maximize(
            vec![2.0, 3.0],
            vec![Constraint::new(vec![1.0, 1.0], Relation::Le, 4.0)],
        )
        .unwrap();
        let outcome = Solver::new().branch_and_bound(&problem).unwrap();

        assert_eq!(outcome.tree.status, NodeStatus::Integer);
        assert!(outcome.tree.is_leaf());
        assert_eq!(outcome.nodes_explored, 1);
        assert!(!outcome.truncated);

        let best = outcome.best.unwrap();
        assert_eq!(best.status, SolutionStatus::Optimal);
        assert_eq!(best.values, vec![0.0, 4.0]);
        assert!((best.objective_value - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_branching_finds_integer_optimum() {
        init();
        let outcome = Solver::new().branch_and_bound(&knapsack_like()).unwrap();

        assert_eq!(outcome.tree.status, NodeStatus::Branched);
        assert_eq!(outcome.tree.children.len(), 2);
        assert_eq!(outcome.tree.children[0].id, "P0.1");
        assert_eq!(outcome.tree.children[1].id, "P0.2");

        // x1 >= 3 relaxes to Z = 39, below the incumbent found under x1 <= 2
        let pruned = &outcome.tree.children[1];
        assert_eq!(pruned.status, NodeStatus::Pruned);
        assert!(pruned.is_leaf());
        let pruned_z = pruned.relaxation.as_ref().unwrap().objective_value;
        assert!((pruned_z - 39.0).abs() < 1e-6, "P0.2 Z = {}", pruned_z);

        let best = outcome.best.unwrap();
        assert_eq!(best.values, vec![0.0, 5.0]);
        assert!((best.objective_value - 40.0).abs() < 1e-9, "Z = {}", best.objective_value);

        let root_z = outcome.tree.relaxation.as_ref().unwrap().objective_value;
        assert!((root_z - 41.25).abs() < 1e-6);
        assert!(best.objective_value <= root_z + 1e-9);
    }

    #[test]
    fn test_no_integer_node_beats_incumbent() {
        let outcome = Solver::new().branch_and_bound(&knapsack_like()).unwrap();
        let best_z = outcome.best.as_ref().unwrap().objective_value;

        for node in outcome.tree.iter() {
            if node.status == NodeStatus::Integer {
                let z = node.relaxation.as_ref().unwrap().objective_value;
                assert!(z <= best_z + 1e-6, "node {} has Z = {} > {}", node.id, z, best_z);
            }
            // Children carry their parent's bounds plus one
            for child in &node.children {
                assert_eq!(child.added_constraints.len(), node.added_constraints.len() + 1);
                assert_eq!(child.added_constraints.last().copied(), child.bound);
            }
        }
        assert_eq!(outcome.nodes_explored, outcome.tree.len());
    }

    #[test]
    fn test_large_costs_keep_integral_root() {
        init();
        // Maximize 1e7 x1 + x2 subject to x2 >= 5, x1 + x2 <= 6, x1 <= 4
        let problem = Problem::maximize(
            vec![1e7, 1.0, 0.0],
            vec![
                Constraint::new(vec![0.0, 1.0, 0.0], Relation::Ge, 5.0),
                Constraint::new(vec![1.0, 1.0, 0.0], Relation::Le, 6.0),
                Constraint::new(vec![1.0, 0.0, 0.0], Relation::Le, 4.0),
            ],
        )
        .unwrap();
        let outcome = Solver::new().branch_and_bound(&problem).unwrap();

        assert_eq!(outcome.tree.status, NodeStatus::Integer);
        assert_eq!(outcome.nodes_explored, 1);

        let best = outcome.best.unwrap();
        assert_eq!(best.values, vec![1.0, 5.0, 0.0]);
        assert!((best.objective_value - 10_000_005.0).abs() < 1e-3, "Z = {}", best.objective_value);
    }

    #[test]
    fn test_no_integral_point() {
        // Maximize x1 + x2 subject to 2x1 = 1, x2 <= 3
        let problem = Problem::maximize(
            vec![1.0, 1.0],
            vec![
                Constraint::new(vec![2.0, 0.0], Relation::Eq, 1.0),
                Constraint::new(vec![0.0, 1.0], Relation::Le, 3.0),
            ],
        )
        .unwrap();
        let outcome = Solver::new().branch_and_bound(&problem).unwrap();

        assert!(outcome.best.is_none());
        assert_eq!(outcome.tree.status, NodeStatus::Branched);
        assert!(outcome.tree.children.iter().all(|c| c.status == NodeStatus::Infeasible));
        assert_eq!(outcome.tree.children[0].bound.unwrap().to_string(), "x1 <= 0");
        assert_eq!(outcome.tree.children[1].bound.unwrap().to_string(), "x1 >= 1");
    }

    #[test]
    fn test_minimize_integer() {
        // Minimize x1 + x2 subject to 2x1 + 2x2 >= 3: relaxation 1.5, integers need 2
        let problem = Problem::minimize(
            vec![1.0, 1.0],
            vec![Constraint::new(vec![2.0, 2.0], Relation::Ge, 3.0)],
        )
        .unwrap();
        let outcome = Solver::new().branch_and_bound(&problem).unwrap();

        let root_z = outcome.tree.relaxation.as_ref().unwrap().objective_value;
        let best = outcome.best.unwrap();
        assert!((root_z - 1.5).abs() < 1e-6);
        assert!((best.objective_value - 2.0).abs() < 1e-9, "Z = {}", best.objective_value);
        assert!(best.objective_value >= root_z);
    }

    #[test]
    fn test_depth_cap_marks_result_best_found() {
        let solver = Solver::with_options(SolverOptions::default().with_max_depth(0));
        let outcome = solver.branch_and_bound(&knapsack_like()).unwrap();

        assert!(outcome.truncated);
        assert!(outcome.best.is_none());
        assert_eq!(outcome.tree.status, NodeStatus::Processing);
        assert!(outcome.tree.relaxation.is_some());
    }

    #[test]
    fn test_cancellation_stops_expansion() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let flag = Arc::new(AtomicBool::new(true));
        let solver = Solver::new().with_cancel_flag(flag.clone());
        let outcome = solver.branch_and_bound(&knapsack_like()).unwrap();

        assert!(outcome.truncated);
        assert_eq!(outcome.nodes_explored, 0);
        assert_eq!(outcome.tree.status, NodeStatus::Processing);

        flag.store(false, Ordering::Relaxed);
        let outcome = solver.branch_and_bound(&knapsack_like()).unwrap();
        assert!(!outcome.truncated);
    }

    #[test]
    fn test_unbounded_relaxation_aborts() {
        let problem = Problem::maximize(
            vec![1.0, 1.0],
            vec![Constraint::new(vec![1.0, -1.0], Relation::Le, 0.5)],
        )
        .unwrap();
        let result = Solver::new().branch_and_bound(&problem);
        assert_eq!(result.unwrap_err(), SolveError::Unbounded);
    }
}
