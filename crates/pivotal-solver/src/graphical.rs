//! Vertex enumeration for two-variable problems.
//!
//! Every constraint boundary and both axes are intersected pairwise; the feasible
//! intersections are the corners of the feasible polygon, and the best corner is optimal
//! unless the region is open in an improving direction.

use crate::method::{clean, satisfies, Strategy};
use crate::options::Tolerances;
use crate::problem::{Problem, Relation};
use crate::solution::{Solution, SolutionStatus, SolveError};
use crate::Solver;

/// A point `(x1, x2)`.
pub type Point = [f64; 2];

/// Coordinates handed to whoever draws the feasible region.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotData {
    /// Feasible vertices, counter-clockwise around their centroid
    pub vertices: Vec<Point>,
    pub optimum: Option<Point>,
    pub integer_point: Option<Point>,
}

/// The line `a * x1 + b * x2 = c`.
#[derive(Debug, Clone, Copy)]
struct Line {
    a: f64,
    b: f64,
    c: f64,
}

fn require_two_variables(problem: &Problem) -> Result<(), SolveError> {
    if problem.num_variables() != 2 {
        return Err(SolveError::InvalidProblem(format!(
            "the graphical method needs exactly 2 variables, got {}",
            problem.num_variables()
        )));
    }
    Ok(())
}

fn boundary_lines(problem: &Problem) -> Vec<Line> {
    let mut lines: Vec<Line> = problem
        .constraints()
        .iter()
        .map(|c| Line {
            a: c.coefficients[0],
            b: c.coefficients[1],
            c: c.rhs,
        })
        .collect();
    lines.push(Line { a: 1.0, b: 0.0, c: 0.0 });
    lines.push(Line { a: 0.0, b: 1.0, c: 0.0 });
    lines
}

/// Pairwise intersections in pair order, skipping parallel pairs and merging duplicates.
fn intersections(lines: &[Line], tol: &Tolerances) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::new();

    for (i, l1) in lines.iter().enumerate() {
        for l2 in &lines[i + 1..] {
            let det = l1.a * l2.b - l1.b * l2.a;
            if det.abs() < tol.pivot {
                continue;
            }
            let x1 = (l1.c * l2.b - l1.b * l2.c) / det;
            let x2 = (l1.a * l2.c - l1.c * l2.a) / det;

            let duplicate = points
                .iter()
                .any(|p| (p[0] - x1).abs() <= tol.vertex && (p[1] - x2).abs() <= tol.vertex);
            if !duplicate {
                points.push([x1, x2]);
            }
        }
    }

    points
}

fn is_feasible(problem: &Problem, point: &Point, tol: &Tolerances) -> bool {
    point.iter().all(|&v| v >= -tol.feasibility)
        && problem
            .constraints()
            .iter()
            .all(|c| satisfies(c, point, tol.feasibility))
}

/// Feasible corners of a two-variable problem, in discovery order.
pub fn feasible_vertices(problem: &Problem, tol: &Tolerances) -> Result<Vec<Point>, SolveError> {
    require_two_variables(problem)?;

    let vertices: Vec<Point> = intersections(&boundary_lines(problem), tol)
        .into_iter()
        .filter(|p| is_feasible(problem, p, tol))
        .map(|[x1, x2]| [clean(x1, tol.feasibility), clean(x2, tol.feasibility)])
        .collect();

    Ok(vertices)
}

/// Extreme rays of the feasible region's recession cone.
///
/// The cone lies in the first quadrant, so its extreme rays are among the axis
/// directions and the directions of the constraint lines.
fn recession_rays(problem: &Problem, tol: &Tolerances) -> Vec<Point> {
    let mut candidates: Vec<Point> = vec![[1.0, 0.0], [0.0, 1.0]];
    for c in problem.constraints() {
        let (a, b) = (c.coefficients[0], c.coefficients[1]);
        let norm = a.hypot(b);
        if norm > tol.pivot {
            candidates.push([b / norm, -a / norm]);
            candidates.push([-b / norm, a / norm]);
        }
    }

    candidates.retain(|d| {
        d.iter().all(|&v| v >= -tol.feasibility)
            && problem.constraints().iter().all(|c| {
                let along = c.activity(d);
                match c.relation {
                    Relation::Le => along <= tol.feasibility,
                    Relation::Ge => along >= -tol.feasibility,
                    Relation::Eq => along.abs() <= tol.feasibility,
                }
            })
    });
    candidates
}

impl Solver {
    pub(crate) fn graphical(&self, problem: &Problem) -> Result<Solution, SolveError> {
        let tol = self.options().tolerances;
        let vertices = feasible_vertices(problem, &tol)?;
        if vertices.is_empty() {
            return Err(SolveError::Infeasible("the feasible region has no vertices".to_string()));
        }
        log::debug!("graphical method found {} feasible vertices", vertices.len());

        let objective = problem.normalized_objective();
        let score = |p: &Point| objective[0] * p[0] + objective[1] * p[1];

        let mut best = vertices[0];
        let mut best_value = score(&best);
        for vertex in &vertices[1..] {
            let value = score(vertex);
            if value > best_value {
                best_value = value;
                best = *vertex;
            }
        }

        let rays = recession_rays(problem, &tol);
        if let Some(ray) = rays.iter().find(|&d| score(d) > tol.degeneracy) {
            log::info!("feasible region is open along ({:.4}, {:.4})", ray[0], ray[1]);
            return Err(SolveError::Unbounded);
        }

        // A tied vertex or a flat ray leaving the optimum both give other optimal points
        let tie = tol.degeneracy * (1.0 + best_value.abs());
        let alternate_optima = vertices
            .iter()
            .any(|v| *v != best && (score(v) - best_value).abs() <= tie)
            || rays.iter().any(|d| score(d).abs() <= tol.degeneracy);

        let values = best.to_vec();
        let objective_value = problem.evaluate(&values);
        log::info!("{} finished with Z = {}", Strategy::Graphical, objective_value);

        Ok(Solution {
            status: SolutionStatus::Optimal,
            method: Strategy::Graphical,
            variables: problem.variable_names(),
            values,
            objective_value,
            dual_values: None,
            iterations: Vec::new(),
            alternate_optima,
        })
    }

    /// Drawing data for a two-variable problem: its feasible polygon and the chosen points.
    pub fn plot_data(
        &self,
        problem: &Problem,
        optimum: Option<&Solution>,
        integer: Option<&Solution>,
    ) -> Result<PlotData, SolveError> {
        let mut vertices = feasible_vertices(problem, &self.options().tolerances)?;
        sort_counter_clockwise(&mut vertices);

        let as_point = |s: &Solution| [s.values[0], s.values[1]];
        Ok(PlotData {
            vertices,
            optimum: optimum.map(as_point),
            integer_point: integer.map(as_point),
        })
    }
}

fn sort_counter_clockwise(points: &mut [Point]) {
    if points.is_empty() {
        return;
    }
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / n;
    points.sort_by(|p, q| {
        let ap = (p[1] - cy).atan2(p[0] - cx);
        let aq = (q[1] - cy).atan2(q[0] - cx);
        ap.total_cmp(&aq)
    });
}
