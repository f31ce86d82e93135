use pivotal_solver::{Problem, Solution, Solver, Strategy};

use crate::request::{RequestError, SolveRequest};
use crate::response::{ApiResponse, SolutionBody, SolveResponse, TreeNode};

/// Decode a JSON request body and solve it.
pub fn handle(body: &str) -> ApiResponse {
    match SolveRequest::from_json(body) {
        Ok(request) => handle_request(&request),
        Err(e) => {
            log::info!("rejected request: {}", e);
            ApiResponse::rejected(&e)
        }
    }
}

pub fn handle_request(request: &SolveRequest) -> ApiResponse {
    let (problem, strategy) = match prepare(request) {
        Ok(prepared) => prepared,
        Err(e) => {
            log::info!("rejected request: {}", e);
            return ApiResponse::rejected(&e);
        }
    };

    let solver = Solver::with_options(request.options.clone());
    let report = solver.report(&problem, strategy, request.integer);
    let outcome = match report.result {
        Ok(outcome) => outcome,
        Err(error) => return ApiResponse::failed(error),
    };

    let best = outcome.integer.as_ref().and_then(|search| search.best.as_ref());
    let mut body = SolveResponse {
        status: report.status_text,
        solution: Some(SolutionBody::from_solution(&outcome.solution)),
        integer_solution: best.map(SolutionBody::from_solution),
        tree_data: outcome.integer.as_ref().map(|search| TreeNode::from_node(&search.tree)),
        ..Default::default()
    };

    if request.dual {
        body.dual_solution = solve_dual(&solver, &problem).as_ref().map(SolutionBody::from_solution);
    }

    if problem.num_variables() == 2 {
        match solver.plot_data(&problem, Some(&outcome.solution), best) {
            Ok(plot) => body.plot = Some(plot),
            Err(e) => log::warn!("no plot data: {}", e),
        }
    }

    ApiResponse::ok(body)
}

/// Check a request without solving it; returns one message per problem found.
pub fn validate(body: &str) -> Vec<String> {
    match SolveRequest::from_json(body).and_then(|request| prepare(&request)) {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    }
}

fn prepare(request: &SolveRequest) -> Result<(Problem, Strategy), RequestError> {
    Ok((request.to_problem()?, request.strategy()?))
}

fn solve_dual(solver: &Solver, problem: &Problem) -> Option<Solution> {
    match solver.solve_dual(problem) {
        Ok(solution) => Some(solution),
        Err(e) => {
            log::warn!("dual problem could not be solved: {}", e);
            None
        }
    }
}
