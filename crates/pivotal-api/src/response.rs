use std::collections::BTreeMap;

use serde::Serialize;

use pivotal_solver::{
    BranchNode, ErrorDescriptor, ErrorKind, IterationRecord, NodeStatus, Pivot, PlotData, Solution, SolutionStatus,
    Strategy,
};

use crate::display::format_number;
use crate::request::RequestError;

/// HTTP-style status code plus the JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: SolveResponse,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SolveResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_solution: Option<SolutionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_data: Option<TreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual_solution: Option<SolutionBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<PlotData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

/// A solution flattened for display: variable values sit next to `Z`.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionBody {
    pub status: SolutionStatus,
    pub method: Strategy,
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
    /// Shadow price per constraint, keyed `c1..cM`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dual_values: Option<BTreeMap<String, f64>>,
    pub alternate_optima: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub iterations: Vec<RenderedIteration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedIteration {
    pub phase: String,
    pub iteration: usize,
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_info: Option<Pivot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    /// `Z` for the objective row, otherwise the basic column's label
    pub label: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub status: NodeStatus,
    pub depth: usize,
    /// Bound that created the node, e.g. `x1 <= 2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_info: Option<String>,
    pub constraints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<NodeSolution>,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSolution {
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Transport status for an engine error.
pub fn status_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::InvalidProblem | ErrorKind::InvalidMethod => 400,
        ErrorKind::Infeasible | ErrorKind::Unbounded | ErrorKind::CycleLimit => 422,
    }
}

impl ApiResponse {
    pub fn ok(body: SolveResponse) -> Self {
        Self { status_code: 200, body }
    }

    /// The request never reached the engine.
    pub fn rejected(err: &RequestError) -> Self {
        let descriptor = match err {
            RequestError::Problem(e) => e.descriptor(),
            other => ErrorDescriptor {
                kind: ErrorKind::InvalidProblem,
                message: other.to_string(),
            },
        };
        Self::failed(descriptor)
    }

    pub fn failed(error: ErrorDescriptor) -> Self {
        Self {
            status_code: status_code(error.kind),
            body: SolveResponse {
                status: error.message.clone(),
                error: Some(error),
                ..Default::default()
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.body)
    }
}

impl SolutionBody {
    pub fn from_solution(solution: &Solution) -> Self {
        let values = solution.named_values().map(|(name, v)| (name.to_string(), v)).collect();
        let dual_values = solution.dual_values.as_ref().map(|duals| {
            duals
                .iter()
                .enumerate()
                .map(|(i, y)| (format!("c{}", i + 1), *y))
                .collect()
        });

        Self {
            status: solution.status,
            method: solution.method,
            z: solution.objective_value,
            values,
            dual_values,
            alternate_optima: solution.alternate_optima,
            note: solution
                .alternate_optima
                .then(|| "Multiple optimal solutions exist; this is one of them".to_string()),
            iterations: solution.iterations.iter().map(render_iteration).collect(),
        }
    }
}

/// Tableau snapshot with fraction-formatted cells.
pub fn render_iteration(record: &IterationRecord) -> RenderedIteration {
    let tableau = &record.tableau;
    let headers = tableau.column_labels().into_iter().map(str::to_string).collect();

    let rows = (0..tableau.num_rows())
        .map(|i| {
            let label = if i == 0 {
                "Z".to_string()
            } else {
                tableau.columns()[record.basis.get(i - 1)].label.clone()
            };
            RenderedRow {
                label,
                values: tableau.row(i).iter().map(|v| format_number(*v)).collect(),
            }
        })
        .collect();

    RenderedIteration {
        phase: record.phase.label().to_string(),
        iteration: record.step,
        headers,
        rows,
        pivot_info: record.pivot,
    }
}

impl TreeNode {
    pub fn from_node(node: &BranchNode) -> Self {
        Self {
            id: node.id.clone(),
            status: node.status,
            depth: node.depth,
            branch_info: node.bound.map(|b| b.to_string()),
            constraints: node.added_constraints.iter().map(ToString::to_string).collect(),
            solution: node.relaxation.as_ref().map(|s| NodeSolution {
                z: s.objective_value,
                values: s.named_values().map(|(name, v)| (name.to_string(), v)).collect(),
            }),
            children: node.children.iter().map(TreeNode::from_node).collect(),
        }
    }
}
