pub mod display;
pub mod handler;
pub mod request;
pub mod response;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use display::{format_decimal, format_number};
pub use handler::{handle, handle_request, validate};
pub use request::{ConstraintSpec, Objective, RequestError, Sign, SolveRequest};
pub use response::{
    render_iteration, status_code, ApiResponse, NodeSolution, RenderedIteration, RenderedRow, SolutionBody, SolveResponse,
    TreeNode,
};
