use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use pivotal_api::{ApiResponse, RenderedIteration, SolutionBody, SolveRequest, TreeNode};

#[derive(Parser)]
#[command(name = "pivotal")]
#[command(about = "Solve linear programs with the simplex, graphical and branch-and-bound methods", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the problem in a JSON request file
    Solve {
        /// The request file
        file: PathBuf,
        /// Override the request's method (auto, standard, two_phase, big_m, graphical)
        #[arg(short, long)]
        method: Option<String>,
        /// Require integral values
        #[arg(short, long)]
        integer: bool,
        /// Also solve the dual problem
        #[arg(short, long)]
        dual: bool,
        /// Print every tableau
        #[arg(short, long)]
        steps: bool,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check a request file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Commands::Solve { file, method, integer, dual, steps, format } => {
            let source = read_file(&file);

            let mut request = match SolveRequest::from_json(&source) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Request error: {}", e);
                    std::process::exit(1);
                }
            };
            if method.is_some() {
                request.method = method;
            }
            request.integer |= integer;
            request.dual |= dual;

            let response = pivotal_api::handle_request(&request);

            if format == "json" {
                match response.to_json_pretty() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error encoding response: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_pretty(&response, steps);
            }

            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let source = read_file(&file);

            let problems = pivotal_api::validate(&source);
            if problems.is_empty() {
                if let Ok(problem) = SolveRequest::from_json(&source).and_then(|r| r.to_problem()) {
                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", problem.num_variables());
                    println!("  {} constraints", problem.num_constraints());
                }
            } else {
                eprintln!("✗ {} has errors:", file.display());
                for p in &problems {
                    eprintln!("  {}", p);
                }
                std::process::exit(1);
            }
        }
    }
}

fn read_file(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_pretty(response: &ApiResponse, steps: bool) {
    let body = &response.body;
    println!("Status: {}", body.status);

    if let Some(error) = &body.error {
        println!("{:?}: {}", error.kind, error.message);
        return;
    }

    if let Some(solution) = &body.solution {
        println!();
        print_solution("Relaxation", solution);
        if steps {
            for iteration in &solution.iterations {
                print_iteration(iteration);
            }
        }
    }

    if let Some(tree) = &body.tree_data {
        println!();
        println!("Branch-and-bound tree:");
        print_tree(tree, 1);
    }

    if let Some(integer) = &body.integer_solution {
        println!();
        print_solution("Integer solution", integer);
    } else if body.tree_data.is_some() {
        println!();
        println!("No integer solution found.");
    }

    if let Some(dual) = &body.dual_solution {
        println!();
        print_solution("Dual", dual);
    }
}

fn print_solution(title: &str, solution: &SolutionBody) {
    println!("{} ({}, {:?}):", title, solution.method, solution.status);
    println!("  {:10} {:>12.4}", "Z", solution.z);
    for (name, value) in &solution.values {
        println!("  {:10} {:>12.4}", name, value);
    }

    if let Some(duals) = &solution.dual_values {
        println!("  Shadow prices:");
        for (name, value) in duals {
            println!("    {:8} {:>12.4}", name, value);
        }
    }

    if let Some(note) = &solution.note {
        println!("  Note: {}", note);
    }
}

fn print_iteration(iteration: &RenderedIteration) {
    println!();
    match &iteration.pivot_info {
        Some(p) => println!("{} - step {} (pivot row {}, column {})", iteration.phase, iteration.iteration, p.row, p.col),
        None => println!("{} - step {} (final)", iteration.phase, iteration.iteration),
    }

    print!("  {:>6}", "");
    for h in &iteration.headers {
        print!(" {:>10}", h);
    }
    println!();
    for row in &iteration.rows {
        print!("  {:>6}", row.label);
        for v in &row.values {
            print!(" {:>10}", v);
        }
        println!();
    }
}

fn print_tree(node: &TreeNode, indent: usize) {
    let bound = node.branch_info.as_deref().map(|b| format!(" [{}]", b)).unwrap_or_default();
    let z = node.solution.as_ref().map(|s| format!(" Z = {:.4}", s.z)).unwrap_or_default();
    println!("{}{}{} {:?}{}", "  ".repeat(indent), node.id, bound, node.status, z);
    for child in &node.children {
        print_tree(child, indent + 1);
    }
}
