use std::process::exit;

use clap::Parser;

use treewidth_tsp::file_handler::graph_handler::{export_graph, import_graph, ImportOptions};
use treewidth_tsp::tour_dp::tour_dp::{solve, SolveOptions};

/// Computes an optimal travelling salesman tour of a graph by dynamic
/// programming over the tree decomposition supplied with it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the instance file (graph plus tree decomposition)
    fname: String,
    /// The bag to root the decomposition at (bag 0 if not given)
    #[clap(short, long)]
    root: Option<u64>,
    /// The largest bag width the solver accepts
    #[clap(short, long, default_value = "12")]
    width_limit: usize,
    /// The vertex id the instance file starts counting from
    #[clap(long, default_value = "0")]
    vid_start: i64,
    /// Re-emit the parsed instance to this path in normalised form
    #[clap(short, long)]
    save: Option<String>,
}

fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    let args = Args::parse();

    let options = ImportOptions {
        vid_start: args.vid_start,
    };
    let (graph, decomposition) = match import_graph(&args.fname, &options) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}: {}", args.fname, e);
            exit(1);
        }
    };
    let decomposition = match decomposition {
        Some(d) => d,
        None => {
            eprintln!("{}: instance carries no tree decomposition", args.fname);
            exit(2);
        }
    };

    if let Some(path) = &args.save {
        if let Err(e) = export_graph(path, &graph, Some(&decomposition), true) {
            eprintln!("{}: {}", path, e);
            exit(1);
        }
    }

    let solve_options = SolveOptions {
        root: args.root,
        width_limit: args.width_limit,
    };
    match solve(&graph, &decomposition, &solve_options) {
        Ok(solution) if solution.is_tour() => {
            let edges: Vec<(usize, usize)> = solution
                .edges
                .iter()
                .map(|&(a, b)| (a.index(), b.index()))
                .collect();
            println!("TSP cost: {}", solution.cost);
            println!("Tour: {:?}", edges);
        }
        Ok(_) => {
            println!("TSP cost: infinity (no tour)");
            exit(3);
        }
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    }
}
