use super::apsp_solver::*;
use super::error::Result;
use super::example_graphs::*;
use super::matrix::DistanceMatrix;
use super::matrix_io::*;
use super::util::*;
use super::visualize::*;
use clap::{Parser, Subcommand, ValueEnum};
use pbr::ProgressBar;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Parser, Clone, Debug)]
#[clap(author = clap::crate_authors!(", "))]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(about = "All-pairs shortest paths with a block-row parallel Floyd-Warshall algorithm")]
#[clap(color = clap::ColorChoice::Auto)]
#[clap(propagate_version = true)]
#[clap(subcommand_required = true)]
#[clap(arg_required_else_help = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixFormat {
    /// vertex count followed by the row-major entries, `i` for unreachable in the output
    Text,
    /// serialized [`DistanceMatrix`]
    Json,
}

#[derive(Subcommand, Clone, Debug)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// read an adjacency matrix, print the matrix of shortest path lengths
    Solve {
        /// input file, read from stdin if not provided
        #[clap(short = 'i', long)]
        input: Option<String>,
        /// the number of workers, overriding `worker_num` in the solver config
        #[clap(short = 'p', long)]
        workers: Option<usize>,
        /// solver configuration in json, e.g. `{"worker_num":4,"show_intermediate":true}`
        #[clap(long, default_value_t = ("{}").to_string())]
        solver_config: String,
        /// use the serial solver instead of the parallel one
        #[clap(long, action)]
        serial: bool,
        #[clap(long, value_enum, default_value = "text")]
        input_format: MatrixFormat,
        #[clap(long, value_enum, default_value = "text")]
        output_format: MatrixFormat,
        /// record the matrix after every pivot into a visualizer file
        #[clap(long, action)]
        enable_visualizer: bool,
        /// the visualizer file, a timestamped file under the default data folder if not provided
        #[clap(long)]
        visualizer_filename: Option<String>,
    },
    /// benchmark the solver on random graphs
    Benchmark {
        /// the number of vertices of each random graph
        #[clap(value_parser)]
        vertex_num: VertexNum,
        /// probability of each directed edge being present
        #[clap(value_parser)]
        edge_probability: f64,
        /// the number of workers, overriding `worker_num` in the solver config
        #[clap(short = 'p', long)]
        workers: Option<usize>,
        /// rounds to run, each on a different random graph
        #[clap(short = 'r', long, default_value_t = 100)]
        total_rounds: usize,
        #[clap(long, default_value_t = 100)]
        max_weight: Weight,
        /// the random graph of round `r` uses seed `starting_seed + r`
        #[clap(long, default_value_t = 0)]
        starting_seed: u64,
        #[clap(long, default_value_t = ("{}").to_string())]
        solver_config: String,
        #[clap(long, action)]
        serial: bool,
        /// compare every result with the serial solver
        #[clap(long, action)]
        verify: bool,
        /// print the profile of each round as a json line into this file
        #[clap(long)]
        profiler_output: Option<String>,
        #[clap(long, action)]
        disable_progress_bar: bool,
    },
    /// print a random graph in the console input format
    Generate {
        #[clap(value_parser)]
        vertex_num: VertexNum,
        #[clap(value_parser)]
        edge_probability: f64,
        #[clap(long, default_value_t = 100)]
        max_weight: Weight,
        #[clap(long, default_value_t = 0)]
        seed: u64,
        #[clap(long, value_enum, default_value = "text")]
        output_format: MatrixFormat,
    },
}

/// the parallel solver config with an optional override of the worker count
fn build_solver(serial: bool, workers: Option<usize>, solver_config: &str) -> Result<Box<dyn ShortestPathSolver>> {
    if serial {
        return Ok(Box::new(SolverSerial::new()));
    }
    let mut config: serde_json::Value = serde_json::from_str(solver_config)?;
    if let (Some(workers), Some(object)) = (workers, config.as_object_mut()) {
        object.insert("worker_num".to_string(), json!(workers));
    }
    Ok(Box::new(SolverParallel::new_json(config)?))
}

fn load_matrix(input: Option<&str>, format: MatrixFormat) -> Result<DistanceMatrix> {
    match (input, format) {
        (Some(filename), MatrixFormat::Text) => read_matrix(BufReader::new(File::open(filename)?)),
        (Some(filename), MatrixFormat::Json) => read_matrix_json(BufReader::new(File::open(filename)?)),
        (None, MatrixFormat::Text) => read_matrix(std::io::stdin().lock()),
        (None, MatrixFormat::Json) => read_matrix_json(std::io::stdin().lock()),
    }
}

fn print_matrix(matrix: &DistanceMatrix, format: MatrixFormat) -> Result<()> {
    let stdout = std::io::stdout();
    match format {
        MatrixFormat::Text => write_matrix(stdout.lock(), matrix),
        MatrixFormat::Json => write_matrix_json(stdout.lock(), matrix),
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Solve {
                input,
                workers,
                solver_config,
                serial,
                input_format,
                output_format,
                enable_visualizer,
                visualizer_filename,
            } => {
                let mut solver = build_solver(serial, workers, &solver_config)?;
                let matrix = load_matrix(input.as_deref(), input_format)?;
                let mut visualizer = None;
                if enable_visualizer {
                    let filename =
                        visualizer_filename.unwrap_or_else(|| visualize_data_folder() + auto_visualize_data_filename().as_str());
                    if let Some(folder) = Path::new(&filename).parent() {
                        std::fs::create_dir_all(folder)?;
                    }
                    log::info!("visualizer file: {filename}");
                    visualizer = Some(Visualizer::new(Some(filename))?);
                }
                let result = solver.solve_visualizer(&matrix, visualizer.as_mut())?;
                print_matrix(&result, output_format)?;
            }
            Commands::Benchmark {
                vertex_num,
                edge_probability,
                workers,
                total_rounds,
                max_weight,
                starting_seed,
                solver_config,
                serial,
                verify,
                profiler_output,
                disable_progress_bar,
            } => {
                let mut solver = build_solver(serial, workers, &solver_config)?;
                let mut verifier = verify.then(SolverSerial::new);
                let profiler_header = json!({
                    "vertex_num": vertex_num,
                    "edge_probability": edge_probability,
                    "total_rounds": total_rounds,
                    "serial": serial,
                    "solver_config": serde_json::from_str::<serde_json::Value>(&solver_config)?,
                });
                let mut benchmark_profiler = BenchmarkProfiler::new(profiler_output.map(|filename| (filename, profiler_header)))?;
                let mut pb = (!disable_progress_bar).then(|| ProgressBar::on(std::io::stderr(), total_rounds as u64));
                for round in 0..total_rounds {
                    if let Some(pb) = pb.as_mut() {
                        pb.set(round as u64);
                    }
                    let graph = RandomGraph::new(vertex_num, edge_probability, max_weight, starting_seed + round as u64)?;
                    let matrix = graph.adjacency_matrix()?;
                    benchmark_profiler.begin(&matrix);
                    let result = solver.solve(&matrix)?;
                    benchmark_profiler.end(Some(&*solver))?;
                    if let Some(pb) = pb.as_mut() {
                        pb.message(format!("{} ", benchmark_profiler.brief()).as_str());
                    }
                    if let Some(verifier) = verifier.as_mut() {
                        assert_eq!(result, verifier.solve(&matrix)?, "mismatch at round {round}");
                    }
                }
                if let Some(mut pb) = pb {
                    pb.finish();
                }
                println!("{}", benchmark_profiler.brief());
            }
            Commands::Generate {
                vertex_num,
                edge_probability,
                max_weight,
                seed,
                output_format,
            } => {
                let matrix = RandomGraph::new(vertex_num, edge_probability, max_weight, seed)?.adjacency_matrix()?;
                match output_format {
                    MatrixFormat::Text => print!("{}", format_input(&matrix)),
                    MatrixFormat::Json => print_matrix(&matrix, MatrixFormat::Json)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::error::FloydError;
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_consistent() {
        // cargo test cli_parser_consistent -- --nocapture
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parse_solve() {
        // cargo test cli_parse_solve -- --nocapture
        let cli = Cli::parse_from(["parallel_floyd", "solve", "-p", "4", "--output-format", "json"]);
        match cli.command {
            Commands::Solve {
                workers,
                output_format,
                input,
                serial,
                ..
            } => {
                assert_eq!(workers, Some(4));
                assert_eq!(output_format, MatrixFormat::Json);
                assert_eq!(input, None);
                assert!(!serial);
            }
            _ => unreachable!(),
        }
        assert!(Cli::try_parse_from(["parallel_floyd", "solve", "--output-format", "xml"]).is_err());
    }

    #[test]
    fn cli_build_solver() {
        // cargo test cli_build_solver -- --nocapture
        let matrix = RandomGraph::new(6, 0.5, 9, 3).unwrap().adjacency_matrix().unwrap();
        let expected = SolverSerial::new().solve(&matrix).unwrap();
        let mut solver = build_solver(false, Some(3), r#"{"thread_pool_size":0}"#).unwrap();
        assert_eq!(solver.solve(&matrix).unwrap(), expected);
        assert_eq!(solver.generate_profiler_report()["worker_num"], json!(3));
        assert!(build_solver(false, None, r#"{"unknown":1}"#).is_err());
        assert!(build_solver(true, None, "not json").is_ok());
    }

    #[test]
    fn cli_rejects_bad_graph_parameters() {
        // cargo test cli_rejects_bad_graph_parameters -- --nocapture
        let cli = Cli::parse_from(["parallel_floyd", "generate", "4", "1.5"]);
        assert!(matches!(cli.run(), Err(FloydError::Config(_))));
        let cli = Cli::parse_from(["parallel_floyd", "benchmark", "4", "0.5", "--max-weight", "0", "--disable-progress-bar"]);
        assert!(matches!(cli.run(), Err(FloydError::Config(_))));
    }
}
