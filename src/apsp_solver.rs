//! All-Pairs Shortest Path Solver
//!
//! This module includes the common usage of the algorithm: a serial solver running the whole matrix as a single block,
//! and a parallel solver that launches a group of workers running the coordinator in lock-step.
//!

use super::communicator::Universe;
use super::coordinator::Coordinator;
use super::error::{FloydError, Result};
use super::matrix::DistanceMatrix;
use super::partition::*;
use super::relaxation::floyd_warshall_serial;
use super::visualize::*;
use crate::derivative::Derivative;
use crate::parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub trait ShortestPathSolver {
    /// compute the length of the shortest path between every ordered pair of vertices
    fn solve(&mut self, matrix: &DistanceMatrix) -> Result<DistanceMatrix> {
        self.solve_visualizer(matrix, None)
    }
    fn solve_visualizer(&mut self, matrix: &DistanceMatrix, visualizer: Option<&mut Visualizer>) -> Result<DistanceMatrix>;
    /// statistics of the last run
    fn generate_profiler_report(&self) -> serde_json::Value;
}

/// a serial solver
#[derive(Debug, Default)]
pub struct SolverSerial {
    /// wall time of the last run in seconds
    last_solve_time: Option<f64>,
}

impl SolverSerial {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShortestPathSolver for SolverSerial {
    fn solve_visualizer(&mut self, matrix: &DistanceMatrix, visualizer: Option<&mut Visualizer>) -> Result<DistanceMatrix> {
        // same preconditions as a single parallel worker
        BlockPartition::new(matrix.vertex_num(), 1)?;
        let begin = Instant::now();
        let result = floyd_warshall_serial(matrix.clone());
        self.last_solve_time = Some(begin.elapsed().as_secs_f64());
        if let Some(visualizer) = visualizer {
            visualizer.snapshot("input".to_string(), matrix)?;
            visualizer.snapshot("result".to_string(), &result)?;
        }
        Ok(result)
    }

    fn generate_profiler_report(&self) -> serde_json::Value {
        json!({
            "worker_num": 1,
            "solve_time": self.last_solve_time,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverParallelConfig {
    /// the number of cooperating workers, must divide the vertex count
    #[serde(default = "solver_parallel_default_configs::worker_num")]
    pub worker_num: usize,
    /// every worker needs its own thread, so a nonzero size must be at least `worker_num`
    #[serde(default = "solver_parallel_default_configs::thread_pool_size")]
    pub thread_pool_size: usize,
    /// print the full matrix after every pivot, for debugging only
    #[serde(default = "solver_parallel_default_configs::show_intermediate")]
    pub show_intermediate: bool,
}

pub mod solver_parallel_default_configs {
    pub fn worker_num() -> usize {
        1
    } // by default a single worker holding the whole matrix
    pub fn thread_pool_size() -> usize {
        0
    } // by default exactly one thread per worker
    pub fn show_intermediate() -> bool {
        cfg!(feature = "show_intermediate_matrices")
    }
}

impl Default for SolverParallelConfig {
    fn default() -> Self {
        Self {
            worker_num: solver_parallel_default_configs::worker_num(),
            thread_pool_size: solver_parallel_default_configs::thread_pool_size(),
            show_intermediate: solver_parallel_default_configs::show_intermediate(),
        }
    }
}

/// launches `worker_num` workers on a dedicated thread pool, each owning one block of rows
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SolverParallel {
    pub config: SolverParallelConfig,
    /// thread pool used to run the workers concurrently
    #[derivative(Debug = "ignore")]
    thread_pool: rayon::ThreadPool,
    /// statistics of the last run
    last_profile: Option<serde_json::Value>,
}

impl SolverParallel {
    /// recommended way to create a new instance, given a customized configuration
    pub fn new_config(config: SolverParallelConfig) -> Result<Self> {
        if config.worker_num == 0 {
            return Err(FloydError::Config("at least one worker required".to_string()));
        }
        if config.thread_pool_size != 0 && config.thread_pool_size < config.worker_num {
            return Err(FloydError::Config(format!(
                "thread pool of {} cannot run {} workers concurrently",
                config.thread_pool_size, config.worker_num
            )));
        }
        let thread_num = if config.thread_pool_size == 0 {
            config.worker_num
        } else {
            config.thread_pool_size
        };
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_num)
            .thread_name(|index| format!("floyd-worker-{index}"))
            .build()
            .map_err(|err| FloydError::ThreadPool(err.to_string()))?;
        Ok(Self {
            config,
            thread_pool,
            last_profile: None,
        })
    }

    pub fn new(worker_num: usize) -> Result<Self> {
        Self::new_config(SolverParallelConfig {
            worker_num,
            ..Default::default()
        })
    }

    /// build from a JSON configuration, missing fields take their default values
    pub fn new_json(config: serde_json::Value) -> Result<Self> {
        let config: SolverParallelConfig = serde_json::from_value(config)?;
        Self::new_config(config)
    }
}

impl ShortestPathSolver for SolverParallel {
    fn solve_visualizer(&mut self, matrix: &DistanceMatrix, mut visualizer: Option<&mut Visualizer>) -> Result<DistanceMatrix> {
        let worker_num = self.config.worker_num;
        // fail before any worker starts, so no collective is ever issued on a bad configuration
        let partition = BlockPartition::new(matrix.vertex_num(), worker_num)?;
        log::info!(
            "solving {} vertices with {} workers of {} rows each",
            partition.vertex_num(),
            worker_num,
            partition.block_size()
        );
        let begin = Instant::now();
        let show_intermediate = self.config.show_intermediate;
        let results: Vec<Mutex<Option<Result<Option<DistanceMatrix>>>>> = (0..worker_num).map(|_| Mutex::new(None)).collect();
        let mut input = Some(matrix.clone());
        self.thread_pool.scope(|scope| {
            for (mut communicator, slot) in Universe::create(worker_num).into_iter().zip(results.iter()) {
                let is_root = communicator.is_root(ROOT_RANK);
                let input = if is_root { input.take() } else { None };
                let visualizer = if is_root { visualizer.take() } else { None };
                scope.spawn(move |_| {
                    let mut coordinator = Coordinator::new(&mut communicator).with_visualizer(visualizer);
                    coordinator.show_intermediate = show_intermediate;
                    let result = coordinator.run(input);
                    if let Err(err) = &result {
                        log::debug!("worker {} failed: {}", communicator.rank(), err);
                    }
                    // drop the endpoints now so that peers waiting on this worker are released
                    drop(communicator);
                    *slot.lock() = Some(result);
                });
            }
        });
        let solve_time = begin.elapsed().as_secs_f64();
        let mut output = None;
        let mut errors = vec![];
        for slot in results.into_iter() {
            match slot.into_inner() {
                Some(Ok(Some(result))) => output = Some(result),
                Some(Ok(None)) => {}
                Some(Err(err)) => errors.push(err),
                None => errors.push(FloydError::ThreadPool("a worker never reported back".to_string())),
            }
        }
        if !errors.is_empty() {
            // the first failure causes a cascade of disconnects in its peers, report the cause
            let position = errors.iter().position(FloydError::is_root_cause).unwrap_or(0);
            return Err(errors.swap_remove(position));
        }
        let output = output.ok_or_else(|| FloydError::Config("root worker returned no matrix".to_string()))?;
        log::info!("solved {} vertices in {:.3e}s", partition.vertex_num(), solve_time);
        self.last_profile = Some(json!({
            "worker_num": worker_num,
            "vertex_num": partition.vertex_num(),
            "block_size": partition.block_size(),
            "solve_time": solve_time,
        }));
        Ok(output)
    }

    fn generate_profiler_report(&self) -> serde_json::Value {
        self.last_profile.clone().unwrap_or_else(|| json!({}))
    }
}

#[cfg(test)]
pub mod tests {
    use super::super::example_graphs::*;
    use super::super::relaxation::tests::*;
    use super::super::util::*;
    use super::*;

    fn solve_parallel(matrix: &DistanceMatrix, worker_num: usize) -> DistanceMatrix {
        SolverParallel::new(worker_num).unwrap().solve(matrix).unwrap()
    }

    fn assert_triangle_property(matrix: &DistanceMatrix) {
        let n = matrix.vertex_num();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    assert!(
                        matrix.get(i, j) <= path_through(matrix.get(i, k), matrix.get(k, j)),
                        "d({i},{j}) = {} > d({i},{k}) + d({k},{j})",
                        matrix.get(i, j)
                    );
                }
            }
        }
    }

    fn sample_graphs() -> Vec<DistanceMatrix> {
        let mut matrices = vec![];
        for (seed, probability) in [(1, 0.1), (2, 0.25), (3, 0.5), (4, 0.9)] {
            matrices.push(RandomGraph::new(12, probability, 30, seed).unwrap().adjacency_matrix().unwrap());
        }
        matrices.push(ChainGraph::new(12, 7).adjacency_matrix().unwrap());
        matrices.push(GridGraph::new(3, 4, 2).adjacency_matrix().unwrap());
        matrices.push(DistanceMatrix::new_unconnected(12));
        matrices
    }

    #[test]
    fn apsp_solver_serial_matches_reference() {
        // cargo test apsp_solver_serial_matches_reference -- --nocapture
        let mut solver = SolverSerial::new();
        for matrix in sample_graphs() {
            let result = solver.solve(&matrix).unwrap();
            assert_eq!(result.to_rows(), reference_floyd_warshall(&matrix));
        }
        assert!(solver.generate_profiler_report()["solve_time"].is_number());
    }

    #[test]
    fn apsp_solver_single_worker_matches_serial() {
        // cargo test apsp_solver_single_worker_matches_serial -- --nocapture
        for matrix in sample_graphs() {
            let serial = SolverSerial::new().solve(&matrix).unwrap();
            assert_eq!(solve_parallel(&matrix, 1), serial);
        }
    }

    #[test]
    fn apsp_solver_independent_of_partitioning() {
        // cargo test apsp_solver_independent_of_partitioning -- --nocapture
        for matrix in sample_graphs() {
            let single = solve_parallel(&matrix, 1);
            for worker_num in [2, 3, 4, 6, 12] {
                assert_eq!(solve_parallel(&matrix, worker_num), single, "{worker_num} workers differ");
            }
        }
    }

    #[test]
    fn apsp_solver_idempotent() {
        // cargo test apsp_solver_idempotent -- --nocapture
        for matrix in sample_graphs() {
            let once = solve_parallel(&matrix, 4);
            let twice = solve_parallel(&once, 4);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn apsp_solver_triangle_property() {
        // cargo test apsp_solver_triangle_property -- --nocapture
        for matrix in sample_graphs() {
            assert_triangle_property(&solve_parallel(&matrix, 3));
        }
    }

    #[test]
    fn apsp_solver_diagonal_stays_zero_every_pivot() {
        // cargo test apsp_solver_diagonal_stays_zero_every_pivot -- --nocapture
        if cfg!(feature = "disable_visualizer") {
            return;
        }
        let matrix = RandomGraph::new(8, 0.4, 10, 7).unwrap().adjacency_matrix().unwrap();
        let mut visualizer = Visualizer::new(None).unwrap();
        SolverParallel::new(4)
            .unwrap()
            .solve_visualizer(&matrix, Some(&mut visualizer))
            .unwrap();
        // input plus one snapshot per pivot
        assert_eq!(visualizer.snapshots().len(), 1 + 8);
        for (name, snapshot) in visualizer.snapshots() {
            for i in 0..8 {
                assert_eq!(snapshot["d"][i][i], json!(0), "diagonal broken at {name}");
            }
        }
    }

    #[test]
    fn apsp_solver_single_vertex() {
        // cargo test apsp_solver_single_vertex -- --nocapture
        let result = solve_parallel(&DistanceMatrix::new_unconnected(1), 1);
        assert_eq!(result.to_rows(), vec![vec![0]]);
    }

    #[test]
    fn apsp_solver_chain_of_four() {
        // cargo test apsp_solver_chain_of_four -- --nocapture
        let matrix = chain_of_four();
        let single = solve_parallel(&matrix, 1);
        assert_eq!(single.get(0, 3), 6);
        assert_eq!(single.get(0, 2), 5);
        assert_eq!(single.get(0, 1), 2);
        assert_eq!(single.get(1, 3), 4);
        for (i, j) in [(1, 0), (2, 0), (2, 1), (3, 0), (3, 1), (3, 2)] {
            assert_eq!(single.get(i, j), UNREACHABLE);
        }
        let double = solve_parallel(&matrix, 2);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(single.get(i, j), double.get(i, j), "entry ({i}, {j})");
            }
        }
    }

    #[test]
    fn apsp_solver_rejects_indivisible_partition() {
        // cargo test apsp_solver_rejects_indivisible_partition -- --nocapture
        let mut solver = SolverParallel::new(3).unwrap();
        let result = solver.solve(&chain_of_four());
        assert!(matches!(result, Err(FloydError::Config(_))));
    }

    #[test]
    fn apsp_solver_config() {
        // cargo test apsp_solver_config -- --nocapture
        let solver = SolverParallel::new_json(json!({})).unwrap();
        assert_eq!(solver.config.worker_num, 1);
        let solver = SolverParallel::new_json(json!({"worker_num": 4, "thread_pool_size": 8})).unwrap();
        assert_eq!(solver.config.worker_num, 4);
        assert!(matches!(
            SolverParallel::new_json(json!({"worker_num": 4, "thread_pool_size": 2})),
            Err(FloydError::Config(_))
        ));
        assert!(matches!(SolverParallel::new(0), Err(FloydError::Config(_))));
        assert!(matches!(
            SolverParallel::new_json(json!({"workers": 4})),
            Err(FloydError::SerdeJson(_))
        ));
    }

    #[test]
    fn apsp_solver_profiler_report() {
        // cargo test apsp_solver_profiler_report -- --nocapture
        let mut solver = SolverParallel::new(2).unwrap();
        assert_eq!(solver.generate_profiler_report(), json!({}));
        solver.solve(&ChainGraph::new(6, 1).adjacency_matrix().unwrap()).unwrap();
        let report = solver.generate_profiler_report();
        assert_eq!(report["worker_num"], json!(2));
        assert_eq!(report["block_size"], json!(3));
    }
}
