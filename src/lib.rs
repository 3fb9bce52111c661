extern crate cfg_if;
extern crate chrono;
extern crate clap;
extern crate crossbeam_channel;
extern crate derivative;
extern crate log;
extern crate parking_lot;
extern crate pbr;
extern crate rand;
extern crate rand_xoshiro;
extern crate rayon;
extern crate serde;
#[macro_use]
extern crate serde_json;
extern crate thiserror;

pub mod apsp_solver;
pub mod cli;
pub mod communicator;
pub mod coordinator;
pub mod error;
pub mod example_graphs;
pub mod matrix;
pub mod matrix_io;
pub mod partition;
pub mod pivot;
pub mod relaxation;
pub mod util;
pub mod visualize;

use apsp_solver::*;
use error::Result;
use matrix::DistanceMatrix;

/// solve all-pairs shortest paths with `worker_num` cooperating workers
/// (to avoid creating a thread pool on every call, consider reusing a [`apsp_solver::SolverParallel`] object)
pub fn floyd_apsp(matrix: &DistanceMatrix, worker_num: usize) -> Result<DistanceMatrix> {
    SolverParallel::new(worker_num)?.solve(matrix)
}

#[cfg(test)]
mod tests {
    use super::util::*;
    use super::*;

    #[test]
    fn floyd_apsp_convenience() {
        // cargo test floyd_apsp_convenience -- --nocapture
        let matrix = DistanceMatrix::from_rows(&[vec![0, 5, 1], vec![UNREACHABLE, 0, UNREACHABLE], vec![UNREACHABLE, 2, 0]]).unwrap();
        let result = floyd_apsp(&matrix, 3).unwrap();
        assert_eq!(result.row(0), &[0, 3, 1]);
        assert_eq!(result.row(1), &[UNREACHABLE, 0, UNREACHABLE]);
        assert!(floyd_apsp(&matrix, 2).is_err());
    }
}
