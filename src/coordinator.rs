//! Coordinator
//!
//! The driver every worker runs in lock-step: the root broadcasts the vertex count, distributes the matrix,
//! then for each pivot `k = 0, ..., n-1` the pivot row is broadcast and every worker relaxes its own rows,
//! and finally the blocks are collected back at the root.
//!
//! The state only ever moves forward: `Uninitialized → Distributing → Iterating(0..n) → Collecting → Done`.
//!

use super::communicator::Communicator;
use super::error::{FloydError, Result};
use super::matrix::*;
use super::matrix_io::format_matrix;
use super::partition::*;
use super::pivot::broadcast_pivot_row;
use super::relaxation::relax;
use super::util::*;
use super::visualize::Visualizer;
use crate::derivative::Derivative;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Uninitialized,
    Distributing,
    /// relaxing against pivot `k`
    Iterating(VertexIndex),
    Collecting,
    Done,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Coordinator<'a> {
    communicator: &'a mut Communicator,
    state: CoordinatorState,
    /// gather and print the full matrix after every pivot, for debugging only
    pub show_intermediate: bool,
    /// snapshots of the full matrix after every pivot; only meaningful at the root
    #[derivative(Debug = "ignore")]
    visualizer: Option<&'a mut Visualizer>,
}

impl<'a> Coordinator<'a> {
    pub fn new(communicator: &'a mut Communicator) -> Self {
        Self {
            communicator,
            state: CoordinatorState::Uninitialized,
            show_intermediate: cfg!(feature = "show_intermediate_matrices"),
            visualizer: None,
        }
    }

    /// attach a visualizer; the root records the input and the matrix after every pivot
    pub fn with_visualizer(mut self, visualizer: Option<&'a mut Visualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    fn transit(&mut self, state: CoordinatorState) {
        log::debug!("worker {}: {:?} -> {:?}", self.communicator.rank(), self.state, state);
        self.state = state;
    }

    fn is_root(&self) -> bool {
        self.communicator.is_root(ROOT_RANK)
    }

    /// run the whole algorithm; `matrix` must be `Some` at the root, which also receives the result
    pub fn run(&mut self, matrix: Option<DistanceMatrix>) -> Result<Option<DistanceMatrix>> {
        if self.state != CoordinatorState::Uninitialized {
            return Err(FloydError::Config(format!("a coordinator runs only once, found it {:?}", self.state)));
        }
        self.transit(CoordinatorState::Distributing);
        let matrix = if self.is_root() {
            let matrix = matrix.ok_or_else(|| FloydError::Config("root worker has no input matrix".to_string()))?;
            if let Some(visualizer) = self.visualizer.as_mut() {
                visualizer.snapshot("input".to_string(), &matrix)?;
            }
            Some(matrix)
        } else {
            None
        };
        // the root also decides whether every pivot round ends with an extra gather
        let report_intermediate = self.show_intermediate || self.visualizer.is_some();
        let header = matrix.as_ref().map(|matrix| (matrix.vertex_num(), report_intermediate));
        let (vertex_num, report_intermediate) = self.communicator.broadcast(header, ROOT_RANK)?;
        // identical on every worker, so either all proceed or all stop here
        let partition = BlockPartition::new(vertex_num, self.communicator.size())?;
        let mut block = scatter_matrix(self.communicator, &partition, matrix)?;
        for pivot in 0..vertex_num {
            self.transit(CoordinatorState::Iterating(pivot));
            let pivot_row = broadcast_pivot_row(self.communicator, &partition, &block, pivot)?;
            relax(&mut block, &pivot_row, pivot);
            if report_intermediate {
                self.report_intermediate(&partition, &block, pivot)?;
            }
        }
        self.transit(CoordinatorState::Collecting);
        let result = gather_matrix(self.communicator, &partition, block)?;
        self.transit(CoordinatorState::Done);
        Ok(result)
    }

    /// collective: the root assembles a copy of the current matrix
    fn report_intermediate(&mut self, partition: &BlockPartition, block: &LocalBlock, pivot: VertexIndex) -> Result<()> {
        if let Some(matrix) = gather_matrix(self.communicator, partition, block.clone())? {
            if self.show_intermediate {
                eprint!("After pivot = {}\n{}", pivot, format_matrix(&matrix));
            }
            log::debug!("matrix after pivot {}:\n{}", pivot, format_matrix(&matrix));
            if let Some(visualizer) = self.visualizer.as_mut() {
                visualizer.snapshot(format!("after pivot {pivot}"), &matrix)?;
            }
        }
        Ok(())
    }
}

/// run the algorithm on this worker with default settings; all workers of the group must call it together
pub fn run_all_pairs_shortest_paths(
    communicator: &mut Communicator,
    matrix: Option<DistanceMatrix>,
) -> Result<Option<DistanceMatrix>> {
    Coordinator::new(communicator).run(matrix)
}
