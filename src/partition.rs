//! Block Partition
//!
//! Splits the rows of an n×n distance matrix into `worker_num` continuous blocks of `n / worker_num` rows.
//! Block `r` holds the global rows `[r * b, (r + 1) * b)` where `b` is the block size.
//!

use super::communicator::Communicator;
use super::error::{FloydError, Result};
use super::matrix::*;
use super::util::*;
use serde::{Deserialize, Serialize};

/// the rank that holds the global matrix before distribution and after collection
pub const ROOT_RANK: Rank = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPartition {
    /// the number of vertices
    vertex_num: VertexNum,
    /// the number of workers, each owning one block
    worker_num: usize,
    /// rows per block
    block_size: usize,
}

impl BlockPartition {
    /// fails unless there is at least one vertex and one worker and the vertices divide evenly among workers
    pub fn new(vertex_num: VertexNum, worker_num: usize) -> Result<Self> {
        if worker_num == 0 {
            return Err(FloydError::Config("at least one worker required".to_string()));
        }
        if vertex_num == 0 {
            return Err(FloydError::Config("at least one vertex required".to_string()));
        }
        if vertex_num % worker_num != 0 {
            return Err(FloydError::Config(format!(
                "{vertex_num} vertices cannot be divided evenly among {worker_num} workers"
            )));
        }
        Ok(Self {
            vertex_num,
            worker_num,
            block_size: vertex_num / worker_num,
        })
    }

    pub fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    pub fn worker_num(&self) -> usize {
        self.worker_num
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// the number of entries in a single block
    pub fn block_len(&self) -> usize {
        self.block_size * self.vertex_num
    }

    /// global rows owned by `rank`
    pub fn row_range(&self, rank: Rank) -> VertexRange {
        debug_assert!(rank < self.worker_num, "rank {rank} out of range");
        VertexRange::new_length(rank * self.block_size, self.block_size)
    }

    /// the rank owning global row `vertex_index`
    pub fn owner_of(&self, vertex_index: VertexIndex) -> Rank {
        debug_assert!(vertex_index < self.vertex_num, "vertex {vertex_index} out of range");
        vertex_index / self.block_size
    }

    /// the local row index of global row `vertex_index` inside its owner's block
    pub fn local_row_of(&self, vertex_index: VertexIndex) -> usize {
        vertex_index % self.block_size
    }

    fn check_matrix(&self, matrix: &DistanceMatrix) -> Result<()> {
        if matrix.vertex_num() != self.vertex_num {
            return Err(FloydError::Config(format!(
                "partition of {} vertices cannot hold a matrix of {} vertices",
                self.vertex_num,
                matrix.vertex_num()
            )));
        }
        Ok(())
    }

    /// split the global matrix into one block per worker, in rank order
    pub fn distribute(&self, matrix: DistanceMatrix) -> Result<Vec<LocalBlock>> {
        self.check_matrix(&matrix)?;
        let block_len = self.block_len();
        let mut data = matrix.into_flat();
        let mut blocks = Vec::with_capacity(self.worker_num);
        // peel blocks off the tail to avoid copying the whole buffer for every block
        for rank in (0..self.worker_num).rev() {
            let block_data = data.split_off(rank * block_len);
            blocks.push(LocalBlock::new(self.vertex_num, self.row_range(rank), block_data));
        }
        blocks.reverse();
        Ok(blocks)
    }

    /// the exact inverse of [`Self::distribute`]: block `r` goes back to rows `[r * b, (r + 1) * b)`
    pub fn collect(&self, blocks: Vec<LocalBlock>) -> Result<DistanceMatrix> {
        if blocks.len() != self.worker_num {
            return Err(FloydError::Config(format!(
                "expected {} blocks, found {}",
                self.worker_num,
                blocks.len()
            )));
        }
        let mut data = Vec::with_capacity(self.vertex_num * self.vertex_num);
        for (rank, block) in blocks.into_iter().enumerate() {
            if block.vertex_num() != self.vertex_num || block.row_range() != self.row_range(rank) {
                return Err(FloydError::Config(format!(
                    "block {rank} holds rows {:?} of {} vertices, expected rows {:?} of {}",
                    block.row_range(),
                    block.vertex_num(),
                    self.row_range(rank),
                    self.vertex_num
                )));
            }
            data.extend(block.into_flat());
        }
        DistanceMatrix::from_flat(self.vertex_num, data)
    }
}

/// collective: the root distributes its matrix, every worker returns its own block
pub fn scatter_matrix(
    communicator: &mut Communicator,
    partition: &BlockPartition,
    matrix: Option<DistanceMatrix>,
) -> Result<LocalBlock> {
    let blocks = if communicator.is_root(ROOT_RANK) {
        let matrix = matrix.ok_or_else(|| FloydError::Config("root worker has no matrix to distribute".to_string()))?;
        Some(partition.distribute(matrix)?)
    } else {
        None
    };
    communicator.scatter(blocks, ROOT_RANK)
}

/// collective: every worker hands in its block, the root returns the reassembled matrix
pub fn gather_matrix(
    communicator: &mut Communicator,
    partition: &BlockPartition,
    block: LocalBlock,
) -> Result<Option<DistanceMatrix>> {
    match communicator.gather(block, ROOT_RANK)? {
        Some(blocks) => partition.collect(blocks).map(Some),
        None => Ok(None),
    }
}
