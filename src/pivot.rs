use super::communicator::Communicator;
use super::error::Result;
use super::matrix::*;
use super::partition::BlockPartition;
use super::util::*;

/// collective: every worker returns an identical copy of global row `pivot`, taken from the block of its owner;
/// all workers must call it with the same `pivot` in the same order
pub fn broadcast_pivot_row(
    communicator: &mut Communicator,
    partition: &BlockPartition,
    block: &LocalBlock,
    pivot: VertexIndex,
) -> Result<PivotRow> {
    let owner = partition.owner_of(pivot);
    let row = if communicator.is_root(owner) {
        debug_assert!(block.row_range().contains(pivot), "owner must hold the pivot row");
        Some(block.row(partition.local_row_of(pivot)).to_vec())
    } else {
        None
    };
    let pivot_row = communicator.broadcast(row, owner)?;
    log::trace!("worker {} received pivot row {} from worker {}", communicator.rank(), pivot, owner);
    Ok(pivot_row)
}
