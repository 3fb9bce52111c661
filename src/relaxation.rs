//! Relaxation
//!
//! The Floyd–Warshall update of a worker's rows against the broadcast pivot row:
//! `d[r][j] = min(d[r][j], d[r][k] + pivot[j])` for every local row `r` and column `j`.
//! After the round of pivot `k` completed on every worker, entry (i, j) of the global matrix is the length
//! of the shortest path from `i` to `j` using only intermediate vertices in `{0, ..., k}`.
//!

use super::matrix::*;
use super::partition::BlockPartition;
use super::util::*;

/// relax every local row against `pivot_row`, the full row of global vertex `pivot`
pub fn relax(block: &mut LocalBlock, pivot_row: &[Weight], pivot: VertexIndex) {
    debug_assert_eq!(pivot_row.len(), block.vertex_num(), "pivot row must cover every column");
    for row in block.rows_mut() {
        let to_pivot = row[pivot];
        if !is_reachable(to_pivot) {
            continue; // nothing goes through a pivot that can't be reached
        }
        for (distance, &from_pivot) in row.iter_mut().zip(pivot_row.iter()) {
            let candidate = path_through(to_pivot, from_pivot);
            if candidate < *distance {
                *distance = candidate;
            }
        }
    }
}

/// the single-worker algorithm: the whole matrix is one block relaxed against each of its own rows in turn
pub fn floyd_warshall_serial(matrix: DistanceMatrix) -> DistanceMatrix {
    let vertex_num = matrix.vertex_num();
    if vertex_num == 0 {
        return matrix;
    }
    let mut block = LocalBlock::new(vertex_num, VertexRange::new(0, vertex_num), matrix.into_flat());
    for pivot in 0..vertex_num {
        let pivot_row = block.row(pivot).to_vec();
        relax(&mut block, &pivot_row, pivot);
    }
    let partition = BlockPartition::new(vertex_num, 1).expect("a single worker always divides the vertices");
    partition
        .collect(vec![block])
        .expect("a single block covers the whole matrix")
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// textbook triple loop, kept independent from [`relax`]
    pub fn reference_floyd_warshall(matrix: &DistanceMatrix) -> Vec<Vec<Weight>> {
        let n = matrix.vertex_num();
        let mut distances = matrix.to_rows();
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if distances[i][k] < UNREACHABLE && distances[k][j] < UNREACHABLE {
                        let through = (distances[i][k] + distances[k][j]).min(UNREACHABLE);
                        if through < distances[i][j] {
                            distances[i][j] = through;
                        }
                    }
                }
            }
        }
        distances
    }

    /// edges 0→1=2, 1→2=3, 2→3=1, everything else absent
    pub fn chain_of_four() -> DistanceMatrix {
        DistanceMatrix::from_weighted_edges(4, &[(0, 1, 2), (1, 2, 3), (2, 3, 1)]).unwrap()
    }

    #[test]
    fn relaxation_single_round() {
        // cargo test relaxation_single_round -- --nocapture
        let matrix = chain_of_four();
        // rows 0 and 1 relaxed against pivot 1
        let mut block = LocalBlock::new(4, VertexRange::new(0, 2), matrix.as_slice()[0..8].to_vec());
        relax(&mut block, matrix.row(1), 1);
        assert_eq!(block.row(0), &[0, 2, 5, UNREACHABLE]);
        assert_eq!(block.row(1), &[UNREACHABLE, 0, 3, UNREACHABLE]);
    }

    #[test]
    fn relaxation_sentinel_never_improves() {
        // cargo test relaxation_sentinel_never_improves -- --nocapture
        let mut block = LocalBlock::new(3, VertexRange::new(0, 1), vec![0, UNREACHABLE, UNREACHABLE]);
        relax(&mut block, &[UNREACHABLE, 0, UNREACHABLE], 1);
        assert_eq!(block.row(0), &[0, UNREACHABLE, UNREACHABLE]);
        let mut block = LocalBlock::new(3, VertexRange::new(0, 1), vec![0, 7, UNREACHABLE]);
        relax(&mut block, &[UNREACHABLE, 0, UNREACHABLE], 1);
        assert_eq!(block.row(0), &[0, 7, UNREACHABLE]);
    }

    #[test]
    fn relaxation_serial_chain() {
        // cargo test relaxation_serial_chain -- --nocapture
        let result = floyd_warshall_serial(chain_of_four());
        assert_eq!(result.get(0, 3), 6);
        assert_eq!(result.get(0, 2), 5);
        assert_eq!(result.get(1, 3), 4);
        for i in 0..4 {
            assert_eq!(result.get(i, i), 0);
            for j in 0..i {
                assert_eq!(result.get(i, j), UNREACHABLE, "no path back from {i} to {j}");
            }
        }
        assert_eq!(result.to_rows(), reference_floyd_warshall(&chain_of_four()));
    }

    #[test]
    fn relaxation_serial_single_vertex() {
        // cargo test relaxation_serial_single_vertex -- --nocapture
        let result = floyd_warshall_serial(DistanceMatrix::new_unconnected(1));
        assert_eq!(result.to_rows(), vec![vec![0]]);
    }

    #[test]
    fn relaxation_serial_prefers_detour() {
        // cargo test relaxation_serial_prefers_detour -- --nocapture
        let matrix = DistanceMatrix::from_weighted_edges(3, &[(0, 2, 10), (0, 1, 1), (1, 2, 1), (2, 0, 4)]).unwrap();
        let result = floyd_warshall_serial(matrix.clone());
        assert_eq!(result.get(0, 2), 2);
        assert_eq!(result.get(1, 0), 5);
        assert_eq!(result.get(2, 1), 5);
        assert_eq!(result.to_rows(), reference_floyd_warshall(&matrix));
    }
}
