//! Distance Matrix
//!
//! The n×n matrix is stored as one contiguous row-major buffer: entry (i, j) lives at `i * n + j`.
//! A worker only ever holds a [`LocalBlock`], a continuous range of rows of the global matrix,
//! indexed by local row; the global [`DistanceMatrix`] exists only at the root before scatter and after gather.
//!

use super::error::{FloydError, Result};
use super::util::*;
use super::visualize::*;
use serde::{Deserialize, Serialize};

/// a full row of the global matrix, shared read-only by every worker during one pivot round
pub type PivotRow = Vec<Weight>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    /// the number of vertices
    vertex_num: VertexNum,
    /// row-major entries, `vertex_num * vertex_num` of them
    data: Vec<Weight>,
}

impl DistanceMatrix {
    /// every vertex is unreachable from every other vertex, self-distance is 0
    pub fn new_unconnected(vertex_num: VertexNum) -> Self {
        let mut data = vec![UNREACHABLE; vertex_num * vertex_num];
        for i in 0..vertex_num {
            data[i * vertex_num + i] = 0;
        }
        Self { vertex_num, data }
    }

    /// build an adjacency matrix from directed weighted edges `(from, to, weight)`; parallel edges keep the lighter one
    pub fn from_weighted_edges(vertex_num: VertexNum, weighted_edges: &[(VertexIndex, VertexIndex, Weight)]) -> Result<Self> {
        let mut matrix = Self::new_unconnected(vertex_num);
        for &(from, to, weight) in weighted_edges.iter() {
            if from >= vertex_num || to >= vertex_num {
                return Err(FloydError::InputFormat(format!(
                    "edge {from}->{to} out of range for {vertex_num} vertices"
                )));
            }
            if weight < 0 {
                return Err(FloydError::InputFormat(format!("edge {from}->{to} has negative weight {weight}")));
            }
            if from == to {
                continue; // self-distance stays 0
            }
            let index = matrix.index(from, to);
            matrix.data[index] = matrix.data[index].min(weight.min(UNREACHABLE));
        }
        Ok(matrix)
    }

    /// wrap a flat row-major buffer, checking shape and the nonnegative / zero-diagonal conventions
    pub fn from_flat(vertex_num: VertexNum, mut data: Vec<Weight>) -> Result<Self> {
        if data.len() != vertex_num * vertex_num {
            return Err(FloydError::InputFormat(format!(
                "expected {} entries for {vertex_num} vertices, found {}",
                vertex_num * vertex_num,
                data.len()
            )));
        }
        for (index, value) in data.iter_mut().enumerate() {
            let (i, j) = (index / vertex_num, index % vertex_num);
            if *value < 0 {
                return Err(FloydError::InputFormat(format!("entry ({i}, {j}) has negative weight {value}")));
            }
            if i == j && *value != 0 {
                return Err(FloydError::InputFormat(format!("diagonal entry ({i}, {i}) must be 0, found {value}")));
            }
            // anything at or beyond the sentinel means no edge
            *value = (*value).min(UNREACHABLE);
        }
        Ok(Self { vertex_num, data })
    }

    pub fn from_rows(rows: &[Vec<Weight>]) -> Result<Self> {
        let vertex_num = rows.len();
        let mut data = Vec::with_capacity(vertex_num * vertex_num);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != vertex_num {
                return Err(FloydError::InputFormat(format!(
                    "row {i} has {} entries, expected {vertex_num}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_flat(vertex_num, data)
    }

    pub fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    /// flat offset of the logical entry (i, j)
    #[inline(always)]
    pub fn index(&self, i: VertexIndex, j: VertexIndex) -> usize {
        debug_assert!(i < self.vertex_num && j < self.vertex_num, "({i}, {j}) out of range");
        i * self.vertex_num + j
    }

    #[inline(always)]
    pub fn get(&self, i: VertexIndex, j: VertexIndex) -> Weight {
        self.data[self.index(i, j)]
    }

    pub fn row(&self, i: VertexIndex) -> &[Weight] {
        &self.data[i * self.vertex_num..(i + 1) * self.vertex_num]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
        // `chunks` panics on 0, the empty matrix simply yields no rows
        self.data.chunks(self.vertex_num.max(1))
    }

    pub fn as_slice(&self) -> &[Weight] {
        &self.data
    }

    pub fn into_flat(self) -> Vec<Weight> {
        self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<Weight>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl MatrixVisualizer for DistanceMatrix {
    fn snapshot(&self, abbrev: bool) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows()
            .map(|row| {
                json!(row
                    .iter()
                    .map(|&weight| if is_reachable(weight) { json!(weight) } else { json!(null) })
                    .collect::<Vec<_>>())
            })
            .collect();
        let key_vertex_num = if abbrev { "n" } else { "vertex_num" };
        let key_distances = if abbrev { "d" } else { "distances" };
        let mut value = serde_json::Map::new();
        value.insert(key_vertex_num.to_string(), json!(self.vertex_num));
        value.insert(key_distances.to_string(), json!(rows));
        serde_json::Value::Object(value)
    }
}

/// the continuous rows `[row_range.start, row_range.end)` of the global matrix, owned exclusively by one worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBlock {
    /// the number of vertices in the global matrix, i.e. the length of each row
    vertex_num: VertexNum,
    /// the global rows held by this block
    row_range: VertexRange,
    /// row-major entries indexed by local row, `row_range.len() * vertex_num` of them
    data: Vec<Weight>,
}

impl LocalBlock {
    pub fn new(vertex_num: VertexNum, row_range: VertexRange, data: Vec<Weight>) -> Self {
        assert_eq!(data.len(), row_range.len() * vertex_num, "block data doesn't match its row range");
        Self {
            vertex_num,
            row_range,
            data,
        }
    }

    pub fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    pub fn row_range(&self) -> VertexRange {
        self.row_range
    }

    /// number of local rows
    pub fn row_num(&self) -> usize {
        self.row_range.len()
    }

    /// flat offset of local row `local_row` and column `j`
    #[inline(always)]
    pub fn index(&self, local_row: usize, j: VertexIndex) -> usize {
        debug_assert!(local_row < self.row_num() && j < self.vertex_num);
        local_row * self.vertex_num + j
    }

    #[inline(always)]
    pub fn get(&self, local_row: usize, j: VertexIndex) -> Weight {
        self.data[self.index(local_row, j)]
    }

    pub fn row(&self, local_row: usize) -> &[Weight] {
        &self.data[local_row * self.vertex_num..(local_row + 1) * self.vertex_num]
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, Weight> {
        self.data.chunks_exact_mut(self.vertex_num.max(1))
    }

    pub fn as_slice(&self) -> &[Weight] {
        &self.data
    }

    pub fn into_flat(self) -> Vec<Weight> {
        self.data
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn matrix_row_major_layout() {
        // cargo test matrix_row_major_layout -- --nocapture
        let matrix = DistanceMatrix::from_rows(&[vec![0, 1, 2], vec![3, 0, 5], vec![6, 7, 0]]).unwrap();
        assert_eq!(matrix.vertex_num(), 3);
        assert_eq!(matrix.index(1, 2), 5);
        assert_eq!(matrix.get(2, 1), 7);
        assert_eq!(matrix.row(1), &[3, 0, 5]);
        assert_eq!(matrix.as_slice(), &[0, 1, 2, 3, 0, 5, 6, 7, 0]);
    }

    #[test]
    fn matrix_rejects_malformed_input() {
        // cargo test matrix_rejects_malformed_input -- --nocapture
        assert!(matches!(
            DistanceMatrix::from_flat(2, vec![0, 1, 2]),
            Err(FloydError::InputFormat(_))
        ));
        assert!(matches!(
            DistanceMatrix::from_flat(2, vec![0, -1, 2, 0]),
            Err(FloydError::InputFormat(_))
        ));
        assert!(matches!(
            DistanceMatrix::from_flat(2, vec![1, 1, 2, 0]),
            Err(FloydError::InputFormat(_))
        ));
        assert!(matches!(
            DistanceMatrix::from_rows(&[vec![0, 1], vec![0]]),
            Err(FloydError::InputFormat(_))
        ));
    }

    #[test]
    fn matrix_normalizes_sentinel() {
        // cargo test matrix_normalizes_sentinel -- --nocapture
        let matrix = DistanceMatrix::from_flat(2, vec![0, UNREACHABLE * 5, 3, 0]).unwrap();
        assert_eq!(matrix.get(0, 1), UNREACHABLE);
        assert_eq!(matrix.get(1, 0), 3);
    }

    #[test]
    fn matrix_from_weighted_edges() {
        // cargo test matrix_from_weighted_edges -- --nocapture
        let matrix = DistanceMatrix::from_weighted_edges(3, &[(0, 1, 4), (0, 1, 2), (1, 2, 7), (2, 2, 9)]).unwrap();
        assert_eq!(matrix.get(0, 1), 2);
        assert_eq!(matrix.get(1, 2), 7);
        assert_eq!(matrix.get(2, 2), 0);
        assert_eq!(matrix.get(1, 0), UNREACHABLE);
        assert!(DistanceMatrix::from_weighted_edges(3, &[(0, 3, 1)]).is_err());
        assert!(DistanceMatrix::from_weighted_edges(3, &[(0, 1, -1)]).is_err());
    }

    #[test]
    fn matrix_local_block_indexing() {
        // cargo test matrix_local_block_indexing -- --nocapture
        let block = LocalBlock::new(3, VertexRange::new(1, 3), vec![3, 0, 5, 6, 7, 0]);
        assert_eq!(block.row_num(), 2);
        assert_eq!(block.get(0, 0), 3);
        assert_eq!(block.get(1, 1), 7);
        assert_eq!(block.row(1), &[6, 7, 0]);
    }

    #[test]
    fn matrix_snapshot_marks_unreachable() {
        // cargo test matrix_snapshot_marks_unreachable -- --nocapture
        let matrix = DistanceMatrix::new_unconnected(2);
        let snapshot = matrix.snapshot(false);
        assert_eq!(snapshot["vertex_num"], json!(2));
        assert_eq!(snapshot["distances"], json!([[0, null], [null, 0]]));
    }
}
