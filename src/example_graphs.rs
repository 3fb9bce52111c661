//! Example Graphs
//!
//! Weighted directed graphs to exercise and benchmark the solvers.
//! Random graphs use a deterministic generator so that a seed always reproduces the same matrix.
//!

use super::error::{FloydError, Result};
use super::matrix::DistanceMatrix;
use super::util::*;
use crate::rand_xoshiro::rand_core::SeedableRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub trait ExampleGraph {
    fn vertex_num(&self) -> VertexNum;

    /// directed edges `(from, to, weight)`
    fn weighted_edges(&self) -> Vec<(VertexIndex, VertexIndex, Weight)>;

    /// the adjacency matrix: edge weights, 0 on the diagonal, [`UNREACHABLE`] elsewhere
    fn adjacency_matrix(&self) -> Result<DistanceMatrix> {
        DistanceMatrix::from_weighted_edges(self.vertex_num(), &self.weighted_edges())
    }
}

/// every ordered pair is connected independently with probability `edge_probability`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomGraph {
    pub vertex_num: VertexNum,
    pub edge_probability: f64,
    /// weights are drawn uniformly from `[1, max_weight]`
    pub max_weight: Weight,
    pub seed: u64,
}

impl RandomGraph {
    pub fn new(vertex_num: VertexNum, edge_probability: f64, max_weight: Weight, seed: u64) -> Result<Self> {
        if !(0. ..=1.).contains(&edge_probability) {
            return Err(FloydError::Config(format!("invalid edge probability {edge_probability}")));
        }
        if !(1..UNREACHABLE).contains(&max_weight) {
            return Err(FloydError::Config(format!(
                "max weight {max_weight} must be in [1, {UNREACHABLE})"
            )));
        }
        Ok(Self {
            vertex_num,
            edge_probability,
            max_weight,
            seed,
        })
    }
}

impl ExampleGraph for RandomGraph {
    fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    fn weighted_edges(&self) -> Vec<(VertexIndex, VertexIndex, Weight)> {
        let mut rng = DeterministicRng::seed_from_u64(self.seed);
        let mut weighted_edges = vec![];
        for from in 0..self.vertex_num {
            for to in 0..self.vertex_num {
                if from == to {
                    continue;
                }
                if rng.next_f64() < self.edge_probability {
                    weighted_edges.push((from, to, rng.gen_range(1..=self.max_weight)));
                }
            }
        }
        weighted_edges
    }
}

/// `0 → 1 → ... → n-1`, every edge of the same weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainGraph {
    pub vertex_num: VertexNum,
    pub weight: Weight,
}

impl ChainGraph {
    pub fn new(vertex_num: VertexNum, weight: Weight) -> Self {
        Self { vertex_num, weight }
    }
}

impl ExampleGraph for ChainGraph {
    fn vertex_num(&self) -> VertexNum {
        self.vertex_num
    }

    fn weighted_edges(&self) -> Vec<(VertexIndex, VertexIndex, Weight)> {
        (1..self.vertex_num).map(|to| (to - 1, to, self.weight)).collect()
    }
}

/// a `rows × columns` grid with edges in both directions between horizontal and vertical neighbors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridGraph {
    pub rows: usize,
    pub columns: usize,
    pub weight: Weight,
}

impl GridGraph {
    pub fn new(rows: usize, columns: usize, weight: Weight) -> Self {
        Self { rows, columns, weight }
    }

    pub fn vertex_index(&self, row: usize, column: usize) -> VertexIndex {
        row * self.columns + column
    }
}

impl ExampleGraph for GridGraph {
    fn vertex_num(&self) -> VertexNum {
        self.rows * self.columns
    }

    fn weighted_edges(&self) -> Vec<(VertexIndex, VertexIndex, Weight)> {
        let mut weighted_edges = vec![];
        for row in 0..self.rows {
            for column in 0..self.columns {
                let vertex = self.vertex_index(row, column);
                if column + 1 < self.columns {
                    let right = self.vertex_index(row, column + 1);
                    weighted_edges.push((vertex, right, self.weight));
                    weighted_edges.push((right, vertex, self.weight));
                }
                if row + 1 < self.rows {
                    let down = self.vertex_index(row + 1, column);
                    weighted_edges.push((vertex, down, self.weight));
                    weighted_edges.push((down, vertex, self.weight));
                }
            }
        }
        weighted_edges
    }
}
