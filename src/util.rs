use super::apsp_solver::ShortestPathSolver;
use super::matrix::DistanceMatrix;
use crate::rand_xoshiro;
use crate::rand_xoshiro::rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;
use std::time::Instant;

cfg_if::cfg_if! {
    if #[cfg(feature="i32_weight")] {
        /// use i32 to store weight, halving the memory of every matrix
        pub type Weight = i32;
    } else {
        pub type Weight = i64;
    }
}

pub type VertexIndex = usize;
pub type VertexNum = VertexIndex;
/// rank of a worker inside a group of cooperating workers
pub type Rank = usize;

/// "no path currently known"; any real path cost must stay strictly below it
pub const UNREACHABLE: Weight = 1_000_000;

#[inline(always)]
pub fn is_reachable(weight: Weight) -> bool {
    weight < UNREACHABLE
}

/// path cost through an intermediate vertex, never smaller than [`UNREACHABLE`] if either half is unreachable
#[inline(always)]
pub fn path_through(first_half: Weight, second_half: Weight) -> Weight {
    if !is_reachable(first_half) || !is_reachable(second_half) {
        return UNREACHABLE;
    }
    first_half.saturating_add(second_half).min(UNREACHABLE)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct IndexRange {
    pub range: [VertexIndex; 2],
}

// rows owned by a worker are always a continuous range of vertices
pub type VertexRange = IndexRange;

impl IndexRange {
    pub fn new(start: VertexIndex, end: VertexIndex) -> Self {
        debug_assert!(end >= start, "invalid range [{}, {})", start, end);
        Self { range: [start, end] }
    }
    pub fn new_length(start: VertexIndex, length: VertexNum) -> Self {
        Self::new(start, start + length)
    }
    pub fn is_empty(&self) -> bool {
        self.range[1] == self.range[0]
    }
    pub fn len(&self) -> usize {
        self.range[1] - self.range[0]
    }
    pub fn start(&self) -> VertexIndex {
        self.range[0]
    }
    pub fn end(&self) -> VertexIndex {
        self.range[1]
    }
    pub fn contains(&self, vertex_index: VertexIndex) -> bool {
        vertex_index >= self.start() && vertex_index < self.end()
    }
    pub fn iter(&self) -> std::ops::Range<VertexIndex> {
        self.range[0]..self.range[1]
    }
}

/// use Xoshiro256StarStar for deterministic random number generator
pub type DeterministicRng = rand_xoshiro::Xoshiro256StarStar;

pub trait F64Rng {
    fn next_f64(&mut self) -> f64;
}

impl F64Rng for DeterministicRng {
    fn next_f64(&mut self) -> f64 {
        f64::from_bits(0x3FF << 52 | self.next_u64() >> 12) - 1.
    }
}

/// record the solving time of multiple input matrices
pub struct BenchmarkProfiler {
    /// each record corresponds to a different input matrix
    pub records: Vec<BenchmarkProfilerEntry>,
    /// summation of all solving time
    pub sum_round_time: f64,
    /// summation of the vertex count of all inputs
    pub sum_vertex_num: usize,
    /// the file to output the profiler results
    pub benchmark_profiler_output: Option<File>,
}

impl BenchmarkProfiler {
    pub fn new(detail_log_file: Option<(String, serde_json::Value)>) -> std::io::Result<Self> {
        let benchmark_profiler_output = match detail_log_file {
            Some((filename, header)) => {
                let mut file = File::create(filename)?;
                file.write_all(header.to_string().as_bytes())?;
                file.write_all(b"\n")?;
                Some(file)
            }
            None => None,
        };
        Ok(Self {
            records: vec![],
            sum_round_time: 0.,
            sum_vertex_num: 0,
            benchmark_profiler_output,
        })
    }
    /// record the beginning of a solving procedure
    pub fn begin(&mut self, matrix: &DistanceMatrix) {
        // sanity check last entry, if exists, is complete
        if let Some(last_entry) = self.records.last() {
            assert!(
                last_entry.is_complete(),
                "the last benchmark profiler entry is not complete, make sure to call `begin` and `end` in pairs"
            );
        }
        let mut entry = BenchmarkProfilerEntry::new(matrix.vertex_num());
        entry.record_begin();
        self.records.push(entry);
    }
    /// record the ending of a solving procedure
    pub fn end(&mut self, solver: Option<&dyn ShortestPathSolver>) -> std::io::Result<()> {
        let last_entry = self
            .records
            .last_mut()
            .expect("last entry not exists, call `begin` before `end`");
        last_entry.record_end();
        let round_time = last_entry.round_time.unwrap_or(0.);
        self.sum_round_time += round_time;
        self.sum_vertex_num += last_entry.vertex_num;
        if let Some(file) = self.benchmark_profiler_output.as_mut() {
            let mut value = json!({
                "round_time": round_time,
                "vertex_num": last_entry.vertex_num,
            });
            if let (Some(solver), Some(object)) = (solver, value.as_object_mut()) {
                object.insert("solver_profile".to_string(), solver.generate_profiler_report());
            }
            file.write_all(value.to_string().as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }
    /// print out a brief one-line statistics
    pub fn brief(&self) -> String {
        let total = self.sum_round_time / (self.records.len() as f64);
        let per_vertex = self.sum_round_time / (self.sum_vertex_num as f64);
        format!("total: {total:.3e}, vertex: {per_vertex:.3e},")
    }
}

pub struct BenchmarkProfilerEntry {
    /// the vertex count of this input
    pub vertex_num: VertexNum,
    /// the time of beginning a solving procedure
    begin_time: Option<Instant>,
    /// interval between calling [`Self::record_begin`] to calling [`Self::record_end`]
    pub round_time: Option<f64>,
}

impl BenchmarkProfilerEntry {
    pub fn new(vertex_num: VertexNum) -> Self {
        Self {
            vertex_num,
            begin_time: None,
            round_time: None,
        }
    }
    /// record the beginning of a solving procedure
    pub fn record_begin(&mut self) {
        assert_eq!(self.begin_time, None, "do not call `record_begin` twice on the same entry");
        self.begin_time = Some(Instant::now());
    }
    /// record the ending of a solving procedure
    pub fn record_end(&mut self) {
        let begin_time = self
            .begin_time
            .as_ref()
            .expect("make sure to call `record_begin` before calling `record_end`");
        self.round_time = Some(begin_time.elapsed().as_secs_f64());
    }
    pub fn is_complete(&self) -> bool {
        self.round_time.is_some()
    }
}
