//! Matrix Input/Output
//!
//! Console format: the vertex count `n` followed by `n²` whitespace-separated entries in row-major order.
//! The output prints one row per line, unreachable entries rendered as [`UNREACHABLE_MARKER`].
//! The marker is also accepted on input so that an output can be fed back as a new adjacency matrix.
//!

use super::error::{FloydError, Result};
use super::matrix::DistanceMatrix;
use super::util::*;
use std::io::{BufRead, Read, Write};

pub const UNREACHABLE_MARKER: &str = "i";

fn parse_entry(token: &str, position: usize) -> Result<Weight> {
    if token == UNREACHABLE_MARKER {
        return Ok(UNREACHABLE);
    }
    token
        .parse::<Weight>()
        .map_err(|err| FloydError::InputFormat(format!("entry #{position} `{token}` is not a weight: {err}")))
}

/// parse a matrix from the console format held in `text`
pub fn parse_matrix(text: &str) -> Result<DistanceMatrix> {
    let mut tokens = text.split_whitespace();
    let vertex_num: VertexNum = match tokens.next() {
        Some(token) => token
            .parse()
            .map_err(|err| FloydError::InputFormat(format!("vertex count `{token}` is not a number: {err}")))?,
        None => return Err(FloydError::InputFormat("missing vertex count".to_string())),
    };
    let entry_num = vertex_num
        .checked_mul(vertex_num)
        .ok_or_else(|| FloydError::InputFormat(format!("vertex count {vertex_num} too large")))?;
    // count before allocating, the header alone must not decide the allocation size
    let tokens: Vec<&str> = tokens.collect();
    if tokens.len() < entry_num {
        return Err(FloydError::InputFormat(format!(
            "expected {entry_num} entries for {vertex_num} vertices, found {}",
            tokens.len()
        )));
    }
    if let Some(token) = tokens.get(entry_num) {
        return Err(FloydError::InputFormat(format!("unexpected trailing token `{token}`")));
    }
    let data = tokens
        .iter()
        .enumerate()
        .map(|(position, token)| parse_entry(token, position))
        .collect::<Result<Vec<Weight>>>()?;
    DistanceMatrix::from_flat(vertex_num, data)
}

pub fn read_matrix(mut reader: impl BufRead) -> Result<DistanceMatrix> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_matrix(&text)
}

pub fn read_matrix_json(reader: impl BufRead) -> Result<DistanceMatrix> {
    let matrix: DistanceMatrix = serde_json::from_reader(reader)?;
    // deserialization bypasses the shape checks of the constructors
    DistanceMatrix::from_flat(matrix.vertex_num(), matrix.into_flat())
}

/// one row per line, entries separated by a single space
pub fn format_matrix(matrix: &DistanceMatrix) -> String {
    let mut text = String::new();
    for row in matrix.rows() {
        let entries: Vec<String> = row
            .iter()
            .map(|&weight| {
                if is_reachable(weight) {
                    weight.to_string()
                } else {
                    UNREACHABLE_MARKER.to_string()
                }
            })
            .collect();
        text.push_str(&entries.join(" "));
        text.push('\n');
    }
    text
}

pub fn write_matrix(mut writer: impl Write, matrix: &DistanceMatrix) -> Result<()> {
    writer.write_all(format_matrix(matrix).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn write_matrix_json(mut writer: impl Write, matrix: &DistanceMatrix) -> Result<()> {
    serde_json::to_writer(&mut writer, matrix)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// the console input format, vertex count first; unreachable entries use the numeric sentinel
pub fn format_input(matrix: &DistanceMatrix) -> String {
    let mut text = format!("{}\n", matrix.vertex_num());
    for row in matrix.rows() {
        let entries: Vec<String> = row.iter().map(|weight| weight.to_string()).collect();
        text.push_str(&entries.join(" "));
        text.push('\n');
    }
    text
}
