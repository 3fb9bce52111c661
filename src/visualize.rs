//! Visualizer
//!
//! This module records the progress of the algorithm as a sequence of matrix snapshots in a JSON file
//!

use crate::chrono::Local;
use crate::serde_json;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

pub trait MatrixVisualizer {
    /// take a snapshot, set `abbrev` to true to save space
    fn snapshot(&self, abbrev: bool) -> serde_json::Value;
}

#[derive(Debug)]
pub struct Visualizer {
    /// save to file if applicable
    file: Option<File>,
    /// all snapshots
    snapshots: Vec<(String, serde_json::Value)>,
}

impl Visualizer {
    /// create a new visualizer with target filename
    pub fn new(mut filename: Option<String>) -> std::io::Result<Self> {
        if cfg!(feature = "disable_visualizer") {
            filename = None; // do not open file
        }
        let file = match filename {
            Some(filename) => Some(File::create(filename)?),
            None => None,
        };
        Ok(Self {
            file,
            snapshots: Vec::new(),
        })
    }

    /// append another snapshot, and also update the file in case the program is interrupted
    pub fn snapshot(&mut self, name: String, object: &impl MatrixVisualizer) -> std::io::Result<()> {
        if cfg!(feature = "disable_visualizer") {
            return Ok(());
        }
        let abbrev = true;
        let value = object.snapshot(abbrev);
        self.snapshots.push((name, value));
        self.save()?;
        Ok(())
    }

    pub fn snapshots(&self) -> &[(String, serde_json::Value)] {
        &self.snapshots
    }

    /// save to file
    pub fn save(&mut self) -> std::io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.set_len(0)?; // truncate the file
            file.seek(SeekFrom::Start(0))?; // move the cursor to the front
            file.write_all(
                json!({
                    "snapshots": &self.snapshots,
                })
                .to_string()
                .as_bytes(),
            )?;
            file.sync_all()?;
        }
        Ok(())
    }
}

const DEFAULT_VISUALIZE_DATA_FOLDER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/visualize/data/");

pub fn visualize_data_folder() -> String {
    DEFAULT_VISUALIZE_DATA_FOLDER.to_string()
}

pub fn auto_visualize_data_filename() -> String {
    format!("{}.json", Local::now().format("%Y%m%d-%H-%M-%S%.3f"))
}

#[cfg(test)]
mod tests {
    use super::super::matrix::*;
    use super::*;

    #[test]
    fn visualize_snapshots_in_memory() {
        // cargo test visualize_snapshots_in_memory -- --nocapture
        let mut visualizer = Visualizer::new(None).unwrap();
        let matrix = DistanceMatrix::new_unconnected(3);
        visualizer.snapshot("initial".to_string(), &matrix).unwrap();
        visualizer.snapshot("again".to_string(), &matrix).unwrap();
        if cfg!(not(feature = "disable_visualizer")) {
            assert_eq!(visualizer.snapshots().len(), 2);
            assert_eq!(visualizer.snapshots()[0].0, "initial");
            assert_eq!(visualizer.snapshots()[0].1["n"], json!(3));
        }
    }

    #[test]
    fn visualize_save_to_file() {
        // cargo test visualize_save_to_file -- --nocapture
        let filename = std::env::temp_dir().join(format!("parallel_floyd_{}", auto_visualize_data_filename()));
        let filename = filename.to_string_lossy().to_string();
        let mut visualizer = Visualizer::new(Some(filename.clone())).unwrap();
        visualizer
            .snapshot("initial".to_string(), &DistanceMatrix::new_unconnected(2))
            .unwrap();
        if cfg!(not(feature = "disable_visualizer")) {
            let content = std::fs::read_to_string(&filename).unwrap();
            let value: serde_json::Value = serde_json::from_str(&content).unwrap();
            assert_eq!(value["snapshots"][0][0], json!("initial"));
            assert_eq!(value["snapshots"][0][1]["d"], json!([[0, null], [null, 0]]));
        }
        std::fs::remove_file(&filename).ok();
    }
}
