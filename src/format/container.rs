//! In-memory keyed-frame container of dynamic-violation rows.

use std::collections::BTreeMap;
use std::path::Path;

use crate::types::error::{NodalError, NodalResult};
use crate::types::{EdgeDescriptor, FrameIndex};

/// All DV frames of one subject, keyed by frame index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DvContainer {
    frames: BTreeMap<FrameIndex, Vec<EdgeDescriptor>>,
}

impl DvContainer {
    /// Create a new empty container.
    pub fn new() -> Self {
        Self {
            frames: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the rows of a frame.
    pub fn insert_frame(&mut self, frame: FrameIndex, rows: Vec<EdgeDescriptor>) {
        self.frames.insert(frame, rows);
    }

    /// Rows of a frame, if stored.
    pub fn frame(&self, frame: FrameIndex) -> Option<&[EdgeDescriptor]> {
        self.frames.get(&frame).map(|rows| rows.as_slice())
    }

    /// Stored frame keys, ascending.
    pub fn frame_keys(&self) -> Vec<FrameIndex> {
        self.frames.keys().copied().collect()
    }

    /// Number of stored frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Iterate over (frame, rows) in ascending frame order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameIndex, &[EdgeDescriptor])> {
        self.frames.iter().map(|(f, rows)| (*f, rows.as_slice()))
    }

    /// Parse the JSON interchange form: `{"<frame>": [[i, j, weight_sum, count], ...]}`.
    pub fn from_json_str(json: &str) -> NodalResult<Self> {
        let raw: BTreeMap<String, Vec<[f64; 4]>> = serde_json::from_str(json)?;
        let mut container = Self::new();
        for (key, rows) in raw {
            let frame: FrameIndex = key.trim().parse().map_err(|_| {
                NodalError::Configuration(format!("frame key {:?} is not an integer", key))
            })?;
            container.insert_frame(frame, rows.into_iter().map(EdgeDescriptor::from_row).collect());
        }
        Ok(container)
    }

    /// Read the JSON interchange form from a file.
    pub fn from_json_file(path: &Path) -> NodalResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
