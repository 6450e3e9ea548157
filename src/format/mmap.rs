//! Memory-mapped frame access for .dvc files.

use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::types::error::{NodalError, NodalResult};
use crate::types::header::ContainerHeader;
use crate::types::{EdgeDescriptor, FrameIndex};

use super::compression::decompress_rows;
use super::reader::{block_slice, parse_layout, FrameEntry};

/// Read-only memory-mapped access to a .dvc file. Only the frame index is
/// decoded on open; frame blocks are decompressed on demand.
pub struct MmapDvReader {
    path: PathBuf,
    mmap: Mmap,
    header: ContainerHeader,
    entries: Vec<FrameEntry>,
}

impl MmapDvReader {
    /// Open a .dvc file for memory-mapped read access.
    pub fn open(path: &Path) -> NodalResult<Self> {
        let file = std::fs::File::open(path)?;
        // The container is opened read-only and never written while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        let (header, entries) = parse_layout(&mmap)?;

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            header,
            entries,
        })
    }

    /// Get the file header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Stored frame keys, ascending.
    pub fn frame_keys(&self) -> Vec<FrameIndex> {
        self.entries.iter().map(|e| e.frame).collect()
    }

    /// Frame index entries, ascending by frame.
    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Whether the container stores `frame`.
    pub fn contains(&self, frame: FrameIndex) -> bool {
        self.find(frame).is_some()
    }

    /// Decode the rows of a single frame (O(log n) lookup).
    pub fn read_frame(&self, frame: FrameIndex) -> NodalResult<Vec<EdgeDescriptor>> {
        let entry = self.find(frame).ok_or_else(|| NodalError::FrameNotFound {
            path: self.path.clone(),
            frame,
        })?;
        let block = block_slice(&self.mmap, entry)?;
        decompress_rows(block, entry.row_count as usize)
    }

    fn find(&self, frame: FrameIndex) -> Option<&FrameEntry> {
        self.entries
            .binary_search_by_key(&frame, |e| e.frame)
            .ok()
            .map(|pos| &self.entries[pos])
    }
}
