//! Writes .dvc files from an in-memory container.

use std::io::Write;
use std::path::Path;

use crate::types::error::NodalResult;
use crate::types::header::{ContainerHeader, HEADER_SIZE};
use crate::types::{DVC_MAGIC, FORMAT_VERSION};

use super::compression::compress_rows;
use super::DvContainer;

/// Size of a single frame index record on disk: 24 bytes.
pub const INDEX_RECORD_SIZE: u64 = 24;

/// Writer for .dvc binary files.
pub struct DvWriter;

impl DvWriter {
    /// Write a complete DvContainer to a .dvc file.
    pub fn write_to_file(container: &DvContainer, path: &Path) -> NodalResult<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        Self::write_to(container, &mut writer)
    }

    /// Write a complete DvContainer to any writer.
    pub fn write_to(container: &DvContainer, writer: &mut impl Write) -> NodalResult<()> {
        // Step 1: Compress every frame block and record its placement
        let mut blocks: Vec<Vec<u8>> = Vec::with_capacity(container.frame_count());
        let mut index: Vec<(u32, u32, u64, u64)> = Vec::with_capacity(container.frame_count());
        let mut offset = HEADER_SIZE;

        for (frame, rows) in container.iter() {
            let block = compress_rows(rows);
            index.push((frame, rows.len() as u32, offset, block.len() as u64));
            offset += block.len() as u64;
            blocks.push(block);
        }

        // Step 2: Write header
        let header = ContainerHeader {
            magic: DVC_MAGIC,
            version: FORMAT_VERSION,
            frame_count: index.len() as u64,
            index_offset: offset,
        };
        header.write_to(writer)?;

        // Step 3: Write frame blocks
        for block in &blocks {
            writer.write_all(block)?;
        }

        // Step 4: Write frame index (already sorted by frame)
        for &(frame, row_count, block_offset, block_len) in &index {
            writer.write_all(&frame.to_le_bytes())?; // 4 bytes
            writer.write_all(&row_count.to_le_bytes())?; // 4 bytes
            writer.write_all(&block_offset.to_le_bytes())?; // 8 bytes
            writer.write_all(&block_len.to_le_bytes())?; // 8 bytes
                                                         // Total: 4+4+8+8 = 24
        }

        writer.flush()?;
        Ok(())
    }
}
