//! Reads .dvc files into an in-memory container.

use std::io::Read;
use std::path::Path;

use crate::types::error::{NodalError, NodalResult};
use crate::types::header::{read_u32, read_u64, ContainerHeader, HEADER_SIZE};
use crate::types::FrameIndex;

use super::compression::decompress_rows;
use super::writer::INDEX_RECORD_SIZE;
use super::DvContainer;

/// One entry of the frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEntry {
    /// Frame key.
    pub frame: FrameIndex,
    /// Number of rows in the frame block.
    pub row_count: u32,
    /// Absolute byte offset of the compressed block.
    pub block_offset: u64,
    /// Compressed block length in bytes.
    pub block_len: u64,
}

/// Reader for .dvc binary files.
pub struct DvReader;

impl DvReader {
    /// Read a .dvc file into a DvContainer.
    pub fn read_from_file(path: &Path) -> NodalResult<DvContainer> {
        let data = std::fs::read(path)?;
        let mut cursor = std::io::Cursor::new(data);
        Self::read_from(&mut cursor)
    }

    /// Read from any reader into a DvContainer.
    pub fn read_from(reader: &mut impl Read) -> NodalResult<DvContainer> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let (_, entries) = parse_layout(&data)?;

        let mut container = DvContainer::new();
        for entry in entries {
            let block = block_slice(&data, &entry)?;
            let rows = decompress_rows(block, entry.row_count as usize)?;
            container.insert_frame(entry.frame, rows);
        }
        Ok(container)
    }
}

/// Parse the header and frame index of a complete container image.
pub(crate) fn parse_layout(data: &[u8]) -> NodalResult<(ContainerHeader, Vec<FrameEntry>)> {
    if data.len() < HEADER_SIZE as usize {
        return Err(NodalError::Truncated);
    }
    let header = ContainerHeader::read_from(&mut std::io::Cursor::new(&data[..HEADER_SIZE as usize]))?;

    let start = header.index_offset as usize;
    let record = INDEX_RECORD_SIZE as usize;
    let count = header.frame_count as usize;
    let end = count
        .checked_mul(record)
        .and_then(|len| start.checked_add(len))
        .ok_or(NodalError::Corrupt(header.index_offset))?;
    if end > data.len() {
        return Err(NodalError::Truncated);
    }

    let mut entries = Vec::with_capacity(count);
    for k in 0..count {
        let off = start + k * record;
        entries.push(FrameEntry {
            frame: read_u32(data, off),
            row_count: read_u32(data, off + 4),
            block_offset: read_u64(data, off + 8),
            block_len: read_u64(data, off + 16),
        });
    }
    if entries.windows(2).any(|w| w[0].frame >= w[1].frame) {
        return Err(NodalError::Corrupt(header.index_offset));
    }
    Ok((header, entries))
}

/// Bounds-checked compressed block of one frame.
pub(crate) fn block_slice<'a>(data: &'a [u8], entry: &FrameEntry) -> NodalResult<&'a [u8]> {
    let start = entry.block_offset as usize;
    let end = start
        .checked_add(entry.block_len as usize)
        .ok_or(NodalError::Corrupt(entry.block_offset))?;
    if end > data.len() {
        return Err(NodalError::Truncated);
    }
    Ok(&data[start..end])
}
