//! LZ4 row-block compression/decompression.

use crate::types::error::{NodalError, NodalResult};
use crate::types::EdgeDescriptor;

/// Size of one encoded row: four little-endian f64 values.
pub const ROW_SIZE: usize = 32;

/// Encode rows as little-endian f64 quadruples and compress with LZ4
/// (size prepended for decompression).
pub fn compress_rows(rows: &[EdgeDescriptor]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(rows.len() * ROW_SIZE);
    for row in rows {
        for value in row.to_row() {
            raw.extend_from_slice(&value.to_le_bytes());
        }
    }
    lz4_flex::compress_prepend_size(&raw)
}

/// Decompress a row block and decode `expected_rows` descriptors.
///
/// The size prefix is checked against `expected_rows` before any buffer is
/// allocated for the decompressed block.
pub fn decompress_rows(data: &[u8], expected_rows: usize) -> NodalResult<Vec<EdgeDescriptor>> {
    let expected = expected_rows
        .checked_mul(ROW_SIZE)
        .ok_or_else(|| NodalError::Compression(format!("row count {} overflows", expected_rows)))?;
    if data.len() < 4 {
        return Err(NodalError::Compression(format!(
            "row block of {} bytes lacks a size prefix",
            data.len()
        )));
    }
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&data[..4]);
    let declared = u32::from_le_bytes(prefix) as usize;
    if declared != expected {
        return Err(NodalError::Compression(format!(
            "row block declares {} bytes, expected {}",
            declared, expected
        )));
    }

    let raw = lz4_flex::block::decompress(&data[4..], expected)
        .map_err(|e| NodalError::Compression(e.to_string()))?;
    if raw.len() != expected {
        return Err(NodalError::Compression(format!(
            "row block holds {} bytes, expected {}",
            raw.len(),
            expected
        )));
    }

    let rows = raw
        .chunks_exact(ROW_SIZE)
        .map(|chunk| {
            let mut row = [0.0f64; 4];
            for (k, value) in row.iter_mut().enumerate() {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&chunk[k * 8..k * 8 + 8]);
                *value = f64::from_le_bytes(bytes);
            }
            EdgeDescriptor::from_row(row)
        })
        .collect();
    Ok(rows)
}
