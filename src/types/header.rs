//! File header for .dvc container files.

use std::io::{Read, Write};

use crate::types::error::{NodalError, NodalResult};
use crate::types::{DVC_MAGIC, FORMAT_VERSION};

/// Header of a .dvc file. Fixed size: 32 bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerHeader {
    /// Magic bytes: [0x44, 0x56, 0x43, 0x46] ("DVCF").
    pub magic: [u8; 4],
    /// Format version (currently 1).
    pub version: u32,
    /// Number of frames stored in the container.
    pub frame_count: u64,
    /// Byte offset where the frame index starts.
    pub index_offset: u64,
}

/// The fixed size of a ContainerHeader on disk: 32 bytes.
pub const HEADER_SIZE: u64 = 32;

impl ContainerHeader {
    /// Create a header for an empty container.
    pub fn new() -> Self {
        Self {
            magic: DVC_MAGIC,
            version: FORMAT_VERSION,
            frame_count: 0,
            index_offset: HEADER_SIZE,
        }
    }

    /// Write this header to the given writer. Writes exactly 32 bytes.
    ///
    /// Layout (all little-endian):
    /// - 0x00..0x04: magic (4 bytes)
    /// - 0x04..0x08: version (u32)
    /// - 0x08..0x10: frame_count (u64)
    /// - 0x10..0x18: index_offset (u64)
    /// - 0x18..0x20: _reserved (u64, written as 0)
    pub fn write_to(&self, writer: &mut impl Write) -> NodalResult<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.frame_count.to_le_bytes())?;
        writer.write_all(&self.index_offset.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?; // _reserved
        Ok(())
    }

    /// Read a header from the given reader. Reads exactly 32 bytes.
    pub fn read_from(reader: &mut impl Read) -> NodalResult<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                NodalError::Truncated
            } else {
                NodalError::Io(e)
            }
        })?;

        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != DVC_MAGIC {
            return Err(NodalError::InvalidMagic);
        }

        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != FORMAT_VERSION {
            return Err(NodalError::UnsupportedVersion(version));
        }

        let frame_count = read_u64(&buf, 8);
        let index_offset = read_u64(&buf, 16);
        // bytes 24..32 are reserved

        Ok(Self {
            magic,
            version,
            frame_count,
            index_offset,
        })
    }
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Little-endian u64 at `offset`. Caller guarantees 8 bytes are available.
pub(crate) fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Little-endian u32 at `offset`. Caller guarantees 4 bytes are available.
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}
