//! Persist nodal strength vectors as flat numeric arrays.

use std::io::Write;
use std::path::Path;

use ndarray::ArrayView1;
use ndarray_npy::WriteNpyExt;

use crate::types::error::{NodalError, NodalResult};
use crate::types::NodalStrengthVector;

/// On-disk encoding of a result vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    /// NumPy `.npy` v1.0, little-endian float64.
    Npy,
    /// JSON array.
    Json,
    /// One value per line.
    Text,
}

impl VectorFormat {
    /// Pick the encoding from the file extension (`.npy`, `.json`, else text).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("npy") => Self::Npy,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Write `vector` to `path`, encoding chosen by extension.
pub fn write_vector(vector: &NodalStrengthVector, path: &Path) -> NodalResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    match VectorFormat::from_path(path) {
        VectorFormat::Npy => write_npy(vector.as_slice(), &mut writer)?,
        VectorFormat::Json => serde_json::to_writer(&mut writer, vector)?,
        VectorFormat::Text => {
            for value in vector.as_slice() {
                writeln!(writer, "{}", value)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Encode a 1-D float64 array as a NumPy `.npy` file.
pub fn write_npy(values: &[f64], writer: &mut impl Write) -> NodalResult<()> {
    ArrayView1::from(values)
        .write_npy(writer)
        .map_err(|e| NodalError::Npy(e.to_string()))
}
