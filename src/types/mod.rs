//! All data types for the nodal-strength library.

pub mod cycle;
pub mod edge;
pub mod error;
pub mod header;
pub mod strength;

pub use cycle::{Endpoint, PersistenceCycle};
pub use edge::{EdgeDescriptor, EdgeKey, GraphNode};
pub use error::{NodalError, NodalResult};
pub use header::{ContainerHeader, HEADER_SIZE};
pub use strength::NodalStrengthVector;

/// Discrete time-sample identifier.
pub type FrameIndex = u32;

/// Magic bytes at the start of every DV container file.
pub const DVC_MAGIC: [u8; 4] = [0x44, 0x56, 0x43, 0x46]; // "DVCF"

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Default number of brain regions (parcellation size).
pub const DEFAULT_NUM_REGIONS: usize = 100;

/// Default fraction of frames kept by a percentile selection.
pub const DEFAULT_PERCENT: f64 = 0.15;

/// Default homology group read from scaffold files (H1 cycles).
pub const DEFAULT_HOMOLOGY_GROUP: u32 = 1;

/// File name prefix of per-frame scaffold files.
pub const SCAFFOLD_FILE_PREFIX: &str = "generators__";

/// File extension of per-frame scaffold files.
pub const SCAFFOLD_FILE_EXT: &str = "json";

/// Returns the current time as Unix epoch microseconds.
pub fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros() as u64
}

/// Which per-frame representation a run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Dynamic-violation triangle descriptors in a keyed-frame container.
    Dv,
    /// Homological scaffold cycles, one file per frame in a directory.
    Scaffold,
}

impl Modality {
    /// Return a human-readable name for this modality.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dv => "dv",
            Self::Scaffold => "scaffold",
        }
    }

    /// Parse a modality from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dv" => Some(Self::Dv),
            "scaffold" => Some(Self::Scaffold),
            _ => None,
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
