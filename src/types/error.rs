//! Error types for the nodal-strength library.

use std::path::PathBuf;

use thiserror::Error;

use super::FrameIndex;

/// All errors that can occur in the nodal-strength library.
#[derive(Error, Debug)]
pub enum NodalError {
    /// Invalid or missing selection/pipeline arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ranking table path does not exist.
    #[error("Ranking table not found: {0}")]
    RankingTableNotFound(PathBuf),

    /// Ranking table is empty, ragged, or lacks the requested column.
    #[error("Ranking table {path} has bad shape: {reason}")]
    RankingTableShape { path: PathBuf, reason: String },

    /// A scaffold directory holds no per-frame files.
    #[error("No frames found in {0}")]
    NoFramesFound(PathBuf),

    /// Scaffold directories share no common frame.
    #[error("Scaffold directories do not share any common frame")]
    EmptyIntersection,

    /// Requested frame key is not stored in a DV container.
    #[error("Frame {frame} not found in {path}")]
    FrameNotFound { path: PathBuf, frame: FrameIndex },

    /// Per-frame scaffold file is missing.
    #[error("Scaffold file not found: {0}")]
    ScaffoldFileNotFound(PathBuf),

    /// Per-frame scaffold file cannot be read or parsed.
    #[error("Failed to load scaffold file {path}: {reason}")]
    ScaffoldCorrupt { path: PathBuf, reason: String },

    /// Homology group key is absent or its value is not a cycle list.
    #[error("Homology group {group} missing or malformed in {path}")]
    HomologyGroupMissing { path: PathBuf, group: u32 },

    /// Nodal vector length does not match the configured region count.
    #[error("Nodal strength length mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Every (subject, frame) pair failed.
    #[error("No valid nodal strength vectors computed ({total} pairs attempted)")]
    NoValidResults { total: usize },

    /// Invalid magic bytes in container header.
    #[error("Invalid magic bytes in container header")]
    InvalidMagic,

    /// Unsupported container format version.
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    /// File is empty or truncated.
    #[error("File is empty or truncated")]
    Truncated,

    /// Corrupt data at a given offset.
    #[error("Corrupt data at offset {0}")]
    Corrupt(u64),

    /// Compression error.
    #[error("Compression error: {0}")]
    Compression(String),

    /// NumPy array encoding error.
    #[error("NPY error: {0}")]
    Npy(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodalError {
    /// Whether the aggregator may skip the offending pair and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Configuration(_)
                | Self::RankingTableNotFound(_)
                | Self::RankingTableShape { .. }
                | Self::NoFramesFound(_)
                | Self::EmptyIntersection
                | Self::NoValidResults { .. }
        )
    }

    /// Short stable name of the error kind, used in skip reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::RankingTableNotFound(_) => "ranking_table_not_found",
            Self::RankingTableShape { .. } => "ranking_table_shape",
            Self::NoFramesFound(_) => "no_frames_found",
            Self::EmptyIntersection => "empty_intersection",
            Self::FrameNotFound { .. } => "frame_not_found",
            Self::ScaffoldFileNotFound(_) => "scaffold_file_not_found",
            Self::ScaffoldCorrupt { .. } => "scaffold_corrupt",
            Self::HomologyGroupMissing { .. } => "homology_group_missing",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::NoValidResults { .. } => "no_valid_results",
            Self::InvalidMagic
            | Self::UnsupportedVersion(_)
            | Self::Truncated
            | Self::Corrupt(_)
            | Self::Compression(_) => "container_corrupt",
            Self::Json(_) => "json",
            Self::Npy(_) => "npy",
            Self::Io(_) => "io",
        }
    }
}

/// Convenience result type for nodal-strength operations.
pub type NodalResult<T> = Result<T, NodalError>;
