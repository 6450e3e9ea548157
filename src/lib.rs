//! nodal-strength: per-region strength maps from time-resolved brain connectivity.
//!
//! Two representations are supported: dynamic-violation triangle descriptors
//! stored in keyed-frame containers, and homological scaffold cycles stored one
//! file per frame. Frames are selected (single, all, or a ranked percentile),
//! reduced to nodal strength vectors, and averaged over frames and subjects.

pub mod cli;
pub mod config;
pub mod engine;
pub mod format;
pub mod graph;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{load_config, RunConfig};
pub use engine::{
    compute_brainmap, compute_brainmap_dv, compute_brainmap_scaffold, select_frames,
    AggregateResult, AggregationMode, Aggregator, CancelToken, Direction, DvExtractor,
    FrameSelector, Metric, PipelineOutput, PipelineParams, RankingKey, RunSummary, Scenario,
    ScaffoldExtractor, SelectionPolicy, SkippedPair, StrengthExtractor,
};
pub use format::{
    DvContainer, DvReader, DvWriter, MmapDvReader, RankingTable, ScaffoldFrame, ScaffoldReader,
    ScaffoldWriter,
};
pub use graph::{ScaffoldBuilder, WeightedGraph};
pub use types::{
    EdgeDescriptor, EdgeKey, FrameIndex, GraphNode, Modality, NodalError, NodalResult,
    NodalStrengthVector, PersistenceCycle, DEFAULT_HOMOLOGY_GROUP, DEFAULT_NUM_REGIONS,
    DEFAULT_PERCENT,
};
