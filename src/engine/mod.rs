//! High-level operations: frame selection, extraction, aggregation, pipelines.

pub mod aggregate;
pub mod extract;
pub mod pipeline;
pub mod selector;

pub use aggregate::{
    AggregateResult, AggregationMode, Aggregator, CancelToken, RunSummary, SkippedPair,
    SubjectSummary,
};
pub use extract::{DvExtractor, ScaffoldExtractor, StrengthExtractor};
pub use pipeline::{
    compute_brainmap, compute_brainmap_dv, compute_brainmap_scaffold, select_frames,
    PipelineOutput, PipelineParams,
};
pub use selector::{
    rank_frames, selection_size, validate_percent, Direction, FrameSelector, Metric, RankingKey,
    Scenario, SelectionPolicy,
};
