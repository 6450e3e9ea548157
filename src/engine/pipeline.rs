//! Brain-map pipelines: frame selection + aggregation with modality defaults.

use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::types::{
    FrameIndex, Modality, NodalError, NodalResult, DEFAULT_HOMOLOGY_GROUP, DEFAULT_NUM_REGIONS,
    DEFAULT_PERCENT,
};

use super::aggregate::{AggregateResult, AggregationMode, Aggregator, CancelToken};
use super::extract::{DvExtractor, ScaffoldExtractor, StrengthExtractor};
use super::selector::{
    validate_percent, FrameSelector, Metric, RankingKey, Scenario, SelectionPolicy,
};

/// Parameters of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Frame selection scenario.
    pub scenario: Scenario,
    /// Explicit frame for `SingleFrame`.
    pub frame: Option<FrameIndex>,
    /// Fraction of frames kept by `TopPercent`, in (0, 1].
    pub percent: f64,
    /// Ranking table for `TopPercent`.
    pub ranking_table: Option<PathBuf>,
    /// Number of brain regions.
    pub num_regions: usize,
    /// Ranking metric; `None` uses the modality default.
    pub metric: Option<Metric>,
    /// Explicit column/direction, overriding `metric`.
    pub ranking_key: Option<RankingKey>,
    /// Homology group read by the scaffold extractor.
    pub homology_group: u32,
    /// Averaging mode.
    pub aggregation: AggregationMode,
    /// Run extractions on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            scenario: Scenario::SingleFrame,
            frame: None,
            percent: DEFAULT_PERCENT,
            ranking_table: None,
            num_regions: DEFAULT_NUM_REGIONS,
            metric: None,
            ranking_key: None,
            homology_group: DEFAULT_HOMOLOGY_GROUP,
            aggregation: AggregationMode::Pooled,
            parallel: false,
        }
    }
}

impl PipelineParams {
    /// Metric used when none is configured: coherence for DV, complexity
    /// for scaffold.
    pub fn default_metric(modality: Modality) -> Metric {
        match modality {
            Modality::Dv => Metric::Coherence,
            Modality::Scaffold => Metric::Complexity,
        }
    }

    /// Effective ranking column and direction.
    pub fn ranking_key(&self, modality: Modality) -> RankingKey {
        self.ranking_key.unwrap_or_else(|| {
            self.metric
                .unwrap_or_else(|| Self::default_metric(modality))
                .ranking_key()
        })
    }

    /// Validate and build the selection policy.
    pub fn policy(&self, modality: Modality) -> NodalResult<SelectionPolicy> {
        if self.num_regions == 0 {
            return Err(NodalError::Configuration(
                "num_regions must be positive".into(),
            ));
        }
        validate_percent(self.percent)?;
        if self.scenario == Scenario::TopPercent && self.ranking_table.is_none() {
            return Err(NodalError::Configuration(
                "ranking table required for scenario 'top_percent'".into(),
            ));
        }
        SelectionPolicy::from_scenario(
            self.scenario,
            self.frame,
            self.percent,
            self.ranking_key(modality),
        )
    }
}

/// Frames chosen for a run plus its aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// Modality of the run.
    pub modality: Modality,
    /// Selected frames, in selection order.
    pub frames: Vec<FrameIndex>,
    /// Aggregated nodal strength.
    pub result: AggregateResult,
    /// When the run finished (Unix epoch microseconds).
    pub finished_at: u64,
}

/// Select frames without aggregating.
pub fn select_frames(
    modality: Modality,
    sources: &[PathBuf],
    params: &PipelineParams,
) -> NodalResult<Vec<FrameIndex>> {
    let policy = params.policy(modality)?;
    FrameSelector::new(modality, sources).select(&policy, params.ranking_table.as_deref())
}

/// Run selection and aggregation for either modality.
pub fn compute_brainmap(
    modality: Modality,
    sources: &[PathBuf],
    params: &PipelineParams,
    cancel: Option<CancelToken>,
) -> NodalResult<PipelineOutput> {
    if sources.is_empty() {
        return Err(NodalError::Configuration("no input sources given".into()));
    }

    let frames = select_frames(modality, sources, params)?;
    info!(
        "{}: {} subject(s), {} frame(s), scenario={}",
        modality,
        sources.len(),
        frames.len(),
        params.scenario.name()
    );

    let extractor: Box<dyn StrengthExtractor> = match modality {
        Modality::Dv => Box::new(DvExtractor::new()),
        Modality::Scaffold => Box::new(ScaffoldExtractor::new(params.homology_group)),
    };

    let mut aggregator = Aggregator::new(params.num_regions)
        .with_mode(params.aggregation)
        .parallel(params.parallel);
    if let Some(token) = cancel {
        aggregator = aggregator.with_cancel(token);
    }
    let result = aggregator.aggregate(sources, &frames, extractor.as_ref())?;

    Ok(PipelineOutput {
        modality,
        frames,
        result,
        finished_at: crate::types::now_micros(),
    })
}

/// Nodal strength from dynamic-violation containers.
pub fn compute_brainmap_dv(
    containers: &[PathBuf],
    params: &PipelineParams,
) -> NodalResult<PipelineOutput> {
    compute_brainmap(Modality::Dv, containers, params, None)
}

/// Nodal strength from scaffold directories.
pub fn compute_brainmap_scaffold(
    directories: &[PathBuf],
    params: &PipelineParams,
) -> NodalResult<PipelineOutput> {
    compute_brainmap(Modality::Scaffold, directories, params, None)
}
