//! Run configuration loading from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{
    AggregationMode, Direction, Metric, PipelineParams, RankingKey, Scenario,
};
use crate::types::{
    FrameIndex, Modality, NodalError, NodalResult, DEFAULT_HOMOLOGY_GROUP, DEFAULT_NUM_REGIONS,
    DEFAULT_PERCENT,
};

/// One pipeline run, as written in a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// "dv" or "scaffold".
    pub mode: String,
    /// DV containers or scaffold directories, one per subject.
    pub inputs: Vec<PathBuf>,
    /// "single_frame", "all_frames" or "top_percent".
    #[serde(default = "default_scenario")]
    pub scenario: String,
    /// Frame for "single_frame".
    #[serde(default)]
    pub frame: Option<FrameIndex>,
    /// Fraction of frames for "top_percent".
    #[serde(default = "default_percent")]
    pub percent: f64,
    /// Ranking table for "top_percent".
    #[serde(default)]
    pub ranking_table: Option<PathBuf>,
    /// Number of brain regions.
    #[serde(default = "default_num_regions")]
    pub num_regions: usize,
    /// "coherence" or "complexity"; defaults per modality.
    #[serde(default)]
    pub metric: Option<String>,
    /// Custom ranking column, overriding `metric`.
    #[serde(default)]
    pub ranking_column: Option<usize>,
    /// Direction for `ranking_column`: "high" or "low".
    #[serde(default)]
    pub direction: Option<String>,
    /// Scaffold homology group.
    #[serde(default = "default_homology_group")]
    pub homology_group: u32,
    /// "pooled" or "subject_mean".
    #[serde(default = "default_aggregation")]
    pub aggregation: String,
    /// Run extractions in parallel.
    #[serde(default)]
    pub parallel: bool,
    /// Where the result vector is written.
    pub output: PathBuf,
    /// Optional image handed to the renderer.
    #[serde(default)]
    pub output_img: Option<PathBuf>,
    /// External renderer program.
    #[serde(default)]
    pub renderer: Option<String>,
}

fn default_scenario() -> String {
    "single_frame".to_string()
}

fn default_percent() -> f64 {
    DEFAULT_PERCENT
}

fn default_num_regions() -> usize {
    DEFAULT_NUM_REGIONS
}

fn default_homology_group() -> u32 {
    DEFAULT_HOMOLOGY_GROUP
}

fn default_aggregation() -> String {
    "pooled".to_string()
}

impl RunConfig {
    /// Parsed modality.
    pub fn modality(&self) -> NodalResult<Modality> {
        Modality::from_name(&self.mode)
            .ok_or_else(|| NodalError::Configuration(format!("Unknown mode: {:?}", self.mode)))
    }

    /// Convert into typed pipeline parameters, rejecting unknown names.
    pub fn to_params(&self) -> NodalResult<PipelineParams> {
        let metric = self
            .metric
            .as_deref()
            .map(|m| {
                Metric::from_name(m)
                    .ok_or_else(|| NodalError::Configuration(format!("Unknown metric: {:?}", m)))
            })
            .transpose()?;

        let ranking_key = match (self.ranking_column, self.direction.as_deref()) {
            (Some(column), direction) => {
                let direction = match direction {
                    Some(d) => Direction::from_name(d).ok_or_else(|| {
                        NodalError::Configuration(format!("Unknown direction: {:?}", d))
                    })?,
                    None => Direction::High,
                };
                Some(RankingKey::new(column, direction))
            }
            (None, Some(_)) => {
                return Err(NodalError::Configuration(
                    "direction given without ranking_column".into(),
                ))
            }
            (None, None) => None,
        };

        let aggregation = AggregationMode::from_name(&self.aggregation).ok_or_else(|| {
            NodalError::Configuration(format!("Unknown aggregation: {:?}", self.aggregation))
        })?;

        Ok(PipelineParams {
            scenario: Scenario::parse(&self.scenario)?,
            frame: self.frame,
            percent: self.percent,
            ranking_table: self.ranking_table.clone(),
            num_regions: self.num_regions,
            metric,
            ranking_key,
            homology_group: self.homology_group,
            aggregation,
            parallel: self.parallel,
        })
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &PathBuf| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.clone()
            }
        };
        self.inputs = self.inputs.iter().map(resolve).collect();
        self.ranking_table = self.ranking_table.as_ref().map(resolve);
        self.output = resolve(&self.output);
        self.output_img = self.output_img.as_ref().map(resolve);
    }
}

/// Load a run configuration from a TOML file. Relative paths inside the
/// file are taken relative to the file's directory.
pub fn load_config(path: &Path) -> NodalResult<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NodalError::Io(std::io::Error::other(format!(
            "Failed to read config file {}: {e}",
            path.display()
        )))
    })?;

    let mut config: RunConfig = toml::from_str(&content)
        .map_err(|e| NodalError::Configuration(format!("Failed to parse config: {e}")))?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}
