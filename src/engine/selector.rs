//! Frame selection: which time frames a run processes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::format::{list_scaffold_frames, MmapDvReader, RankingTable};
use crate::types::{FrameIndex, Modality, NodalError, NodalResult};

/// Which end of the ranking metric to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Largest values first.
    High,
    /// Smallest values first.
    Low,
}

impl Direction {
    /// Return a human-readable name for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }

    /// Parse a direction; sort-order spellings are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "high" | "desc" | "top" => Some(Self::High),
            "low" | "asc" | "bottom" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Ranking column and the direction to take frames from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankingKey {
    /// Column index in the ranking table (column 0 is the frame).
    pub column: usize,
    /// Sort direction.
    pub direction: Direction,
}

impl RankingKey {
    /// Create a new ranking key.
    pub fn new(column: usize, direction: Direction) -> Self {
        Self { column, direction }
    }
}

/// Named indicator metrics of the ranking table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Hyper-coherence (column 5); high = more synchronized.
    Coherence,
    /// Hyper-complexity (column 1); low = more ordered.
    Complexity,
}

impl Metric {
    /// Column and direction this metric selects.
    pub fn ranking_key(&self) -> RankingKey {
        match self {
            Self::Coherence => RankingKey::new(5, Direction::High),
            Self::Complexity => RankingKey::new(1, Direction::Low),
        }
    }

    /// Return a human-readable name for this metric.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Coherence => "coherence",
            Self::Complexity => "complexity",
        }
    }

    /// Parse a metric name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "coherence" | "hyper" => Some(Self::Coherence),
            "complexity" => Some(Self::Complexity),
            _ => None,
        }
    }
}

/// Frame selection scenario as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    SingleFrame,
    AllFrames,
    TopPercent,
}

impl Scenario {
    /// Return a human-readable name for this scenario.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleFrame => "single_frame",
            Self::AllFrames => "all_frames",
            Self::TopPercent => "top_percent",
        }
    }

    /// Parse a scenario; unknown names are configuration errors.
    pub fn parse(name: &str) -> NodalResult<Self> {
        match name.to_lowercase().as_str() {
            "single_frame" | "single" => Ok(Self::SingleFrame),
            "all_frames" | "all" => Ok(Self::AllFrames),
            "top_percent" | "percent" => Ok(Self::TopPercent),
            other => Err(NodalError::Configuration(format!(
                "Unknown scenario: {:?}",
                other
            ))),
        }
    }
}

/// How frames are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SelectionPolicy {
    /// Exactly one explicit frame.
    Single { frame: FrameIndex },
    /// Every frame the sources provide.
    All,
    /// The top or bottom `percent` of frames by a ranking column.
    TopPercent { percent: f64, key: RankingKey },
}

impl SelectionPolicy {
    /// Build and validate a policy from loosely-typed arguments.
    pub fn from_scenario(
        scenario: Scenario,
        frame: Option<FrameIndex>,
        percent: f64,
        key: RankingKey,
    ) -> NodalResult<Self> {
        validate_percent(percent)?;
        match scenario {
            Scenario::SingleFrame => {
                let frame = frame.ok_or_else(|| {
                    NodalError::Configuration("frame required for scenario 'single_frame'".into())
                })?;
                Ok(Self::Single { frame })
            }
            Scenario::AllFrames => Ok(Self::All),
            Scenario::TopPercent => Ok(Self::TopPercent { percent, key }),
        }
    }
}

/// Percent must lie in (0, 1].
pub fn validate_percent(percent: f64) -> NodalResult<()> {
    if !(percent > 0.0 && percent <= 1.0) {
        return Err(NodalError::Configuration(format!(
            "percent must be in the interval (0, 1]; got {}",
            percent
        )));
    }
    Ok(())
}

/// Number of frames a percentile selection keeps: `ceil(rows * percent)`.
pub fn selection_size(rows: usize, percent: f64) -> usize {
    ((rows as f64 * percent).ceil() as usize).min(rows)
}

/// Chooses frames from a set of subject sources.
pub struct FrameSelector<'a> {
    modality: Modality,
    sources: &'a [PathBuf],
}

impl<'a> FrameSelector<'a> {
    /// Create a selector over the given subject sources.
    pub fn new(modality: Modality, sources: &'a [PathBuf]) -> Self {
        Self { modality, sources }
    }

    /// Select frames, loading the ranking table from `ranking_table` when the
    /// policy needs one.
    pub fn select(
        &self,
        policy: &SelectionPolicy,
        ranking_table: Option<&Path>,
    ) -> NodalResult<Vec<FrameIndex>> {
        match policy {
            SelectionPolicy::TopPercent { .. } => {
                let path = ranking_table.ok_or_else(|| {
                    NodalError::Configuration(
                        "ranking table required for scenario 'top_percent'".into(),
                    )
                })?;
                let table = RankingTable::load(path)?;
                self.select_with_table(policy, Some(&table))
            }
            _ => self.select_with_table(policy, None),
        }
    }

    /// Select frames with an already-loaded ranking table.
    pub fn select_with_table(
        &self,
        policy: &SelectionPolicy,
        table: Option<&RankingTable>,
    ) -> NodalResult<Vec<FrameIndex>> {
        let frames = match *policy {
            SelectionPolicy::Single { frame } => vec![frame],
            SelectionPolicy::All => self.available_frames()?,
            SelectionPolicy::TopPercent { percent, key } => {
                validate_percent(percent)?;
                let table = table.ok_or_else(|| {
                    NodalError::Configuration(
                        "ranking table required for scenario 'top_percent'".into(),
                    )
                })?;
                rank_frames(table, percent, key)?
            }
        };
        debug!(
            "Selected {} frame(s) for {} sources ({:?})",
            frames.len(),
            self.sources.len(),
            policy
        );
        Ok(frames)
    }

    /// Every frame available across the sources, ascending.
    ///
    /// DV: the keys of the first container. Scaffold: the intersection of the
    /// frames present in every directory.
    pub fn available_frames(&self) -> NodalResult<Vec<FrameIndex>> {
        let first = self
            .sources
            .first()
            .ok_or_else(|| NodalError::Configuration("no input sources given".into()))?;

        match self.modality {
            Modality::Dv => {
                let frames = MmapDvReader::open(first)?.frame_keys();
                if frames.is_empty() {
                    return Err(NodalError::NoFramesFound(first.clone()));
                }
                Ok(frames)
            }
            Modality::Scaffold => {
                let mut common: Option<BTreeSet<FrameIndex>> = None;
                for dir in self.sources {
                    let frames = list_scaffold_frames(dir)?;
                    if frames.is_empty() {
                        return Err(NodalError::NoFramesFound(dir.clone()));
                    }
                    let frames: BTreeSet<FrameIndex> = frames.into_iter().collect();
                    common = Some(match common {
                        None => frames,
                        Some(acc) => acc.intersection(&frames).copied().collect(),
                    });
                }
                let common = common.unwrap_or_default();
                if common.is_empty() {
                    return Err(NodalError::EmptyIntersection);
                }
                Ok(common.into_iter().collect())
            }
        }
    }
}

/// Rank rows by `key` and return the frames of the first `ceil(N * percent)`.
///
/// The sort is stable, so ties keep file order and the earlier frame wins at
/// the cut boundary.
pub fn rank_frames(
    table: &RankingTable,
    percent: f64,
    key: RankingKey,
) -> NodalResult<Vec<FrameIndex>> {
    let values = table.column(key.column)?;
    let n = selection_size(values.len(), percent);

    let mut order: Vec<usize> = (0..values.len()).collect();
    match key.direction {
        Direction::High => order.sort_by(|&a, &b| values[b].total_cmp(&values[a])),
        Direction::Low => order.sort_by(|&a, &b| values[a].total_cmp(&values[b])),
    }
    order.truncate(n);

    let rows = table.rows();
    Ok(order.into_iter().map(|idx| rows[idx].frame).collect())
}
