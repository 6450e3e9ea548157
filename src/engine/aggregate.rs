//! Cross-frame, cross-subject aggregation with per-pair failure isolation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::types::{FrameIndex, NodalError, NodalResult, NodalStrengthVector};

use super::extract::StrengthExtractor;

/// How valid pairs are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Mean over every valid (subject, frame) pair.
    #[default]
    Pooled,
    /// Mean over frames per subject, then mean over subjects.
    SubjectMean,
}

impl AggregationMode {
    /// Return a human-readable name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pooled => "pooled",
            Self::SubjectMean => "subject_mean",
        }
    }

    /// Parse a mode name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pooled" => Some(Self::Pooled),
            "subject_mean" | "subject" => Some(Self::SubjectMean),
            _ => None,
        }
    }
}

/// Cooperative cancellation flag, checked between pairs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A (subject, frame) pair dropped from the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPair {
    /// Subject source path.
    pub subject: PathBuf,
    /// Frame index.
    pub frame: FrameIndex,
    /// Error kind (see `NodalError::kind`).
    pub kind: String,
    /// Human-readable cause.
    pub reason: String,
}

/// Per-subject contribution counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    /// Subject source path.
    pub subject: PathBuf,
    /// Frames that produced a valid vector.
    pub valid_frames: usize,
    /// Frames that were skipped.
    pub skipped_frames: usize,
}

/// Total / valid / skipped counts of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pairs planned (subjects × frames).
    pub total: usize,
    /// Pairs actually attempted.
    pub visited: usize,
    /// Pairs that contributed.
    pub valid: usize,
    /// Pairs dropped.
    pub skipped: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pairs total, {} visited, {} valid, {} skipped",
            self.total, self.visited, self.valid, self.skipped
        )
    }
}

/// Mean nodal strength over all successfully processed pairs.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    /// Averaged nodal strength.
    pub mean: NodalStrengthVector,
    /// Number of contributing (subject, frame) pairs. Always >= 1.
    pub count: usize,
    /// Pairs planned.
    pub total_pairs: usize,
    /// Pairs attempted before completion or cancellation.
    pub visited_pairs: usize,
    /// Dropped pairs with their causes, in visiting order.
    pub skipped: Vec<SkippedPair>,
    /// Per-subject counts, in input order.
    pub subjects: Vec<SubjectSummary>,
    /// Averaging mode used.
    pub mode: AggregationMode,
    /// Whether the run stopped early on cancellation.
    pub cancelled: bool,
}

impl AggregateResult {
    /// Total / valid / skipped counts.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.total_pairs,
            visited: self.visited_pairs,
            valid: self.count,
            skipped: self.skipped.len(),
        }
    }

    /// Subjects with at least one valid frame.
    pub fn contributing_subjects(&self) -> usize {
        self.subjects.iter().filter(|s| s.valid_frames > 0).count()
    }
}

struct SubjectAccumulator {
    sum: NodalStrengthVector,
    valid: usize,
    skipped: usize,
}

/// Running sums over a contiguous or interleaved share of the pairs.
///
/// Each extracted vector is folded in and dropped immediately; only the sums
/// (one per subject plus the pooled one) stay alive.
struct PartialSums {
    pooled: NodalStrengthVector,
    subjects: Vec<SubjectAccumulator>,
    count: usize,
    visited: usize,
    cancelled: bool,
    skipped: Vec<(usize, SkippedPair)>,
}

impl PartialSums {
    fn new(num_subjects: usize, num_regions: usize) -> Self {
        Self {
            pooled: NodalStrengthVector::zeros(num_regions),
            subjects: (0..num_subjects)
                .map(|_| SubjectAccumulator {
                    sum: NodalStrengthVector::zeros(num_regions),
                    valid: 0,
                    skipped: 0,
                })
                .collect(),
            count: 0,
            visited: 0,
            cancelled: false,
            skipped: Vec::new(),
        }
    }

    /// Fold the outcome of pair number `idx` into the sums.
    fn absorb(
        &mut self,
        idx: usize,
        s: usize,
        subject: &Path,
        frame: FrameIndex,
        outcome: Option<NodalResult<NodalStrengthVector>>,
    ) {
        let Some(outcome) = outcome else {
            self.cancelled = true;
            return;
        };
        self.visited += 1;
        match outcome {
            Ok(strength) => {
                debug!("Accepted subject={}, frame={}", subject.display(), frame);
                self.pooled.accumulate(&strength);
                self.subjects[s].sum.accumulate(&strength);
                self.subjects[s].valid += 1;
                self.count += 1;
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!(
                        "Skipping subject={}, frame={}: {}",
                        subject.display(),
                        frame,
                        e
                    );
                } else {
                    // Run-level error raised by an extractor; still isolated to this pair.
                    error!(
                        "Skipping subject={}, frame={} on unexpected error: {}",
                        subject.display(),
                        frame,
                        e
                    );
                }
                self.subjects[s].skipped += 1;
                self.skipped.push((
                    idx,
                    SkippedPair {
                        subject: subject.to_path_buf(),
                        frame,
                        kind: e.kind().to_string(),
                        reason: e.to_string(),
                    },
                ));
            }
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.pooled.accumulate(&other.pooled);
        for (acc, theirs) in self.subjects.iter_mut().zip(&other.subjects) {
            acc.sum.accumulate(&theirs.sum);
            acc.valid += theirs.valid;
            acc.skipped += theirs.skipped;
        }
        self.count += other.count;
        self.visited += other.visited;
        self.cancelled |= other.cancelled;
        self.skipped.extend(other.skipped);
        self
    }
}

/// Iterates subject × frame pairs through an extractor and averages the
/// resulting vectors.
pub struct Aggregator {
    num_regions: usize,
    mode: AggregationMode,
    parallel: bool,
    cancel: Option<CancelToken>,
}

impl Aggregator {
    /// Create a sequential, pooled aggregator for `num_regions` regions.
    pub fn new(num_regions: usize) -> Self {
        Self {
            num_regions,
            mode: AggregationMode::Pooled,
            parallel: false,
            cancel: None,
        }
    }

    /// Set the averaging mode.
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fold extractions into partial sums on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Configured region count.
    pub fn num_regions(&self) -> usize {
        self.num_regions
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }

    fn extract(
        &self,
        extractor: &dyn StrengthExtractor,
        subject: &Path,
        frame: FrameIndex,
    ) -> Option<NodalResult<NodalStrengthVector>> {
        if self.is_cancelled() {
            return None;
        }
        let result = extractor
            .load(subject, frame, self.num_regions)
            .and_then(|strength| {
                strength.check_len(self.num_regions)?;
                Ok(strength)
            });
        Some(result)
    }

    /// Aggregate every frame of every subject.
    ///
    /// Failing pairs are skipped and reported; the call only fails when no
    /// pair produced a valid vector. Vectors are folded into running sums as
    /// they arrive. Skipped pairs are reported in (subject, frame) input order
    /// in both sequential and parallel runs.
    pub fn aggregate(
        &self,
        sources: &[PathBuf],
        frames: &[FrameIndex],
        extractor: &dyn StrengthExtractor,
    ) -> NodalResult<AggregateResult> {
        let pairs: Vec<(usize, FrameIndex)> = (0..sources.len())
            .flat_map(|s| frames.iter().map(move |&f| (s, f)))
            .collect();
        let empty = || PartialSums::new(sources.len(), self.num_regions);

        let mut sums = if self.parallel {
            pairs
                .par_iter()
                .enumerate()
                .fold(empty, |mut acc, (idx, &(s, f))| {
                    let outcome = self.extract(extractor, &sources[s], f);
                    acc.absorb(idx, s, &sources[s], f, outcome);
                    acc
                })
                .reduce(empty, PartialSums::merge)
        } else {
            let mut acc = empty();
            for (idx, &(s, f)) in pairs.iter().enumerate() {
                let outcome = self.extract(extractor, &sources[s], f);
                acc.absorb(idx, s, &sources[s], f, outcome);
            }
            acc
        };
        sums.skipped.sort_by_key(|(idx, _)| *idx);

        let PartialSums {
            pooled,
            subjects,
            count,
            visited,
            cancelled,
            skipped,
        } = sums;
        let skipped: Vec<SkippedPair> = skipped.into_iter().map(|(_, pair)| pair).collect();

        if count == 0 {
            return Err(NodalError::NoValidResults { total: visited });
        }

        let mean = match self.mode {
            AggregationMode::Pooled => pooled.divided_by(count),
            AggregationMode::SubjectMean => {
                let mut sum = NodalStrengthVector::zeros(self.num_regions);
                let mut contributing = 0usize;
                for acc in subjects.iter().filter(|a| a.valid > 0) {
                    sum.accumulate(&acc.sum.divided_by(acc.valid));
                    contributing += 1;
                }
                sum.divided_by(contributing)
            }
        };

        let result = AggregateResult {
            mean,
            count,
            total_pairs: pairs.len(),
            visited_pairs: visited,
            skipped,
            subjects: sources
                .iter()
                .zip(&subjects)
                .map(|(subject, acc)| SubjectSummary {
                    subject: subject.clone(),
                    valid_frames: acc.valid,
                    skipped_frames: acc.skipped,
                })
                .collect(),
            mode: self.mode,
            cancelled,
        };
        info!("Aggregation finished: {}", result.summary());
        if cancelled {
            warn!("Aggregation cancelled; returning partial result");
        }
        Ok(result)
    }
}
