//! Phase 4 tests: aggregation, pipelines, and run configuration.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use nodal_strength::config::load_config;
use nodal_strength::engine::{
    compute_brainmap, compute_brainmap_dv, compute_brainmap_scaffold, select_frames,
    AggregationMode, Aggregator, CancelToken, Direction, DvExtractor, Metric, PipelineParams,
    RankingKey, ScaffoldExtractor, Scenario, StrengthExtractor,
};
use nodal_strength::format::{DvContainer, DvWriter, ScaffoldWriter};
use nodal_strength::graph::ScaffoldBuilder;
use nodal_strength::types::{
    EdgeDescriptor, FrameIndex, Modality, NodalError, NodalResult, NodalStrengthVector,
};

/// Extractor backed by a closure, for driving the aggregator directly.
struct FnExtractor<F>(F);

impl<F> StrengthExtractor for FnExtractor<F>
where
    F: Fn(&Path, FrameIndex, usize) -> NodalResult<NodalStrengthVector> + Send + Sync,
{
    fn modality(&self) -> Modality {
        Modality::Dv
    }

    fn load(
        &self,
        source: &Path,
        frame: FrameIndex,
        num_regions: usize,
    ) -> NodalResult<NodalStrengthVector> {
        (self.0)(source, frame, num_regions)
    }
}

fn subjects(n: usize) -> Vec<PathBuf> {
    (0..n).map(|i| PathBuf::from(format!("subject{}", i))).collect()
}

fn subject_no(path: &Path) -> f64 {
    path.to_string_lossy()
        .trim_start_matches("subject")
        .parse()
        .unwrap()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length differs");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }
}

fn scenario_a_container(dir: &Path, name: &str) -> PathBuf {
    let mut container = DvContainer::new();
    container.insert_frame(
        0,
        vec![
            EdgeDescriptor::new(0, 1, 4.0, 2.0),
            EdgeDescriptor::new(1, 2, 9.0, 3.0),
        ],
    );
    container.insert_frame(1, vec![EdgeDescriptor::new(0, 2, 2.0, 1.0)]);
    let path = dir.join(name);
    DvWriter::write_to_file(&container, &path).unwrap();
    path
}

// ==================== Aggregator Tests ====================

#[test]
fn test_identical_vectors_average_to_themselves() {
    let v = vec![1.5, 0.0, 7.25];
    let extractor = FnExtractor(|_: &Path, _: FrameIndex, _: usize| {
        Ok(NodalStrengthVector::from_vec(vec![1.5, 0.0, 7.25]))
    });
    let result = Aggregator::new(3)
        .aggregate(&subjects(3), &[0, 1, 2, 3], &extractor)
        .unwrap();
    assert_close(result.mean.as_slice(), &v);
    assert_eq!(result.count, 12);
    assert!(result.skipped.is_empty());
    assert!(!result.cancelled);
}

#[test]
fn test_failing_pairs_are_skipped() {
    let extractor = FnExtractor(|source: &Path, frame: FrameIndex, n: usize| {
        if frame == 1 {
            return Err(NodalError::FrameNotFound {
                path: source.to_path_buf(),
                frame,
            });
        }
        Ok(NodalStrengthVector::from_vec(vec![f64::from(frame); n]))
    });
    let result = Aggregator::new(2)
        .aggregate(&subjects(2), &[0, 1, 2], &extractor)
        .unwrap();

    assert_eq!(result.count, 4);
    assert_close(result.mean.as_slice(), &[1.0, 1.0]);

    let summary = result.summary();
    assert_eq!(summary.total, 6);
    assert_eq!(summary.visited, 6);
    assert_eq!(summary.valid, 4);
    assert_eq!(summary.skipped, 2);

    assert_eq!(result.skipped[0].subject, PathBuf::from("subject0"));
    assert_eq!(result.skipped[0].frame, 1);
    assert_eq!(result.skipped[0].kind, "frame_not_found");
    assert_eq!(result.skipped[1].subject, PathBuf::from("subject1"));
    assert_eq!(result.subjects[0].valid_frames, 2);
    assert_eq!(result.subjects[0].skipped_frames, 1);
}

#[test]
fn test_all_pairs_failing() {
    let extractor = FnExtractor(|source: &Path, _: FrameIndex, _: usize| {
        Err(NodalError::ScaffoldFileNotFound(source.to_path_buf()))
    });
    match Aggregator::new(4)
        .aggregate(&subjects(2), &[0, 1], &extractor)
        .unwrap_err()
    {
        NodalError::NoValidResults { total: 4 } => {}
        e => panic!("Expected NoValidResults, got {:?}", e),
    }
}

#[test]
fn test_wrong_length_vector_is_skipped() {
    let extractor = FnExtractor(|source: &Path, _: FrameIndex, n: usize| {
        if source == Path::new("subject1") {
            Ok(NodalStrengthVector::from_vec(vec![100.0; n + 1]))
        } else {
            Ok(NodalStrengthVector::from_vec(vec![2.0; n]))
        }
    });
    let result = Aggregator::new(3)
        .aggregate(&subjects(2), &[0], &extractor)
        .unwrap();
    assert_close(result.mean.as_slice(), &[2.0, 2.0, 2.0]);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].kind, "shape_mismatch");
}

#[test]
fn test_extractor_errors_are_recoverable_selection_errors_are_not() {
    let dir = TempDir::new().unwrap();
    let container = scenario_a_container(dir.path(), "a.dvc");

    let missing_frame = DvExtractor.load(&container, 99, 3).unwrap_err();
    assert!(matches!(missing_frame, NodalError::FrameNotFound { .. }));
    assert!(missing_frame.is_recoverable());

    let missing_file = ScaffoldExtractor::default()
        .load(&dir.path().join("no_such_dir"), 0, 3)
        .unwrap_err();
    assert!(matches!(missing_file, NodalError::ScaffoldFileNotFound(_)));
    assert!(missing_file.is_recoverable());

    assert!(NodalError::ShapeMismatch { expected: 3, got: 4 }.is_recoverable());

    let no_table = PipelineParams {
        scenario: Scenario::TopPercent,
        ..PipelineParams::default()
    };
    let config_err = select_frames(Modality::Dv, &[container], &no_table).unwrap_err();
    assert!(!config_err.is_recoverable());
    assert!(!NodalError::EmptyIntersection.is_recoverable());

    let all_failing = FnExtractor(|source: &Path, _: FrameIndex, _: usize| {
        Err(NodalError::ScaffoldFileNotFound(source.to_path_buf()))
    });
    let exhausted = Aggregator::new(3)
        .aggregate(&subjects(1), &[0], &all_failing)
        .unwrap_err();
    assert!(matches!(exhausted, NodalError::NoValidResults { total: 1 }));
    assert!(!exhausted.is_recoverable());
}

#[test]
fn test_parallel_matches_sequential() {
    let extractor = FnExtractor(|source: &Path, frame: FrameIndex, n: usize| {
        let s = subject_no(source);
        if (s as u32 + frame) % 5 == 0 {
            return Err(NodalError::FrameNotFound {
                path: source.to_path_buf(),
                frame,
            });
        }
        let values = (0..n)
            .map(|r| (s + 1.0) * 0.1 + f64::from(frame) / 3.0 + r as f64 * 1e-3)
            .collect();
        Ok(NodalStrengthVector::from_vec(values))
    });
    let sources = subjects(6);
    let frames: Vec<FrameIndex> = (0..20).collect();

    let sequential = Aggregator::new(8)
        .aggregate(&sources, &frames, &extractor)
        .unwrap();
    let parallel = Aggregator::new(8)
        .parallel(true)
        .aggregate(&sources, &frames, &extractor)
        .unwrap();

    assert_close(parallel.mean.as_slice(), sequential.mean.as_slice());
    assert_eq!(sequential.count, parallel.count);
    assert_eq!(sequential.skipped, parallel.skipped);
}

#[test]
fn test_subject_mean_differs_from_pooled() {
    let extractor = FnExtractor(|source: &Path, frame: FrameIndex, n: usize| {
        match (subject_no(source) as u32, frame) {
            (0, 0) => Ok(NodalStrengthVector::from_vec(vec![1.0; n])),
            (0, 1) => Ok(NodalStrengthVector::from_vec(vec![3.0; n])),
            (1, 0) => Ok(NodalStrengthVector::from_vec(vec![10.0; n])),
            _ => Err(NodalError::ScaffoldFileNotFound(source.to_path_buf())),
        }
    });
    let sources = subjects(3);

    let pooled = Aggregator::new(2)
        .aggregate(&sources, &[0, 1], &extractor)
        .unwrap();
    assert_close(pooled.mean.as_slice(), &[14.0 / 3.0, 14.0 / 3.0]);
    assert_eq!(pooled.mode, AggregationMode::Pooled);

    let per_subject = Aggregator::new(2)
        .with_mode(AggregationMode::SubjectMean)
        .aggregate(&sources, &[0, 1], &extractor)
        .unwrap();
    assert_close(per_subject.mean.as_slice(), &[6.0, 6.0]);
    assert_eq!(per_subject.count, 3);
    assert_eq!(per_subject.contributing_subjects(), 2);
}

#[test]
fn test_cancel_before_start() {
    let token = CancelToken::new();
    token.cancel();
    let extractor = FnExtractor(|_: &Path, _: FrameIndex, n: usize| {
        Ok(NodalStrengthVector::zeros(n))
    });
    match Aggregator::new(2)
        .with_cancel(token)
        .aggregate(&subjects(2), &[0, 1], &extractor)
        .unwrap_err()
    {
        NodalError::NoValidResults { total: 0 } => {}
        e => panic!("Expected NoValidResults, got {:?}", e),
    }
}

#[test]
fn test_cancel_mid_run_returns_partial() {
    let token = CancelToken::new();
    let calls = AtomicUsize::new(0);
    let trigger = token.clone();
    let extractor = FnExtractor(move |_: &Path, _: FrameIndex, n: usize| {
        if calls.fetch_add(1, Ordering::SeqCst) == 1 {
            trigger.cancel();
        }
        Ok(NodalStrengthVector::from_vec(vec![1.0; n]))
    });
    let result = Aggregator::new(2)
        .with_cancel(token)
        .aggregate(&subjects(2), &[0, 1, 2], &extractor)
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.count, 2);
    assert_eq!(result.visited_pairs, 2);
    assert_eq!(result.total_pairs, 6);
    assert_close(result.mean.as_slice(), &[1.0, 1.0]);
}

// ==================== Pipeline Tests ====================

#[test]
fn test_dv_pipeline_single_frame() {
    let dir = TempDir::new().unwrap();
    let sources = vec![
        scenario_a_container(dir.path(), "a.dvc"),
        scenario_a_container(dir.path(), "b.dvc"),
    ];
    let params = PipelineParams {
        frame: Some(0),
        num_regions: 3,
        ..PipelineParams::default()
    };
    let output = compute_brainmap_dv(&sources, &params).unwrap();
    assert_eq!(output.modality, Modality::Dv);
    assert_eq!(output.frames, vec![0]);
    assert_eq!(output.result.count, 2);
    assert_close(output.result.mean.as_slice(), &[2.0, 5.0, 3.0]);
}

#[test]
fn test_dv_pipeline_all_frames_with_missing_subject() {
    let dir = TempDir::new().unwrap();
    let sources = vec![
        scenario_a_container(dir.path(), "a.dvc"),
        dir.path().join("missing.dvc"),
    ];
    let params = PipelineParams {
        scenario: Scenario::AllFrames,
        num_regions: 3,
        ..PipelineParams::default()
    };
    let output = compute_brainmap_dv(&sources, &params).unwrap();
    assert_eq!(output.frames, vec![0, 1]);
    assert_eq!(output.result.count, 2);
    assert_eq!(output.result.skipped.len(), 2);
    // frame 0: [2,5,3]; frame 1: [2,0,2]
    assert_close(output.result.mean.as_slice(), &[2.0, 2.5, 2.5]);
}

#[test]
fn test_scaffold_pipeline_top_percent_default_metric() {
    let dir = TempDir::new().unwrap();
    let subject = dir.path().join("s1");
    for frame in 0..4u32 {
        let mut builder = ScaffoldBuilder::new();
        builder.cycle(f64::from(frame + 1), &[(0, 1)]);
        ScaffoldWriter::write_frame(&subject, frame, &builder.build()).unwrap();
    }
    let table = dir.path().join("ranking.txt");
    std::fs::write(&table, "0 0.9\n1 0.1\n2 0.5\n3 0.3\n").unwrap();

    let params = PipelineParams {
        scenario: Scenario::TopPercent,
        percent: 0.5,
        ranking_table: Some(table),
        num_regions: 2,
        ..PipelineParams::default()
    };
    // Scaffold ranks by complexity (column 1, lowest first).
    let output = compute_brainmap_scaffold(&[subject], &params).unwrap();
    assert_eq!(output.frames, vec![1, 3]);
    assert_close(output.result.mean.as_slice(), &[3.0, 3.0]);
}

#[test]
fn test_ranking_key_precedence() {
    let mut params = PipelineParams::default();
    assert_eq!(
        params.ranking_key(Modality::Dv),
        RankingKey::new(5, Direction::High)
    );
    assert_eq!(
        params.ranking_key(Modality::Scaffold),
        RankingKey::new(1, Direction::Low)
    );
    params.metric = Some(Metric::Complexity);
    assert_eq!(params.ranking_key(Modality::Dv), Metric::Complexity.ranking_key());
    params.ranking_key = Some(RankingKey::new(3, Direction::High));
    assert_eq!(
        params.ranking_key(Modality::Scaffold),
        RankingKey::new(3, Direction::High)
    );
}

#[test]
fn test_pipeline_configuration_errors() {
    let sources = vec![PathBuf::from("whatever.dvc")];

    match compute_brainmap(Modality::Dv, &[], &PipelineParams::default(), None).unwrap_err() {
        NodalError::Configuration(_) => {}
        e => panic!("Expected Configuration, got {:?}", e),
    }

    let zero_regions = PipelineParams {
        frame: Some(0),
        num_regions: 0,
        ..PipelineParams::default()
    };
    assert!(matches!(
        select_frames(Modality::Dv, &sources, &zero_regions),
        Err(NodalError::Configuration(_))
    ));

    let no_table = PipelineParams {
        scenario: Scenario::TopPercent,
        ..PipelineParams::default()
    };
    assert!(matches!(
        select_frames(Modality::Dv, &sources, &no_table),
        Err(NodalError::Configuration(_))
    ));

    let bad_percent = PipelineParams {
        frame: Some(0),
        percent: 0.0,
        ..PipelineParams::default()
    };
    assert!(matches!(
        select_frames(Modality::Dv, &sources, &bad_percent),
        Err(NodalError::Configuration(_))
    ));
}

#[test]
fn test_pipeline_cancel_token() {
    let dir = TempDir::new().unwrap();
    let sources = vec![scenario_a_container(dir.path(), "a.dvc")];
    let params = PipelineParams {
        frame: Some(0),
        num_regions: 3,
        ..PipelineParams::default()
    };
    let token = CancelToken::new();
    token.cancel();
    match compute_brainmap(Modality::Dv, &sources, &params, Some(token)).unwrap_err() {
        NodalError::NoValidResults { .. } => {}
        e => panic!("Expected NoValidResults, got {:?}", e),
    }
}

// ==================== Config Tests ====================

#[test]
fn test_load_config_resolves_relative_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(
        &path,
        r#"
mode = "scaffold"
inputs = ["subjects/s1", "/abs/s2"]
scenario = "top_percent"
percent = 0.25
ranking_table = "ranking.txt"
num_regions = 10
ranking_column = 3
direction = "low"
aggregation = "subject_mean"
output = "out/map.npy"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.modality().unwrap(), Modality::Scaffold);
    assert_eq!(config.inputs[0], dir.path().join("subjects/s1"));
    assert_eq!(config.inputs[1], PathBuf::from("/abs/s2"));
    assert_eq!(config.output, dir.path().join("out/map.npy"));

    let params = config.to_params().unwrap();
    assert_eq!(params.scenario, Scenario::TopPercent);
    assert_eq!(params.percent, 0.25);
    assert_eq!(params.num_regions, 10);
    assert_eq!(params.homology_group, 1);
    assert_eq!(params.aggregation, AggregationMode::SubjectMean);
    assert_eq!(params.ranking_key, Some(RankingKey::new(3, Direction::Low)));
    assert_eq!(params.ranking_table, Some(dir.path().join("ranking.txt")));
}

#[test]
fn test_config_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(&path, "mode = \"dv\"\ninputs = [\"a.dvc\"]\noutput = \"map.txt\"\n").unwrap();

    let params = load_config(&path).unwrap().to_params().unwrap();
    assert_eq!(params.scenario, Scenario::SingleFrame);
    assert_eq!(params.percent, 0.15);
    assert_eq!(params.num_regions, 100);
    assert_eq!(params.aggregation, AggregationMode::Pooled);
    assert!(params.metric.is_none());
    assert!(params.ranking_key.is_none());
    assert!(!params.parallel);
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");

    std::fs::write(
        &path,
        "mode = \"dv\"\ninputs = []\noutput = \"m.npy\"\ndirection = \"low\"\n",
    )
    .unwrap();
    match load_config(&path).unwrap().to_params().unwrap_err() {
        NodalError::Configuration(_) => {}
        e => panic!("Expected Configuration, got {:?}", e),
    }

    std::fs::write(
        &path,
        "mode = \"eeg\"\ninputs = []\noutput = \"m.npy\"\n",
    )
    .unwrap();
    assert!(matches!(
        load_config(&path).unwrap().modality(),
        Err(NodalError::Configuration(_))
    ));

    std::fs::write(&path, "mode = [").unwrap();
    match load_config(&path).unwrap_err() {
        NodalError::Configuration(_) => {}
        e => panic!("Expected Configuration, got {:?}", e),
    }
}
