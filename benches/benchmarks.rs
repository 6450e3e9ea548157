//! Criterion benchmarks for nodal-strength.

use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use tempfile::{NamedTempFile, TempDir};

use nodal_strength::engine::{
    rank_frames, Aggregator, Direction, DvExtractor, RankingKey, ScaffoldExtractor,
};
use nodal_strength::format::{
    DvContainer, DvReader, DvWriter, MmapDvReader, RankingTable, ScaffoldWriter,
};
use nodal_strength::graph::ScaffoldBuilder;
use nodal_strength::types::{EdgeDescriptor, FrameIndex, DEFAULT_NUM_REGIONS};

/// Random triangle descriptors over `DEFAULT_NUM_REGIONS` regions.
fn make_rows(count: usize) -> Vec<EdgeDescriptor> {
    let mut rng = rand::thread_rng();
    let n = DEFAULT_NUM_REGIONS as i64;
    (0..count)
        .map(|_| {
            let c = rng.gen_range(1..20) as f64;
            EdgeDescriptor::new(
                rng.gen_range(0..n),
                rng.gen_range(0..n),
                c * rng.gen_range(0.0..1.0),
                c,
            )
        })
        .collect()
}

fn make_container(frames: u32, rows_per_frame: usize) -> DvContainer {
    let mut container = DvContainer::new();
    for frame in 0..frames {
        container.insert_frame(frame, make_rows(rows_per_frame));
    }
    container
}

fn make_scaffold_dir(dir: &std::path::Path, frames: u32, cycles: usize) {
    let mut rng = rand::thread_rng();
    let n = DEFAULT_NUM_REGIONS as i64;
    for frame in 0..frames {
        let mut builder = ScaffoldBuilder::new();
        for _ in 0..cycles {
            let len = rng.gen_range(3..8);
            let ring: Vec<i64> = (0..len).map(|_| rng.gen_range(0..n)).collect();
            builder.ring(rng.gen_range(0.01..2.0), &ring);
        }
        ScaffoldWriter::write_frame(dir, frame, &builder.build()).unwrap();
    }
}

fn bench_dv_extraction(c: &mut Criterion) {
    let rows = make_rows(50_000);

    c.bench_function("dv_nodal_strength_50k_rows", |b| {
        b.iter(|| DvExtractor::nodal_strength(&rows, DEFAULT_NUM_REGIONS))
    });
}

fn bench_scaffold_graph(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut builder = ScaffoldBuilder::new();
    for _ in 0..2_000 {
        let ring: Vec<i64> = (0..6).map(|_| rng.gen_range(0..100)).collect();
        builder.ring(rng.gen_range(0.01..2.0), &ring);
    }

    c.bench_function("scaffold_graph_2k_cycles", |b| {
        b.iter(|| builder.graph().nodal_strength(DEFAULT_NUM_REGIONS))
    });
}

fn bench_write_container(c: &mut Criterion) {
    let container = make_container(200, 5_000);

    c.bench_function("write_dvc_200_frames", |b| {
        b.iter(|| {
            let tmp = NamedTempFile::new().unwrap();
            DvWriter::write_to_file(&container, tmp.path()).unwrap();
        })
    });
}

fn bench_read_container(c: &mut Criterion) {
    let tmp = NamedTempFile::new().unwrap();
    DvWriter::write_to_file(&make_container(200, 5_000), tmp.path()).unwrap();

    c.bench_function("read_dvc_200_frames", |b| {
        b.iter(|| {
            let _ = DvReader::read_from_file(tmp.path()).unwrap();
        })
    });
}

fn bench_mmap_frame_access(c: &mut Criterion) {
    let tmp = NamedTempFile::new().unwrap();
    DvWriter::write_to_file(&make_container(1_000, 2_000), tmp.path()).unwrap();
    let reader = MmapDvReader::open(tmp.path()).unwrap();

    c.bench_function("mmap_frame_access_1k", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let frame = rng.gen_range(0..1_000u32);
            let _ = reader.read_frame(frame);
        })
    });
}

fn bench_rank_frames(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let rows: Vec<Vec<f64>> = (0..10_000)
        .map(|f| {
            let mut row = vec![f as f64];
            row.extend((0..5).map(|_| rng.gen_range(0.0..1.0)));
            row
        })
        .collect();
    let table = RankingTable::from_rows(rows).unwrap();
    let key = RankingKey::new(5, Direction::High);

    c.bench_function("rank_frames_10k", |b| {
        b.iter(|| rank_frames(&table, 0.15, key).unwrap())
    });
}

fn bench_aggregate_dv(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let container = make_container(50, 5_000);
    let sources: Vec<PathBuf> = (0..8)
        .map(|s| {
            let path = dir.path().join(format!("subject{}.dvc", s));
            DvWriter::write_to_file(&container, &path).unwrap();
            path
        })
        .collect();
    let frames: Vec<FrameIndex> = (0..50).collect();

    c.bench_function("aggregate_dv_8x50_sequential", |b| {
        let aggregator = Aggregator::new(DEFAULT_NUM_REGIONS);
        b.iter(|| aggregator.aggregate(&sources, &frames, &DvExtractor).unwrap())
    });
    c.bench_function("aggregate_dv_8x50_parallel", |b| {
        let aggregator = Aggregator::new(DEFAULT_NUM_REGIONS).parallel(true);
        b.iter(|| aggregator.aggregate(&sources, &frames, &DvExtractor).unwrap())
    });
}

fn bench_aggregate_scaffold(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let sources: Vec<PathBuf> = (0..4)
        .map(|s| {
            let path = dir.path().join(format!("subject{}", s));
            make_scaffold_dir(&path, 40, 300);
            path
        })
        .collect();
    let frames: Vec<FrameIndex> = (0..40).collect();
    let extractor = ScaffoldExtractor::default();

    c.bench_function("aggregate_scaffold_4x40_parallel", |b| {
        let aggregator = Aggregator::new(DEFAULT_NUM_REGIONS).parallel(true);
        b.iter(|| aggregator.aggregate(&sources, &frames, &extractor).unwrap())
    });
}

criterion_group!(
    benches,
    bench_dv_extraction,
    bench_scaffold_graph,
    bench_write_container,
    bench_read_container,
    bench_mmap_frame_access,
    bench_rank_frames,
    bench_aggregate_dv,
    bench_aggregate_scaffold,
);
criterion_main!(benches);
