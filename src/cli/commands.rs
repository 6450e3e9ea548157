//! CLI command implementations.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::config::RunConfig;
use crate::engine::{compute_brainmap, select_frames, PipelineOutput, PipelineParams};
use crate::format::{write_vector, DvContainer, DvWriter, MmapDvReader};
use crate::types::{Modality, NodalError, NodalResult};

/// Where and how to persist a run's result.
#[derive(Debug, Clone)]
pub struct OutputTargets {
    /// Result vector path (.npy, .json, or text).
    pub output: PathBuf,
    /// Optional image handed to the renderer.
    pub output_img: Option<PathBuf>,
    /// Renderer program, invoked as `<renderer> <vector> <image>`.
    pub renderer: Option<String>,
}

impl OutputTargets {
    fn validate(&self) -> NodalResult<()> {
        if self.output_img.is_some() && self.renderer.is_none() {
            return Err(NodalError::Configuration(
                "--output-img requires --renderer".into(),
            ));
        }
        Ok(())
    }
}

/// Compute a brain map and persist it.
pub fn cmd_compute(
    modality: Modality,
    inputs: &[PathBuf],
    params: &PipelineParams,
    targets: &OutputTargets,
    json: bool,
) -> NodalResult<()> {
    targets.validate()?;
    let output = compute_brainmap(modality, inputs, params, None)?;

    write_vector(&output.result.mean, &targets.output)?;
    info!("Saved array to {}", targets.output.display());

    if let (Some(img), Some(renderer)) = (&targets.output_img, &targets.renderer) {
        render_image(renderer, &targets.output, img)?;
    }

    print_report(&output, &targets.output, json);
    Ok(())
}

/// Run a pipeline described by a TOML config.
pub fn cmd_run(config: &RunConfig, json: bool) -> NodalResult<()> {
    let modality = config.modality()?;
    let params = config.to_params()?;
    let targets = OutputTargets {
        output: config.output.clone(),
        output_img: config.output_img.clone(),
        renderer: config.renderer.clone(),
    };
    cmd_compute(modality, &config.inputs, &params, &targets, json)
}

/// Print the selected frames without aggregating.
pub fn cmd_frames(
    modality: Modality,
    inputs: &[PathBuf],
    params: &PipelineParams,
    json: bool,
) -> NodalResult<()> {
    let frames = select_frames(modality, inputs, params)?;
    if json {
        println!(
            "{}",
            serde_json::json!({"count": frames.len(), "frames": frames})
        );
    } else {
        for frame in &frames {
            println!("{}", frame);
        }
    }
    Ok(())
}

/// Display information about a .dvc container.
pub fn cmd_info(path: &Path, json: bool) -> NodalResult<()> {
    let reader = MmapDvReader::open(path)?;
    let file_size = std::fs::metadata(path)?.len();
    let entries = reader.entries();
    let total_rows: u64 = entries.iter().map(|e| u64::from(e.row_count)).sum();

    if json {
        let frames: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| serde_json::json!({"frame": e.frame, "rows": e.row_count}))
            .collect();
        let info = serde_json::json!({
            "file": path.display().to_string(),
            "version": reader.header().version,
            "frames": reader.header().frame_count,
            "rows": total_rows,
            "file_size": file_size,
            "frame_rows": frames,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).unwrap_or_default()
        );
    } else {
        println!("File: {}", path.display());
        println!("Version: {}", reader.header().version);
        println!("Frames: {}", reader.header().frame_count);
        println!("Rows: {}", total_rows);
        println!("File size: {}", format_size(file_size));
        if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
            println!("Frame range: {}..={}", first.frame, last.frame);
        }
    }
    Ok(())
}

/// Build a .dvc container from the JSON interchange form.
pub fn cmd_pack(json_file: &Path, container: &Path, json: bool) -> NodalResult<()> {
    let data = DvContainer::from_json_file(json_file)?;
    DvWriter::write_to_file(&data, container)?;

    if json {
        println!(
            "{}",
            serde_json::json!({"file": container.display().to_string(), "frames": data.frame_count()})
        );
    } else {
        println!(
            "Packed {} frames into {}",
            data.frame_count(),
            container.display()
        );
    }
    Ok(())
}

fn render_image(renderer: &str, vector: &Path, image: &Path) -> NodalResult<()> {
    let status = Command::new(renderer).arg(vector).arg(image).status()?;
    if status.success() {
        info!("Saved image to {}", image.display());
    } else {
        warn!("Renderer {} exited with {}", renderer, status);
    }
    Ok(())
}

fn print_report(output: &PipelineOutput, path: &Path, json: bool) {
    let result = &output.result;
    let summary = result.summary();
    if json {
        let report = serde_json::json!({
            "modality": output.modality,
            "output": path.display().to_string(),
            "frames": output.frames,
            "summary": summary,
            "subjects": result.subjects,
            "skipped": result.skipped,
            "mode": result.mode,
            "cancelled": result.cancelled,
            "finished_at": output.finished_at,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return;
    }

    println!("Saved array to {}", path.display());
    println!("Modality: {}", output.modality);
    println!("Frames selected: {}", output.frames.len());
    println!(
        "Pairs: {} total, {} valid, {} skipped",
        summary.total, summary.valid, summary.skipped
    );
    println!(
        "Subjects contributing: {}/{}",
        result.contributing_subjects(),
        result.subjects.len()
    );
    if let Some((lo, hi)) = result.mean.range() {
        println!(
            "Result: length={}, range=[{:.4}, {:.4}]",
            result.mean.len(),
            lo,
            hi
        );
    }
    for skip in &result.skipped {
        println!(
            "  skipped subject={} frame={}: {}",
            skip.subject.display(),
            skip.frame,
            skip.reason
        );
    }
}

/// Format a byte size as human-readable.
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
