//! Per-frame scaffold files: `generators__<frame>.json` inside a subject directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::Value;

use crate::types::error::{NodalError, NodalResult};
use crate::types::{FrameIndex, PersistenceCycle, SCAFFOLD_FILE_EXT, SCAFFOLD_FILE_PREFIX};

/// All homology groups of one scaffold frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaffoldFrame {
    groups: BTreeMap<u32, Vec<PersistenceCycle>>,
}

impl ScaffoldFrame {
    /// Wrap pre-grouped cycles.
    pub fn from_groups(groups: BTreeMap<u32, Vec<PersistenceCycle>>) -> Self {
        Self { groups }
    }

    /// Cycles of a homology group, if present.
    pub fn group(&self, group: u32) -> Option<&[PersistenceCycle]> {
        self.groups.get(&group).map(|c| c.as_slice())
    }

    /// Total number of cycles across all groups.
    pub fn cycle_count(&self) -> usize {
        self.groups.values().map(|c| c.len()).sum()
    }

    /// Serialize as a JSON object keyed by the group number.
    pub fn to_json_string(&self) -> NodalResult<String> {
        let keyed: BTreeMap<String, &Vec<PersistenceCycle>> = self
            .groups
            .iter()
            .map(|(g, cycles)| (g.to_string(), cycles))
            .collect();
        Ok(serde_json::to_string(&keyed)?)
    }
}

/// Path of the scaffold file for `frame` inside `directory`.
pub fn scaffold_path(directory: &Path, frame: FrameIndex) -> PathBuf {
    directory.join(format!(
        "{}{}.{}",
        SCAFFOLD_FILE_PREFIX, frame, SCAFFOLD_FILE_EXT
    ))
}

/// Frame index embedded in a scaffold file name.
///
/// Returns `None` for names outside the naming convention and `Some(Err(..))`
/// for names that match it but carry an unparseable index.
pub fn parse_scaffold_name(name: &str) -> Option<Result<FrameIndex, String>> {
    let rest = name.strip_prefix(SCAFFOLD_FILE_PREFIX)?;
    let stem = rest.strip_suffix(&format!(".{}", SCAFFOLD_FILE_EXT))?;
    Some(stem.parse::<FrameIndex>().map_err(|e| e.to_string()))
}

/// Sorted frame indices present in a scaffold directory.
///
/// A missing directory yields an empty list. Files whose name matches the
/// pattern but whose index does not parse are skipped with a warning.
pub fn list_scaffold_frames(directory: &Path) -> NodalResult<Vec<FrameIndex>> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(NodalError::Io(e)),
    };

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        match parse_scaffold_name(name) {
            Some(Ok(frame)) => frames.push(frame),
            Some(Err(reason)) => {
                warn!("Ignoring scaffold file with unexpected name {}: {}", name, reason)
            }
            None => {}
        }
    }
    frames.sort_unstable();
    frames.dedup();
    Ok(frames)
}

/// Reader for per-frame scaffold files.
pub struct ScaffoldReader;

impl ScaffoldReader {
    /// Load the cycles of `group` for `frame` from a subject directory.
    pub fn read_cycles(
        directory: &Path,
        frame: FrameIndex,
        group: u32,
    ) -> NodalResult<Vec<PersistenceCycle>> {
        let path = scaffold_path(directory, frame);
        let root = Self::read_document(&path)?;

        let Value::Object(map) = root else {
            return Err(NodalError::HomologyGroupMissing { path, group });
        };
        let value = map
            .get(&group.to_string())
            .ok_or_else(|| NodalError::HomologyGroupMissing {
                path: path.clone(),
                group,
            })?;
        serde_json::from_value(value.clone())
            .map_err(|_| NodalError::HomologyGroupMissing { path, group })
    }

    /// Load every homology group of a frame.
    pub fn read_frame(directory: &Path, frame: FrameIndex) -> NodalResult<ScaffoldFrame> {
        let path = scaffold_path(directory, frame);
        let root = Self::read_document(&path)?;
        let raw: BTreeMap<String, Vec<PersistenceCycle>> =
            serde_json::from_value(root).map_err(|e| NodalError::ScaffoldCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mut groups = BTreeMap::new();
        for (key, cycles) in raw {
            let group: u32 = key.parse().map_err(|_| NodalError::ScaffoldCorrupt {
                path: path.clone(),
                reason: format!("homology group key {:?} is not an integer", key),
            })?;
            groups.insert(group, cycles);
        }
        Ok(ScaffoldFrame::from_groups(groups))
    }

    fn read_document(path: &Path) -> NodalResult<Value> {
        if !path.is_file() {
            return Err(NodalError::ScaffoldFileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| NodalError::ScaffoldCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| NodalError::ScaffoldCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Writer for per-frame scaffold files.
pub struct ScaffoldWriter;

impl ScaffoldWriter {
    /// Write `frame_data` as the scaffold file of `frame` in `directory`.
    pub fn write_frame(
        directory: &Path,
        frame: FrameIndex,
        frame_data: &ScaffoldFrame,
    ) -> NodalResult<PathBuf> {
        std::fs::create_dir_all(directory)?;
        let path = scaffold_path(directory, frame);
        std::fs::write(&path, frame_data.to_json_string()?)?;
        Ok(path)
    }
}
