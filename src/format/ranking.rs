//! Whitespace-delimited ranking tables (per-frame indicator metrics).

use std::path::{Path, PathBuf};

use crate::types::error::{NodalError, NodalResult};
use crate::types::FrameIndex;

/// One row: frame index followed by its metric values.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    /// Frame index (column 0).
    pub frame: FrameIndex,
    /// All columns of the row, including column 0.
    pub values: Vec<f64>,
}

/// External per-frame scalar metrics, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingTable {
    source: PathBuf,
    rows: Vec<RankingRow>,
    columns: usize,
}

impl RankingTable {
    /// Load a table from disk.
    pub fn load(path: &Path) -> NodalResult<Self> {
        if !path.exists() {
            return Err(NodalError::RankingTableNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse table text. Blank lines and `#` comments are ignored; every row
    /// must have the same number of columns.
    pub fn parse(text: &str, source: &Path) -> NodalResult<Self> {
        let shape_err = |reason: String| NodalError::RankingTableShape {
            path: source.to_path_buf(),
            reason,
        };

        let mut rows = Vec::new();
        let mut columns = 0usize;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let values = line
                .split_whitespace()
                .map(|tok| tok.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|e| shape_err(format!("line {}: {}", lineno + 1, e)))?;

            if rows.is_empty() {
                columns = values.len();
            } else if values.len() != columns {
                return Err(shape_err(format!(
                    "line {} has {} columns, expected {}",
                    lineno + 1,
                    values.len(),
                    columns
                )));
            }

            let frame = values[0];
            let in_range = frame >= 0.0 && frame <= f64::from(FrameIndex::MAX);
            if !(frame.is_finite() && frame.fract() == 0.0 && in_range) {
                return Err(shape_err(format!(
                    "line {}: frame {} is not an integer in 0..={}",
                    lineno + 1,
                    frame,
                    FrameIndex::MAX
                )));
            }
            rows.push(RankingRow {
                frame: frame as FrameIndex,
                values,
            });
        }

        if rows.is_empty() {
            return Err(shape_err("table has no rows".to_string()));
        }

        Ok(Self {
            source: source.to_path_buf(),
            rows,
            columns,
        })
    }

    /// Build a table directly from rows (frame first in each row).
    pub fn from_rows(rows: Vec<Vec<f64>>) -> NodalResult<Self> {
        let text: String = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self::parse(&text, Path::new("<memory>"))
    }

    /// Path the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows (never true for a parsed table).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// All rows in file order.
    pub fn rows(&self) -> &[RankingRow] {
        &self.rows
    }

    /// Values of one column, in row order.
    pub fn column(&self, column: usize) -> NodalResult<Vec<f64>> {
        if column >= self.columns {
            return Err(NodalError::RankingTableShape {
                path: self.source.clone(),
                reason: format!(
                    "must have at least {} columns; got {}",
                    column + 1,
                    self.columns
                ),
            });
        }
        Ok(self.rows.iter().map(|r| r.values[column]).collect())
    }
}
