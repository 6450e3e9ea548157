//! Fixed-length per-region strength vector.

use serde::Serialize;

use super::error::{NodalError, NodalResult};

/// Per-region scalar summary for one frame, subject, or group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodalStrengthVector(Vec<f64>);

impl NodalStrengthVector {
    /// All-zero vector of `num_regions` entries.
    pub fn zeros(num_regions: usize) -> Self {
        Self(vec![0.0; num_regions])
    }

    /// Wrap raw values.
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no regions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume into the raw values.
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }

    /// Add `value` at `index`; indices outside the vector are dropped.
    pub fn add_at(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot += value;
        }
    }

    /// Fail with `ShapeMismatch` unless the length equals `expected`.
    pub fn check_len(&self, expected: usize) -> NodalResult<()> {
        if self.0.len() != expected {
            return Err(NodalError::ShapeMismatch {
                expected,
                got: self.0.len(),
            });
        }
        Ok(())
    }

    /// Elementwise `self += other`. Lengths must already agree.
    pub fn accumulate(&mut self, other: &NodalStrengthVector) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += *b;
        }
    }

    /// Elementwise division by a scalar count.
    pub fn divided_by(&self, count: usize) -> Self {
        let d = count as f64;
        Self(self.0.iter().map(|v| v / d).collect())
    }

    /// Smallest and largest value, or None when empty.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.0.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

impl std::ops::Index<usize> for NodalStrengthVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}
