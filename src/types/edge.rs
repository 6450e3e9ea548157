//! Edge descriptors and canonical undirected edge keys.

use serde::Serialize;

/// One dynamic-violation record: edge (i, j) with the summed weight of the
/// violating triangles that contain it and how many there were.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeDescriptor {
    /// First region index.
    pub i: i64,
    /// Second region index.
    pub j: i64,
    /// Sum of triangle weights incident to (i, j).
    pub weight_sum: f64,
    /// Number of violating triangles incident to (i, j).
    pub count: f64,
}

impl EdgeDescriptor {
    /// Create a new descriptor.
    pub fn new(i: i64, j: i64, weight_sum: f64, count: f64) -> Self {
        Self {
            i,
            j,
            weight_sum,
            count,
        }
    }

    /// Build from a raw 4-column row. Region columns are truncated toward zero.
    pub fn from_row(row: [f64; 4]) -> Self {
        Self {
            i: row[0] as i64,
            j: row[1] as i64,
            weight_sum: row[2],
            count: row[3],
        }
    }

    /// The raw 4-column row for this descriptor.
    pub fn to_row(&self) -> [f64; 4] {
        [self.i as f64, self.j as f64, self.weight_sum, self.count]
    }

    /// Average weight per violating triangle, or None when no triangle was counted.
    pub fn mean_weight(&self) -> Option<f64> {
        if self.count > 0.0 {
            Some(self.weight_sum / self.count)
        } else {
            None
        }
    }
}

/// Canonical undirected edge: endpoints stored as (min, max).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeKey<N: Ord>(N, N);

impl<N: Ord> EdgeKey<N> {
    /// Canonicalize an unordered pair.
    pub fn new(a: N, b: N) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Smaller endpoint.
    pub fn low(&self) -> &N {
        &self.0
    }

    /// Larger endpoint.
    pub fn high(&self) -> &N {
        &self.1
    }

    /// Whether this edge is a self-loop.
    pub fn is_loop(&self) -> bool {
        self.0 == self.1
    }
}

/// A vertex of a scaffold graph.
///
/// Cycle files normally name vertices by integer region id; anything else is
/// kept as a label so its incident weight still lands on integer neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GraphNode {
    /// Integer region id (may be negative or out of range).
    Region(i64),
    /// Non-integer vertex label.
    Label(String),
}

impl GraphNode {
    /// Region index if this node names a region in `[0, num_regions)`.
    pub fn region_index(&self, num_regions: usize) -> Option<usize> {
        match self {
            Self::Region(r) if *r >= 0 && (*r as u64) < num_regions as u64 => Some(*r as usize),
            _ => None,
        }
    }
}

impl From<i64> for GraphNode {
    fn from(value: i64) -> Self {
        Self::Region(value)
    }
}

impl std::fmt::Display for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Region(r) => write!(f, "{}", r),
            Self::Label(l) => write!(f, "{:?}", l),
        }
    }
}
