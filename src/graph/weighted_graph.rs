//! Undirected weighted region graph for a single frame.

use std::collections::BTreeMap;

use crate::types::{EdgeKey, GraphNode, NodalStrengthVector, PersistenceCycle};

/// Region-adjacency structure for one (subject, frame) extraction.
///
/// Edges are keyed canonically, so (u, v) and (v, u) are the same entry.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    edges: BTreeMap<EdgeKey<GraphNode>, f64>,
}

impl WeightedGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }

    /// Build a scaffold graph from persistence cycles.
    ///
    /// Every edge traversed by a cycle receives the cycle's persistence
    /// interval; edges shared by several cycles accumulate the sum.
    pub fn from_cycles(cycles: &[PersistenceCycle]) -> Self {
        let mut graph = Self::new();
        for cycle in cycles {
            let w = cycle.persistence_interval;
            for (u, v) in &cycle.edges {
                graph.add_weight(u.to_node(), v.to_node(), w);
            }
        }
        graph
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct vertices touched by an edge.
    pub fn node_count(&self) -> usize {
        let mut nodes: Vec<&GraphNode> = self
            .edges
            .keys()
            .flat_map(|k| [k.low(), k.high()])
            .collect();
        nodes.sort();
        nodes.dedup();
        nodes.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Weight of the undirected edge (a, b), if present.
    pub fn weight(&self, a: impl Into<GraphNode>, b: impl Into<GraphNode>) -> Option<f64> {
        self.edges.get(&EdgeKey::new(a.into(), b.into())).copied()
    }

    /// Add `w` to edge (a, b), creating it at `w` when absent.
    pub fn add_weight(&mut self, a: impl Into<GraphNode>, b: impl Into<GraphNode>, w: f64) {
        *self
            .edges
            .entry(EdgeKey::new(a.into(), b.into()))
            .or_insert(0.0) += w;
    }

    /// Record edge (a, b) at `w` only if it is not present yet.
    /// Returns whether the edge was inserted.
    pub fn insert_if_absent(
        &mut self,
        a: impl Into<GraphNode>,
        b: impl Into<GraphNode>,
        w: f64,
    ) -> bool {
        let key = EdgeKey::new(a.into(), b.into());
        if self.edges.contains_key(&key) {
            return false;
        }
        self.edges.insert(key, w);
        true
    }

    /// Iterate over (edge, weight) pairs in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey<GraphNode>, f64)> {
        self.edges.iter().map(|(k, w)| (k, *w))
    }

    /// Sum of the weights of all edges incident to `node`.
    /// A self-loop counts twice.
    pub fn weighted_degree(&self, node: &GraphNode) -> f64 {
        self.edges
            .iter()
            .map(|(k, w)| {
                let hits = (k.low() == node) as u8 + (k.high() == node) as u8;
                f64::from(hits) * w
            })
            .sum()
    }

    /// Project edge weights onto regions: entry r is the weighted degree of
    /// region r. Vertices that are not regions in `[0, num_regions)` are
    /// skipped; regions without edges stay at zero.
    pub fn nodal_strength(&self, num_regions: usize) -> NodalStrengthVector {
        let mut strength = NodalStrengthVector::zeros(num_regions);
        for (key, w) in &self.edges {
            if let Some(r) = key.low().region_index(num_regions) {
                strength.add_at(r, *w);
            }
            if let Some(r) = key.high().region_index(num_regions) {
                strength.add_at(r, *w);
            }
        }
        strength
    }
}
