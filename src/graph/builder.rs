//! Fluent API for building scaffold frames.

use std::collections::BTreeMap;

use crate::format::ScaffoldFrame;
use crate::types::{PersistenceCycle, DEFAULT_HOMOLOGY_GROUP};

use super::WeightedGraph;

/// Fluent builder for constructing a ScaffoldFrame cycle by cycle.
pub struct ScaffoldBuilder {
    current_group: u32,
    groups: BTreeMap<u32, Vec<PersistenceCycle>>,
}

impl ScaffoldBuilder {
    /// Create a new builder writing into the default homology group.
    pub fn new() -> Self {
        Self {
            current_group: DEFAULT_HOMOLOGY_GROUP,
            groups: BTreeMap::new(),
        }
    }

    /// Switch the homology group that subsequent cycles are added to.
    pub fn group(&mut self, group: u32) -> &mut Self {
        self.current_group = group;
        self.groups.entry(group).or_default();
        self
    }

    /// Add a cycle traversing the given region edges.
    pub fn cycle(&mut self, persistence_interval: f64, edges: &[(i64, i64)]) -> &mut Self {
        self.groups
            .entry(self.current_group)
            .or_default()
            .push(PersistenceCycle::new(persistence_interval, edges));
        self
    }

    /// Add a closed cycle through the given regions (last vertex links back
    /// to the first).
    pub fn ring(&mut self, persistence_interval: f64, regions: &[i64]) -> &mut Self {
        let edges: Vec<(i64, i64)> = regions
            .iter()
            .zip(regions.iter().cycle().skip(1))
            .map(|(&u, &v)| (u, v))
            .collect();
        self.cycle(persistence_interval, &edges)
    }

    /// Weighted graph of the current group, without building the frame.
    pub fn graph(&self) -> WeightedGraph {
        self.groups
            .get(&self.current_group)
            .map(|cycles| WeightedGraph::from_cycles(cycles))
            .unwrap_or_default()
    }

    /// Build the final ScaffoldFrame.
    pub fn build(self) -> ScaffoldFrame {
        ScaffoldFrame::from_groups(self.groups)
    }
}

impl Default for ScaffoldBuilder {
    fn default() -> Self {
        Self::new()
    }
}
