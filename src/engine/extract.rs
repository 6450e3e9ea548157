//! Per-frame nodal strength extraction for both modalities.

use std::path::Path;

use log::debug;

use crate::format::{MmapDvReader, ScaffoldReader};
use crate::graph::WeightedGraph;
use crate::types::{
    EdgeDescriptor, FrameIndex, GraphNode, Modality, NodalResult, NodalStrengthVector,
    DEFAULT_HOMOLOGY_GROUP,
};

/// Loads one (subject, frame) pair and reduces it to a nodal strength vector.
pub trait StrengthExtractor: Send + Sync {
    /// The representation this extractor reads.
    fn modality(&self) -> Modality;

    /// Extract the nodal strength of `frame` from `source`.
    fn load(
        &self,
        source: &Path,
        frame: FrameIndex,
        num_regions: usize,
    ) -> NodalResult<NodalStrengthVector>;
}

/// Dynamic-violation extractor: sources are .dvc containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DvExtractor;

impl DvExtractor {
    /// Create a new DV extractor.
    pub fn new() -> Self {
        Self
    }

    /// Mean triangle weight per canonical edge.
    ///
    /// Rows with `count <= 0` are ignored. When several rows map to the same
    /// undirected edge, the first one seen is kept and later ones are dropped
    /// rather than re-averaged.
    pub fn edge_weights(rows: &[EdgeDescriptor]) -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        for row in rows {
            if let Some(w) = row.mean_weight() {
                graph.insert_if_absent(GraphNode::Region(row.i), GraphNode::Region(row.j), w);
            }
        }
        graph
    }

    /// Project DV rows onto regions; out-of-range endpoints are dropped.
    pub fn nodal_strength(rows: &[EdgeDescriptor], num_regions: usize) -> NodalStrengthVector {
        Self::edge_weights(rows).nodal_strength(num_regions)
    }
}

impl StrengthExtractor for DvExtractor {
    fn modality(&self) -> Modality {
        Modality::Dv
    }

    fn load(
        &self,
        source: &Path,
        frame: FrameIndex,
        num_regions: usize,
    ) -> NodalResult<NodalStrengthVector> {
        let reader = MmapDvReader::open(source)?;
        let rows = reader.read_frame(frame)?;
        let strength = Self::nodal_strength(&rows, num_regions);
        strength.check_len(num_regions)?;
        debug!(
            "dv {} frame {}: {} rows",
            source.display(),
            frame,
            rows.len()
        );
        Ok(strength)
    }
}

/// Homological scaffold extractor: sources are subject directories.
#[derive(Debug, Clone, Copy)]
pub struct ScaffoldExtractor {
    homology_group: u32,
}

impl ScaffoldExtractor {
    /// Create an extractor reading the given homology group.
    pub fn new(homology_group: u32) -> Self {
        Self { homology_group }
    }

    /// The homology group this extractor reads.
    pub fn homology_group(&self) -> u32 {
        self.homology_group
    }

    /// Build the weighted scaffold graph of one frame.
    pub fn build_graph(&self, directory: &Path, frame: FrameIndex) -> NodalResult<WeightedGraph> {
        let cycles = ScaffoldReader::read_cycles(directory, frame, self.homology_group)?;
        Ok(WeightedGraph::from_cycles(&cycles))
    }
}

impl Default for ScaffoldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_HOMOLOGY_GROUP)
    }
}

impl StrengthExtractor for ScaffoldExtractor {
    fn modality(&self) -> Modality {
        Modality::Scaffold
    }

    fn load(
        &self,
        source: &Path,
        frame: FrameIndex,
        num_regions: usize,
    ) -> NodalResult<NodalStrengthVector> {
        let graph = self.build_graph(source, frame)?;
        let strength = graph.nodal_strength(num_regions);
        strength.check_len(num_regions)?;
        debug!(
            "scaffold {} frame {}: {} edges over {} nodes",
            source.display(),
            frame,
            graph.edge_count(),
            graph.node_count()
        );
        Ok(strength)
    }
}
